use anyhow::{Context, Result};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Sample-accurate floating point audio, one buffer per channel.
///
/// Invariants: all channels have the same length, `sample_rate > 0`,
/// samples are in `[-1.0, 1.0]` as produced by the codec.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    pub channels: Vec<Vec<f32>>,
}

impl DecodedAudio {
    /// Number of frames (one sample per channel).
    pub fn frame_count(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    pub fn duration_seconds(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }
}

/// Decode a compressed audio container into per-channel float samples.
///
/// `extension_hint` helps symphonia pick a demuxer for containers without
/// strong magic bytes; it comes from the blob's declared MIME subtype.
pub fn decode_blob(data: &[u8], extension_hint: Option<&str>) -> Result<DecodedAudio> {
    if data.is_empty() {
        anyhow::bail!("empty audio blob");
    }

    let cursor = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension_hint {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("unrecognized audio container")?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("no decodable audio track")?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("unsupported audio codec")?;

    let mut sample_rate = 0u32;
    let mut channels: Vec<Vec<f32>> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // End of stream is reported as an unexpected EOF by the reader.
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e).context("failed to read audio packet"),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // A corrupt packet is skippable; a hard error is not.
            Err(SymphoniaError::DecodeError(e)) => {
                debug!("skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(e).context("failed to decode audio packet"),
        };

        let spec = *decoded.spec();
        let channel_count = spec.channels.count();

        if channels.is_empty() {
            sample_rate = spec.rate;
        }

        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);

        accumulate_frames(&mut channels, buf.samples(), channel_count)?;
    }

    if sample_rate == 0 || channels.iter().all(|c| c.is_empty()) {
        anyhow::bail!("decoded stream produced no samples");
    }

    debug!(
        "decoded {} frames, {} Hz, {} channels",
        channels[0].len(),
        sample_rate,
        channels.len()
    );

    Ok(DecodedAudio {
        sample_rate,
        channels,
    })
}

/// De-interleave one packet's samples into the running per-channel buffers.
///
/// A stream whose channel layout changes mid-way (chained OGG, variable MP3)
/// is rejected rather than accumulated: mixing layouts would leave the
/// channels with unequal lengths.
fn accumulate_frames(
    channels: &mut Vec<Vec<f32>>,
    samples: &[f32],
    channel_count: usize,
) -> Result<()> {
    if channel_count == 0 {
        anyhow::bail!("packet reported zero channels");
    }

    if channels.is_empty() {
        *channels = vec![Vec::new(); channel_count];
    } else if channel_count != channels.len() {
        anyhow::bail!(
            "channel count changed mid-stream ({} to {})",
            channels.len(),
            channel_count
        );
    }

    for frame in samples.chunks_exact(channel_count) {
        for (ch, &sample) in frame.iter().enumerate() {
            channels[ch].push(sample);
        }
    }

    Ok(())
}
