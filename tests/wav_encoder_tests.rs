// Integration tests for the PCM encoder.
//
// The WAV container must be byte-exact: the classifier's decoding stack
// reads the canonical 44-byte RIFF/WAVE header directly.

use genrecast::{encode_wav, quantize_sample};

fn u16_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(bytes[offset..offset + 2].try_into().unwrap())
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

fn i16_at(bytes: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes(bytes[offset..offset + 2].try_into().unwrap())
}

#[test]
fn header_layout_matches_riff_wave_pcm() {
    let frames = 1000usize;
    let channels = 2u16;
    let sample_rate = 22050u32;
    let samples = vec![0.0_f32; frames * channels as usize];

    let bytes = encode_wav(&samples, sample_rate, channels).unwrap();
    let data_bytes = (frames * channels as usize * 2) as u32;

    assert_eq!(bytes.len(), 44 + data_bytes as usize);

    assert_eq!(&bytes[0..4], b"RIFF");
    assert_eq!(u32_at(&bytes, 4), 36 + data_bytes);
    assert_eq!(&bytes[8..12], b"WAVE");
    assert_eq!(&bytes[12..16], b"fmt ");
    assert_eq!(u32_at(&bytes, 16), 16); // fmt subchunk size
    assert_eq!(u16_at(&bytes, 20), 1); // PCM
    assert_eq!(u16_at(&bytes, 22), channels);
    assert_eq!(u32_at(&bytes, 24), sample_rate);
    assert_eq!(u32_at(&bytes, 28), sample_rate * channels as u32 * 2); // byte rate
    assert_eq!(u16_at(&bytes, 32), channels * 2); // block align
    assert_eq!(u16_at(&bytes, 34), 16); // bits per sample
    assert_eq!(&bytes[36..40], b"data");
    assert_eq!(u32_at(&bytes, 40), data_bytes);
}

#[test]
fn length_is_exact_across_rates_and_channels() {
    for &(frames, rate, channels) in &[
        (1usize, 8000u32, 1u16),
        (441, 44100, 1),
        (480, 48000, 2),
        (2205, 22050, 2),
    ] {
        let samples = vec![0.1_f32; frames * channels as usize];
        let bytes = encode_wav(&samples, rate, channels).unwrap();
        assert_eq!(
            bytes.len(),
            44 + frames * channels as usize * 2,
            "wrong length for {frames} frames at {rate} Hz, {channels} ch"
        );
    }
}

#[test]
fn clipped_samples_encode_to_rail_values() {
    let bytes = encode_wav(&[1.5, -1.5, 0.0], 22050, 1).unwrap();
    assert_eq!(i16_at(&bytes, 44), 32767);
    assert_eq!(i16_at(&bytes, 46), -32768);
    assert_eq!(i16_at(&bytes, 48), 0);
}

#[test]
fn samples_are_interleaved_in_input_order() {
    // Four recognizable stereo frames.
    let samples = vec![0.25_f32, -0.25, 0.5, -0.5];
    let bytes = encode_wav(&samples, 22050, 2).unwrap();

    for (i, &expected) in samples.iter().enumerate() {
        assert_eq!(i16_at(&bytes, 44 + i * 2), quantize_sample(expected));
    }
}

#[test]
fn roundtrip_through_wav_reader_within_one_quantization_step() {
    let original: Vec<f32> = (0..4410)
        .map(|i| (i as f32 * 2.0 * std::f32::consts::PI * 220.0 / 22050.0).sin() * 0.8)
        .collect();
    let bytes = encode_wav(&original, 22050, 1).unwrap();

    let reader = hound::WavReader::new(std::io::Cursor::new(bytes)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.sample_rate, 22050);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);

    let decoded: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(decoded.len(), original.len());

    for (orig, got) in original.iter().zip(decoded.iter()) {
        let recovered = *got as f32 / 32767.0;
        assert!(
            (orig - recovered).abs() <= 1.0 / 32767.0 + f32::EPSILON,
            "sample out of tolerance: {orig} vs {recovered}"
        );
    }
}
