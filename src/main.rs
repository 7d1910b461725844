use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use genrecast::{
    create_router, transcode, AppState, CaptureSession, ClassificationRecord, ClassifierClient,
    Config, FileDevice, HistoryStore, MicrophoneDevice,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "genrecast", about = "Record or upload audio and classify its genre")]
struct Cli {
    /// Config file (a built-in default config is used when missing)
    #[arg(long, default_value = "config/genrecast")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP control API for the view layer
    Serve,
    /// Record from the default microphone, then classify
    Record {
        /// Recording length in seconds
        #[arg(long, default_value_t = 10)]
        duration_secs: u64,
    },
    /// Classify an existing audio file
    Classify { path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} starting", cfg.service.name);

    match cli.command {
        Command::Serve => serve(cfg).await,
        Command::Record { duration_secs } => record(cfg, duration_secs).await,
        Command::Classify { path } => classify_file(cfg, path).await,
    }
}

async fn serve(cfg: Config) -> Result<()> {
    let classifier = ClassifierClient::new(&cfg.classifier.base_url, cfg.classifier.timeout_secs);
    let history = HistoryStore::open(&cfg.history.path)?;
    let state = AppState::new(classifier, history, cfg.audio.target_sample_rate);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("control API listening on {}", addr);
    info!("classifier endpoint: {}/predict", cfg.classifier.base_url);

    axum::serve(listener, create_router(state))
        .await
        .context("HTTP server failed")
}

async fn record(cfg: Config, duration_secs: u64) -> Result<()> {
    let mut session = CaptureSession::new(Box::new(MicrophoneDevice::new()));
    session.start().await.context("could not start capture")?;

    info!("recording for {}s...", duration_secs);
    tokio::time::sleep(Duration::from_secs(duration_secs)).await;

    let Some(blob) = session.stop().await else {
        warn!("nothing was captured");
        return Ok(());
    };

    submit(cfg, blob).await
}

async fn classify_file(cfg: Config, path: PathBuf) -> Result<()> {
    let mut session = CaptureSession::new(Box::new(FileDevice::new(&path)));
    session
        .start()
        .await
        .with_context(|| format!("could not open {}", path.display()))?;

    let Some(blob) = session.stop().await else {
        warn!("{} contained no data", path.display());
        return Ok(());
    };

    submit(cfg, blob).await
}

async fn submit(cfg: Config, blob: genrecast::EncodedBlob) -> Result<()> {
    let captured_at = Utc::now();
    let target_rate = cfg.audio.target_sample_rate;

    let asset = tokio::task::spawn_blocking(move || transcode(blob, target_rate))
        .await
        .context("transcode task panicked")?;

    let classifier = ClassifierClient::new(&cfg.classifier.base_url, cfg.classifier.timeout_secs);
    let prediction = classifier
        .classify(&asset)
        .await
        .context("classification failed")?;

    println!("genre:      {}", prediction.genre);
    println!("confidence: {:.1}%", prediction.confidence * 100.0);
    for (label, score) in &prediction.top_3 {
        println!("  {:<12} {:.1}%", label, score * 100.0);
    }

    let history = HistoryStore::open(&cfg.history.path)?;
    history
        .append(ClassificationRecord::new(prediction, captured_at))
        .await?;

    Ok(())
}
