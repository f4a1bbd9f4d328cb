use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use roar_core::{
    load_config, validate_config, AcquireStage, CommandDetector, Config, DemucsSeparator,
    LedgerConfig, PostProcessorConfig, SeparateMusicStage, Stage, StageReport, StageRunner,
    StatusLedger, VoiceActivityStage, YtDlpSource,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_logging();

    // Determine config path
    let config_path = std::env::var("ROAR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        sinks = config.ledger.sinks.len(),
        post_processors = config.post_processors.len(),
        "Configuration loaded successfully"
    );

    run_pipeline(&config).await
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    let json = std::env::var("ROAR_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// Runs every configured stage in order: acquisition first, then the
/// post-processors as listed.
async fn run_pipeline(config: &Config) -> Result<()> {
    let mut reports = Vec::new();

    if let Some(acquire) = &config.acquire {
        let source = Arc::new(YtDlpSource::new(
            acquire.tool.clone(),
            acquire.downloader_args.clone(),
        ));
        let stage = AcquireStage::new(acquire.clone(), source)
            .context("Failed to set up acquire stage")?;
        reports.push(run_stage(stage, &config.ledger).await?);
    }

    for processor in &config.post_processors {
        let report = match processor {
            PostProcessorConfig::SeparateMusic(sep) => {
                let separator = Arc::new(DemucsSeparator::new(
                    sep.tool.clone(),
                    sep.model.clone(),
                    sep.device.clone(),
                ));
                let stage = SeparateMusicStage::new(sep.clone(), separator)
                    .context("Failed to set up separate_music stage")?;
                run_stage(stage, &config.ledger).await?
            }
            PostProcessorConfig::VoiceActivity(vad) => {
                let detector = Arc::new(CommandDetector::new(
                    vad.tool.clone(),
                    vad.tool_args.clone(),
                ));
                let stage = VoiceActivityStage::new(vad.clone(), detector)
                    .context("Failed to set up voice_activity stage")?;
                run_stage(stage, &config.ledger).await?
            }
        };
        reports.push(report);
    }

    let failed: usize = reports.iter().map(StageReport::failed).sum();
    if failed > 0 {
        bail!("{} item(s) failed; rerun to retry them", failed);
    }

    info!("Pipeline finished");
    Ok(())
}

/// Runs one stage against a ledger opened for it alone. Ctrl+C stops the
/// stage, closes its ledger and fails the run; unfinished items stay pending
/// and resume on the next run.
async fn run_stage<S: Stage>(stage: S, ledger_config: &LedgerConfig) -> Result<StageReport> {
    let name = stage.name().to_string();
    let ledger = Arc::new(
        StatusLedger::from_config(ledger_config)
            .with_context(|| format!("Failed to open ledger for {}", name))?,
    );

    let report = StageRunner::new(stage, ledger)
        .run_until(shutdown_signal())
        .await
        .with_context(|| format!("Stage {} aborted", name))?;

    info!(
        stage = %report.stage,
        enumerated = report.enumerated,
        skipped = report.skipped,
        dispatched = report.dispatched,
        succeeded = report.succeeded,
        failed = report.failed(),
        elapsed_secs = report.elapsed.as_secs_f64(),
        "Stage summary"
    );
    for failure in &report.failures {
        warn!(stage = %report.stage, "{}", failure);
    }

    Ok(report)
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C");
}
