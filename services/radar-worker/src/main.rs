//! Radar overlay worker.
//!
//! Polls the volume source for each configured station and keeps
//! `{STATION}_{product}.png` overlays (plus bounds and world files) current.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use radar_common::StationId;
use radar_worker::{
    HttpVolumeSource, RenderPipeline, Scheduler, StationConfig, VolumeSource, WorkerConfig,
};
use storage::ArtifactStore;
use volume::JsonVolumeDecoder;

#[derive(Parser, Debug)]
#[command(name = "radar-worker")]
#[command(about = "Render georeferenced radar overlays from the newest volume scans")]
struct Args {
    /// Worker configuration (YAML); built-in defaults when omitted
    #[arg(short, long, env = "RADAR_CONFIG")]
    config: Option<PathBuf>,

    /// Run one cycle and exit (vs continuous polling)
    #[arg(long)]
    once: bool,

    /// Only process this station (replaces the configured list)
    #[arg(short, long)]
    station: Option<String>,

    /// Products to render for --station (repeatable)
    #[arg(short, long)]
    product: Vec<String>,

    /// Directory for overlays; overrides the config file
    #[arg(long, env = "RADAR_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Base URL of the volume source
    #[arg(long, env = "RADAR_SOURCE_URL")]
    source_url: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Serve Prometheus metrics on this port
    #[arg(long, env = "METRICS_PORT")]
    metrics_port: Option<u16>,
}

fn load_config(args: &Args) -> Result<WorkerConfig> {
    let mut config = match &args.config {
        Some(path) => WorkerConfig::from_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => WorkerConfig::from_yaml("")?,
    };

    if let Some(url) = &args.source_url {
        config.source.base_url = url.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output.directory = dir.display().to_string();
        config.output.s3 = None;
    }
    if let Some(station) = &args.station {
        let id = StationId::parse(station)?;
        let products = if args.product.is_empty() {
            vec!["reflectivity".to_string()]
        } else {
            args.product.clone()
        };
        let previous = config.stations.iter().find(|s| s.id == id).cloned();
        let mut selected = StationConfig::new(id, products);
        if let Some(previous) = previous {
            selected.latitude = previous.latitude;
            selected.longitude = previous.longitude;
        }
        config.stations = vec![selected];
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(port) = args.metrics_port {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], port))
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!(port, "Serving metrics");
    }

    let config = load_config(&args)?;

    let store = match &config.output.s3 {
        Some(s3) => ArtifactStore::s3(s3)?,
        None => ArtifactStore::local(&config.output.directory)?,
    };
    let source: Arc<dyn VolumeSource> = Arc::new(HttpVolumeSource::new(
        config.source.base_url.clone(),
        config.source.request_timeout(),
    )?);

    info!(
        source = %config.source.base_url,
        store = %store.location(),
        stations = config.stations.len(),
        "Starting radar overlay worker"
    );

    let pipeline = Arc::new(RenderPipeline::from_config(
        &config,
        source,
        Arc::new(JsonVolumeDecoder),
        store,
    ));
    let scheduler = Scheduler::new(pipeline, config.stations.clone())
        .with_concurrency(config.schedule.concurrency)
        .with_poll_interval(config.schedule.poll_interval());

    if args.once {
        info!("Running single cycle");
        let results = scheduler.run_once().await;
        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        if failed == results.len() && !results.is_empty() {
            anyhow::bail!("every station failed");
        }
    } else {
        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        // Handle Ctrl+C
        let shutdown_tx_clone = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Received shutdown signal");
            shutdown_tx_clone.send(()).ok();
        });

        scheduler.run_forever(shutdown_tx.subscribe()).await?;
    }

    Ok(())
}
