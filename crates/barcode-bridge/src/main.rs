//! Barcode Bridge entry point.
//!
//! By default runs headless: captures scanner input system-wide and forwards
//! every barcode to the configured print service until Ctrl-C.  The `export`
//! subcommand instead downloads one label export from the print service's
//! HTTP API and exits.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  ├─ load_config()          -- --config or BARCODE_BRIDGE_CONFIG, exe dir, working directory
//!  ├─ run (default)
//!  │    ├─ CaptureEngine          (keyboard hook thread)
//!  │    │     │ mpsc (bounded, try_send)
//!  │    │     ▼
//!  │    └─ ForwardBarcodesUseCase (Tokio task → TcpPrintClient)
//!  └─ export
//!       └─ ExportClient           (HTTP GET → export_folder/export_<timestamp>.<ext>)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use barcode_bridge::application::capture_engine::CaptureEngine;
use barcode_bridge::application::forward_barcodes::ForwardBarcodesUseCase;
use barcode_bridge::infrastructure::input_capture::platform_listener;
use barcode_bridge::infrastructure::network::export_client::{
    ExportClient, ExportError, ExportFormat, ExportRequest,
};
use barcode_bridge::infrastructure::network::print_client::TcpPrintClient;
use barcode_bridge::infrastructure::storage::config::{load_config, AppConfig, LoadedConfig};

/// Capacity of the capture → forward channel.  A full channel drops barcodes
/// rather than stalling the keyboard hook.
const BARCODE_CHANNEL_CAPACITY: usize = 64;

/// Command-line arguments for the bridge.
#[derive(Debug, Parser)]
#[command(
    name = "barcode-bridge",
    about = "Forwards keyboard-wedge barcode scans to a label print service",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    ///
    /// When omitted, the file is looked up next to the executable and then in
    /// the working directory; if neither exists the defaults are used.  A path
    /// given here must exist.
    #[arg(short, long, env = "BARCODE_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Capture barcodes and forward them to the print service (default).
    Run,
    /// Download a label export from the print service's HTTP API.
    Export(ExportArgs),
}

#[derive(Debug, Args)]
struct ExportArgs {
    /// Order number to export.
    #[arg(long, required_unless_present = "start", conflicts_with_all = ["start", "end"])]
    order: Option<String>,

    /// Restrict an order export to one position.
    #[arg(long, requires = "order")]
    position: Option<String>,

    /// First barcode of a range export.
    #[arg(long, requires = "end")]
    start: Option<String>,

    /// Last barcode of a range export.
    #[arg(long, requires = "start")]
    end: Option<String>,

    #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
    format: FormatArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

impl ExportArgs {
    fn request(&self) -> anyhow::Result<ExportRequest> {
        match (&self.order, &self.start, &self.end) {
            (Some(order), _, _) => Ok(ExportRequest::Order {
                order: order.clone(),
                position: self.position.clone(),
            }),
            (None, Some(start), Some(end)) => Ok(ExportRequest::Range {
                start: start.clone(),
                end: end.clone(),
            }),
            _ => bail!("either --order or both --start and --end are required"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (loaded, load_error) = match load_config(cli.config.clone()) {
        Ok(loaded) => (loaded, None),
        Err(e) => (
            LoadedConfig {
                config: AppConfig::default(),
                source: None,
            },
            Some(e),
        ),
    };
    let config = loaded.config;

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("Barcode Bridge starting");
    match (load_error, &loaded.source) {
        (Some(e), _) => warn!("could not load config, using defaults: {e}"),
        (None, Some(path)) => info!("config loaded from {}", path.display()),
        (None, None) => info!("no config file found, using defaults"),
    }

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run_bridge(config).await,
        Command::Export(args) => run_export(&config, &args).await,
    }
}

async fn run_bridge(config: AppConfig) -> anyhow::Result<()> {
    info!("{}", config.summary());

    let (tx, rx) = mpsc::channel(BARCODE_CHANNEL_CAPACITY);

    // ── Capture engine ────────────────────────────────────────────────────────
    let engine = CaptureEngine::new(platform_listener(), config.scanner_config(), Arc::new(tx));
    if engine.start().is_err() {
        // Already logged by the engine; the bridge keeps running without capture.
        warn!("running without barcode capture");
    }

    // ── Forwarding task ───────────────────────────────────────────────────────
    let forwarder = Arc::new(TcpPrintClient::from_config(&config.server));
    info!("forwarding barcodes to {}", forwarder.address());
    let use_case = Arc::new(ForwardBarcodesUseCase::new(forwarder));
    let forward_task = {
        let use_case = Arc::clone(&use_case);
        tokio::spawn(async move { use_case.run(rx).await })
    };

    info!("Barcode Bridge ready.  Press Ctrl-C to exit.");
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
    }
    info!("shutdown signal received");

    // Dropping the engine releases the hook and the last channel sender,
    // which ends the forwarding loop once queued barcodes are handled.
    engine.stop();
    drop(engine);
    if let Err(e) = forward_task.await {
        error!("forwarding task failed: {e}");
    }

    let status = use_case.status().await;
    info!(
        printed = status.printed,
        rejected = status.rejected,
        failed = status.failed,
        "Barcode Bridge stopped"
    );
    Ok(())
}

async fn run_export(config: &AppConfig, args: &ExportArgs) -> anyhow::Result<()> {
    let request = args.request()?;
    let client = ExportClient::from_config(config)?;

    match client.export(&request, args.format.into()).await {
        Ok(path) => {
            info!("export written to {}", path.display());
            Ok(())
        }
        Err(ExportError::NotFound) => {
            warn!("the print service has no labels for {request:?}");
            Err(ExportError::NotFound.into())
        }
        Err(e) => Err(e.into()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
