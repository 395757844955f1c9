//! PhishGuard
//!
//! Lexical URL phishing detection: an HTTP prediction service plus the
//! offline tooling used to inspect features and calibrate thresholds.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use phishguard_classifiers::extract;
use phishguard_server::{
    calibrate, create_router, AppState, CalibrateArgs, Cli, Commands, ServeArgs, ServerConfig,
};
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => serve(args).await,
        Commands::Extract { url } => {
            println!("{}", serde_json::to_string_pretty(&extract(&url))?);
            Ok(())
        }
        Commands::Calibrate(args) => run_calibrate(args),
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    init_tracing(args.verbose);

    info!("Starting PhishGuard server");

    let config = ServerConfig::load(&args)?;
    info!("Configuration loaded successfully");
    info!("Model: {}", config.model_path.display());

    let metrics_handle = init_metrics()?;

    // Bundle problems abort here, before the listener binds
    let addr = config.socket_addr()?;
    let state = AppState::new(config, metrics_handle)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn run_calibrate(args: CalibrateArgs) -> Result<()> {
    init_tracing(args.verbose);

    let calibration = calibrate::run(&args)?;

    println!("{}", calibration.report);
    match calibration.roc_auc {
        Some(auc) => println!("ROC-AUC: {:.4}", auc),
        None => println!("ROC-AUC: undefined (single-class validation set)"),
    }
    println!();

    let selection = calibration.selection;
    println!(
        "Selected threshold: {:.4} (specificity={:.4}, recall={:.4})",
        selection.selected, selection.specificity, selection.recall
    );
    println!("Final threshold: {:.4}", selection.threshold);

    if let Some(path) = calibration.written_to {
        println!("Calibrated bundle written to {}", path.display());
    }
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("phishguard=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("phishguard=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "phishguard_requests_total",
        "Total number of prediction requests"
    );
    metrics::describe_counter!(
        "phishguard_verdicts_total",
        "Total number of verdicts by outcome"
    );
    metrics::describe_counter!(
        "phishguard_errors_total",
        "Total number of prediction errors by type"
    );
    metrics::describe_histogram!(
        "phishguard_prediction_latency_us",
        metrics::Unit::Microseconds,
        "Feature extraction and scoring latency in microseconds"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
