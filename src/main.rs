//! FLOWSCAN: multi-factor stock scanner
//!
//! Entry point. Loads configuration, initialises structured logging,
//! loads the snapshot source, runs a startup scan and serves the
//! dashboard until Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use flowscan::config;
use flowscan::dashboard::{self, DashboardState, ScanResponse};
use flowscan::data::fixture::FixtureSource;
use flowscan::data::SnapshotSource;
use flowscan::types::ScannerResult;

const BANNER: &str = r#"
 _____ _     _____        ______   ____    _    _   _
|  ___| |   / _ \ \      / / ___| / ___|  / \  | \ | |
| |_  | |  | | | \ \ /\ / /\___ \| |     / _ \ |  \| |
|  _| | |__| |_| |\ V  V /  ___) | |___ / ___ \| |\  |
|_|   |_____\___/  \_/\_/  |____/ \____/_/   \_\_| \_|

  Flow, setup and liquidity scoring
  v0.1.0
"#;

/// Rows logged after the startup scan.
const STARTUP_TOP_N: usize = 5;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path =
        std::env::var("FLOWSCAN_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = config::AppConfig::load(&config_path)?;

    init_logging();

    println!("{BANNER}");
    info!(
        config = %config_path,
        default_mode = %cfg.scanner.default_mode,
        default_limit = cfg.scanner.default_limit,
        fetch_concurrency = cfg.scanner.fetch_concurrency,
        "FLOWSCAN starting up"
    );

    // -- Components --------------------------------------------------------

    let scanner = cfg.build_scanner()?;

    let source: Arc<dyn SnapshotSource> = match cfg.scanner.fixture_path.as_deref() {
        Some(path) => Arc::new(FixtureSource::load(path)?),
        None => {
            warn!("No fixture_path configured; scans will return no results");
            Arc::new(FixtureSource::empty())
        }
    };

    let state = Arc::new(DashboardState::new(
        scanner,
        Arc::clone(&source),
        cfg.scanner.default_limit,
    ));

    // -- Startup scan ------------------------------------------------------

    let mode = cfg.scanner.default_mode;
    let symbols = source.symbols();
    let results = state
        .scanner
        .scan(source.as_ref(), &symbols, mode, cfg.scanner.default_limit)
        .await;
    log_top_results(&results);
    state.record_scan(ScanResponse::new(mode, results)).await;

    // -- Serve -------------------------------------------------------------

    if cfg.dashboard.enabled {
        info!("Serving dashboard. Press Ctrl+C to stop.");
        dashboard::serve(state, cfg.dashboard.port, shutdown_signal()).await?;
    } else {
        info!("Dashboard disabled; exiting after startup scan");
    }

    info!("FLOWSCAN shut down cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
    }
    info!("Shutdown signal received.");
}

/// Log a human-readable summary of the best-ranked symbols.
fn log_top_results(results: &[ScannerResult]) {
    if results.is_empty() {
        warn!("Startup scan produced no results");
        return;
    }
    for (rank, result) in results.iter().take(STARTUP_TOP_N).enumerate() {
        info!(
            rank = rank + 1,
            symbol = %result.symbol,
            score = result.combined_score,
            price = format!("${:.2}", result.price),
            quick = result.quick_count(),
            "{result}"
        );
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("flowscan=info"));

    let json_logging = std::env::var("FLOWSCAN_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
