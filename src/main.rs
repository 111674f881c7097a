//! ==============================================================================
//! main.rs - proximity host entry point
//! ==============================================================================
//!
//! purpose:
//!     scans for nearby ble beacons on a fixed interval, tiers each one by
//!     signal strength, and serves the latest snapshot plus a bounded scan
//!     history on a small web dashboard.
//!
//! responsibilities:
//!     - load configuration (config/proximity.toml)
//!     - set up tracing from the configured log level
//!     - pick the scanner backend (simulated, or btleplug with "hardware")
//!     - run the scan controller and the web server side by side
//!
//! architecture:
//!
//!     ┌─────────────────────────────────────────────────────────────┐
//!     │                    rust host (this file)                     │
//!     │  ┌──────────────────────┐        ┌──────────────────────┐   │
//!     │  │ scan controller      │        │ web server           │   │
//!     │  │ (30s cycle + manual) │        │ (port 3000)          │   │
//!     │  └──────────┬───────────┘        └──────────┬───────────┘   │
//!     │             │ writes                  reads │               │
//!     │             └──────────►┌──────────┐◄───────┘               │
//!     │                         │ScanState │ <- domain.rs           │
//!     │                         └──────────┘                        │
//!     │     (ScanHandle: Arc<RwLock<ScanState>> + wake signal)       │
//!     └──────────────────────────────────────────────────────────────┘
//!
//! ==============================================================================

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use proximity_host::clock::WallClock;
use proximity_host::config::HostConfig;
use proximity_host::controller::{ScanController, ScanHandle, ScanSettings};
use proximity_host::{scanner, web};

#[tokio::main]
async fn main() -> Result<()> {
    // startup banner
    println!("===========================================================");
    println!("  Proximity Host - BLE presence dashboard");
    println!("===========================================================");

    // step 1: load configuration
    let config = HostConfig::load_or_default();
    config.print_summary();

    // step 2: logging (RUST_LOG wins over the config file)
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // step 3: shared state, clock and scanner
    let handle = ScanHandle::new(config.scan.max_devices, config.scan.max_history);
    let clock = WallClock::new(config.clock.utc_offset_seconds, config.clock.format.clone())?;
    let scanner = match scanner::default_scanner().await {
        Ok(s) => {
            tracing::info!("[STARTUP] ✓ Scanner ready ({})", s.name());
            s
        }
        Err(e) => {
            tracing::error!("[STARTUP] Fatal: no scanner available: {:#}", e);
            return Err(e);
        }
    };

    // step 4: start the web server in background
    let addr = config.bind_addr()?;
    let web_handle = handle.clone();
    let server = tokio::spawn(async move { web::run_server(web_handle, addr).await });

    // step 5: scan loop
    let controller = ScanController::new(
        handle,
        scanner,
        Box::new(clock),
        ScanSettings::from(&config),
    );

    tokio::select! {
        _ = controller.run() => Ok(()),
        res = server => {
            // the scan loop never returns, so getting here means the server died
            res.context("web server task panicked")?
                .context("web server stopped")
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("[SHUTDOWN] ctrl-c received");
            Ok(())
        }
    }
}
