//! ==============================================================================
//! controller.rs - scan cycle controller
//! ==============================================================================
//!
//! purpose:
//!     owns the scan → classify → record sequence and decides when to run it.
//!     a cycle runs when none has run yet, when the interval has elapsed since
//!     the last one finished, or when someone asked for a manual scan.
//!
//! concurrency:
//!     the controller is a single tokio task. the radio scan is awaited
//!     WITHOUT holding the state lock, so the web server keeps answering
//!     (readers see `scanning: true` and an empty snapshot meanwhile).
//!     `scanning` doubles as the guard that stops two cycles overlapping.
//!
//! relationships:
//!     - used by: main.rs (spawns run()), web.rs (ScanHandle for reads/trigger)
//!     - uses: scanner.rs, clock.rs, proximity.rs, domain.rs
//!
//! ==============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, RwLock, RwLockReadGuard};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::HostConfig;
use crate::domain::{DiscoveredPeer, ScanState, ScanSummary};
use crate::proximity::Thresholds;
use crate::scanner::Scanner;

// ==============================================================================
// shared handle
// ==============================================================================
// cheap to clone; the web server and the controller each hold one.

#[derive(Clone)]
pub struct ScanHandle {
    state: Arc<RwLock<ScanState>>,
    wake: Arc<Notify>,
}

impl ScanHandle {
    pub fn new(max_devices: usize, max_history: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(ScanState::new(max_devices, max_history))),
            wake: Arc::new(Notify::new()),
        }
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, ScanState> {
        self.state.read().await
    }

    /// ask for a scan on the controller's next turn; does not wait for it
    pub async fn request_scan(&self) {
        self.state.write().await.scan_requested = true;
        self.wake.notify_one();
    }
}

#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub interval: Duration,
    pub duration: Duration,
    pub thresholds: Thresholds,
    pub show_devices: bool,
}

impl From<&HostConfig> for ScanSettings {
    fn from(config: &HostConfig) -> Self {
        Self {
            interval: config.scan.interval(),
            duration: config.scan.duration(),
            thresholds: config.proximity.thresholds(),
            show_devices: config.logging.show_devices,
        }
    }
}

/// true when a cycle should start at `now`
pub fn scan_due(state: &ScanState, now: Instant, interval: Duration) -> bool {
    time_until_due(state, now, interval).is_zero()
}

fn time_until_due(state: &ScanState, now: Instant, interval: Duration) -> Duration {
    if state.scan_requested {
        return Duration::ZERO;
    }
    match state.last_scan_at {
        None => Duration::ZERO,
        Some(last) => interval.saturating_sub(now.saturating_duration_since(last)),
    }
}

pub struct ScanController {
    handle: ScanHandle,
    scanner: Box<dyn Scanner>,
    clock: Box<dyn Clock>,
    settings: ScanSettings,
}

impl ScanController {
    pub fn new(
        handle: ScanHandle,
        scanner: Box<dyn Scanner>,
        clock: Box<dyn Clock>,
        settings: ScanSettings,
    ) -> Self {
        Self { handle, scanner, clock, settings }
    }

    pub fn handle(&self) -> ScanHandle {
        self.handle.clone()
    }

    /// run a cycle if one is due, otherwise do nothing
    pub async fn maybe_run_scan(&self, now: Instant) -> Option<ScanSummary> {
        let due = scan_due(&*self.handle.read().await, now, self.settings.interval);
        if !due {
            return None;
        }
        self.run_scan_cycle().await
    }

    /// one full scan → classify → record pass
    ///
    /// returns None without touching anything if a cycle is already running.
    pub async fn run_scan_cycle(&self) -> Option<ScanSummary> {
        {
            let mut state = self.handle.state.write().await;
            if state.scanning {
                warn!("[SCAN] cycle already in progress, skipping");
                return None;
            }
            state.scanning = true;
            state.scan_requested = false;
            state.snapshot.clear();
        }

        debug!("[SCAN] listening for {:?} via {}", self.settings.duration, self.scanner.name());
        let adverts = match self.scanner.scan(self.settings.duration).await {
            Ok(adverts) => adverts,
            Err(e) => {
                // a failed scan is recorded like an empty one
                warn!("[SCAN] ⚠ scanner error: {:#}", e);
                Vec::new()
            }
        };
        let timestamp = self.clock.timestamp();

        let mut state = self.handle.state.write().await;
        let mut dropped = 0usize;
        for adv in adverts {
            let peer = DiscoveredPeer::classify(adv, &self.settings.thresholds);
            if self.settings.show_devices {
                debug!(
                    "[PEER] {} {:<20} {:>4} dBm {}",
                    peer.address, peer.name, peer.rssi, peer.proximity_label
                );
            }
            if !state.snapshot.try_push(peer) {
                dropped += 1;
            }
        }
        if dropped > 0 {
            debug!("[SCAN] snapshot full, dropped {} peers", dropped);
        }

        let summary = ScanSummary {
            timestamp: timestamp.clone(),
            total: state.snapshot.len(),
            named: state.snapshot.named_count(),
        };
        state.history.push(summary.clone());
        state.last_scan_time = Some(timestamp);
        state.last_scan_at = Some(Instant::now());
        state.scanning = false;

        info!(
            "[SCAN] #{} at {}: {} devices ({} named)",
            state.history.total_scans(),
            summary.timestamp,
            summary.total,
            summary.named
        );
        Some(summary)
    }

    /// poll forever: scan when due, sleep until the next deadline or a
    /// manual request, whichever comes first
    pub async fn run(self) {
        info!(
            "[RUNTIME] Starting scan loop ({}s interval, {}s scans)",
            self.settings.interval.as_secs(),
            self.settings.duration.as_secs()
        );
        loop {
            self.maybe_run_scan(Instant::now()).await;

            let wait = {
                let state = self.handle.read().await;
                time_until_due(&state, Instant::now(), self.settings.interval)
            };
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = self.handle.wake.notified() => {
                    debug!("[SCAN] woken by manual request");
                }
            }
        }
    }
}
