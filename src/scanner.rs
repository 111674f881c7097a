//! ==============================================================================
//! scanner.rs - radio scan abstraction
//! ==============================================================================
//!
//! purpose:
//!     provides a single interface for "listen for N seconds, tell me who is
//!     around". abstracts away the difference between running with a real
//!     bluetooth adapter (btleplug) and a development machine (simulated).
//!
//! design:
//!     - without feature="hardware": SimulatedScanner, a fixed roster whose
//!       signal drifts a little on every scan.
//!     - with feature="hardware": BleScanner, a btleplug central that only
//!       reports peripherals heard during the current scan window.
//!
//! relationships:
//!     - used by: controller.rs (one call per scan cycle)
//!     - produces: domain::Advertisement
//!
//! ==============================================================================

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::Advertisement;

#[async_trait]
pub trait Scanner: Send + Sync {
    /// scan for `duration` and return peers in discovery order
    async fn scan(&self, duration: Duration) -> Result<Vec<Advertisement>>;

    /// short backend name for logs
    fn name(&self) -> &'static str;
}

/// pick the backend this build was compiled for
pub async fn default_scanner() -> Result<Box<dyn Scanner>> {
    #[cfg(feature = "hardware")]
    {
        Ok(Box::new(BleScanner::new().await?))
    }
    #[cfg(not(feature = "hardware"))]
    {
        Ok(Box::new(SimulatedScanner::new()))
    }
}

// ==============================================================================================
// SIMULATED IMPLEMENTATION (For dev machines / CI)
// ==============================================================================================

const ROSTER: &[(&str, Option<&str>, i32)] = &[
    ("C8:2B:96:1A:04:7E", Some("Pixel 7"), -48),
    ("F4:5C:89:B2:11:03", Some("Galaxy Buds2"), -58),
    ("D0:03:4B:2E:9A:51", None, -62),
    ("A4:C1:38:6F:20:DD", Some("LYWSD03MMC"), -71),
    ("E2:17:5F:C0:88:42", None, -76),
    ("7C:D1:C3:4A:E5:19", Some("Mi Band 6"), -83),
    ("5A:9E:02:77:B3:6C", None, -89),
    ("3F:62:A8:D9:0B:E7", None, -95),
];

pub struct SimulatedScanner {
    scans: AtomicU32,
}

impl SimulatedScanner {
    pub fn new() -> Self {
        tracing::info!("Using SIMULATED scanner (no radio access)");
        Self { scans: AtomicU32::new(0) }
    }
}

impl Default for SimulatedScanner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scanner for SimulatedScanner {
    async fn scan(&self, duration: Duration) -> Result<Vec<Advertisement>> {
        tokio::time::sleep(duration).await;
        let n = self.scans.fetch_add(1, Ordering::Relaxed) as i32;

        let peers = ROSTER
            .iter()
            .enumerate()
            // every third roster entry only shows up on alternate scans
            .filter(|(i, _)| i % 3 != 2 || n % 2 == 0)
            .map(|(i, (addr, name, base))| {
                let drift = (n * 7 + i as i32 * 13) % 11 - 5;
                Advertisement::new(*addr, *name, base + drift)
            })
            .collect::<Vec<_>>();

        tracing::debug!("[SIM SCAN] #{} produced {} peers", n, peers.len());
        Ok(peers)
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

// ==============================================================================================
// REAL IMPLEMENTATION (btleplug, requires a bluetooth adapter)
// ==============================================================================================

#[cfg(feature = "hardware")]
pub use ble::BleScanner;

#[cfg(feature = "hardware")]
mod ble {
    use super::*;

    use std::collections::HashSet;

    use anyhow::{anyhow, Context};
    use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
    use btleplug::platform::{Adapter, Manager, PeripheralId};
    use futures::StreamExt;

    pub struct BleScanner {
        adapter: Adapter,
    }

    impl BleScanner {
        pub async fn new() -> Result<Self> {
            let manager = Manager::new().await.context("failed to start bluetooth manager")?;
            let adapter = manager
                .adapters()
                .await
                .context("failed to list bluetooth adapters")?
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("no bluetooth adapter found"))?;
            let info = adapter.adapter_info().await.unwrap_or_default();
            tracing::info!("Using REAL BLE scanner ({})", info);
            Ok(Self { adapter })
        }
    }

    #[async_trait]
    impl Scanner for BleScanner {
        async fn scan(&self, duration: Duration) -> Result<Vec<Advertisement>> {
            let mut events = self.adapter.events().await?;
            self.adapter.start_scan(ScanFilter::default()).await?;

            // only peripherals heard in this window count; btleplug's own
            // cache still holds everything from earlier scans
            let mut seen = HashSet::new();
            let mut order: Vec<PeripheralId> = Vec::new();
            let window = async {
                while let Some(event) = events.next().await {
                    match event {
                        CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => {
                            if seen.insert(id.clone()) {
                                order.push(id);
                            }
                        }
                        _ => {}
                    }
                }
            };
            let _ = tokio::time::timeout(duration, window).await;

            self.adapter.stop_scan().await?;

            let mut out = Vec::with_capacity(order.len());
            for id in order {
                let props = match self.adapter.peripheral(&id).await {
                    Ok(p) => p.properties().await.ok().flatten(),
                    Err(e) => {
                        tracing::debug!("[BLE] peripheral {:?} vanished: {}", id, e);
                        None
                    }
                };
                // no rssi means we never actually heard an advertisement
                if let Some(props) = props {
                    if let Some(rssi) = props.rssi {
                        out.push(Advertisement {
                            address: props.address.to_string(),
                            name: props.local_name,
                            rssi: rssi as i32,
                        });
                    }
                }
            }
            Ok(out)
        }

        fn name(&self) -> &'static str {
            "ble"
        }
    }
}

// ==============================================================================
// tests
// ==============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulated_scan_alternates_roster() {
        let scanner = SimulatedScanner::new();
        let first = scanner.scan(Duration::ZERO).await.unwrap();
        let second = scanner.scan(Duration::ZERO).await.unwrap();
        assert_eq!(first.len(), ROSTER.len());
        assert!(second.len() < first.len());
    }

    #[tokio::test]
    async fn test_simulated_drift_stays_close() {
        let scanner = SimulatedScanner::new();
        for _ in 0..5 {
            for adv in scanner.scan(Duration::ZERO).await.unwrap() {
                let (_, _, base) = ROSTER.iter().find(|(a, _, _)| *a == adv.address).unwrap();
                assert!((adv.rssi - base).abs() <= 5, "{} drifted to {}", adv.address, adv.rssi);
            }
        }
    }
}
