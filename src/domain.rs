use std::collections::VecDeque;

use serde::Serialize;
use tokio::time::Instant;

use crate::proximity::{ProximityTier, Thresholds};

/// name reported for peers that do not advertise one
pub const UNKNOWN_NAME: &str = "Unknown";

/// `lastScanTime` value before the first completed cycle
pub const NEVER_SCANNED: &str = "Never";

/// one raw advertisement as handed over by a scanner backend
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Advertisement {
    /// radio hardware address (e.g. "AA:BB:CC:DD:EE:FF")
    pub address: String,
    /// advertised local name, if any
    pub name: Option<String>,
    /// received signal strength in dBm
    pub rssi: i32,
}

impl Advertisement {
    pub fn new(address: impl Into<String>, name: Option<&str>, rssi: i32) -> Self {
        Self {
            address: address.into(),
            name: name.map(str::to_string),
            rssi,
        }
    }
}

/// a classified peer from the most recent scan
///
/// field names on the wire match what the dashboard script reads.
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct DiscoveredPeer {
    #[serde(rename = "mac")]
    pub address: String,
    pub name: String,
    pub rssi: i32,
    #[serde(skip)]
    pub tier: ProximityTier,
    #[serde(rename = "proximityLabel")]
    pub proximity_label: &'static str,
    #[serde(rename = "colorClass")]
    pub color_class: &'static str,
}

impl DiscoveredPeer {
    pub fn classify(adv: Advertisement, thresholds: &Thresholds) -> Self {
        let tier = thresholds.classify(adv.rssi);
        Self {
            address: adv.address,
            name: adv
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            rssi: adv.rssi,
            tier,
            proximity_label: tier.label(),
            color_class: tier.color_class(),
        }
    }

    pub fn is_named(&self) -> bool {
        self.name != UNKNOWN_NAME
    }
}

/// one history row, written once per completed scan cycle
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct ScanSummary {
    pub timestamp: String,
    pub total: usize,
    pub named: usize,
}

// ==============================================================================
// snapshot store
// ==============================================================================
// bounded list of peers seen in the latest scan. first-N-wins: once full,
// later discoveries from the same scan are dropped, nothing is evicted.

#[derive(Clone, Debug)]
pub struct SnapshotStore {
    peers: Vec<DiscoveredPeer>,
    capacity: usize,
}

impl SnapshotStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            peers: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn clear(&mut self) {
        self.peers.clear();
    }

    /// append a peer; returns false (and drops it) when the store is full
    pub fn try_push(&mut self, peer: DiscoveredPeer) -> bool {
        if self.peers.len() >= self.capacity {
            return false;
        }
        self.peers.push(peer);
        true
    }

    pub fn peers(&self) -> &[DiscoveredPeer] {
        &self.peers
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn named_count(&self) -> usize {
        self.peers.iter().filter(|p| p.is_named()).count()
    }
}

// ==============================================================================
// history log
// ==============================================================================
// fixed-capacity ring of scan summaries. when full the oldest record is
// overwritten. total_scans keeps counting past the capacity.

#[derive(Clone, Debug)]
pub struct HistoryLog {
    records: VecDeque<ScanSummary>,
    capacity: usize,
    total_scans: u64,
}

impl HistoryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            total_scans: 0,
        }
    }

    pub fn push(&mut self, record: ScanSummary) {
        if self.capacity == 0 {
            self.total_scans += 1;
            return;
        }
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
        self.total_scans += 1;
    }

    /// records oldest to newest
    pub fn records(&self) -> impl Iterator<Item = &ScanSummary> {
        self.records.iter()
    }

    pub fn latest(&self) -> Option<&ScanSummary> {
        self.records.back()
    }

    /// always min(total_scans, capacity)
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_scans(&self) -> u64 {
        self.total_scans
    }
}

// ==============================================================================
// shared state
// ==============================================================================
// written only by the scan controller, read by the web handlers.
// lives behind Arc<RwLock<ScanState>> (see controller::ScanHandle).

#[derive(Debug)]
pub struct ScanState {
    pub snapshot: SnapshotStore,
    pub history: HistoryLog,
    /// true while a cycle is running; also the overlap guard
    pub scanning: bool,
    /// wall-clock time of the last completed cycle
    pub last_scan_time: Option<String>,
    /// monotonic time of the last completed cycle
    pub last_scan_at: Option<Instant>,
    /// set by a manual trigger, cleared when the cycle it asked for starts
    pub scan_requested: bool,
}

impl ScanState {
    pub fn new(max_devices: usize, max_history: usize) -> Self {
        Self {
            snapshot: SnapshotStore::new(max_devices),
            history: HistoryLog::new(max_history),
            scanning: false,
            last_scan_time: None,
            last_scan_at: None,
            scan_requested: false,
        }
    }

    pub fn last_scan_label(&self) -> &str {
        self.last_scan_time.as_deref().unwrap_or(NEVER_SCANNED)
    }
}

// ==============================================================================
// tests
// ==============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn peer(i: usize, name: Option<&str>) -> DiscoveredPeer {
        DiscoveredPeer::classify(
            Advertisement::new(format!("00:00:00:00:00:{:02X}", i), name, -70),
            &Thresholds::default(),
        )
    }

    fn summary(n: usize) -> ScanSummary {
        ScanSummary { timestamp: format!("scan-{}", n), total: n, named: 0 }
    }

    #[test]
    fn test_unnamed_peer_uses_sentinel() {
        let p = peer(1, None);
        assert_eq!(p.name, UNKNOWN_NAME);
        assert!(!p.is_named());

        // an empty advertised name is as good as none
        let p = peer(2, Some(""));
        assert_eq!(p.name, UNKNOWN_NAME);
    }

    #[test]
    fn test_peer_json_shape() {
        let p = DiscoveredPeer::classify(
            Advertisement::new("AA:BB:CC:DD:EE:FF", Some("Tag"), -50),
            &Thresholds::default(),
        );
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "mac": "AA:BB:CC:DD:EE:FF",
                "name": "Tag",
                "rssi": -50,
                "proximityLabel": "Present",
                "colorClass": "status-present",
            })
        );
    }

    #[test]
    fn test_snapshot_first_n_wins() {
        let mut store = SnapshotStore::new(3);
        for i in 0..5 {
            let accepted = store.try_push(peer(i, Some("x")));
            assert_eq!(accepted, i < 3);
        }
        assert_eq!(store.len(), 3);
        let kept: Vec<_> = store.peers().iter().map(|p| p.address.clone()).collect();
        assert_eq!(kept, vec!["00:00:00:00:00:00", "00:00:00:00:00:01", "00:00:00:00:00:02"]);
    }

    #[test]
    fn test_snapshot_named_count() {
        let mut store = SnapshotStore::new(10);
        store.try_push(peer(0, Some("a")));
        store.try_push(peer(1, None));
        store.try_push(peer(2, Some("b")));
        assert_eq!(store.named_count(), 2);
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.named_count(), 0);
    }

    #[test]
    fn test_history_wraps_in_insertion_order() {
        let mut log = HistoryLog::new(100);
        for n in 1..=101 {
            log.push(summary(n));
        }
        assert_eq!(log.len(), 100);
        assert_eq!(log.total_scans(), 101);
        let totals: Vec<usize> = log.records().map(|r| r.total).collect();
        assert_eq!(totals, (2..=101).collect::<Vec<_>>());
        assert_eq!(log.latest().map(|r| r.total), Some(101));
    }

    #[test]
    fn test_history_len_before_wrap() {
        let mut log = HistoryLog::new(4);
        assert!(log.is_empty());
        log.push(summary(1));
        log.push(summary(2));
        assert_eq!(log.len(), 2);
        assert_eq!(log.total_scans(), 2);
    }

    #[test]
    fn test_fresh_state_reports_never() {
        let state = ScanState::new(100, 100);
        assert_eq!(state.last_scan_label(), NEVER_SCANNED);
        assert!(state.snapshot.is_empty());
        assert!(!state.scanning);
    }
}
