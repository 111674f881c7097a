//! ==============================================================================
//! clock.rs - wall clock for scan timestamps
//! ==============================================================================
//!
//! purpose:
//!     formats "now" in the configured utc offset for history records.
//!     a board without an rtc boots near the unix epoch and only gets real
//!     time once ntp lands; until then we hand out a sentinel instead.
//!
//! relationships:
//!     - used by: controller.rs (timestamp for each ScanSummary)
//!     - configured by: config.rs ([clock] section)
//!
//! ==============================================================================

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};

/// timestamp reported while the clock is not synchronized
pub const TIME_ERROR: &str = "Time Error";

/// default display format, e.g. "2025-01-31 14:05:09"
pub const DEFAULT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// anything earlier is treated as "never synced" (2021-01-01T00:00:00Z)
const SYNC_FLOOR_SECS: i64 = 1_609_459_200;

pub trait Clock: Send + Sync {
    /// current local time, or None if the clock is not synchronized
    fn now(&self) -> Option<DateTime<FixedOffset>>;

    /// format string used by `timestamp`
    fn format(&self) -> &str {
        DEFAULT_FORMAT
    }

    /// human readable "now", falling back to TIME_ERROR
    fn timestamp(&self) -> String {
        let Some(t) = self.now() else {
            return TIME_ERROR.to_string();
        };
        let mut out = String::new();
        match write!(out, "{}", t.format(self.format())) {
            Ok(()) => out,
            Err(_) => TIME_ERROR.to_string(),
        }
    }
}

/// true if every strftime specifier in `fmt` is one chrono knows
pub fn format_is_valid(fmt: &str) -> bool {
    !StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error))
}

/// system clock shifted into a fixed utc offset
pub struct WallClock {
    offset: FixedOffset,
    format: String,
}

impl WallClock {
    pub fn new(utc_offset_seconds: i32, format: impl Into<String>) -> anyhow::Result<Self> {
        let offset = FixedOffset::east_opt(utc_offset_seconds)
            .ok_or_else(|| anyhow::anyhow!("utc offset out of range: {}s", utc_offset_seconds))?;
        let format = format.into();
        if !format_is_valid(&format) {
            anyhow::bail!("invalid time format: {:?}", format);
        }
        Ok(Self { offset, format })
    }
}

impl Clock for WallClock {
    fn now(&self) -> Option<DateTime<FixedOffset>> {
        synced(Utc::now()).map(|t| t.with_timezone(&self.offset))
    }

    fn format(&self) -> &str {
        &self.format
    }
}

fn synced(t: DateTime<Utc>) -> Option<DateTime<Utc>> {
    (t.timestamp() >= SYNC_FLOOR_SECS).then_some(t)
}

/// clock pinned to one instant (or to "unsynced"), for tests and demos
pub struct FixedClock(pub Option<DateTime<FixedOffset>>);

impl FixedClock {
    pub fn at(utc_offset_seconds: i32, unix_secs: i64) -> Self {
        let t = FixedOffset::east_opt(utc_offset_seconds)
            .and_then(|tz| tz.timestamp_opt(unix_secs, 0).single());
        Self(t)
    }

    pub fn unsynced() -> Self {
        Self(None)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Option<DateTime<FixedOffset>> {
        self.0
    }
}
