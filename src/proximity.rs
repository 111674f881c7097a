//! ==============================================================================
//! proximity.rs - signal strength to proximity tier
//! ==============================================================================
//!
//! purpose:
//!     turns a raw rssi reading (dBm) into one of three coarse tiers.
//!     the dashboard colours each device card by the tier's css class.
//!
//! relationships:
//!     - used by: controller.rs (tags every peer as the snapshot is rebuilt)
//!     - configured by: config.rs ([proximity] section)
//!
//! ==============================================================================

/// default cut-off above which a peer counts as present
pub const DEFAULT_PRESENT_ABOVE_DBM: i32 = -65;

/// default cut-off at or below which a peer counts as far
pub const DEFAULT_FAR_AT_OR_BELOW_DBM: i32 = -85;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProximityTier {
    Present,
    InProximity,
    Far,
}

impl ProximityTier {
    /// human readable label shown in the device badge
    pub fn label(self) -> &'static str {
        match self {
            ProximityTier::Present => "Present",
            ProximityTier::InProximity => "In Proximity",
            ProximityTier::Far => "Far / Weak",
        }
    }

    /// css class the dashboard uses for the card border
    pub fn color_class(self) -> &'static str {
        match self {
            ProximityTier::Present => "status-present",
            ProximityTier::InProximity => "status-proximity",
            ProximityTier::Far => "status-far",
        }
    }
}

/// tier boundaries in dBm
///
/// `present_above_dbm` is exclusive, `far_at_or_below_dbm` is inclusive,
/// everything in between is InProximity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub present_above_dbm: i32,
    pub far_at_or_below_dbm: i32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            present_above_dbm: DEFAULT_PRESENT_ABOVE_DBM,
            far_at_or_below_dbm: DEFAULT_FAR_AT_OR_BELOW_DBM,
        }
    }
}

impl Thresholds {
    pub fn classify(&self, rssi: i32) -> ProximityTier {
        if rssi > self.present_above_dbm {
            ProximityTier::Present
        } else if rssi > self.far_at_or_below_dbm {
            ProximityTier::InProximity
        } else {
            ProximityTier::Far
        }
    }
}

/// classify with the stock thresholds (-65 / -85)
pub fn classify(rssi: i32) -> ProximityTier {
    Thresholds::default().classify(rssi)
}

// ==============================================================================
// tests
// ==============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(classify(-64), ProximityTier::Present);
        assert_eq!(classify(-65), ProximityTier::InProximity);
        assert_eq!(classify(-84), ProximityTier::InProximity);
        assert_eq!(classify(-85), ProximityTier::Far);
    }

    #[test]
    fn test_total_over_extremes() {
        assert_eq!(classify(i32::MAX), ProximityTier::Present);
        assert_eq!(classify(0), ProximityTier::Present);
        assert_eq!(classify(-100), ProximityTier::Far);
        assert_eq!(classify(i32::MIN), ProximityTier::Far);
    }

    #[test]
    fn test_tags_pair_with_tier() {
        assert_eq!(classify(-40).color_class(), "status-present");
        assert_eq!(classify(-70).color_class(), "status-proximity");
        assert_eq!(classify(-90).color_class(), "status-far");
        assert_eq!(classify(-70).label(), "In Proximity");
        assert_eq!(classify(-90).label(), "Far / Weak");
    }

    #[test]
    fn test_custom_thresholds() {
        let t = Thresholds { present_above_dbm: -50, far_at_or_below_dbm: -70 };
        assert_eq!(t.classify(-49), ProximityTier::Present);
        assert_eq!(t.classify(-50), ProximityTier::InProximity);
        assert_eq!(t.classify(-70), ProximityTier::Far);
        // same reading lands differently under the stock cut-offs
        assert_eq!(classify(-60), ProximityTier::Present);
        assert_eq!(t.classify(-60), ProximityTier::InProximity);
    }
}
