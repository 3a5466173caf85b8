use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scan profile attached to an OOI. Level 0 means the object is never probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanProfile {
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ooi {
    pub primary_key: String,
    pub object_type: String,
    pub scan_profile: Option<ScanProfile>,
    /// Last time the inventory confirmed this object still exists; drives
    /// the stale-object reschedule path.
    pub checked_at: Option<DateTime<Utc>>,
}

impl Ooi {
    /// An OOI is probeable only when it has a scan profile above level 0.
    pub fn scan_level(&self) -> u8 {
        self.scan_profile.map(|p| p.level).unwrap_or(0)
    }
}
