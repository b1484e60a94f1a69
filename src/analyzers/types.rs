//! Data types produced by the analyzers.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

use crate::model::OperationalState;

/// Productivity bucket for an equipment's productive-time percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ProductivityTier {
    Low,
    Medium,
    High,
}

impl ProductivityTier {
    pub const ALL: [ProductivityTier; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for ProductivityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Time accounting for one equipment over the whole log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentSummary {
    pub equipment: String,
    pub total_secs: i64,
    pub productive_secs: i64,
    pub maintenance_secs: i64,
    pub stopped_secs: i64,
    pub total_hours: f64,
    pub productive_hours: f64,
    pub productive_pct: f64,
    pub maintenance_pct: f64,
    pub stopped_pct: f64,
    pub tier: ProductivityTier,
}

impl EquipmentSummary {
    /// Maintenance plus stopped share of total time.
    pub fn inactivity_pct(&self) -> f64 {
        self.maintenance_pct + self.stopped_pct
    }
}

/// Seconds spent in one state during one hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyBucket {
    pub hour: NaiveDateTime,
    pub state: OperationalState,
    pub secs: i64,
}

/// Productive share of the time recorded in one hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyProductivity {
    pub hour: NaiveDateTime,
    pub productive_secs: i64,
    pub total_secs: i64,
    pub productive_pct: f64,
}

/// Why an equipment was flagged, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    FullMaintenance,
    FullStop,
    Critical,
    High,
}

impl AlertSeverity {
    pub const ALL: [AlertSeverity; 4] = [
        Self::FullMaintenance,
        Self::FullStop,
        Self::Critical,
        Self::High,
    ];

    pub fn comment(self) -> &'static str {
        match self {
            Self::FullMaintenance => "100% maintenance",
            Self::FullStop => "100% stopped",
            Self::Critical => "critical inactivity (>=80%)",
            Self::High => "high inactivity (>60%)",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.comment())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRecord {
    pub equipment: String,
    pub total_hours: f64,
    pub maintenance_hours: f64,
    pub stopped_hours: f64,
    pub maintenance_pct: f64,
    pub stopped_pct: f64,
    pub inactivity_pct: f64,
    pub severity: AlertSeverity,
}

/// Equipment sharing the same alert severity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertGroup {
    pub severity: AlertSeverity,
    pub equipment: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierCount {
    pub tier: ProductivityTier,
    pub count: usize,
    pub share_pct: f64,
}

/// Productive time of one tier inside one equipment group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTierShare {
    pub group: String,
    pub tier: ProductivityTier,
    pub productive_secs: i64,
    pub share_pct: f64,
}

/// Distinct equipment whose last reading in an hour was in `state`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateCount {
    pub state: OperationalState,
    pub equipment: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPoint {
    pub timestamp: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: Option<f64>,
    pub state: OperationalState,
}

/// Span between the first and last reading above the labor speed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaborWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration_secs: i64,
    pub distance_km: f64,
    pub readings: usize,
}

/// Reconstructed route of one equipment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentTrace {
    pub equipment: String,
    pub route: Vec<GeoPoint>,
    pub start: Option<GeoPoint>,
    pub end: Option<GeoPoint>,
    pub stop_count: usize,
    pub labor: Option<LaborWindow>,
}
