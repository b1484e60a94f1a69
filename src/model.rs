//! Core telemetry types produced by ingestion.

use chrono::{DurationRound, NaiveDateTime, TimeDelta};
use serde::Serialize;
use std::fmt;

/// What a piece of equipment was doing when a reading was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationalState {
    Productive,
    Maintenance,
    Loss,
    Unregistered,
}

/// Outcome of mapping a raw `Grupo Operacion` label onto [`OperationalState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateLabel {
    Known(OperationalState),
    /// `AUXILIAR` rows count as productive time.
    Auxiliary,
    Unrecognized,
}

impl StateLabel {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "PRODUCTIVO" | "PRODUCTIVE" => Self::Known(OperationalState::Productive),
            "MANTENIMIENTO" | "MAINTENANCE" => Self::Known(OperationalState::Maintenance),
            "PERDIDA" | "PÉRDIDA" | "LOSS" => Self::Known(OperationalState::Loss),
            "NAO CADASTRADO" | "NÃO CADASTRADO" | "UNREGISTERED" => {
                Self::Known(OperationalState::Unregistered)
            }
            "AUXILIAR" | "AUXILIARY" => Self::Auxiliary,
            _ => Self::Unrecognized,
        }
    }

    /// The state a reading carrying this label is recorded under.
    pub fn state(self) -> OperationalState {
        match self {
            Self::Known(state) => state,
            Self::Auxiliary => OperationalState::Productive,
            Self::Unrecognized => OperationalState::Unregistered,
        }
    }
}

impl OperationalState {
    pub const ALL: [OperationalState; 4] = [
        Self::Productive,
        Self::Maintenance,
        Self::Loss,
        Self::Unregistered,
    ];

    /// Label as it appears in the source logs.
    pub fn label(self) -> &'static str {
        match self {
            Self::Productive => "PRODUCTIVO",
            Self::Maintenance => "MANTENIMIENTO",
            Self::Loss => "PERDIDA",
            Self::Unregistered => "NAO CADASTRADO",
        }
    }

    /// Anything that is neither productive nor maintenance counts as stopped.
    pub fn is_stopped(self) -> bool {
        !matches!(self, Self::Productive | Self::Maintenance)
    }

    /// States that mark a stop on a route.
    pub fn is_stop_marker(self) -> bool {
        matches!(self, Self::Loss | Self::Maintenance)
    }
}

impl fmt::Display for OperationalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// One telemetry row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub equipment: String,
    pub timestamp: NaiveDateTime,
    pub state: OperationalState,
    pub group: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub speed: Option<f64>,
    /// Seconds until the next reading of the same equipment; 0 for the last one.
    pub duration_secs: i64,
}

impl Reading {
    pub fn new(equipment: impl Into<String>, timestamp: NaiveDateTime, state: OperationalState) -> Self {
        Self {
            equipment: equipment.into(),
            timestamp,
            state,
            group: None,
            latitude: None,
            longitude: None,
            speed: None,
            duration_secs: 0,
        }
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    pub fn with_position(mut self, latitude: f64, longitude: f64, speed: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self.speed = Some(speed);
        self
    }

    pub fn with_duration(mut self, secs: i64) -> Self {
        self.duration_secs = secs;
        self
    }

    /// Timestamp floored to the hour.
    pub fn hour(&self) -> NaiveDateTime {
        floor_to_hour(self.timestamp)
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

pub fn floor_to_hour(ts: NaiveDateTime) -> NaiveDateTime {
    ts.duration_trunc(TimeDelta::hours(1)).unwrap_or(ts)
}

/// Row accounting gathered while parsing a log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub rows_read: usize,
    pub dropped_bad_timestamp: usize,
    pub dropped_malformed: usize,
    pub auxiliary_folded: usize,
    pub unrecognized_states: usize,
}

/// A parsed log: readings sorted by (equipment, timestamp) with durations filled in.
#[derive(Debug, Clone, Default)]
pub struct TelemetryLog {
    pub readings: Vec<Reading>,
    pub stats: IngestStats,
    /// Names of the route columns that were absent from the header.
    pub missing_geo_columns: Vec<String>,
}

impl TelemetryLog {
    pub fn has_geo_columns(&self) -> bool {
        self.missing_geo_columns.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_auxiliary_folds_into_productive() {
        assert_eq!(StateLabel::parse("AUXILIAR"), StateLabel::Auxiliary);
        assert_eq!(
            StateLabel::parse(" auxiliar ").state(),
            OperationalState::Productive
        );
    }

    #[test]
    fn test_known_labels() {
        assert_eq!(StateLabel::parse("PERDIDA").state(), OperationalState::Loss);
        assert_eq!(
            StateLabel::parse("Nao Cadastrado").state(),
            OperationalState::Unregistered
        );
        assert_eq!(
            StateLabel::parse("MANTENIMIENTO").state(),
            OperationalState::Maintenance
        );
    }

    #[test]
    fn test_unrecognized_counts_as_stopped() {
        let label = StateLabel::parse("TRASLADO");
        assert_eq!(label, StateLabel::Unrecognized);
        assert!(label.state().is_stopped());
    }

    #[test]
    fn test_stop_markers() {
        assert!(OperationalState::Loss.is_stop_marker());
        assert!(OperationalState::Maintenance.is_stop_marker());
        assert!(!OperationalState::Unregistered.is_stop_marker());
        assert!(!OperationalState::Productive.is_stop_marker());
    }

    #[test]
    fn test_hour_floor() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(14, 37, 12)
            .unwrap();
        let reading = Reading::new("E1", ts, OperationalState::Productive);
        assert_eq!(
            reading.hour(),
            NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(14, 0, 0)
                .unwrap()
        );
    }
}
