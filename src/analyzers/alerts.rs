//! Inactivity alerts.
//!
//! Combined inactivity is maintenance% plus stopped%. Only equipment above
//! [`ALERT_THRESHOLD_PCT`] is reported.

use crate::analyzers::types::{AlertGroup, AlertRecord, AlertSeverity, EquipmentSummary};
use crate::analyzers::utility::hours;

pub const ALERT_THRESHOLD_PCT: f64 = 60.0;
pub const CRITICAL_THRESHOLD_PCT: f64 = 80.0;

impl AlertSeverity {
    /// Picks the single highest-priority severity. Callers filter on the
    /// alert threshold; below it this still answers `High`.
    pub fn classify(maintenance_pct: f64, stopped_pct: f64) -> Self {
        let combined = maintenance_pct + stopped_pct;
        if maintenance_pct == 100.0 {
            Self::FullMaintenance
        } else if stopped_pct == 100.0 {
            Self::FullStop
        } else if combined >= CRITICAL_THRESHOLD_PCT {
            Self::Critical
        } else {
            Self::High
        }
    }
}

/// Alerts for every equipment whose combined inactivity exceeds 60%,
/// most inactive first.
pub fn evaluate_alerts(summaries: &[EquipmentSummary]) -> Vec<AlertRecord> {
    let mut alerts: Vec<AlertRecord> = summaries
        .iter()
        .filter(|s| s.inactivity_pct() > ALERT_THRESHOLD_PCT)
        .map(|s| AlertRecord {
            equipment: s.equipment.clone(),
            total_hours: s.total_hours,
            maintenance_hours: hours(s.maintenance_secs),
            stopped_hours: hours(s.stopped_secs),
            maintenance_pct: s.maintenance_pct,
            stopped_pct: s.stopped_pct,
            inactivity_pct: s.inactivity_pct(),
            severity: AlertSeverity::classify(s.maintenance_pct, s.stopped_pct),
        })
        .collect();

    alerts.sort_by(|a, b| {
        b.inactivity_pct
            .total_cmp(&a.inactivity_pct)
            .then_with(|| a.equipment.cmp(&b.equipment))
    });
    alerts
}

/// Collects alerted equipment under their severity, in priority order.
/// Severities with no equipment are omitted.
pub fn group_alerts(alerts: &[AlertRecord]) -> Vec<AlertGroup> {
    AlertSeverity::ALL
        .iter()
        .filter_map(|&severity| {
            let mut equipment: Vec<String> = alerts
                .iter()
                .filter(|a| a.severity == severity)
                .map(|a| a.equipment.clone())
                .collect();
            if equipment.is_empty() {
                return None;
            }
            equipment.sort();
            Some(AlertGroup {
                severity,
                equipment,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::productivity::summarize_equipment;
    use crate::model::{OperationalState, Reading};
    use chrono::NaiveDate;

    fn reading(eq: &str, state: OperationalState, secs: i64) -> Reading {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        Reading::new(eq, ts, state).with_duration(secs)
    }

    #[test]
    fn test_severity_priority() {
        assert_eq!(
            AlertSeverity::classify(100.0, 0.0),
            AlertSeverity::FullMaintenance
        );
        assert_eq!(AlertSeverity::classify(0.0, 100.0), AlertSeverity::FullStop);
        assert_eq!(AlertSeverity::classify(40.0, 40.0), AlertSeverity::Critical);
        assert_eq!(AlertSeverity::classify(30.0, 35.0), AlertSeverity::High);
    }

    #[test]
    fn test_exactly_sixty_is_not_reported() {
        let readings = vec![
            reading("E1", OperationalState::Productive, 400),
            reading("E1", OperationalState::Loss, 600),
        ];
        let alerts = evaluate_alerts(&summarize_equipment(&readings));
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_just_above_sixty_is_high() {
        let readings = vec![
            reading("E1", OperationalState::Productive, 399),
            reading("E1", OperationalState::Loss, 601),
        ];
        let alerts = evaluate_alerts(&summarize_equipment(&readings));

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
    }

    #[test]
    fn test_full_maintenance_and_full_stop() {
        let readings = vec![
            reading("M", OperationalState::Maintenance, 3600),
            reading("S", OperationalState::Loss, 1800),
            reading("S", OperationalState::Unregistered, 1800),
            reading("C", OperationalState::Maintenance, 500),
            reading("C", OperationalState::Loss, 400),
            reading("C", OperationalState::Productive, 100),
        ];
        let alerts = evaluate_alerts(&summarize_equipment(&readings));
        let severity = |eq: &str| alerts.iter().find(|a| a.equipment == eq).unwrap().severity;

        assert_eq!(severity("M"), AlertSeverity::FullMaintenance);
        assert_eq!(severity("S"), AlertSeverity::FullStop);
        assert_eq!(severity("C"), AlertSeverity::Critical);
        assert_eq!(alerts.last().unwrap().equipment, "C");
    }

    #[test]
    fn test_group_alerts_in_priority_order() {
        let readings = vec![
            reading("B", OperationalState::Loss, 100),
            reading("A", OperationalState::Loss, 100),
            reading("M", OperationalState::Maintenance, 100),
            reading("H", OperationalState::Loss, 70),
            reading("H", OperationalState::Productive, 30),
        ];
        let groups = group_alerts(&evaluate_alerts(&summarize_equipment(&readings)));

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].severity, AlertSeverity::FullMaintenance);
        assert_eq!(groups[1].severity, AlertSeverity::FullStop);
        assert_eq!(groups[1].equipment, vec!["A", "B"]);
        assert_eq!(groups[2].severity, AlertSeverity::High);
    }
}
