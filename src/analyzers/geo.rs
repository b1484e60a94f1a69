//! Route reconstruction from GPS readings.

use crate::analyzers::types::{EquipmentTrace, GeoPoint, LaborWindow};
use crate::analyzers::utility::haversine_km;
use crate::model::Reading;

/// Readings faster than this count as labor. Units are whatever the log records.
pub const LABOR_SPEED_THRESHOLD: f64 = 7.0;

fn is_labor(r: &Reading) -> bool {
    r.speed.is_some_and(|s| s > LABOR_SPEED_THRESHOLD)
}

/// Sum of great-circle distances between consecutive points, in kilometres.
pub fn path_distance_km(points: &[(f64, f64)]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_km(pair[0], pair[1]))
        .sum()
}

/// Builds the trace of a single equipment from its readings in time order.
///
/// Readings without both coordinates are skipped. `labor` is `None` when no
/// reading exceeds [`LABOR_SPEED_THRESHOLD`].
pub fn trace_equipment(equipment: &str, readings: &[&Reading]) -> EquipmentTrace {
    let located: Vec<&Reading> = readings
        .iter()
        .copied()
        .filter(|r| r.coordinates().is_some())
        .collect();

    let route: Vec<GeoPoint> = located
        .iter()
        .filter_map(|r| {
            let (latitude, longitude) = r.coordinates()?;
            Some(GeoPoint {
                timestamp: r.timestamp,
                latitude,
                longitude,
                speed: r.speed,
                state: r.state,
            })
        })
        .collect();

    let stop_count = located.iter().filter(|r| r.state.is_stop_marker()).count();

    let labor_readings: Vec<&Reading> = located.iter().copied().filter(|r| is_labor(r)).collect();
    let labor = match (labor_readings.first(), labor_readings.last()) {
        (Some(first), Some(last)) => {
            let points: Vec<(f64, f64)> = labor_readings
                .iter()
                .filter_map(|r| r.coordinates())
                .collect();
            Some(LaborWindow {
                start: first.timestamp,
                end: last.timestamp,
                duration_secs: (last.timestamp - first.timestamp).num_seconds(),
                distance_km: path_distance_km(&points),
                readings: labor_readings.len(),
            })
        }
        _ => None,
    };

    EquipmentTrace {
        equipment: equipment.to_string(),
        start: route.first().cloned(),
        end: route.last().cloned(),
        route,
        stop_count,
        labor,
    }
}

/// Traces every equipment present in `readings`, which must already be
/// sorted by (equipment, timestamp) as ingestion leaves them.
pub fn trace_all(readings: &[Reading]) -> Vec<EquipmentTrace> {
    readings
        .chunk_by(|a, b| a.equipment == b.equipment)
        .map(|run| {
            let refs: Vec<&Reading> = run.iter().collect();
            trace_equipment(&run[0].equipment, &refs)
        })
        .collect()
}
