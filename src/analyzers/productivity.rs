use std::collections::BTreeMap;

use crate::analyzers::types::{EquipmentSummary, ProductivityTier};
use crate::analyzers::utility::{hours, pct};
use crate::model::{OperationalState, Reading};

#[derive(Default)]
struct Totals {
    total: i64,
    productive: i64,
    maintenance: i64,
    stopped: i64,
}

/// Sums each equipment's reading durations by state and derives its
/// percentages and tier.
///
/// Output is ordered by equipment id. Equipment whose total time is zero
/// reports 0% everywhere.
pub fn summarize_equipment(readings: &[Reading]) -> Vec<EquipmentSummary> {
    let mut per_equipment: BTreeMap<&str, Totals> = BTreeMap::new();

    for r in readings {
        let t = per_equipment.entry(r.equipment.as_str()).or_default();
        t.total += r.duration_secs;
        match r.state {
            OperationalState::Productive => t.productive += r.duration_secs,
            OperationalState::Maintenance => t.maintenance += r.duration_secs,
            s if s.is_stopped() => t.stopped += r.duration_secs,
            _ => {}
        }
    }

    per_equipment
        .into_iter()
        .map(|(equipment, t)| {
            let productive_pct = pct(t.productive, t.total);
            EquipmentSummary {
                equipment: equipment.to_string(),
                total_secs: t.total,
                productive_secs: t.productive,
                maintenance_secs: t.maintenance,
                stopped_secs: t.stopped,
                total_hours: hours(t.total),
                productive_hours: hours(t.productive),
                productive_pct,
                maintenance_pct: pct(t.maintenance, t.total),
                stopped_pct: pct(t.stopped, t.total),
                tier: ProductivityTier::from_pct(productive_pct),
            }
        })
        .collect()
}
