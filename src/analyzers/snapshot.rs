use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::analyzers::types::StateCount;
use crate::model::{OperationalState, Reading};

/// Distinct equipment per state, judged by each equipment's last reading
/// inside the hour starting at `hour`. Empty when nothing was recorded then.
pub fn last_state_counts(readings: &[Reading], hour: NaiveDateTime) -> Vec<StateCount> {
    let mut last: BTreeMap<&str, &Reading> = BTreeMap::new();
    for r in readings.iter().filter(|r| r.hour() == hour) {
        last.entry(r.equipment.as_str())
            .and_modify(|cur| {
                if r.timestamp >= cur.timestamp {
                    *cur = r;
                }
            })
            .or_insert(r);
    }

    let mut per_state: BTreeMap<OperationalState, BTreeSet<&str>> = BTreeMap::new();
    for (equipment, r) in last {
        per_state.entry(r.state).or_default().insert(equipment);
    }

    per_state
        .into_iter()
        .map(|(state, equipment)| StateCount {
            state,
            equipment: equipment.len(),
        })
        .collect()
}

/// Distinct hours of the day that appear in the log, sorted.
pub fn available_hours(readings: &[Reading]) -> Vec<NaiveTime> {
    readings
        .iter()
        .map(|r| r.hour().time())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Earliest date in the log.
pub fn first_date(readings: &[Reading]) -> Option<NaiveDate> {
    readings.iter().map(|r| r.timestamp.date()).min()
}
