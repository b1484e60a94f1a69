use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::analyzers::types::{HourlyBucket, HourlyProductivity};
use crate::analyzers::utility::pct;
use crate::model::{OperationalState, Reading};

/// Seconds per (hour, state), in chronological then state order.
pub fn hourly_buckets(readings: &[Reading]) -> Vec<HourlyBucket> {
    let mut buckets: BTreeMap<(NaiveDateTime, OperationalState), i64> = BTreeMap::new();
    for r in readings {
        *buckets.entry((r.hour(), r.state)).or_default() += r.duration_secs;
    }

    buckets
        .into_iter()
        .map(|((hour, state), secs)| HourlyBucket { hour, state, secs })
        .collect()
}

/// Productive share per hour. Hours with no productive time report 0%.
pub fn hourly_productivity(readings: &[Reading]) -> Vec<HourlyProductivity> {
    let mut per_hour: BTreeMap<NaiveDateTime, (i64, i64)> = BTreeMap::new();
    for b in hourly_buckets(readings) {
        let (productive, total) = per_hour.entry(b.hour).or_default();
        *total += b.secs;
        if b.state == OperationalState::Productive {
            *productive += b.secs;
        }
    }

    per_hour
        .into_iter()
        .map(|(hour, (productive_secs, total_secs))| HourlyProductivity {
            hour,
            productive_secs,
            total_secs,
            productive_pct: pct(productive_secs, total_secs),
        })
        .collect()
}
