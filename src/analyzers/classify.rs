use std::collections::BTreeMap;

use crate::analyzers::types::{
    EquipmentSummary, GroupTierShare, HistogramBin, ProductivityTier, TierCount,
};
use crate::analyzers::utility::pct;
use crate::model::{OperationalState, Reading};

pub const LOW_UPPER_PCT: f64 = 60.0;
pub const MEDIUM_UPPER_PCT: f64 = 80.0;

const HISTOGRAM_BINS: usize = 10;

/// Buckets a productive-time percentage (0–100).
///
/// | Range          | Tier   |
/// |----------------|--------|
/// | <= 60          | Low    |
/// | > 60, <= 80    | Medium |
/// | > 80           | High   |
impl ProductivityTier {
    pub fn from_pct(p: f64) -> Self {
        match p {
            p if p <= LOW_UPPER_PCT => Self::Low,
            p if p <= MEDIUM_UPPER_PCT => Self::Medium,
            _ => Self::High,
        }
    }
}

/// Number of equipment per tier, always listing all three tiers.
pub fn tier_counts(summaries: &[EquipmentSummary]) -> Vec<TierCount> {
    let total = summaries.len() as i64;
    ProductivityTier::ALL
        .iter()
        .map(|&tier| {
            let count = summaries.iter().filter(|s| s.tier == tier).count();
            TierCount {
                tier,
                count,
                share_pct: pct(count as i64, total),
            }
        })
        .collect()
}

/// Splits each equipment group's productive time by the tier of the
/// equipment that produced it.
///
/// Readings without a group are left out. Every group lists all three tiers.
pub fn group_tier_breakdown(
    readings: &[Reading],
    summaries: &[EquipmentSummary],
) -> Vec<GroupTierShare> {
    let tiers: BTreeMap<&str, ProductivityTier> = summaries
        .iter()
        .map(|s| (s.equipment.as_str(), s.tier))
        .collect();

    let mut per_group: BTreeMap<&str, BTreeMap<ProductivityTier, i64>> = BTreeMap::new();
    for r in readings {
        let (Some(group), Some(tier)) = (r.group.as_deref(), tiers.get(r.equipment.as_str()))
        else {
            continue;
        };
        let secs = if r.state == OperationalState::Productive {
            r.duration_secs
        } else {
            0
        };
        *per_group.entry(group).or_default().entry(*tier).or_default() += secs;
    }

    let mut out = Vec::new();
    for (group, by_tier) in per_group {
        let group_total: i64 = by_tier.values().sum();
        for tier in ProductivityTier::ALL {
            let productive_secs = by_tier.get(&tier).copied().unwrap_or(0);
            out.push(GroupTierShare {
                group: group.to_string(),
                tier,
                productive_secs,
                share_pct: pct(productive_secs, group_total),
            });
        }
    }
    out
}

/// Distribution of productive percentages in ten bins of width 10.
/// The last bin includes 100.
pub fn productivity_histogram(summaries: &[EquipmentSummary]) -> Vec<HistogramBin> {
    let width = 100.0 / HISTOGRAM_BINS as f64;
    let mut counts = [0usize; HISTOGRAM_BINS];

    for s in summaries {
        let idx = ((s.productive_pct / width).floor() as usize).min(HISTOGRAM_BINS - 1);
        counts[idx] += 1;
    }

    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| HistogramBin {
            lower: i as f64 * width,
            upper: (i + 1) as f64 * width,
            count,
        })
        .collect()
}
