//! Render models returned by the dashboard handlers.
//!
//! Each view is plain data: it serializes to JSON for other front ends and
//! implements [`fmt::Display`] for the terminal.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::analyzers::types::{
    AlertGroup, AlertRecord, EquipmentSummary, EquipmentTrace, GroupTierShare, HistogramBin,
    HourlyProductivity, StateCount, TierCount,
};
use crate::cache::ContentKey;
use crate::model::{IngestStats, Reading};

/// Equipment-group selection applied before aggregating.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GroupFilter {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl GroupFilter {
    /// An empty selection means every group.
    pub fn from_selection<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let selected: BTreeSet<String> = groups
            .into_iter()
            .map(|g| {
                let g: String = g.into();
                g.trim().to_string()
            })
            .filter(|g| !g.is_empty())
            .collect();
        if selected.is_empty() {
            Self::All
        } else {
            Self::Only(selected)
        }
    }

    pub fn matches(&self, reading: &Reading) -> bool {
        match self {
            Self::All => true,
            Self::Only(groups) => reading
                .group
                .as_ref()
                .is_some_and(|g| groups.contains(g)),
        }
    }

    /// Selected group names; empty for [`GroupFilter::All`].
    pub fn labels(&self) -> Vec<String> {
        match self {
            Self::All => Vec::new(),
            Self::Only(groups) => groups.iter().cloned().collect(),
        }
    }
}

impl fmt::Display for GroupFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all groups"),
            Self::Only(groups) => {
                let names: Vec<&str> = groups.iter().map(String::as_str).collect();
                f.write_str(&names.join(", "))
            }
        }
    }
}

/// User-facing warning or information attached to a view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    NoReadings,
    NoDataForHour { hour: NaiveDateTime },
    NoAlerts,
    NoLaborReadings { equipment: String },
    UnknownEquipment { equipment: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoReadings => write!(f, "No readings match the current selection"),
            Self::NoDataForHour { hour } => {
                write!(f, "No data for the selected date and hour: {hour}")
            }
            Self::NoAlerts => write!(f, "No equipment with critical inactivity detected"),
            Self::NoLaborReadings { equipment } => write!(
                f,
                "{equipment}: no readings above labor speed, start/end/distance withheld"
            ),
            Self::UnknownEquipment { equipment } => {
                write!(f, "No route readings for equipment {equipment}")
            }
        }
    }
}

fn write_notices(f: &mut fmt::Formatter<'_>, notices: &[Notice]) -> fmt::Result {
    for n in notices {
        writeln!(f, "! {n}")?;
    }
    Ok(())
}

/// What a freshly loaded log contains.
#[derive(Debug, Clone, Serialize)]
pub struct LogOverview {
    pub key: ContentKey,
    pub readings: usize,
    pub equipment: usize,
    pub groups: Vec<String>,
    pub first_reading: Option<NaiveDateTime>,
    pub last_reading: Option<NaiveDateTime>,
    pub has_route_columns: bool,
    pub stats: IngestStats,
}

impl fmt::Display for LogOverview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Log {}", self.key)?;
        writeln!(
            f,
            "  readings: {} ({} rows read, {} bad timestamps, {} malformed)",
            self.readings,
            self.stats.rows_read,
            self.stats.dropped_bad_timestamp,
            self.stats.dropped_malformed
        )?;
        writeln!(f, "  equipment: {}", self.equipment)?;
        writeln!(f, "  groups: {}", self.groups.join(", "))?;
        if let (Some(first), Some(last)) = (self.first_reading, self.last_reading) {
            writeln!(f, "  span: {first} .. {last}")?;
        }
        writeln!(f, "  route columns: {}", if self.has_route_columns { "yes" } else { "no" })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LastStateView {
    pub hour: NaiveDateTime,
    pub counts: Vec<StateCount>,
    pub notices: Vec<Notice>,
}

impl fmt::Display for LastStateView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Equipment by operational state at {}", self.hour)?;
        write_notices(f, &self.notices)?;
        for c in &self.counts {
            writeln!(f, "  {:<16} {:>5}", c.state.label(), c.equipment)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductivityView {
    pub groups: Vec<String>,
    pub equipment: Vec<EquipmentSummary>,
    pub histogram: Vec<HistogramBin>,
    pub notices: Vec<Notice>,
}

impl fmt::Display for ProductivityView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Productive time per equipment")?;
        write_notices(f, &self.notices)?;
        writeln!(
            f,
            "  {:<14} {:>10} {:>12} {:>8}",
            "equipment", "total h", "productive h", "%"
        )?;
        for s in &self.equipment {
            writeln!(
                f,
                "  {:<14} {:>10.2} {:>12.2} {:>8.1}",
                s.equipment, s.total_hours, s.productive_hours, s.productive_pct
            )?;
        }
        if !self.equipment.is_empty() {
            writeln!(f, "Distribution")?;
            for b in &self.histogram {
                writeln!(
                    f,
                    "  {:>3.0}-{:<3.0} {:>4} {}",
                    b.lower,
                    b.upper,
                    b.count,
                    "#".repeat(b.count)
                )?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HourlyTrendView {
    pub groups: Vec<String>,
    pub series: Vec<HourlyProductivity>,
    pub notices: Vec<Notice>,
}

impl fmt::Display for HourlyTrendView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hourly productive share")?;
        write_notices(f, &self.notices)?;
        for p in &self.series {
            writeln!(
                f,
                "  {} {:>6.1}% {}",
                p.hour.format("%d/%m/%Y %H:%M"),
                p.productive_pct,
                bar(p.productive_pct)
            )?;
        }
        Ok(())
    }
}

/// One `#` per 5 percentage points.
pub(crate) fn bar(pct: f64) -> String {
    "#".repeat((pct / 5.0).round().clamp(0.0, 20.0) as usize)
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationView {
    pub groups: Vec<String>,
    /// Most productive first.
    pub ranking: Vec<EquipmentSummary>,
    pub tiers: Vec<TierCount>,
    pub by_group: Vec<GroupTierShare>,
    pub notices: Vec<Notice>,
}

impl fmt::Display for ClassificationView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cumulative productivity classification")?;
        write_notices(f, &self.notices)?;
        for t in &self.tiers {
            writeln!(f, "  {:<8} {:>4} ({:.1}%)", t.tier, t.count, t.share_pct)?;
        }
        if !self.by_group.is_empty() {
            writeln!(f, "By equipment group (share of productive time)")?;
            for g in &self.by_group {
                writeln!(f, "  {:<20} {:<8} {:>6.1}%", g.group, g.tier, g.share_pct)?;
            }
        }
        writeln!(f, "Ranking")?;
        for s in &self.ranking {
            writeln!(f, "  {:<14} {:>6.1}% {}", s.equipment, s.productive_pct, s.tier)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertsView {
    pub groups: Vec<String>,
    pub alerts: Vec<AlertRecord>,
    pub summary: Vec<AlertGroup>,
    pub notices: Vec<Notice>,
}

impl fmt::Display for AlertsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Equipment with high inactivity")?;
        write_notices(f, &self.notices)?;
        for g in &self.summary {
            writeln!(f, "- Equipment {}: {}", g.equipment.join(", "), g.severity)?;
        }
        for a in &self.alerts {
            writeln!(
                f,
                "  {:<14} maint {:>6.1}%  stopped {:>6.1}%  total {:>6.1}%",
                a.equipment, a.maintenance_pct, a.stopped_pct, a.inactivity_pct
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GeoView {
    pub traces: Vec<EquipmentTrace>,
    pub notices: Vec<Notice>,
}

impl fmt::Display for GeoView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Routes")?;
        write_notices(f, &self.notices)?;
        for t in &self.traces {
            writeln!(
                f,
                "  {}: {} points, {} stops",
                t.equipment,
                t.route.len(),
                t.stop_count
            )?;
            if let (Some(start), Some(end)) = (&t.start, &t.end) {
                writeln!(
                    f,
                    "    from ({:.5}, {:.5}) to ({:.5}, {:.5})",
                    start.latitude, start.longitude, end.latitude, end.longitude
                )?;
            }
            if let Some(labor) = &t.labor {
                writeln!(
                    f,
                    "    labor {} .. {} ({} min), {:.2} km",
                    labor.start,
                    labor.end,
                    labor.duration_secs / 60,
                    labor.distance_km
                )?;
            }
        }
        Ok(())
    }
}

/// Options for the selectors of the last-state view.
#[derive(Debug, Clone, Serialize)]
pub struct Selectors {
    pub groups: Vec<String>,
    pub hours: Vec<String>,
    pub default_date: Option<NaiveDate>,
    pub equipment: Vec<String>,
}

impl fmt::Display for Selectors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Groups: {}", self.groups.join(", "))?;
        writeln!(f, "Hours: {}", self.hours.join(", "))?;
        if let Some(date) = self.default_date {
            writeln!(f, "First date: {}", date.format("%d/%m/%Y"))?;
        }
        writeln!(f, "Equipment: {}", self.equipment.join(", "))
    }
}
