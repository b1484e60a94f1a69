//! Request/response handlers, one per dashboard view.
//!
//! A [`Dashboard`] holds the parse cache for the current upload. Each handler
//! takes the view's filter state and recomputes its render model from the
//! cached readings.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info};

use crate::analyzers::alerts::{evaluate_alerts, group_alerts};
use crate::analyzers::classify::{group_tier_breakdown, productivity_histogram, tier_counts};
use crate::analyzers::geo::trace_all;
use crate::analyzers::hourly::hourly_productivity;
use crate::analyzers::productivity::summarize_equipment;
use crate::analyzers::snapshot::{available_hours, first_date, last_state_counts};
use crate::cache::ParseCache;
use crate::error::{Error, Result};
use crate::model::{Reading, TelemetryLog};
use crate::report::Report;
use crate::views::{
    AlertsView, ClassificationView, GeoView, GroupFilter, HourlyTrendView, LastStateView,
    LogOverview, Notice, ProductivityView, Selectors,
};

#[derive(Debug, Default)]
pub struct Dashboard {
    cache: ParseCache,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts an upload. Re-uploading identical bytes reuses the parsed log.
    #[tracing::instrument(skip_all, fields(bytes = bytes.len()))]
    pub fn load(&mut self, bytes: &[u8]) -> Result<LogOverview> {
        let (key, log) = self.cache.get_or_parse(bytes)?;

        let first_reading = log.readings.iter().map(|r| r.timestamp).min();
        let last_reading = log.readings.iter().map(|r| r.timestamp).max();
        let overview = LogOverview {
            key,
            readings: log.readings.len(),
            equipment: equipment_ids(&log.readings).len(),
            groups: group_names(&log.readings),
            first_reading,
            last_reading,
            has_route_columns: log.has_geo_columns(),
            stats: log.stats.clone(),
        };
        info!(
            key = %overview.key,
            readings = overview.readings,
            equipment = overview.equipment,
            "Log loaded"
        );
        Ok(overview)
    }

    pub fn cache(&self) -> &ParseCache {
        &self.cache
    }

    fn log(&self) -> Result<Arc<TelemetryLog>> {
        self.cache.current().ok_or(Error::NotLoaded)
    }

    fn filtered(&self, filter: &GroupFilter) -> Result<Vec<Reading>> {
        let log = self.log()?;
        let readings: Vec<Reading> = log
            .readings
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        debug!(filter = %filter, kept = readings.len(), "Applied group filter");
        Ok(readings)
    }

    /// Values offered by the view selectors.
    pub fn selectors(&self) -> Result<Selectors> {
        let log = self.log()?;
        Ok(Selectors {
            groups: group_names(&log.readings),
            hours: self
                .available_hours()?
                .iter()
                .map(|t| t.format("%H:%M").to_string())
                .collect(),
            default_date: self.default_date()?,
            equipment: equipment_ids(&log.readings),
        })
    }

    pub fn available_groups(&self) -> Result<Vec<String>> {
        Ok(group_names(&self.log()?.readings))
    }

    pub fn available_hours(&self) -> Result<Vec<NaiveTime>> {
        Ok(available_hours(&self.log()?.readings))
    }

    /// The earliest date in the log, used when no date is picked.
    pub fn default_date(&self) -> Result<Option<NaiveDate>> {
        Ok(first_date(&self.log()?.readings))
    }

    /// How many equipment were in each state at the end of the selected hour.
    pub fn last_state(&self, date: Option<NaiveDate>, hour: u32) -> Result<LastStateView> {
        let log = self.log()?;
        let time = NaiveTime::from_hms_opt(hour, 0, 0).ok_or(Error::InvalidHour(hour))?;

        let Some(date) = date.or_else(|| first_date(&log.readings)) else {
            return Ok(LastStateView {
                hour: NaiveDate::default().and_time(time),
                counts: Vec::new(),
                notices: vec![Notice::NoReadings],
            });
        };

        let hour = date.and_time(time);
        let counts = last_state_counts(&log.readings, hour);
        let notices = if counts.is_empty() {
            vec![Notice::NoDataForHour { hour }]
        } else {
            Vec::new()
        };
        Ok(LastStateView {
            hour,
            counts,
            notices,
        })
    }

    pub fn productivity(&self, filter: &GroupFilter) -> Result<ProductivityView> {
        let readings = self.filtered(filter)?;
        let equipment = summarize_equipment(&readings);
        Ok(ProductivityView {
            groups: filter.labels(),
            histogram: productivity_histogram(&equipment),
            equipment,
            notices: empty_notice(&readings),
        })
    }

    pub fn hourly_trend(&self, filter: &GroupFilter) -> Result<HourlyTrendView> {
        let readings = self.filtered(filter)?;
        Ok(HourlyTrendView {
            groups: filter.labels(),
            series: hourly_productivity(&readings),
            notices: empty_notice(&readings),
        })
    }

    pub fn classification(&self, filter: &GroupFilter) -> Result<ClassificationView> {
        let readings = self.filtered(filter)?;
        let summaries = summarize_equipment(&readings);

        let mut ranking = summaries.clone();
        ranking.sort_by(|a, b| {
            b.productive_pct
                .total_cmp(&a.productive_pct)
                .then_with(|| a.equipment.cmp(&b.equipment))
        });

        Ok(ClassificationView {
            groups: filter.labels(),
            tiers: tier_counts(&summaries),
            by_group: group_tier_breakdown(&readings, &summaries),
            ranking,
            notices: empty_notice(&readings),
        })
    }

    pub fn alerts(&self, filter: &GroupFilter) -> Result<AlertsView> {
        let readings = self.filtered(filter)?;
        let alerts = evaluate_alerts(&summarize_equipment(&readings));
        let summary = group_alerts(&alerts);

        let mut notices = empty_notice(&readings);
        if notices.is_empty() && alerts.is_empty() {
            notices.push(Notice::NoAlerts);
        }
        Ok(AlertsView {
            groups: filter.labels(),
            alerts,
            summary,
            notices,
        })
    }

    /// Routes for one equipment, or for all of them when `equipment` is `None`.
    ///
    /// # Errors
    ///
    /// [`Error::MissingGeoColumns`] when the log has no latitude, longitude or
    /// speed column. Other views keep working on the same log.
    pub fn geo_trace(&self, equipment: Option<&str>) -> Result<GeoView> {
        let log = self.log()?;
        if !log.has_geo_columns() {
            return Err(Error::MissingGeoColumns(log.missing_geo_columns.clone()));
        }

        let readings: Vec<Reading> = log
            .readings
            .iter()
            .filter(|r| equipment.is_none_or(|id| r.equipment == id))
            .filter(|r| r.coordinates().is_some())
            .cloned()
            .collect();

        let traces = trace_all(&readings);
        let mut notices: Vec<Notice> = traces
            .iter()
            .filter(|t| t.labor.is_none())
            .map(|t| Notice::NoLaborReadings {
                equipment: t.equipment.clone(),
            })
            .collect();
        if traces.is_empty() {
            notices.push(match equipment {
                Some(id) => Notice::UnknownEquipment {
                    equipment: id.to_string(),
                },
                None => Notice::NoReadings,
            });
        }

        Ok(GeoView { traces, notices })
    }

    /// Builds the exportable report for the selected groups.
    pub fn report(&self, filter: &GroupFilter) -> Result<Report> {
        let trend = self.hourly_trend(filter)?;
        let alerts = self.alerts(filter)?;
        Ok(Report::build(filter, trend.series, alerts))
    }
}

fn empty_notice(readings: &[Reading]) -> Vec<Notice> {
    if readings.is_empty() {
        vec![Notice::NoReadings]
    } else {
        Vec::new()
    }
}

fn group_names(readings: &[Reading]) -> Vec<String> {
    readings
        .iter()
        .filter_map(|r| r.group.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn equipment_ids(readings: &[Reading]) -> Vec<String> {
    readings
        .iter()
        .map(|r| r.equipment.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
