//! Exportable inactivity report.
//!
//! The layout is fixed: title, generation time, selected groups, the hourly
//! productivity chart, the grouped alert summary, the per-equipment alert
//! table and a footer.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::analyzers::types::{AlertGroup, AlertRecord, HourlyProductivity};
use crate::error::{Error, Result};
use crate::views::{AlertsView, GroupFilter, bar};

pub const REPORT_TITLE: &str = "Equipment Inactivity Report";
const FOOTER: &str = "Generated by equipment_monitor";

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub groups: Vec<String>,
    pub chart: Vec<HourlyProductivity>,
    pub alert_summary: Vec<AlertGroup>,
    pub alerts: Vec<AlertRecord>,
    pub footer: String,
}

impl Report {
    pub fn build(filter: &GroupFilter, chart: Vec<HourlyProductivity>, alerts: AlertsView) -> Self {
        Self {
            title: REPORT_TITLE.to_string(),
            generated_at: Utc::now(),
            groups: filter.labels(),
            chart,
            alert_summary: alerts.summary,
            alerts: alerts.alerts,
            footer: FOOTER.to_string(),
        }
    }

    /// Renders the report as a Markdown document.
    pub fn render_markdown(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(out, "# {}", self.title)?;
        writeln!(out)?;
        writeln!(
            out,
            "Generated: {}",
            self.generated_at.format("%d/%m/%Y %H:%M UTC")
        )?;
        let groups = if self.groups.is_empty() {
            "All".to_string()
        } else {
            self.groups.join(", ")
        };
        writeln!(out, "Groups: {groups}")?;
        writeln!(out)?;

        writeln!(out, "## Hourly productive share")?;
        writeln!(out)?;
        writeln!(out, "```")?;
        for p in &self.chart {
            writeln!(
                out,
                "{} {:>6.1}% {}",
                p.hour.format("%d/%m %H:%M"),
                p.productive_pct,
                bar(p.productive_pct)
            )?;
        }
        writeln!(out, "```")?;
        writeln!(out)?;

        writeln!(out, "## Alert summary")?;
        writeln!(out)?;
        if self.alert_summary.is_empty() {
            writeln!(out, "No equipment with critical inactivity detected.")?;
        }
        for g in &self.alert_summary {
            writeln!(out, "- **Equipment {}**: {}", g.equipment.join(", "), g.severity)?;
        }
        writeln!(out)?;

        writeln!(out, "## Equipment alerts")?;
        writeln!(out)?;
        writeln!(
            out,
            "| Equipment | Total h | Maintenance % | Stopped % | Inactivity % | Comment |"
        )?;
        writeln!(out, "|---|---:|---:|---:|---:|---|")?;
        for a in &self.alerts {
            writeln!(
                out,
                "| {} | {:.2} | {:.1} | {:.1} | {:.1} | {} |",
                a.equipment,
                a.total_hours,
                a.maintenance_pct,
                a.stopped_pct,
                a.inactivity_pct,
                a.severity
            )?;
        }
        writeln!(out)?;
        writeln!(out, "---")?;
        writeln!(out, "{}", self.footer)
    }
}

/// Writes the report to `path`: JSON when the extension is `.json`,
/// Markdown otherwise. Parent directories are created as needed.
///
/// # Errors
///
/// Returns [`Error::Report`] when the file cannot be written.
#[tracing::instrument(skip(report), fields(path = %path.display()))]
pub fn write_report(path: &Path, report: &Report) -> Result<()> {
    let body = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::to_string_pretty(report)?
    } else {
        report.render_markdown()
    };

    let to_report_error = |source| Error::Report {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(to_report_error)?;
    }
    std::fs::write(path, body).map_err(to_report_error)?;

    info!(alerts = report.alerts.len(), "Report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::AlertSeverity;
    use chrono::NaiveDate;
    use std::fs;

    fn sample_report() -> Report {
        let hour = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let alert = AlertRecord {
            equipment: "M1".to_string(),
            total_hours: 2.0,
            maintenance_hours: 2.0,
            stopped_hours: 0.0,
            maintenance_pct: 100.0,
            stopped_pct: 0.0,
            inactivity_pct: 100.0,
            severity: AlertSeverity::FullMaintenance,
        };
        let view = AlertsView {
            groups: vec!["Taller".to_string()],
            summary: vec![AlertGroup {
                severity: AlertSeverity::FullMaintenance,
                equipment: vec!["M1".to_string()],
            }],
            alerts: vec![alert],
            notices: Vec::new(),
        };
        let chart = vec![HourlyProductivity {
            hour,
            productive_secs: 1800,
            total_secs: 3600,
            productive_pct: 50.0,
        }];
        Report::build(&GroupFilter::from_selection(["Taller"]), chart, view)
    }

    #[test]
    fn test_markdown_layout_order() {
        let md = sample_report().render_markdown();

        let title = md.find(REPORT_TITLE).unwrap();
        let groups = md.find("Groups: Taller").unwrap();
        let chart = md.find("## Hourly productive share").unwrap();
        let summary = md.find("- **Equipment M1**: 100% maintenance").unwrap();
        let table = md.find("| M1 | 2.00 | 100.0 | 0.0 | 100.0 | 100% maintenance |").unwrap();
        let footer = md.find(FOOTER).unwrap();

        assert!(title < groups && groups < chart && chart < summary);
        assert!(summary < table && table < footer);
        assert!(md.contains("##########"));
    }

    #[test]
    fn test_display_matches_markdown() {
        let report = sample_report();
        assert_eq!(format!("{report}"), report.render_markdown());
        assert!(report.render_markdown().ends_with(&format!("{FOOTER}\n")));
    }

    #[test]
    fn test_write_report_markdown_and_json() {
        let dir = std::env::temp_dir().join("equipment_monitor_report_test");
        let _ = fs::remove_dir_all(&dir);
        let report = sample_report();

        let md_path = dir.join("report.md");
        write_report(&md_path, &report).unwrap();
        assert!(fs::read_to_string(&md_path).unwrap().starts_with("# "));

        let json_path = dir.join("report.json");
        write_report(&json_path, &report).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["alerts"][0]["severity"], "full_maintenance");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_report_failure_is_report_error() {
        let blocker = std::env::temp_dir().join("equipment_monitor_report_blocker");
        fs::write(&blocker, b"file").unwrap();

        let err = write_report(&blocker.join("report.md"), &sample_report()).unwrap_err();
        assert!(matches!(err, Error::Report { .. }));

        fs::remove_file(&blocker).unwrap();
    }
}
