//! CLI entry point for the equipment monitor.
//!
//! Each subcommand loads a telemetry log from a file or URL and renders one
//! dashboard view: last state per hour, productivity, hourly trend,
//! classification, inactivity alerts, GPS routes, or the exportable report.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use equipment_monitor::config::Settings;
use equipment_monitor::fetch::{BasicClient, load_source};
use equipment_monitor::output::{print_json, print_pretty, write_table};
use equipment_monitor::report::write_report;
use equipment_monitor::views::GroupFilter;
use equipment_monitor::{Dashboard, Error};
use serde::Serialize;
use std::fmt::Display;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "equipment_monitor")]
#[command(about = "Productivity and downtime analysis for equipment telemetry logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Path or URL of the `;`-delimited telemetry log (optionally gzip-compressed)
    #[arg(value_name = "FILE_OR_URL")]
    source: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Pretty)]
    format: Format,
}

#[derive(Args)]
struct FilterArgs {
    /// Only include these equipment groups (repeatable; default: all)
    #[arg(short, long = "group", value_name = "GROUP")]
    groups: Vec<String>,

    /// Also write the view's table to this CSV file
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,
}

impl FilterArgs {
    fn filter(&self) -> GroupFilter {
        GroupFilter::from_selection(self.groups.iter().cloned())
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what the log contains and the available selector values
    Summary {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Count equipment per operational state at the end of an hour
    LastState {
        #[command(flatten)]
        source: SourceArgs,

        /// Hour of the day (0-23)
        #[arg(long)]
        hour: u32,

        /// Date as dd/mm/yyyy or yyyy-mm-dd (default: first date in the log)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Productive share of time per equipment
    Productivity {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Productive share of time per hour
    Hourly {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Low / Medium / High productivity classification
    Classification {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Equipment stopped or in maintenance for more than 60% of the time
    Alerts {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// GPS route, stops and labor window per equipment
    Geo {
        #[command(flatten)]
        source: SourceArgs,

        /// Only trace this equipment
        #[arg(short, long)]
        equipment: Option<String>,
    },
    /// Export the inactivity report (Markdown, or JSON for a .json path)
    Report {
        #[command(flatten)]
        source: SourceArgs,

        /// Only include these equipment groups (repeatable; default: all)
        #[arg(short, long = "group", value_name = "GROUP")]
        groups: Vec<String>,

        /// Report file (default: $REPORT_DIR/report_<timestamp>.md)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .map_err(|_| format!("invalid date '{raw}', expected dd/mm/yyyy or yyyy-mm-dd"))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file
    let settings = Settings::from_env();

    // Logging setup: colored stderr + JSON rolling log file
    let file_appender =
        tracing_appender::rolling::daily(settings.log_dir(), settings.log_file_name());
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let client = BasicClient::new();
    let mut dashboard = Dashboard::new();

    match cli.command {
        Commands::Summary { source } => {
            let overview = load(&client, &mut dashboard, &source.source).await?;
            emit(source.format, &overview)?;
            emit(source.format, &dashboard.selectors()?)?;
        }
        Commands::LastState { source, hour, date } => {
            load(&client, &mut dashboard, &source.source).await?;
            let view = dashboard.last_state(date, hour)?;
            warn_notices(&view.notices);
            emit(source.format, &view)?;
        }
        Commands::Productivity { source, filter } => {
            load(&client, &mut dashboard, &source.source).await?;
            let view = dashboard.productivity(&filter.filter())?;
            warn_notices(&view.notices);
            export_csv(filter.csv.as_ref(), &view.equipment);
            emit(source.format, &view)?;
        }
        Commands::Hourly { source, filter } => {
            load(&client, &mut dashboard, &source.source).await?;
            let view = dashboard.hourly_trend(&filter.filter())?;
            warn_notices(&view.notices);
            export_csv(filter.csv.as_ref(), &view.series);
            emit(source.format, &view)?;
        }
        Commands::Classification { source, filter } => {
            load(&client, &mut dashboard, &source.source).await?;
            let view = dashboard.classification(&filter.filter())?;
            warn_notices(&view.notices);
            export_csv(filter.csv.as_ref(), &view.ranking);
            emit(source.format, &view)?;
        }
        Commands::Alerts { source, filter } => {
            load(&client, &mut dashboard, &source.source).await?;
            let view = dashboard.alerts(&filter.filter())?;
            warn_notices(&view.notices);
            export_csv(filter.csv.as_ref(), &view.alerts);
            emit(source.format, &view)?;
        }
        Commands::Geo { source, equipment } => {
            load(&client, &mut dashboard, &source.source).await?;
            match dashboard.geo_trace(equipment.as_deref()) {
                Ok(view) => {
                    warn_notices(&view.notices);
                    emit(source.format, &view)?;
                }
                Err(e @ Error::MissingGeoColumns(_)) => {
                    error!(error = %e, "Route view unavailable for this log");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Report {
            source,
            groups,
            output,
        } => {
            load(&client, &mut dashboard, &source.source).await?;
            let filter = GroupFilter::from_selection(groups);
            let report = dashboard.report(&filter)?;

            let path = output.unwrap_or_else(|| {
                settings
                    .report_dir
                    .join(format!("report_{}.md", Utc::now().format("%Y%m%d_%H%M%S")))
            });
            match write_report(&path, &report) {
                Ok(()) => info!(path = %path.display(), "Report saved"),
                Err(e) => error!(error = %e, "Report generation failed"),
            }
            if matches!(source.format, Format::Json) {
                print_json(&report)?;
            }
        }
    }

    Ok(())
}

/// Loads the source into the dashboard and returns its overview.
#[tracing::instrument(skip(client, dashboard))]
async fn load(
    client: &BasicClient,
    dashboard: &mut Dashboard,
    source: &str,
) -> Result<equipment_monitor::views::LogOverview> {
    let bytes = load_source(client, source).await?;
    Ok(dashboard.load(&bytes)?)
}

fn emit<V: Display + Serialize>(format: Format, view: &V) -> Result<()> {
    match format {
        Format::Pretty => print_pretty(view),
        Format::Json => print_json(view)?,
    }
    Ok(())
}

fn warn_notices(notices: &[equipment_monitor::views::Notice]) {
    for notice in notices {
        warn!(%notice, "Notice");
    }
}

fn export_csv<T: Serialize>(path: Option<&PathBuf>, rows: &[T]) {
    let Some(path) = path else {
        return;
    };
    match write_table(path, rows) {
        Ok(()) => info!(path = %path.display(), rows = rows.len(), "Table exported"),
        Err(e) => error!(path = %path.display(), error = %e, "Table export failed"),
    }
}
