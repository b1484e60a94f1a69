//! Error type shared by the library modules.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed telemetry log: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to fetch source: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("invalid source URL: {0}")]
    Url(String),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("log is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("route view needs columns {}", .0.join(", "))]
    MissingGeoColumns(Vec<String>),

    #[error("hour must be between 0 and 23, got {0}")]
    InvalidHour(u32),

    #[error("no log loaded")]
    NotLoaded,

    #[error("could not write report to {path}: {source}")]
    Report {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
