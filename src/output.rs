//! Output formatting and persistence for dashboard views.
//!
//! Supports human-readable text, JSON, and CSV table export.

use std::fmt::Display;
use std::fs::File;
use std::path::Path;

use csv::WriterBuilder;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;

/// Prints a view in its terminal layout.
pub fn print_pretty(view: &impl Display) {
    print!("{view}");
}

/// Prints a view as pretty-printed JSON.
pub fn print_json(view: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(view)?);
    Ok(())
}

/// Writes `rows` to a `;`-delimited CSV file, replacing any existing file.
///
/// Rows must be flat (no nested collections).
pub fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing CSV table");
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = WriterBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}
