//! Parser for `;`-delimited equipment telemetry logs.

use std::io::Read;

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use flate2::read::GzDecoder;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{IngestStats, Reading, StateLabel, TelemetryLog};

pub const COL_TIMESTAMP: &str = "Fecha/Hora";
pub const COL_EQUIPMENT: &str = "Equipo";
pub const COL_STATE: &str = "Grupo Operacion";
pub const COL_GROUP: &str = "Grupo Equipo/Frente";
pub const COL_LATITUDE: &str = "Latitud";
pub const COL_LONGITUDE: &str = "Longitud";
pub const COL_SPEED: &str = "Velocidad";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const UTF8_BOM: [u8; 3] = [0xef, 0xbb, 0xbf];

const DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
];

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d"];

struct Columns {
    timestamp: usize,
    equipment: usize,
    state: usize,
    group: usize,
    latitude: Option<usize>,
    longitude: Option<usize>,
    speed: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<(Self, Vec<String>)> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let missing: Vec<String> = [COL_TIMESTAMP, COL_EQUIPMENT, COL_STATE, COL_GROUP]
            .into_iter()
            .filter(|name| find(*name).is_none())
            .map(String::from)
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingColumns(missing));
        }

        let columns = Columns {
            timestamp: find(COL_TIMESTAMP).unwrap_or_default(),
            equipment: find(COL_EQUIPMENT).unwrap_or_default(),
            state: find(COL_STATE).unwrap_or_default(),
            group: find(COL_GROUP).unwrap_or_default(),
            latitude: find(COL_LATITUDE),
            longitude: find(COL_LONGITUDE),
            speed: find(COL_SPEED),
        };

        let missing_geo = [
            (COL_LATITUDE, columns.latitude),
            (COL_LONGITUDE, columns.longitude),
            (COL_SPEED, columns.speed),
        ]
        .into_iter()
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| name.to_string())
        .collect();

        Ok((columns, missing_geo))
    }
}

/// Parses a telemetry log from raw bytes.
///
/// Rows with an unparsable `Fecha/Hora` are dropped. Short rows are kept with
/// their missing trailing fields treated as blank. The remaining readings
/// are sorted by equipment and time, and each one gets the number of seconds
/// until the next reading of the same equipment.
///
/// # Errors
///
/// Returns an error if the header is unreadable or lacks a required column.
pub fn parse_log(bytes: &[u8]) -> Result<TelemetryLog> {
    let decoded = decompress(bytes)?;
    let body = decoded.strip_prefix(&UTF8_BOM).unwrap_or(&decoded[..]);

    let mut rdr = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .from_reader(body);

    let headers = rdr.headers()?.clone();
    let (columns, missing_geo_columns) = Columns::locate(&headers)?;
    if !missing_geo_columns.is_empty() {
        debug!(missing = ?missing_geo_columns, "Log has no route columns");
    }

    let mut stats = IngestStats::default();
    let mut readings = Vec::new();

    for result in rdr.records() {
        stats.rows_read += 1;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                debug!(error = %e, "Skipping malformed row");
                stats.dropped_malformed += 1;
                continue;
            }
        };

        let field = |idx: usize| record.get(idx).unwrap_or("").trim();
        let optional = |idx: Option<usize>| idx.and_then(|i| parse_number(field(i)));

        let Some(timestamp) = parse_timestamp(field(columns.timestamp)) else {
            stats.dropped_bad_timestamp += 1;
            continue;
        };

        let label = StateLabel::parse(field(columns.state));
        match label {
            StateLabel::Auxiliary => stats.auxiliary_folded += 1,
            StateLabel::Unrecognized => stats.unrecognized_states += 1,
            StateLabel::Known(_) => {}
        }

        let group = field(columns.group);
        readings.push(Reading {
            equipment: field(columns.equipment).to_string(),
            timestamp,
            state: label.state(),
            group: (!group.is_empty()).then(|| group.to_string()),
            latitude: optional(columns.latitude),
            longitude: optional(columns.longitude),
            speed: optional(columns.speed),
            duration_secs: 0,
        });
    }

    if stats.dropped_bad_timestamp > 0 {
        warn!(
            dropped = stats.dropped_bad_timestamp,
            "Dropped rows with unparsable timestamps"
        );
    }
    if stats.unrecognized_states > 0 {
        warn!(
            count = stats.unrecognized_states,
            "Unrecognized operation labels recorded as unregistered"
        );
    }

    derive_durations(&mut readings);

    Ok(TelemetryLog {
        readings,
        stats,
        missing_geo_columns,
    })
}

/// Sorts readings by (equipment, timestamp) and fills `duration_secs` with the
/// gap to the next reading of the same equipment. The last reading of each
/// equipment gets 0.
pub fn derive_durations(readings: &mut [Reading]) {
    readings.sort_by(|a, b| {
        a.equipment
            .cmp(&b.equipment)
            .then(a.timestamp.cmp(&b.timestamp))
    });

    let len = readings.len();
    for i in 0..len {
        let next = readings.get(i + 1);
        let secs = match next {
            Some(next) if next.equipment == readings[i].equipment => {
                (next.timestamp - readings[i].timestamp).num_seconds()
            }
            _ => 0,
        };
        readings[i].duration_secs = secs;
    }
}

/// Parses a day-first timestamp. Date-only values land on midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parses a number that may use a comma as decimal separator.
pub fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

fn decompress(bytes: &[u8]) -> Result<Vec<u8>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes.to_vec());
    }

    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out)?;
    debug!(compressed = bytes.len(), decompressed = out.len(), "Decompressed gzip log");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OperationalState;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    const HEADER: &str = "Fecha/Hora;Equipo;Grupo Operacion;Grupo Equipo/Frente";

    fn log(rows: &[&str]) -> String {
        let mut s = HEADER.to_string();
        for r in rows {
            s.push('\n');
            s.push_str(r);
        }
        s
    }

    #[test]
    fn test_duration_to_next_reading() {
        let text = log(&[
            "01/05/2024 08:05:00;E1;PRODUCTIVO;Cosecha",
            "01/05/2024 08:00:00;E1;PRODUCTIVO;Cosecha",
        ]);
        let parsed = parse_log(text.as_bytes()).unwrap();

        assert_eq!(parsed.readings.len(), 2);
        assert_eq!(parsed.readings[0].duration_secs, 300);
        assert_eq!(parsed.readings[1].duration_secs, 0);
    }

    #[test]
    fn test_durations_do_not_cross_equipment() {
        let text = log(&[
            "01/05/2024 08:00:00;A;PRODUCTIVO;G",
            "01/05/2024 09:00:00;B;PRODUCTIVO;G",
            "01/05/2024 08:30:00;A;PERDIDA;G",
        ]);
        let parsed = parse_log(text.as_bytes()).unwrap();
        let secs: Vec<_> = parsed
            .readings
            .iter()
            .map(|r| (r.equipment.as_str(), r.duration_secs))
            .collect();

        assert_eq!(secs, vec![("A", 1800), ("A", 0), ("B", 0)]);
    }

    #[test]
    fn test_bad_timestamps_are_dropped() {
        let text = log(&[
            "garbage;E1;PRODUCTIVO;G",
            ";E1;PRODUCTIVO;G",
            "01/05/2024 08:00;E1;PRODUCTIVO;G",
        ]);
        let parsed = parse_log(text.as_bytes()).unwrap();

        assert_eq!(parsed.readings.len(), 1);
        assert_eq!(parsed.stats.rows_read, 3);
        assert_eq!(parsed.stats.dropped_bad_timestamp, 2);
    }

    #[test]
    fn test_auxiliary_rows_become_productive() {
        let text = log(&["01/05/2024 08:00:00;E1;AUXILIAR;G"]);
        let parsed = parse_log(text.as_bytes()).unwrap();

        assert_eq!(parsed.readings[0].state, OperationalState::Productive);
        assert_eq!(parsed.stats.auxiliary_folded, 1);
    }

    #[test]
    fn test_missing_required_column() {
        let text = "Fecha/Hora;Equipo;Grupo Operacion\n01/05/2024 08:00;E1;PRODUCTIVO";
        let err = parse_log(text.as_bytes()).unwrap_err();

        match err {
            Error::MissingColumns(cols) => assert_eq!(cols, vec![COL_GROUP.to_string()]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_geo_columns_with_comma_decimals() {
        let text = "Fecha/Hora;Equipo;Grupo Operacion;Grupo Equipo/Frente;Latitud;Longitud;Velocidad\n\
                    01/05/2024 08:00:00;E1;PRODUCTIVO;G;-21,5;-47,25;8,5";
        let parsed = parse_log(text.as_bytes()).unwrap();
        let r = &parsed.readings[0];

        assert!(parsed.has_geo_columns());
        assert_eq!(r.latitude, Some(-21.5));
        assert_eq!(r.longitude, Some(-47.25));
        assert_eq!(r.speed, Some(8.5));
    }

    #[test]
    fn test_geo_columns_reported_missing() {
        let text = log(&["01/05/2024 08:00:00;E1;PRODUCTIVO;G"]);
        let parsed = parse_log(text.as_bytes()).unwrap();

        assert!(!parsed.has_geo_columns());
        assert_eq!(parsed.missing_geo_columns.len(), 3);
    }

    #[test]
    fn test_blank_group_is_none() {
        let text = log(&["01/05/2024 08:00:00;E1;PRODUCTIVO;"]);
        let parsed = parse_log(text.as_bytes()).unwrap();
        assert_eq!(parsed.readings[0].group, None);
    }

    #[test]
    fn test_gzip_and_bom_input() {
        let mut text = UTF8_BOM.to_vec();
        text.extend_from_slice(log(&["01/05/2024 08:00:00;E1;PERDIDA;G"]).as_bytes());

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&text).unwrap();
        let compressed = encoder.finish().unwrap();

        let parsed = parse_log(&compressed).unwrap();
        assert_eq!(parsed.readings.len(), 1);
        assert_eq!(parsed.readings[0].state, OperationalState::Loss);
    }

    #[test]
    fn test_short_row_keeps_its_time_span() {
        let text = "Fecha/Hora;Equipo;Grupo Operacion;Grupo Equipo/Frente;Latitud;Longitud;Velocidad\n\
                    01/05/2024 08:00:00;E1;PRODUCTIVO;G;-21,5;-47,25;8,5\n\
                    01/05/2024 09:00:00;E1;PERDIDA;G\n\
                    01/05/2024 10:00:00;E1;PRODUCTIVO;G;-21,4;-47,2;9";
        let parsed = parse_log(text.as_bytes()).unwrap();

        let spans: Vec<_> = parsed
            .readings
            .iter()
            .map(|r| (r.state, r.duration_secs))
            .collect();
        assert_eq!(
            spans,
            vec![
                (OperationalState::Productive, 3600),
                (OperationalState::Loss, 3600),
                (OperationalState::Productive, 0),
            ]
        );
        assert_eq!(parsed.stats.dropped_malformed, 0);

        let short = &parsed.readings[1];
        assert_eq!(short.group.as_deref(), Some("G"));
        assert_eq!(short.coordinates(), None);
        assert_eq!(short.speed, None);
    }

    #[test]
    fn test_row_missing_group_field_has_no_group() {
        let text = log(&["01/05/2024 08:00:00;E1;PRODUCTIVO"]);
        let parsed = parse_log(text.as_bytes()).unwrap();

        assert_eq!(parsed.readings.len(), 1);
        assert_eq!(parsed.readings[0].group, None);
    }

    #[test]
    fn test_invalid_utf8_row_is_counted_as_malformed() {
        let mut bytes = log(&["01/05/2024 08:00:00;E1;PRODUCTIVO;G"]).into_bytes();
        bytes.extend_from_slice(b"\n01/05/2024 09:00:00;E\xff2;PERDIDA;G");
        bytes.extend_from_slice(b"\n01/05/2024 10:00:00;E3;PERDIDA;G");
        let parsed = parse_log(&bytes).unwrap();

        assert_eq!(parsed.stats.rows_read, 3);
        assert_eq!(parsed.stats.dropped_malformed, 1);
        let ids: Vec<_> = parsed.readings.iter().map(|r| r.equipment.as_str()).collect();
        assert_eq!(ids, vec!["E1", "E3"]);
    }

    #[test]
    fn test_parse_timestamp_is_day_first() {
        let ts = parse_timestamp("02/03/2024 10:15").unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert!(parse_timestamp("2024-03-02 10:15:00").is_some());
        assert!(parse_timestamp("31/02/2024 10:00").is_none());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("7,5"), Some(7.5));
        assert_eq!(parse_number(" 12 "), Some(12.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
    }
}
