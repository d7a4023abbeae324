//! CSV ingest: raw metric text to chart points.
//!
//! Input rows are `timestamp,value` with no header row. Each column has an
//! explicit parser; the first row that does not fit stops the transform with a
//! `ParseError` naming the line, so a chart is never built from partial data.
//!
//! Output order always matches input order. No sorting, deduplication or
//! filtering happens here.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::domain::{ParsedPoint, TimestampEncoding};
use crate::error::ParseError;

/// Summary stats about a parsed series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStats {
    pub n_points: usize,
    pub first: DateTime<Utc>,
    pub last: DateTime<Utc>,
    pub value_min: f64,
    pub value_max: f64,
}

/// Parse metric CSV text into points, one per row, in input order.
pub fn transform(raw: &str, encoding: TimestampEncoding) -> Result<Vec<ParsedPoint>, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        // Field counts are checked per row below, with a clearer message.
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());

    let mut points = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| ParseError::Csv(e.to_string()))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.len() != 2 {
            return Err(ParseError::FieldCount {
                line,
                found: record.len(),
            });
        }

        let raw_ts = &record[0];
        let timestamp = parse_timestamp(raw_ts, encoding).ok_or_else(|| ParseError::Timestamp {
            line,
            value: raw_ts.to_string(),
            expected: encoding.expected(),
        })?;

        let raw_value = &record[1];
        let value = parse_value(raw_value).ok_or_else(|| ParseError::Value {
            line,
            value: raw_value.to_string(),
        })?;

        points.push(ParsedPoint::new(timestamp, value));
    }

    Ok(points)
}

/// Parse the timestamp column under the deployment's encoding.
pub fn parse_timestamp(s: &str, encoding: TimestampEncoding) -> Option<DateTime<Utc>> {
    match encoding {
        TimestampEncoding::Epoch => parse_epoch_seconds(s),
        TimestampEncoding::Date => parse_date_string(s),
    }
}

fn parse_epoch_seconds(s: &str) -> Option<DateTime<Utc>> {
    let secs = s.parse::<i64>().ok()?;
    let millis = secs.checked_mul(1000)?;
    DateTime::from_timestamp_millis(millis)
}

fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    // Hand-edited data files mix 12h clock times (`8:00AM`) with ISO-like
    // forms and unpadded months (`2008-7-14`). Values are read as UTC.
    const DATETIME_FMTS: [&str; 6] = [
        "%Y-%m-%d %I:%M%p",
        "%Y-%m-%d %I:%M %p",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
    ];
    const DATE_FMTS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

fn parse_value(s: &str) -> Option<f64> {
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Compute stats over a parsed series (`None` when empty).
pub fn compute_stats(points: &[ParsedPoint]) -> Option<SeriesStats> {
    let first = points.first()?;
    let last = points.last()?;

    let mut value_min = f64::INFINITY;
    let mut value_max = f64::NEG_INFINITY;
    for p in points {
        value_min = value_min.min(p.value);
        value_max = value_max.max(p.value);
    }

    Some(SeriesStats {
        n_points: points.len(),
        first: first.timestamp,
        last: last.timestamp,
        value_min,
        value_max,
    })
}
