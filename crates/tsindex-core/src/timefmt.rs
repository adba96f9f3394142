//! Helpers for the time text formats used across the index catalog.
//!
//! Catalog tables store date-times as text, so every comparison the query
//! planner issues is a plain string comparison. These helpers define the
//! canonical forms and keep them stable:
//!
//! - [`normalize`] accepts loosely formatted date-time text (fields split by
//!   any run of `-`, `:`, `.` or `T`) and produces a `NaiveDateTime`;
//!   [`canonical`] renders it as `YYYY-MM-DDThh:mm:ss.ffffff`, the exact
//!   shape stored in catalog time columns. Canonical text sorts
//!   chronologically, which is what makes text comparisons in SQL valid.
//! - [`MIN_TIME`] and [`MAX_TIME`] are the sentinel extremes substituted for
//!   unbounded selection times so the planner only ever compares with
//!   inequality operators.
//! - Span boundaries and time-index keys inside index rows are numeric epoch
//!   seconds; [`looks_like_epoch`], [`epoch_to_utc`] and the rendering
//!   helpers convert those for the two listing formats.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use snafu::prelude::*;

/// Sentinel substituted for an unbounded selection start time.
///
/// Sits above year 0000 so that subtracting a bounded number of days in SQL
/// date arithmetic still lands inside SQLite's supported 0000..9999 range.
pub const MIN_TIME: &str = "0001-01-01T00:00:00.000000";

/// Sentinel substituted for an unbounded selection end time.
pub const MAX_TIME: &str = "9999-12-31T23:59:59.999999";

/// Errors from parsing or converting catalog time values.
#[derive(Debug, Snafu, PartialEq)]
#[snafu(visibility(pub(crate)))]
pub enum TimeError {
    /// The date-time text did not split into 3 to 7 fields.
    #[snafu(display("time '{text}' has {count} fields, expected 3 to 7"))]
    FieldCount {
        /// The original time text.
        text: String,
        /// Number of fields found after splitting.
        count: usize,
    },

    /// A field of the date-time text was empty or not an unsigned integer.
    #[snafu(display("non-numeric field '{piece}' in time '{text}'"))]
    NonNumericField {
        /// The original time text.
        text: String,
        /// The field that failed to parse.
        piece: String,
    },

    /// The fields parsed but do not name a valid date-time.
    #[snafu(display("time '{text}' is out of range"))]
    OutOfRange {
        /// The original time text.
        text: String,
    },

    /// An epoch value cannot be represented as a date-time.
    #[snafu(display("epoch value {value} cannot be represented as a date-time"))]
    EpochOutOfRange {
        /// The offending epoch seconds value.
        value: f64,
    },

    /// A catalog timestamp column held text in no recognized form.
    #[snafu(display("catalog time '{text}' is not a recognized date-time"))]
    UnrecognizedCatalogTime {
        /// The text found in the catalog column.
        text: String,
    },
}

/// Split time text the way the selection grammar expects: any run of the
/// separators `-`, `:`, `.`, `T` delimits fields. Leading or trailing
/// separators produce an empty field, which callers reject.
fn split_time_pieces(text: &str) -> Vec<&str> {
    let is_sep = |c: char| matches!(c, '-' | ':' | '.' | 'T');

    let mut pieces = Vec::new();
    let mut token_start = 0;
    let mut prev_was_sep = false;

    for (idx, ch) in text.char_indices() {
        if is_sep(ch) {
            if !prev_was_sep {
                pieces.push(&text[token_start..idx]);
            }
            prev_was_sep = true;
        } else {
            if prev_was_sep {
                token_start = idx;
            }
            prev_was_sep = false;
        }
    }

    if prev_was_sep {
        pieces.push("");
    } else {
        pieces.push(&text[token_start..]);
    }

    pieces
}

/// Parse loosely formatted date-time text into a `NaiveDateTime`.
///
/// The text is split into year, month, day and optionally hour, minute,
/// second and microseconds; omitted trailing fields default to zero. The
/// seventh field is a whole microsecond count, not a decimal fraction, so
/// `2020-01-01T00:00:00.5` means 5 microseconds past the second. Years are
/// restricted to 1..=9999 to keep the canonical rendering four digits wide.
pub fn normalize(text: &str) -> Result<NaiveDateTime, TimeError> {
    let pieces = split_time_pieces(text);
    ensure!(
        (3..=7).contains(&pieces.len()),
        FieldCountSnafu {
            text,
            count: pieces.len()
        }
    );

    let mut values = Vec::with_capacity(pieces.len());
    for piece in &pieces {
        let value: u32 = piece
            .parse()
            .ok()
            .context(NonNumericFieldSnafu { text, piece: *piece })?;
        values.push(value);
    }

    let year = values[0];
    ensure!((1..=9999).contains(&year), OutOfRangeSnafu { text });

    let hour = values.get(3).copied().unwrap_or(0);
    let minute = values.get(4).copied().unwrap_or(0);
    let second = values.get(5).copied().unwrap_or(0);
    let micro = values.get(6).copied().unwrap_or(0);
    ensure!(micro <= 999_999, OutOfRangeSnafu { text });

    let date =
        NaiveDate::from_ymd_opt(year as i32, values[1], values[2]).context(OutOfRangeSnafu { text })?;
    let time =
        NaiveTime::from_hms_micro_opt(hour, minute, second, micro).context(OutOfRangeSnafu { text })?;

    Ok(date.and_time(time))
}

/// Render a date-time in the canonical catalog form
/// `YYYY-MM-DDThh:mm:ss.ffffff`.
pub fn canonical(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Whether trimmed text is a plain decimal number: optional sign, digits,
/// optionally a dot and more digits. Time-index keys matching this shape are
/// treated as epoch seconds when rendering.
pub fn looks_like_epoch(text: &str) -> bool {
    let trimmed = text.trim();
    let unsigned = trimmed
        .strip_prefix('+')
        .or_else(|| trimmed.strip_prefix('-'))
        .unwrap_or(trimmed);

    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(int_part) && frac_part.map_or(true, all_digits)
}

/// Convert epoch seconds to a UTC date-time, rounding to whole microseconds.
pub fn epoch_to_utc(seconds: f64) -> Result<DateTime<Utc>, TimeError> {
    ensure!(seconds.is_finite(), EpochOutOfRangeSnafu { value: seconds });

    let micros = (seconds * 1_000_000.0).round();
    ensure!(
        (i64::MIN as f64..=i64::MAX as f64).contains(&micros),
        EpochOutOfRangeSnafu { value: seconds }
    );

    DateTime::from_timestamp_micros(micros as i64).context(EpochOutOfRangeSnafu { value: seconds })
}

/// Render a UTC date-time as `YYYY-MM-DD hh:mm:ss`, appending a six-digit
/// fraction only when the sub-second part is nonzero.
pub fn isoformat_space(dt: &DateTime<Utc>) -> String {
    if dt.timestamp_subsec_micros() == 0 {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}

/// Render a UTC date-time in the SYNC listing form
/// `YYYY,DDD,hh:mm:ss.ffffff` where `DDD` is the day of year.
pub fn sync_day_time(dt: &DateTime<Utc>) -> String {
    dt.format("%Y,%j,%H:%M:%S%.6f").to_string()
}

/// Parse a catalog timestamp column, accepting `T` or space separators and
/// an optional fractional second.
pub fn parse_catalog_time(text: &str) -> Result<NaiveDateTime, TimeError> {
    const FORMS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ];

    for form in FORMS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, form) {
            return Ok(dt);
        }
    }

    UnrecognizedCatalogTimeSnafu { text }.fail()
}

/// Render the `updated` catalog timestamp as `YYYY,DDD` for SYNC lines.
pub fn updated_day(text: &str) -> Result<String, TimeError> {
    let dt = parse_catalog_time(text)?;
    Ok(dt.format("%Y,%j").to_string())
}
