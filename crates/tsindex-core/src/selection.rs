//! Data selections: which channels and time windows to fetch.
//!
//! A selection names a network, station, location and channel, each either a
//! literal code or a glob pattern (`*`, `?`), plus an optional start and end
//! time. Selections come from two places:
//!
//! - ad hoc command parts, combined with [`Selection::ad_hoc`], where every
//!   omitted part defaults to match-all;
//! - a selection list file, read with [`read_selection_file`], holding one
//!   whitespace-separated `network station location channel start end` row
//!   per line with `#` comments and blank lines ignored.
//!
//! The location code `--` is an alias for the empty location and is rewritten
//! on entry so the rest of the pipeline only ever sees the stored form.

use std::path::Path;

use chrono::NaiveDateTime;
use snafu::prelude::*;

use crate::timefmt::{self, TimeError};

/// Errors from building selections or reading a selection list file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SelectionError {
    /// The selection list file could not be read.
    #[snafu(display("cannot read selection list file '{}': {source}", path.display()))]
    ListFileRead {
        /// Path of the selection list file.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A selection list line did not match the expected row shape.
    #[snafu(display(
        "line {line_number} of selection list is not \
         'network station location channel starttime endtime': '{line}'"
    ))]
    SelectionFileFormat {
        /// 1-based line number within the file.
        line_number: usize,
        /// The offending line.
        line: String,
    },

    /// An ad hoc selection part was empty or contained whitespace.
    #[snafu(display("invalid {field} selection '{value}'"))]
    MalformedSelection {
        /// Which part was malformed.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// An ad hoc selection time failed to normalize.
    #[snafu(display("invalid {field} time '{value}': {source}"))]
    TimeNormalization {
        /// Which time bound was malformed.
        field: &'static str,
        /// The rejected value.
        value: String,
        /// Underlying parse error.
        source: TimeError,
    },

    /// A selection list time failed to normalize.
    #[snafu(display("invalid {field} time '{value}' on line {line_number}: {source}"))]
    TimeNormalizationAtLine {
        /// Which time bound was malformed.
        field: &'static str,
        /// The rejected value.
        value: String,
        /// 1-based line number within the file.
        line_number: usize,
        /// Underlying parse error.
        source: TimeError,
    },
}

/// One bound of a selection time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBound {
    /// No constraint on this side of the window.
    Unbounded,
    /// Constrained to the given date-time.
    At(NaiveDateTime),
}

impl TimeBound {
    /// The text stored in the request table: canonical date-time text, or
    /// `*` for an unbounded side.
    pub fn as_sql(&self) -> String {
        match self {
            TimeBound::Unbounded => "*".to_string(),
            TimeBound::At(dt) => timefmt::canonical(dt),
        }
    }
}

/// One channel-and-window request against the index catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Network code or glob pattern.
    pub network: String,
    /// Station code or glob pattern.
    pub station: String,
    /// Location code or glob pattern, with `--` already rewritten to ``.
    pub location: String,
    /// Channel code or glob pattern.
    pub channel: String,
    /// Window start bound.
    pub start: TimeBound,
    /// Window end bound.
    pub end: TimeBound,
}

impl Selection {
    /// Build a selection from individually supplied parts. Omitted codes
    /// default to `*`; omitted or `*` times are unbounded.
    pub fn ad_hoc(
        network: Option<&str>,
        station: Option<&str>,
        location: Option<&str>,
        channel: Option<&str>,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Self, SelectionError> {
        let network = ad_hoc_code("network", network)?;
        let station = ad_hoc_code("station", station)?;
        let location = rewrite_location(&ad_hoc_code("location", location)?);
        let channel = ad_hoc_code("channel", channel)?;

        let start = parse_bound("start", start)?;
        let end = parse_bound("end", end)?;

        Ok(Selection {
            network,
            station,
            location,
            channel,
            start,
            end,
        })
    }

    /// Whether any code of this selection contains a glob wildcard.
    pub fn has_wildcard(&self) -> bool {
        [&self.network, &self.station, &self.location, &self.channel]
            .iter()
            .any(|code| code.contains('*') || code.contains('?'))
    }
}

/// Read a selection list file and parse every non-blank, non-comment line.
pub fn read_selection_file(path: &Path) -> Result<Vec<Selection>, SelectionError> {
    let contents = std::fs::read_to_string(path).context(ListFileReadSnafu { path })?;
    parse_selection_list(&contents)
}

fn parse_selection_list(contents: &str) -> Result<Vec<Selection>, SelectionError> {
    let mut selections = Vec::new();
    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        selections.push(parse_selection_line(line, idx + 1)?);
    }
    Ok(selections)
}

fn parse_selection_line(line: &str, line_number: usize) -> Result<Selection, SelectionError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let well_formed = tokens.len() == 6
        && identity_token_ok(tokens[0], 2, false)
        && identity_token_ok(tokens[1], 5, false)
        && identity_token_ok(tokens[2], 2, true)
        && identity_token_ok(tokens[3], 3, false)
        && time_token_ok(tokens[4])
        && time_token_ok(tokens[5]);
    ensure!(well_formed, SelectionFileFormatSnafu { line_number, line });

    let start = parse_bound_at_line("start", tokens[4], line_number)?;
    let end = parse_bound_at_line("end", tokens[5], line_number)?;

    Ok(Selection {
        network: tokens[0].to_string(),
        station: tokens[1].to_string(),
        location: rewrite_location(tokens[2]),
        channel: tokens[3].to_string(),
        start,
        end,
    })
}

fn ad_hoc_code(field: &'static str, value: Option<&str>) -> Result<String, SelectionError> {
    let Some(value) = value else {
        return Ok("*".to_string());
    };
    ensure!(
        !value.is_empty() && !value.contains(char::is_whitespace),
        MalformedSelectionSnafu { field, value }
    );
    Ok(value.to_string())
}

fn parse_bound(field: &'static str, value: Option<&str>) -> Result<TimeBound, SelectionError> {
    match value {
        None => Ok(TimeBound::Unbounded),
        Some("*") => Ok(TimeBound::Unbounded),
        Some(text) => {
            let dt = timefmt::normalize(text)
                .context(TimeNormalizationSnafu { field, value: text })?;
            Ok(TimeBound::At(dt))
        }
    }
}

fn parse_bound_at_line(
    field: &'static str,
    value: &str,
    line_number: usize,
) -> Result<TimeBound, SelectionError> {
    if value == "*" {
        return Ok(TimeBound::Unbounded);
    }
    let dt = timefmt::normalize(value).context(TimeNormalizationAtLineSnafu {
        field,
        value,
        line_number,
    })?;
    Ok(TimeBound::At(dt))
}

/// A code token in a selection list row: codes, `_`, and glob wildcards, up
/// to `max_len` characters, with `-` additionally allowed where the empty
/// location alias `--` is legal.
fn identity_token_ok(token: &str, max_len: usize, allow_dash: bool) -> bool {
    !token.is_empty()
        && token.len() <= max_len
        && token.chars().all(|c| {
            c.is_ascii_alphanumeric() || c == '_' || c == '?' || c == '*' || (allow_dash && c == '-')
        })
}

/// A time token in a selection list row: digits, date-time separators, or
/// the unbounded marker `*`.
fn time_token_ok(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | ':' | 'T' | '.' | '*'))
}

/// Rewrite the empty-location alias `--` to the stored empty string.
fn rewrite_location(location: &str) -> String {
    if location == "--" {
        String::new()
    } else {
        location.to_string()
    }
}
