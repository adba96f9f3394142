//! Index rows and the packed summaries stored inside them.
//!
//! Each row of the index table describes one contiguous section of a data
//! file. Alongside the scalar columns, a row packs two lists into text
//! columns:
//!
//! - `timeindex`: comma-separated `time=>byteoffset` pairs mapping points in
//!   time to positions within the section;
//! - `timespans` (optionally paired with `timerates`): comma-separated
//!   `[start:end]` epoch-second intervals of continuous coverage.
//!
//! Decoding is deferred until a listing actually needs the values, so a
//! fetch never fails on a row the caller does not render.

use snafu::prelude::*;

use crate::timefmt::TimeError;

/// Errors from decoding the packed columns of an index row.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RecordError {
    /// A time-index entry was not a `time=>byteoffset` pair.
    #[snafu(display("malformed time index entry '{entry}'"))]
    MalformedTimeIndex {
        /// The offending entry text.
        entry: String,
    },

    /// A time-span entry was not a `[start:end]` pair of numbers.
    #[snafu(display("malformed time span '{span}'"))]
    MalformedTimeSpan {
        /// The offending span text.
        span: String,
    },

    /// The row carries sample rates but their count differs from the spans.
    #[snafu(display("row has {spans} time spans but {rates} sample rates"))]
    SpanRateCountMismatch {
        /// Number of decoded time spans.
        spans: usize,
        /// Number of decoded sample rates.
        rates: usize,
    },

    /// A time value in the row could not be converted for rendering.
    #[snafu(display("time value out of range: {source}"))]
    TimeOutOfRange {
        /// Underlying conversion error.
        source: TimeError,
    },
}

/// One `time=>byteoffset` entry of a row's time index.
///
/// Both halves are kept as text: times are usually epoch seconds but the
/// scanner may also store named keys (such as `latest`), and offsets are
/// rendered verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeIndexEntry {
    /// The time key of the entry.
    pub time: String,
    /// The byte offset the key maps to.
    pub offset: String,
}

/// One continuous-coverage interval of a row, in epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSpan {
    /// Interval start, epoch seconds.
    pub start: f64,
    /// Interval end, epoch seconds.
    pub end: f64,
}

/// One row of the index table.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRecord {
    /// Network code.
    pub network: String,
    /// Station code.
    pub station: String,
    /// Location code.
    pub location: String,
    /// Channel code.
    pub channel: String,
    /// Quality code of the section.
    pub quality: String,
    /// Earliest data time in the section, canonical text.
    pub starttime: String,
    /// Latest data time in the section, canonical text.
    pub endtime: String,
    /// Nominal sample rate in samples per second.
    pub samplerate: f64,
    /// Path of the data file the section lives in.
    pub filename: String,
    /// Byte offset of the section within the file.
    pub byteoffset: i64,
    /// Length of the section in bytes.
    pub bytes: i64,
    /// Content hash of the section, when the scanner recorded one.
    pub hash: Option<String>,
    /// Packed `time=>byteoffset` entries, when present.
    pub timeindex: Option<String>,
    /// Packed `[start:end]` coverage intervals, when present.
    pub timespans: Option<String>,
    /// Sample rates paired with `timespans`, when present.
    pub timerates: Option<String>,
    /// Data format identifier recorded by the scanner.
    pub format: Option<String>,
    /// Modification time of the data file when scanned.
    pub filemodtime: String,
    /// When this row was last updated.
    pub updated: String,
    /// When the file was last scanned.
    pub scanned: String,
}

impl IndexRecord {
    /// Decode the packed time index into its entries. An absent or empty
    /// column decodes to no entries.
    pub fn time_index(&self) -> Result<Vec<TimeIndexEntry>, RecordError> {
        let Some(packed) = self.timeindex.as_deref().filter(|t| !t.is_empty()) else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        for entry in packed.split(',') {
            let parts: Vec<&str> = entry.split("=>").collect();
            ensure!(parts.len() == 2, MalformedTimeIndexSnafu { entry });
            entries.push(TimeIndexEntry {
                time: parts[0].to_string(),
                offset: parts[1].to_string(),
            });
        }
        Ok(entries)
    }

    /// Decode the packed coverage intervals. An absent or empty column
    /// decodes to no spans.
    pub fn time_spans(&self) -> Result<Vec<TimeSpan>, RecordError> {
        let Some(packed) = self.timespans.as_deref().filter(|t| !t.is_empty()) else {
            return Ok(Vec::new());
        };

        let mut spans = Vec::new();
        for piece in packed.split(',') {
            let inner = piece.trim_start_matches('[').trim_end_matches(']');
            let parts: Vec<&str> = inner.split(':').collect();
            ensure!(parts.len() == 2, MalformedTimeSpanSnafu { span: piece });

            let start: f64 = parts[0]
                .trim()
                .parse()
                .ok()
                .context(MalformedTimeSpanSnafu { span: piece })?;
            let end: f64 = parts[1]
                .trim()
                .parse()
                .ok()
                .context(MalformedTimeSpanSnafu { span: piece })?;
            spans.push(TimeSpan { start, end });
        }
        Ok(spans)
    }

    /// Decode coverage intervals together with their per-span sample rates.
    ///
    /// When the row has no `timerates` every span pairs with `None` and the
    /// caller falls back to the row's nominal rate. When rates are present
    /// their count must match the span count.
    pub fn spans_with_rates(&self) -> Result<Vec<(TimeSpan, Option<&str>)>, RecordError> {
        let spans = self.time_spans()?;

        let Some(packed) = self.timerates.as_deref().filter(|t| !t.is_empty()) else {
            return Ok(spans.into_iter().map(|s| (s, None)).collect());
        };

        let rates: Vec<&str> = packed.split(',').collect();
        ensure!(
            rates.len() == spans.len(),
            SpanRateCountMismatchSnafu {
                spans: spans.len(),
                rates: rates.len()
            }
        );

        Ok(spans.into_iter().zip(rates.into_iter().map(Some)).collect())
    }

    /// Byte offset one past the end of the section.
    pub fn end_offset(&self) -> i64 {
        self.byteoffset + self.bytes
    }

    /// Ordering key for listings: channel identity, then quality, then
    /// section start.
    pub(crate) fn sort_key(&self) -> (&str, &str, &str, &str, &str, &str) {
        (
            &self.network,
            &self.station,
            &self.location,
            &self.channel,
            &self.quality,
            &self.starttime,
        )
    }
}
