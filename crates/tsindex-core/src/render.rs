//! The two listing formats for fetched index rows.
//!
//! [`write_detail`] prints one block per row: the file and channel identity,
//! byte range, bookkeeping times, then the decoded time index and coverage
//! spans. [`write_sync`] prints one pipe-delimited line per coverage span,
//! the exchange format used to reconcile archive inventories.
//!
//! Epoch-second values inside rows are rendered as UTC date-times; index
//! keys that are not epoch-shaped (the scanner also stores named keys) pass
//! through verbatim. Rows are rendered in the order given, so listings
//! follow the fetch ordering.

use std::io::Write;

use snafu::prelude::*;

use crate::record::{IndexRecord, RecordError, TimeOutOfRangeSnafu};
use crate::timefmt::{epoch_to_utc, isoformat_space, looks_like_epoch, sync_day_time, updated_day};

/// Errors from rendering a listing.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RenderError {
    /// A row's packed columns could not be decoded.
    #[snafu(transparent)]
    Record {
        /// Underlying decode error.
        source: RecordError,
    },

    /// Writing the listing failed.
    #[snafu(display("cannot write listing: {source}"))]
    Io {
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Write the detail listing: one descriptive block per index row.
pub fn write_detail<W: Write>(out: &mut W, records: &[IndexRecord]) -> Result<(), RenderError> {
    for record in records {
        // Decode packed columns up front so a malformed row fails before
        // any partial block is written.
        let time_index = record.time_index()?;
        let spans = record.spans_with_rates()?;

        writeln!(out, "{}:", record.filename).context(IoSnafu)?;
        writeln!(
            out,
            "  {}.{}.{}.{}.{}, samplerate: {}, timerange: {} - {}",
            record.network,
            record.station,
            record.location,
            record.channel,
            record.quality,
            render_rate(record.samplerate),
            record.starttime,
            record.endtime
        )
        .context(IoSnafu)?;
        writeln!(
            out,
            "  byteoffset: {}, bytes: {}, endoffset: {}, hash: {}",
            record.byteoffset,
            record.bytes,
            record.end_offset(),
            record.hash.as_deref().unwrap_or("")
        )
        .context(IoSnafu)?;
        writeln!(
            out,
            "  filemodtime: {}, updated: {}, scanned: {}",
            record.filemodtime, record.updated, record.scanned
        )
        .context(IoSnafu)?;

        writeln!(out, "Time index: (time => byteoffset)").context(IoSnafu)?;
        for entry in &time_index {
            let shown = display_index_time(&entry.time)?;
            writeln!(out, "  {} => {}", shown, entry.offset).context(IoSnafu)?;
        }

        writeln!(out, "Time spans:").context(IoSnafu)?;
        for (span, rate) in &spans {
            let start = isoformat_space(&epoch_to_utc(span.start).context(TimeOutOfRangeSnafu)?);
            let end = isoformat_space(&epoch_to_utc(span.end).context(TimeOutOfRangeSnafu)?);
            match rate {
                Some(rate) => writeln!(out, "  {start} - {end} ({rate})").context(IoSnafu)?,
                None => writeln!(out, "  {start} - {end}").context(IoSnafu)?,
            }
        }
    }
    Ok(())
}

/// Write the SYNC listing: one pipe-delimited line per coverage span.
///
/// Rows without coverage spans contribute no lines. A span's own sample
/// rate is used when the row carries per-span rates, otherwise the row's
/// nominal rate.
pub fn write_sync<W: Write>(out: &mut W, records: &[IndexRecord]) -> Result<(), RenderError> {
    for record in records {
        let spans = record.spans_with_rates()?;
        if spans.is_empty() {
            continue;
        }

        let updated = updated_day(&record.updated).context(TimeOutOfRangeSnafu)?;
        for (span, rate) in spans {
            let start = sync_day_time(&epoch_to_utc(span.start).context(TimeOutOfRangeSnafu)?);
            let end = sync_day_time(&epoch_to_utc(span.end).context(TimeOutOfRangeSnafu)?);
            let rate = match rate {
                Some(rate) => rate.to_string(),
                None => render_rate(record.samplerate),
            };
            writeln!(
                out,
                "{}|{}|{}|{}|{}|{}||{}||||{}||NC|{}||",
                record.network,
                record.station,
                record.location,
                record.channel,
                start,
                end,
                rate,
                record.quality,
                updated
            )
            .context(IoSnafu)?;
        }
    }
    Ok(())
}

/// Render an epoch-shaped time index key as a UTC date-time; other keys
/// pass through verbatim.
fn display_index_time(time: &str) -> Result<String, RenderError> {
    let trimmed = time.trim();
    if looks_like_epoch(trimmed) {
        if let Ok(seconds) = trimmed.parse::<f64>() {
            let dt = epoch_to_utc(seconds).context(TimeOutOfRangeSnafu)?;
            return Ok(isoformat_space(&dt));
        }
    }
    Ok(time.to_string())
}

/// Sample rates print with at least one decimal place, so whole-number
/// rates render as `20.0` rather than `20`.
fn render_rate(rate: f64) -> String {
    if rate.is_finite() && rate == rate.trunc() {
        format!("{rate:.1}")
    } else {
        format!("{rate}")
    }
}
