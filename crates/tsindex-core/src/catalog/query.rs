//! Selection resolution and the index-row query plan.
//!
//! A fetch stages the caller's selections in a temporary `request` table and
//! joins the index table against it. Two preparation steps keep that join
//! cheap:
//!
//! - When selections carry wildcards and the catalog has a populated summary
//!   table, requests are first expanded into a temporary `resolved` table of
//!   concrete channels, so the main join compares codes with `=` instead of
//!   `GLOB`.
//! - The overlap test `ts.starttime <= r.endtime AND ts.endtime >=
//!   r.starttime` leaves `ts.starttime` unbounded from below. Sections are
//!   assumed no longer than the catalog's `max_section_days`, letting the
//!   plan add `ts.starttime >= datetime(r.starttime, '-N days')` as an
//!   indexable pre-filter. Rows passing it still face the exact overlap test
//!   in the same WHERE clause.
//!
//! Time comparisons are plain text comparisons. Request times are canonical
//! date-time text, or sentinel extremes for unbounded sides, by the time
//! they reach the query. `datetime()` output carries no fractional part and
//! sorts below canonical text with the same prefix, so the derived lower
//! bound only ever widens the pre-filter.

use log::{debug, warn};
use rusqlite::{params_from_iter, OptionalExtension, Row};
use snafu::prelude::*;

use super::error::{QueryExecutionSnafu, QueryInterruptedSnafu};
use super::{Catalog, FetchError};
use crate::cancel::CancelToken;
use crate::record::IndexRecord;
use crate::selection::Selection;
use crate::timefmt::{MAX_TIME, MIN_TIME};

/// Which temporary table index rows are joined against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JoinSource {
    /// Raw request rows; codes may still hold glob patterns.
    Request,
    /// Requests expanded to concrete channels via the summary table.
    Resolved,
}

impl JoinSource {
    fn table(self) -> &'static str {
        match self {
            JoinSource::Request => "request",
            JoinSource::Resolved => "resolved",
        }
    }

    fn operator(self) -> &'static str {
        match self {
            JoinSource::Request => "GLOB",
            JoinSource::Resolved => "=",
        }
    }
}

impl Catalog {
    /// Fetch all index rows matching the given selections.
    ///
    /// Each selection matches independently and the union is returned,
    /// ordered by network, station, location, channel, quality and section
    /// start time. `filenames`, when given, restricts results to sections of
    /// those data files; an empty list matches nothing.
    ///
    /// Cancelling `token` interrupts the statement currently executing and
    /// the fetch returns [`FetchError::QueryInterrupted`]. The temporary
    /// request tables live in the connection's temp schema and are replaced
    /// on the next fetch.
    pub fn fetch(
        &self,
        selections: &[Selection],
        filenames: Option<&[String]>,
        token: &CancelToken,
    ) -> Result<Vec<IndexRecord>, FetchError> {
        let _armed = token.arm(self.conn.get_interrupt_handle());
        self.checkpoint(token)?;

        // 1) Stage the selections in a temporary request table.
        self.build_request_table(selections)?;

        // 2) With wildcards and a usable summary, expand requests into
        //    concrete channels first.
        let wildcards = selections.iter().any(Selection::has_wildcard);
        let join = if wildcards && self.summary_available()? {
            self.checkpoint(token)?;
            self.resolve_with_summary()?;
            JoinSource::Resolved
        } else {
            JoinSource::Request
        };

        // 3) Unresolved requests keep their '*' time markers; replace them
        //    with sentinel extremes so the main query only compares text.
        if join == JoinSource::Request {
            self.coerce_unbounded_times()?;
        }
        self.checkpoint(token)?;

        // 4) Join the index table against the staged rows.
        let mut rows = self.query_index_rows(join, filenames)?;
        self.checkpoint(token)?;

        // 5) Order for listing; the query itself carries no ORDER BY.
        rows.sort_unstable_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        debug!("fetched {} index rows from '{}'", rows.len(), self.table);
        Ok(rows)
    }

    fn checkpoint(&self, token: &CancelToken) -> Result<(), FetchError> {
        ensure!(!token.is_cancelled(), QueryInterruptedSnafu);
        Ok(())
    }

    fn build_request_table(&self, selections: &[Selection]) -> Result<(), FetchError> {
        sql_result(
            self.conn.execute_batch(
                "DROP TABLE IF EXISTS temp.request;\n\
                 DROP TABLE IF EXISTS temp.resolved;\n\
                 CREATE TEMPORARY TABLE request (\n\
                   network TEXT, station TEXT, location TEXT, channel TEXT,\n\
                   starttime TEXT, endtime TEXT\n\
                 );",
            ),
            "create request table",
        )?;

        let mut insert = sql_result(
            self.conn.prepare(
                "INSERT INTO request (network, station, location, channel, starttime, endtime) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            ),
            "stage request rows",
        )?;
        for selection in selections {
            sql_result(
                insert.execute((
                    &selection.network,
                    &selection.station,
                    &selection.location,
                    &selection.channel,
                    selection.start.as_sql(),
                    selection.end.as_sql(),
                )),
                "stage request rows",
            )?;
        }
        Ok(())
    }

    /// Whether a populated summary table exists alongside the index table.
    fn summary_available(&self) -> Result<bool, FetchError> {
        let name = self.summary_table();

        let exists = sql_result(
            self.conn
                .query_row(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [&name],
                    |row| row.get::<_, String>(0),
                )
                .optional(),
            "probe summary table",
        )?;
        if exists.is_none() {
            warn!(
                "no '{name}' table found, wildcards resolve directly \
                 against the index table"
            );
            return Ok(false);
        }

        let populated = sql_result(
            self.conn
                .query_row(&format!("SELECT 1 FROM {name} LIMIT 1"), [], |row| {
                    row.get::<_, i64>(0)
                })
                .optional(),
            "probe summary table",
        )?;
        if populated.is_none() {
            warn!("summary table '{name}' is empty, treating it as absent");
            return Ok(false);
        }

        Ok(true)
    }

    /// Expand request rows into concrete channels via the summary table.
    ///
    /// Unbounded request times become the channel's own earliest or latest
    /// extent, and channels whose extent misses the window drop out here,
    /// before the index table is touched.
    fn resolve_with_summary(&self) -> Result<(), FetchError> {
        let summary = self.summary_table();
        let sql = format!(
            "CREATE TEMPORARY TABLE resolved (\n\
               network TEXT, station TEXT, location TEXT, channel TEXT,\n\
               starttime TEXT, endtime TEXT\n\
             );\n\
             INSERT INTO resolved (network, station, location, channel, starttime, endtime)\n\
             SELECT DISTINCT s.network, s.station, s.location, s.channel,\n\
               CASE WHEN r.starttime = '*' THEN s.earliest ELSE r.starttime END,\n\
               CASE WHEN r.endtime = '*' THEN s.latest ELSE r.endtime END\n\
             FROM {summary} s, request r\n\
             WHERE (r.starttime = '*' OR r.starttime <= s.latest)\n\
               AND (r.endtime = '*' OR r.endtime >= s.earliest)\n\
               AND (r.network = '*' OR s.network GLOB r.network)\n\
               AND (r.station = '*' OR s.station GLOB r.station)\n\
               AND (r.location = '*' OR s.location GLOB r.location)\n\
               AND (r.channel = '*' OR s.channel GLOB r.channel);"
        );
        sql_result(self.conn.execute_batch(&sql), "resolve selections")?;
        debug!(
            "resolved selections into {} concrete requests",
            self.conn.changes()
        );
        Ok(())
    }

    fn coerce_unbounded_times(&self) -> Result<(), FetchError> {
        sql_result(
            self.conn.execute(
                "UPDATE request SET starttime = ?1 WHERE starttime = '*'",
                [MIN_TIME],
            ),
            "coerce request times",
        )?;
        sql_result(
            self.conn.execute(
                "UPDATE request SET endtime = ?1 WHERE endtime = '*'",
                [MAX_TIME],
            ),
            "coerce request times",
        )?;
        Ok(())
    }

    fn query_index_rows(
        &self,
        join: JoinSource,
        filenames: Option<&[String]>,
    ) -> Result<Vec<IndexRecord>, FetchError> {
        let table = &self.table;
        let source = join.table();
        let op = join.operator();
        let days = self.max_section_days;

        let mut sql = format!(
            "SELECT ts.network, ts.station, ts.location, ts.channel, ts.quality,\n\
               ts.starttime, ts.endtime, ts.samplerate, ts.filename,\n\
               ts.byteoffset, ts.bytes, ts.hash, ts.timeindex, ts.timespans,\n\
               ts.timerates, ts.format, ts.filemodtime, ts.updated, ts.scanned\n\
             FROM {table} ts, {source} r\n\
             WHERE ts.network {op} r.network\n\
               AND ts.station {op} r.station\n\
               AND ts.location {op} r.location\n\
               AND ts.channel {op} r.channel\n\
               AND ts.starttime <= r.endtime\n\
               AND ts.starttime >= datetime(r.starttime, '-{days} days')\n\
               AND ts.endtime >= r.starttime"
        );

        let params: Vec<&str> = match filenames {
            Some([]) => {
                // SQLite rejects `IN ()`, so an empty allow-list becomes a
                // clause matching nothing.
                sql.push_str("\n  AND 0");
                Vec::new()
            }
            Some(names) => {
                let placeholders: Vec<String> =
                    (1..=names.len()).map(|n| format!("?{n}")).collect();
                sql.push_str(&format!(
                    "\n  AND ts.filename IN ({})",
                    placeholders.join(", ")
                ));
                names.iter().map(String::as_str).collect()
            }
            None => Vec::new(),
        };

        let mut stmt = sql_result(self.conn.prepare(&sql), "query index rows")?;
        let mapped = sql_result(
            stmt.query_map(params_from_iter(params), index_record_from_row),
            "query index rows",
        )?;

        let mut rows = Vec::new();
        for row in mapped {
            rows.push(sql_result(row, "query index rows")?);
        }
        Ok(rows)
    }
}

fn index_record_from_row(row: &Row<'_>) -> rusqlite::Result<IndexRecord> {
    Ok(IndexRecord {
        network: row.get(0)?,
        station: row.get(1)?,
        location: row.get(2)?,
        channel: row.get(3)?,
        quality: row.get(4)?,
        starttime: row.get(5)?,
        endtime: row.get(6)?,
        samplerate: row.get(7)?,
        filename: row.get(8)?,
        byteoffset: row.get(9)?,
        bytes: row.get(10)?,
        hash: row.get(11)?,
        timeindex: row.get(12)?,
        timespans: row.get(13)?,
        timerates: row.get(14)?,
        format: row.get(15)?,
        filemodtime: row.get(16)?,
        updated: row.get(17)?,
        scanned: row.get(18)?,
    })
}

/// Map a SQLite result, separating interruption from other failures.
fn sql_result<T>(result: rusqlite::Result<T>, operation: &'static str) -> Result<T, FetchError> {
    match result {
        Ok(value) => Ok(value),
        Err(source) if is_interrupt(&source) => QueryInterruptedSnafu.fail(),
        Err(source) => Err(source).context(QueryExecutionSnafu { operation }),
    }
}

fn is_interrupt(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == rusqlite::ErrorCode::OperationInterrupted
    )
}
