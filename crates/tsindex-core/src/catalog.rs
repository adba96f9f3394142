//! Read-only access to a time series index catalog.
//!
//! A catalog is a SQLite database holding an index table, one row per
//! contiguous section of a data file, and optionally a `<table>_summary`
//! companion table with one row per channel giving its earliest and latest
//! data times. [`Catalog::open`] opens the database read-only with a busy
//! timeout; [`Catalog::fetch`] resolves selections against it.

mod error;
mod query;

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};
use snafu::prelude::*;

pub use self::error::FetchError;
use self::error::{CatalogNotFoundSnafu, InvalidTableNameSnafu, QueryExecutionSnafu};

/// Default bound on the assumed length of a single section, in days.
///
/// The overlap test in the fetch query leaves the section start unbounded
/// from below, which defeats an index range scan. Sections are assumed to
/// span at most this many days so the query can add a derived lower bound;
/// sections longer than the bound are missed. Day-file and similar archives
/// stay well under it.
pub const DEFAULT_MAX_SECTION_DAYS: u32 = 10;

/// An open index catalog.
#[derive(Debug)]
pub struct Catalog {
    conn: Connection,
    table: String,
    max_section_days: u32,
}

impl Catalog {
    /// Open the catalog database read-only.
    ///
    /// The file must already exist; opening never creates a database. The
    /// index table name is validated here because it is interpolated into
    /// query text. Concurrent writers are tolerated with a 10 second busy
    /// timeout.
    pub fn open(path: &Path, table: &str) -> Result<Self, FetchError> {
        ensure!(
            path.exists(),
            CatalogNotFoundSnafu {
                path: path.display().to_string()
            }
        );
        ensure!(is_valid_table_name(table), InvalidTableNameSnafu { name: table });

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)
            .context(QueryExecutionSnafu { operation: "open database" })?;
        conn.busy_timeout(Duration::from_secs(10))
            .context(QueryExecutionSnafu { operation: "set busy timeout" })?;

        Ok(Catalog {
            conn,
            table: table.to_string(),
            max_section_days: DEFAULT_MAX_SECTION_DAYS,
        })
    }

    /// Current bound on assumed section length, in days.
    pub fn max_section_days(&self) -> u32 {
        self.max_section_days
    }

    /// Override the bound on assumed section length.
    ///
    /// Larger values make fetches scan more of the index; smaller values
    /// can miss sections longer than the bound.
    pub fn set_max_section_days(&mut self, days: u32) {
        self.max_section_days = days;
    }

    /// Close the catalog, surfacing any error SQLite held back.
    pub fn close(self) -> Result<(), FetchError> {
        self.conn
            .close()
            .map_err(|(_conn, source)| source)
            .context(QueryExecutionSnafu { operation: "close database" })
    }

    fn summary_table(&self) -> String {
        format!("{}_summary", self.table)
    }
}

/// Table names are interpolated into query text, so only identifier-shaped
/// names are accepted.
fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
