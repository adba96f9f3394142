//! Errors surfaced by catalog operations.

use snafu::prelude::*;

/// Errors from opening a catalog or fetching index rows.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FetchError {
    /// The catalog database file does not exist.
    #[snafu(display("catalog database not found: {path}"))]
    CatalogNotFound {
        /// Path that was checked.
        path: String,
    },

    /// The index table name is not identifier-shaped.
    #[snafu(display("invalid index table name '{name}'"))]
    InvalidTableName {
        /// The rejected name.
        name: String,
    },

    /// A SQLite operation failed.
    #[snafu(display("catalog operation failed ({operation}): {source}"))]
    QueryExecution {
        /// Which operation was running.
        operation: &'static str,
        /// Underlying SQLite error.
        source: rusqlite::Error,
    },

    /// The fetch was cancelled before it completed.
    #[snafu(display("query interrupted before completion"))]
    QueryInterrupted,
}
