//! Error type for the `tsinfo` binary.
//!
//! Wraps the library error chain so `main` prints one readable message and
//! exits nonzero.

use snafu::prelude::*;
use tsindex_core::{FetchError, RenderError, SelectionError};

pub type CliResult<T> = Result<T, CliError>;

/// Everything that can go wrong in a `tsinfo` run.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    /// No selection was given on the command line.
    #[snafu(display("No selection specified, use -l, -N, -S, -L, -C, -s or -e"))]
    NoSelection,

    /// The selection list file could not be read or parsed.
    #[snafu(display("Error reading selection file:\n  {source}"))]
    ReadSelections {
        #[snafu(source(from(SelectionError, Box::new)))]
        source: Box<SelectionError>,
    },

    /// The ad hoc selection options were invalid.
    #[snafu(display("Invalid selection:\n  {source}"))]
    AdHocSelection {
        #[snafu(source(from(SelectionError, Box::new)))]
        source: Box<SelectionError>,
    },

    /// Opening the catalog or fetching rows failed.
    #[snafu(display("Error fetching index rows from '{path}':\n  {source}"))]
    Fetch {
        path: String,
        #[snafu(source(from(FetchError, Box::new)))]
        source: Box<FetchError>,
    },

    /// A fetched row could not be rendered.
    #[snafu(display("Error rendering listing:\n  {source}"))]
    Render { source: RenderError },

    /// Writing the listing to stdout failed.
    #[snafu(display("Error writing listing: {source}"))]
    WriteOutput { source: std::io::Error },

    /// The Ctrl-C handler could not be installed.
    #[snafu(display("Cannot install interrupt handler: {source}"))]
    SignalHandler { source: ctrlc::Error },
}
