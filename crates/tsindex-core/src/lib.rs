//! Query engine for SQLite time series index catalogs.
//!
//! This crate reads the index tables produced by a miniSEED-style catalog
//! scanner and answers coverage questions about them:
//!
//! - Strongly-typed selections (network, station, location, channel plus a
//!   time window) with strict parsing for selection list files
//!   (`selection` module).
//! - A read-only catalog handle that resolves wildcarded selections against
//!   a channel summary table and plans an index-friendly join over the main
//!   index table (`catalog` module).
//! - Decoders for the packed time-index and time-span encodings stored in
//!   index rows (`record` module).
//! - Two listing formats over fetched rows: a readable per-section dump and
//!   the pipe-delimited SYNC interchange format (`render` module).
//! - Cooperative cancellation of in-flight queries (`cancel` module).
//!
//! Front ends (for example a CLI) are expected to depend on this crate
//! rather than re-implementing the selection or planning logic.
#![deny(missing_docs)]

pub mod cancel;
pub mod catalog;
pub mod record;
pub mod render;
pub mod selection;
pub mod timefmt;

pub use cancel::CancelToken;
pub use catalog::{Catalog, FetchError, DEFAULT_MAX_SECTION_DAYS};
pub use record::{IndexRecord, RecordError, TimeIndexEntry, TimeSpan};
pub use render::{write_detail, write_sync, RenderError};
pub use selection::{read_selection_file, Selection, SelectionError, TimeBound};
