//! `tsinfo`: list index rows from a SQLite time series index catalog.
//!
//! Selections come from a list file, ad hoc options, or both; matching rows
//! are printed as a detail listing or, with `--sync`, as pipe-delimited
//! SYNC lines. Ctrl-C interrupts a running query cleanly.

mod error;

use std::io::Write;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::{info, LevelFilter};
use snafu::prelude::*;
use tsindex_core::{
    read_selection_file, write_detail, write_sync, CancelToken, Catalog, Selection,
    DEFAULT_MAX_SECTION_DAYS,
};

use crate::error::{
    AdHocSelectionSnafu, CliResult, FetchSnafu, NoSelectionSnafu, ReadSelectionsSnafu, RenderSnafu,
    SignalHandlerSnafu, WriteOutputSnafu,
};

#[derive(Debug, Parser)]
#[command(
    name = "tsinfo",
    version,
    about = "List time series index rows from a SQLite catalog"
)]
struct Cli {
    /// SQLite database file holding the index catalog.
    #[arg(value_name = "SQLITE_FILE")]
    sqlite_file: PathBuf,

    /// Read selections from a file with lines of
    /// 'network station location channel starttime endtime'.
    #[arg(short = 'l', long = "list-file", value_name = "FILE")]
    list_file: Option<PathBuf>,

    /// Name of the index table inside the catalog.
    #[arg(short = 't', long = "table", default_value = "tsindex")]
    table: String,

    /// Network code or glob pattern to select.
    #[arg(short = 'N', long = "network")]
    network: Option<String>,

    /// Station code or glob pattern to select.
    #[arg(short = 'S', long = "station")]
    station: Option<String>,

    /// Location code or glob pattern to select; '--' selects a blank code.
    #[arg(short = 'L', long = "location", allow_hyphen_values = true)]
    location: Option<String>,

    /// Channel code or glob pattern to select.
    #[arg(short = 'C', long = "channel")]
    channel: Option<String>,

    /// Window start time, e.g. 2020-01-01T00:00:00, or '*' for open.
    #[arg(short = 's', long = "start-time", value_name = "TIME")]
    start_time: Option<String>,

    /// Window end time, or '*' for open.
    #[arg(short = 'e', long = "end-time", value_name = "TIME")]
    end_time: Option<String>,

    /// Restrict results to these data files, comma separated.
    #[arg(long = "filename", value_name = "FILES")]
    filename: Option<String>,

    /// Print the SYNC listing instead of the detail listing.
    #[arg(long = "sync")]
    sync: bool,

    /// Bound on the assumed length of a single section, in days.
    #[arg(
        long = "max-section-days",
        value_name = "DAYS",
        default_value_t = DEFAULT_MAX_SECTION_DAYS
    )]
    max_section_days: u32,

    /// Increase log verbosity; repeat for more detail.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // 1) Collect selections: list file first, then any ad hoc parts.
    let mut selections = Vec::new();
    if let Some(list_file) = &cli.list_file {
        selections.extend(read_selection_file(list_file).context(ReadSelectionsSnafu)?);
    }
    let ad_hoc_given = cli.network.is_some()
        || cli.station.is_some()
        || cli.location.is_some()
        || cli.channel.is_some()
        || cli.start_time.is_some()
        || cli.end_time.is_some();
    if ad_hoc_given {
        selections.push(
            Selection::ad_hoc(
                cli.network.as_deref(),
                cli.station.as_deref(),
                cli.location.as_deref(),
                cli.channel.as_deref(),
                cli.start_time.as_deref(),
                cli.end_time.as_deref(),
            )
            .context(AdHocSelectionSnafu)?,
        );
    }
    ensure!(!selections.is_empty(), NoSelectionSnafu);

    let filenames: Option<Vec<String>> = cli.filename.as_deref().map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    });

    // 2) Route Ctrl-C into query interruption instead of killing the
    //    process mid-listing.
    let token = CancelToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || handler_token.cancel()).context(SignalHandlerSnafu)?;

    // 3) Fetch matching index rows.
    let path = cli.sqlite_file.display().to_string();
    let mut catalog = Catalog::open(&cli.sqlite_file, &cli.table)
        .context(FetchSnafu { path: path.as_str() })?;
    catalog.set_max_section_days(cli.max_section_days);
    let rows = catalog
        .fetch(&selections, filenames.as_deref(), &token)
        .context(FetchSnafu { path: path.as_str() })?;

    // 4) Render the whole listing before writing so partial output never
    //    reaches stdout.
    let mut listing = Vec::new();
    if cli.sync {
        write_sync(&mut listing, &rows).context(RenderSnafu)?;
    } else {
        write_detail(&mut listing, &rows).context(RenderSnafu)?;
    }
    std::io::stdout()
        .write_all(&listing)
        .context(WriteOutputSnafu)?;

    info!("Fetched {} index rows", rows.len());

    catalog.close().context(FetchSnafu { path: path.as_str() })?;
    Ok(())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
