//! Shared fixtures for catalog tests: build small index databases on disk.

use std::path::Path;

use rusqlite::Connection;
use tsindex_core::IndexRecord;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// One index row to seed a test catalog with. Packed columns stay NULL;
/// the render tests cover those.
pub struct SectionSpec {
    pub network: &'static str,
    pub station: &'static str,
    pub location: &'static str,
    pub channel: &'static str,
    pub quality: &'static str,
    pub starttime: &'static str,
    pub endtime: &'static str,
    pub samplerate: f64,
    pub filename: &'static str,
    pub byteoffset: i64,
    pub bytes: i64,
}

impl Default for SectionSpec {
    fn default() -> Self {
        SectionSpec {
            network: "IU",
            station: "ANMO",
            location: "00",
            channel: "BHZ",
            quality: "M",
            starttime: "2020-01-01T00:00:00.000000",
            endtime: "2020-01-02T00:00:00.000000",
            samplerate: 20.0,
            filename: "/data/IU.ANMO.mseed",
            byteoffset: 0,
            bytes: 4096,
        }
    }
}

/// Create a catalog database at `path` holding the given index rows.
pub fn create_catalog(path: &Path, sections: &[SectionSpec]) -> TestResult {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "CREATE TABLE tsindex (
           network TEXT, station TEXT, location TEXT, channel TEXT,
           quality TEXT, version INTEGER, starttime TEXT, endtime TEXT,
           samplerate REAL, filename TEXT, byteoffset INTEGER, bytes INTEGER,
           hash TEXT, timeindex TEXT, timespans TEXT, timerates TEXT,
           format TEXT, filemodtime TEXT, updated TEXT, scanned TEXT
         );",
    )?;

    let mut insert = conn.prepare(
        "INSERT INTO tsindex (
           network, station, location, channel, quality, version, starttime,
           endtime, samplerate, filename, byteoffset, bytes, hash, timeindex,
           timespans, timerates, format, filemodtime, updated, scanned
         ) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, ?8, ?9, ?10, ?11, NULL,
                   NULL, NULL, NULL, NULL, '2020-06-01T00:00:00',
                   '2020-06-02T00:00:00', '2020-06-03T00:00:00')",
    )?;
    for section in sections {
        insert.execute((
            section.network,
            section.station,
            section.location,
            section.channel,
            section.quality,
            section.starttime,
            section.endtime,
            section.samplerate,
            section.filename,
            section.byteoffset,
            section.bytes,
        ))?;
    }
    drop(insert);

    conn.close().map_err(|(_, err)| err)?;
    Ok(())
}

/// Derive the `tsindex_summary` companion table from the index rows already
/// in the catalog at `path`.
pub fn build_summary(path: &Path) -> TestResult {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "CREATE TABLE tsindex_summary AS
           SELECT network, station, location, channel,
                  min(starttime) AS earliest, max(endtime) AS latest,
                  datetime('now') AS updt
           FROM tsindex
           GROUP BY network, station, location, channel;",
    )?;
    conn.close().map_err(|(_, err)| err)?;
    Ok(())
}

/// Channel identities of fetched rows, in fetch order.
pub fn channel_ids(rows: &[IndexRecord]) -> Vec<String> {
    rows.iter()
        .map(|r| format!("{}.{}.{}.{}", r.network, r.station, r.location, r.channel))
        .collect()
}
