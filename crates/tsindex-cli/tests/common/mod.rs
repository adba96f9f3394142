//! Build a small catalog database for CLI tests.

use std::path::Path;

use rusqlite::Connection;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// A catalog with two channels and a summary table. The ANMO row carries
/// packed time index and span columns so both listing formats have
/// something to show.
pub fn create_catalog(path: &Path) -> TestResult {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "CREATE TABLE tsindex (
           network TEXT, station TEXT, location TEXT, channel TEXT,
           quality TEXT, version INTEGER, starttime TEXT, endtime TEXT,
           samplerate REAL, filename TEXT, byteoffset INTEGER, bytes INTEGER,
           hash TEXT, timeindex TEXT, timespans TEXT, timerates TEXT,
           format TEXT, filemodtime TEXT, updated TEXT, scanned TEXT
         );
         INSERT INTO tsindex VALUES
           ('IU', 'ANMO', '00', 'BHZ', 'M', 1,
            '2010-01-01T00:00:00.000000', '2010-01-01T01:00:00.000000', 20.0,
            '/data/IU.ANMO.mseed', 0, 4096, 'a1b2c3',
            '1262304000.0=>0,1262305800.0=>2048',
            '[1262304000.0:1262307600.0]', NULL, NULL,
            '2010-01-02T00:00:00', '2010-01-03T00:00:00',
            '2010-01-04T00:00:00'),
           ('IU', 'COLA', '20', 'LHZ', 'M', 1,
            '2010-02-01T00:00:00.000000', '2010-02-02T00:00:00.000000', 1.0,
            '/data/IU.COLA.mseed', 0, 8192, NULL, NULL,
            '[1264982400.0:1265068800.0]', NULL, NULL,
            '2010-02-02T00:00:00', '2010-02-03T00:00:00',
            '2010-02-04T00:00:00');
         CREATE TABLE tsindex_summary AS
           SELECT network, station, location, channel,
                  min(starttime) AS earliest, max(endtime) AS latest,
                  datetime('now') AS updt
           FROM tsindex
           GROUP BY network, station, location, channel;",
    )?;
    conn.close().map_err(|(_, err)| err)?;
    Ok(())
}
