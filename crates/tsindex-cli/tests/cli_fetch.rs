//! End-to-end runs of the `tsinfo` binary against a catalog on disk.

mod common;

use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

use common::TestResult;

fn tsinfo() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("tsinfo"))
}

#[test]
fn refuses_to_run_without_a_selection() -> TestResult {
    let dir = TempDir::new()?;
    let db = dir.path().join("catalog.sqlite");
    common::create_catalog(&db)?;

    tsinfo()
        .arg(&db)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No selection specified"));
    Ok(())
}

#[test]
fn detail_listing_for_ad_hoc_selection() -> TestResult {
    let dir = TempDir::new()?;
    let db = dir.path().join("catalog.sqlite");
    common::create_catalog(&db)?;

    tsinfo()
        .arg(&db)
        .args(["-N", "IU", "-S", "ANMO"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/data/IU.ANMO.mseed:"))
        .stdout(predicate::str::contains(
            "  IU.ANMO.00.BHZ.M, samplerate: 20.0, timerange: \
             2010-01-01T00:00:00.000000 - 2010-01-01T01:00:00.000000",
        ))
        .stdout(predicate::str::contains(
            "  byteoffset: 0, bytes: 4096, endoffset: 4096, hash: a1b2c3",
        ))
        .stdout(predicate::str::contains("  2010-01-01 00:30:00 => 2048"))
        .stdout(predicate::str::contains(
            "  2010-01-01 00:00:00 - 2010-01-01 01:00:00",
        ))
        .stdout(predicate::str::contains("IU.COLA").not());
    Ok(())
}

#[test]
fn sync_listing_emits_pipe_rows() -> TestResult {
    let dir = TempDir::new()?;
    let db = dir.path().join("catalog.sqlite");
    common::create_catalog(&db)?;

    tsinfo()
        .arg(&db)
        .args(["--sync", "-N", "IU"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "IU|ANMO|00|BHZ|2010,001,00:00:00.000000|2010,001,01:00:00.000000\
             ||20.0||||M||NC|2010,003||",
        ))
        .stdout(predicate::str::contains(
            "IU|COLA|20|LHZ|2010,032,00:00:00.000000|2010,033,00:00:00.000000\
             ||1.0||||M||NC|2010,034||",
        ));
    Ok(())
}

#[test]
fn selection_file_drives_the_fetch() -> TestResult {
    let dir = TempDir::new()?;
    let db = dir.path().join("catalog.sqlite");
    common::create_catalog(&db)?;
    let list = dir.path().join("selections.txt");
    std::fs::write(&list, "# channels of interest\nIU COLA 20 LHZ * *\n")?;

    tsinfo()
        .arg(&db)
        .arg("-l")
        .arg(&list)
        .assert()
        .success()
        .stdout(predicate::str::contains("/data/IU.COLA.mseed:"))
        .stdout(predicate::str::contains("IU.ANMO").not());
    Ok(())
}

#[test]
fn malformed_selection_file_names_the_line() -> TestResult {
    let dir = TempDir::new()?;
    let db = dir.path().join("catalog.sqlite");
    common::create_catalog(&db)?;
    let list = dir.path().join("selections.txt");
    std::fs::write(&list, "IU ANMO -- BHZ 2010-01-01\n")?;

    tsinfo()
        .arg(&db)
        .arg("-l")
        .arg(&list)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error reading selection file"))
        .stderr(predicate::str::contains("line 1"));
    Ok(())
}

#[test]
fn filename_option_restricts_listing() -> TestResult {
    let dir = TempDir::new()?;
    let db = dir.path().join("catalog.sqlite");
    common::create_catalog(&db)?;

    tsinfo()
        .arg(&db)
        .args(["-N", "IU", "--filename", "/data/IU.COLA.mseed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("IU.COLA"))
        .stdout(predicate::str::contains("IU.ANMO").not());
    Ok(())
}

#[test]
fn verbose_reports_row_count_on_stderr() -> TestResult {
    let dir = TempDir::new()?;
    let db = dir.path().join("catalog.sqlite");
    common::create_catalog(&db)?;

    tsinfo()
        .arg(&db)
        .args(["-N", "IU", "-S", "ANMO", "-v"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Fetched 1 index rows"));
    Ok(())
}

#[test]
fn missing_catalog_fails_with_message() {
    tsinfo()
        .args(["-N", "IU"])
        .arg("/nonexistent/catalog.sqlite")
        .assert()
        .failure()
        .stderr(predicate::str::contains("catalog database not found"));
}
