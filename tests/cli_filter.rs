use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn command_invalid() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("blastgraph")?;
    cmd.arg("foobar");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("recognized"));

    Ok(())
}

#[test]
fn command_filter() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("blastgraph")?;
    let output = cmd.arg("filter").arg("tests/blast/hits.tsv").output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(stdout.lines().count(), 13);
    assert!(stdout.starts_with("node\tshared\trelative_score\n"));
    assert!(stdout.contains("q3\ts1\t1\n"));
    assert!(stdout.contains("q8\ts10\t1\n"));
    // 80 / 100 is below 0.9
    assert!(!stdout.contains("q8\ts1\t"));

    Ok(())
}

#[test]
fn command_filter_threshold() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("blastgraph")?;
    let output = cmd
        .arg("filter")
        .arg("tests/blast/hits.tsv")
        .arg("--threshold")
        .arg("0.8")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(stdout.lines().count(), 14);
    assert!(stdout.contains("q8\ts1\t0.8\n"));

    Ok(())
}

#[test]
fn command_filter_bad_threshold() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("blastgraph")?;
    cmd.arg("filter")
        .arg("tests/blast/hits.tsv")
        .arg("--threshold")
        .arg("0");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("threshold must be in (0, 1]"));

    Ok(())
}

#[test]
fn command_filter_rows() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("blastgraph")?;
    let output = cmd
        .arg("filter")
        .arg("tests/blast/pair.tsv")
        .arg("--rows")
        .arg("1")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(stdout, "node\tshared\trelative_score\nq1\ts1\t1\n");

    Ok(())
}

#[test]
fn command_filter_no_header() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("blastgraph")?;
    let output = cmd
        .arg("filter")
        .arg("tests/blast/pair.outfmt6")
        .arg("--no-header")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(stdout.lines().count(), 3);
    assert!(stdout.contains("q1\ts1\t1\n"));
    assert!(stdout.contains("q2\ts1\t1\n"));

    Ok(())
}

#[test]
fn command_filter_malformed() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("blastgraph")?;
    cmd.arg("filter").arg("tests/blast/malformed.tsv");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("line 3"));

    Ok(())
}
