// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Integration tests for the rifts CLI commands

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const HEADER: &str = "SOURCE_SUBREDDIT\tTARGET_SUBREDDIT\tPOST_ID\tTIMESTAMP\tPOST_LABEL\tPOST_PROPERTIES\n";

/// Write a small hyperlink dataset and return its path
///
/// `raiders` sends negative links to six communities that all pile on
/// `punchbag`; `friendly` only links positively.
fn write_dataset(dir: &TempDir) -> PathBuf {
    let mut tsv = String::from(HEADER);
    for i in 0..6 {
        tsv.push_str(&format!("raiders\tvictim{i}\tr{i}\t2016-01-0{} 10:00:00\t-1\t0.1,0.2\n", i + 1));
        tsv.push_str(&format!("victim{i}\tpunchbag\tv{i}\t2016-02-0{} 10:00:00\t-1\t0.1,0.2\n", i + 1));
    }
    tsv.push_str("friendly\tpunchbag\tf1\t2016-03-01 10:00:00\t1\t0.1\n");
    tsv.push_str("friendly\traiders\tf2\t2016-03-02 10:00:00\t0\t0.1\n");
    tsv.push_str("broken\trow\n");

    let path = dir.path().join("soc-redditHyperlinks-body.tsv");
    fs::write(&path, tsv).unwrap();
    path
}

/// A `rifts` command isolated from the user's config and environment
fn rifts(dir: &TempDir) -> Command {
    let config = dir.path().join("rifts.toml");
    if !config.exists() {
        fs::write(&config, "").unwrap();
    }
    let mut cmd = Command::cargo_bin("rifts").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("RIFTS_CONFIG")
        .env("NO_COLOR", "1")
        .arg("--config")
        .arg(&config);
    cmd
}

#[test]
fn test_analyze_text_report() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);

    rifts(&dir)
        .arg("analyze")
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("negative links: 12"))
        .stdout(predicate::str::contains("raiders"))
        .stdout(predicate::str::contains("punchbag"))
        .stdout(predicate::str::contains("Roles"));
}

#[test]
fn test_analyze_json_report() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);

    let output = rifts(&dir).arg("--json").arg("analyze").arg(&data).output().unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["negative_links"], 12);
    assert_eq!(report["load"]["skipped"], 1);
    assert_eq!(report["role_census"]["instigator"], 1);
    assert_eq!(report["role_census"]["target"], 1);
}

#[test]
fn test_no_color_env_values() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);

    for value in ["1", "yes", "", "0", "true"] {
        rifts(&dir)
            .env("NO_COLOR", value)
            .args(["rank", "--top", "1"])
            .arg(&data)
            .assert()
            .success()
            .stdout(predicate::str::contains("raiders"))
            .stdout(predicate::str::contains("\u{1b}[").not());
    }
}

#[test]
fn test_no_color_flag() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);

    rifts(&dir)
        .env_remove("NO_COLOR")
        .args(["--no-color", "roles"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("\u{1b}[").not());
}

#[test]
fn test_roles_filter() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);

    rifts(&dir)
        .args(["roles", "--role", "instigator"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("raiders"))
        .stdout(predicate::str::contains("punchbag").not());
}

#[test]
fn test_roles_unknown_community_unclassified() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);

    let output = rifts(&dir)
        .args(["--json", "roles", "--role", "unclassified"])
        .arg(&data)
        .output()
        .unwrap();
    assert!(output.status.success());

    let roles: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert!(roles.iter().any(|r| r["id"] == "friendly"));
}

#[test]
fn test_roles_rejects_bad_ratio() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);

    rifts(&dir)
        .args(["roles", "--ratio", "0.5"])
        .arg(&data)
        .assert()
        .failure();

    rifts(&dir)
        .args(["roles", "--ratio", "NaN"])
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("roles.dominance_ratio"));
}

#[test]
fn test_rank_by_in_degree() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);

    rifts(&dir)
        .args(["rank", "--by", "in-degree", "--top", "1"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("1. punchbag"));
}

#[test]
fn test_communities_json() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);

    let output = rifts(&dir)
        .args(["--json", "communities"])
        .arg(&data)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(report["count"].as_u64().unwrap() >= 1);
}

#[test]
fn test_communities_rejects_nan_resolution() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);

    rifts(&dir)
        .args(["communities", "--resolution", "NaN"])
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("community.resolution"));
}

#[test]
fn test_export_formats() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);

    rifts(&dir)
        .arg("export")
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("digraph"));

    rifts(&dir)
        .args(["export", "-f", "tsv"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("raiders\tvictim0\t1\t"));

    let out = dir.path().join("graph.json");
    rifts(&dir)
        .args(["export", "-f", "json", "-o"])
        .arg(&out)
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported to"));

    let graph: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(graph["edges"].as_array().unwrap().len(), 12);
    assert_eq!(graph["nodes"].as_array().unwrap().len(), 8);

    let out = dir.path().join("graph.graphml");
    rifts(&dir)
        .args(["export", "-f", "graphml", "-o"])
        .arg(&out)
        .arg(&data)
        .assert()
        .success();

    let xml = fs::read_to_string(&out).unwrap();
    assert!(xml.contains("<graph id=\"hostility\" edgedefault=\"directed\">"));
    assert_eq!(xml.matches("<node id=").count(), 8);
    assert_eq!(xml.matches("<edge source=").count(), 12);
    assert!(xml.contains("<edge source=\"raiders\" target=\"victim0\">"));
    assert!(xml.contains("<data key=\"first_link\">2016-01-01 10:00:00</data>"));
}

#[test]
fn test_time_window() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);

    let output = rifts(&dir)
        .args(["--json", "analyze", "--since", "2016-02-01"])
        .arg(&data)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["negative_links"], 6);
}

#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();

    rifts(&dir)
        .arg("analyze")
        .arg(dir.path().join("missing.tsv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.tsv"));
}

#[test]
fn test_missing_config_fails() {
    let dir = TempDir::new().unwrap();
    let data = write_dataset(&dir);

    Command::cargo_bin("rifts")
        .unwrap()
        .env_remove("RIFTS_CONFIG")
        .arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("analyze")
        .arg(&data)
        .assert()
        .failure();
}

#[test]
fn test_config_key_lookup() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("rifts.toml"), "[roles]\nmin_activity = 3\n").unwrap();

    rifts(&dir)
        .args(["config", "roles.min_activity"])
        .assert()
        .success()
        .stdout("3\n");

    rifts(&dir)
        .args(["config", "roles.nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"));
}

#[test]
fn test_config_env_override() {
    let dir = TempDir::new().unwrap();

    rifts(&dir)
        .env("RIFTS__REPORT__TOP", "3")
        .args(["config", "report.top"])
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();

    rifts(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rifts"));
}
