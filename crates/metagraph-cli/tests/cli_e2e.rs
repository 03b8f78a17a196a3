use std::fs;
use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

fn metagraph_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_metagraph"))
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/fixtures")
        .join(name)
}

#[test]
fn build_from_definitions_writes_metadata() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("ontology_ready_metadata.json");

    let status = Command::new(metagraph_bin())
        .arg("build")
        .arg("--definitions")
        .arg(fixture("foundation_tables.json"))
        .args(["--strategy", "curated"])
        .arg("-o")
        .arg(&out)
        .status()
        .expect("run metagraph build");
    assert!(status.success());

    let value: Value = serde_json::from_str(&fs::read_to_string(&out).expect("read output"))
        .expect("output is JSON");
    assert_eq!(value["tables"].as_array().map(Vec::len), Some(10));
    assert_eq!(value["relationships"].as_array().map(Vec::len), Some(6));
}

#[test]
fn build_from_dictionaries_with_dedup() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("metadata.json");

    let status = Command::new(metagraph_bin())
        .arg("build")
        .arg("--dictionaries")
        .arg(fixture("dictionaries"))
        .args(["--dedup", "unordered"])
        .arg("-o")
        .arg(&out)
        .status()
        .expect("run metagraph build");
    assert!(status.success());

    let value: Value = serde_json::from_str(&fs::read_to_string(&out).expect("read output"))
        .expect("output is JSON");
    assert_eq!(value["relationships"].as_array().map(Vec::len), Some(1));
}

#[test]
fn build_logs_a_summary_to_stderr() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("metadata.json");

    let run = |filter: &str| {
        Command::new(metagraph_bin())
            .arg("build")
            .arg("--definitions")
            .arg(fixture("foundation_tables.json"))
            .arg("-o")
            .arg(&out)
            .env("METAGRAPH_LOG", filter)
            .output()
            .expect("run metagraph build")
    };

    let output = run("info");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("metadata graph written"), "stderr: {stderr}");

    let quiet = run("warn");
    assert!(quiet.status.success());
    assert!(!String::from_utf8_lossy(&quiet.stderr).contains("metadata graph written"));
}

#[test]
fn build_requires_a_source() {
    let output = Command::new(metagraph_bin())
        .arg("build")
        .output()
        .expect("run metagraph build");
    assert!(!output.status.success());
}

#[test]
fn annotate_owl_reports_counts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("annotated.owl");

    let output = Command::new(metagraph_bin())
        .arg("annotate-owl")
        .arg(fixture("ontology.owl"))
        .arg("-o")
        .arg(&out)
        .env("NO_COLOR", "1")
        .output()
        .expect("run metagraph annotate-owl");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 comments added"), "{stdout}");
    assert!(fs::read_to_string(&out)
        .expect("read annotated")
        .contains("A Deposit concept represented in the ontology."));
}

#[test]
fn docs_fails_when_model_is_unreachable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("ontology_outputs.json");

    let output = Command::new(metagraph_bin())
        .arg("docs")
        .arg("--grounding")
        .arg(fixture("grounding.json"))
        .arg("--textual")
        .arg(fixture("textual.json"))
        .args(["--host", "http://127.0.0.1:9"])
        .args(["--retries", "0", "--timeout-secs", "2", "--fail-fast"])
        .arg("-o")
        .arg(&out)
        .env("NO_COLOR", "1")
        .output()
        .expect("run metagraph docs");
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("foundation.financial.deposits_v4"), "{stderr}");
    let written: Value = serde_json::from_str(&fs::read_to_string(&out).expect("read output"))
        .expect("output is JSON");
    assert_eq!(written, Value::Array(Vec::new()));
}
