//! CLI integration tests.
//!
//! These drive the compiled `stagehand` binary against a project laid
//! out in a temp directory, with a wiremock node standing in for the
//! JSON-RPC endpoint where a test needs one. Global config discovery is
//! pinned to paths inside the fixture so a developer's own
//! `~/.stagehand/config.toml` never leaks in.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn addr(fill: &str) -> String {
    format!("0x{}", fill.repeat(40 / fill.len()))
}

fn placeholder(name: &str) -> String {
    format!("__{name:_<38}")
}

fn artifact(contract: &str, bytecode: &str, abi: Value) -> String {
    json!({
        "contractName": contract,
        "abi": abi,
        "bytecode": bytecode,
    })
    .to_string()
}

/// ABI-encode an address as the 32-byte word `eth_call` returns.
fn address_word(address: &str) -> String {
    format!("0x{}{}", "0".repeat(24), address.trim_start_matches("0x"))
}

/// A registry that answers `word` for lookups containing `name` and the
/// zero word for everything else.
async fn registry_node(name: &str, word: &str) -> MockServer {
    let server = MockServer::start().await;
    // Specific mock first: wiremock serves the earliest mounted match
    Mock::given(method("POST"))
        .and(body_string_contains(hex::encode(name)))
        .respond_with(rpc_result(word))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(rpc_result(&format!("0x{}", "0".repeat(64))))
        .mount(&server)
        .await;
    server
}

fn rpc_result(value: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": value,
    }))
}

/// Lay out a full project: config, build artifacts, report, libraries.
fn project(rpc_url: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    dir.child("stagehand.toml")
        .write_str(&format!(
            r#"rpc_url = "{rpc_url}"
from = "{from}"
registry = "{registry}"
build_dir = "build"

[[units]]
name = "Governance"

[[units]]
name = "Registry"

[[units]]
name = "Exchange"

[[units]]
name = "LinkedList"
kind = "library"
"#,
            from = addr("aa"),
            registry = addr("ce"),
        ))
        .unwrap();

    let build = dir.child("build");
    build.create_dir_all().unwrap();
    for unit in ["Governance", "Registry"] {
        build
            .child(format!("{unit}.json"))
            .write_str(&artifact(unit, "0x6060", json!([])))
            .unwrap();
        build
            .child(format!("{unit}Proxy.json"))
            .write_str(&artifact(&format!("{unit}Proxy"), "0x5050", json!([])))
            .unwrap();
    }
    build
        .child("Exchange.json")
        .write_str(&artifact(
            "Exchange",
            &format!("0x6060{}6040", placeholder("LinkedList")),
            json!([]),
        ))
        .unwrap();
    build
        .child("ExchangeProxy.json")
        .write_str(&artifact("ExchangeProxy", "0x5050", json!([])))
        .unwrap();
    build
        .child("LinkedList.json")
        .write_str(&artifact("LinkedList", "0x4040", json!([])))
        .unwrap();

    dir.child("report.json")
        .write_str(
            &json!({
                "contracts": {
                    "Exchange": {
                        "changes": {
                            "storage": [{"type": "VariableAdded", "description": "bucket"}],
                            "major": []
                        }
                    }
                }
            })
            .to_string(),
        )
        .unwrap();
    dir.child("libraries.json")
        .write_str(&json!({ "LinkedList": addr("4d") }).to_string())
        .unwrap();

    dir
}

/// A command rooted in the project with global config discovery pinned
/// to fixture-local paths.
fn stagehand(project: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("stagehand").unwrap();
    cmd.current_dir(project.path())
        .env("STAGEHAND_CONFIG", project.path().join("no-global.toml"))
        .env("XDG_CONFIG_HOME", project.path().join("xdg"))
        .env("HOME", project.path().join("home"));
    cmd
}

// =============================================================================
// release
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dry_run_release_previews_and_writes_the_proposal() {
    let server = registry_node("Governance", &address_word(&addr("1a"))).await;
    let project = project(&server.uri());

    stagehand(&project)
        .args([
            "release",
            "--report",
            "report.json",
            "--libraries",
            "libraries.json",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "dry run: deployments use stand-in addresses and nothing is sent",
        ))
        .stdout(predicate::str::contains("proposal (2 transaction(s)):"))
        .stdout(predicate::str::contains("register Exchange at its new proxy"))
        .stdout(predicate::str::contains(
            "install the new Exchange implementation",
        ))
        .stdout(predicate::str::contains("proposal digest: sha256:"))
        .stdout(predicate::str::contains(
            "wrote 2 transaction(s) to proposal.json",
        ));

    let written = std::fs::read_to_string(project.path().join("proposal.json")).unwrap();
    let txs: Vec<Value> = serde_json::from_str(&written).unwrap();
    assert_eq!(txs.len(), 2);
    assert_eq!(txs[0]["target"], "Registry");
    assert_eq!(txs[0]["function"], "setAddressFor");
    assert_eq!(txs[0]["args"][0], "Exchange");
    let proxy = txs[0]["args"][1].as_str().unwrap();
    assert!(proxy.starts_with("0x") && proxy.len() == 42);
    assert_eq!(txs[1]["target"], "ExchangeProxy");
    assert_eq!(txs[1]["function"], "setImplementation");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn quiet_mode_still_writes_the_proposal_file() {
    let server = registry_node("Governance", &address_word(&addr("1a"))).await;
    let project = project(&server.uri());

    stagehand(&project)
        .args([
            "--quiet",
            "release",
            "--report",
            "report.json",
            "--libraries",
            "libraries.json",
            "--dry-run",
            "--output",
            "out/proposal.json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert!(project.path().join("out/proposal.json").exists());
}

#[test]
fn release_requires_a_unit_catalog() {
    let dir = TempDir::new().unwrap();
    dir.child("stagehand.toml")
        .write_str("rpc_url = \"http://127.0.0.1:1\"\n")
        .unwrap();

    stagehand(&dir)
        .args(["release", "--report", "report.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unit catalog is empty"));
}

#[test]
fn release_requires_a_report_flag() {
    let dir = TempDir::new().unwrap();
    stagehand(&dir)
        .arg("release")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--report"));
}

#[test]
fn missing_report_file_fails_cleanly() {
    // The report parses before any chain traffic, so no node is needed
    let project = project("http://127.0.0.1:1");

    stagehand(&project)
        .args(["release", "--report", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read report"));
}

#[test]
fn release_help_shows_workflow_examples() {
    let dir = TempDir::new().unwrap();
    stagehand(&dir)
        .args(["release", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("WORKFLOW EXAMPLES:"))
        .stdout(predicate::str::contains("--dry-run"));
}

// =============================================================================
// addresses
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn addresses_lists_every_catalog_unit() {
    let server = registry_node("Exchange", &address_word(&addr("3c"))).await;
    let project = project(&server.uri());

    stagehand(&project)
        .args(["addresses", "--libraries", "libraries.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exchange").and(predicate::str::contains(addr("3c"))))
        .stdout(predicate::str::contains(addr("4d")))
        .stdout(predicate::str::contains("(unregistered)"));
}

// =============================================================================
// completion
// =============================================================================

#[test]
fn completion_emits_a_bash_script() {
    let dir = TempDir::new().unwrap();
    stagehand(&dir)
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stagehand"));
}
