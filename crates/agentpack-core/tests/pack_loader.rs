//! Loading pack documents from disk.

use std::fs;

use agentpack_core::pack::{load_pack, validate};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn load_json_pack_from_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("support.json");
    let document = json!({
        "metadata": {"key": "support", "name": "Support", "version": "0.2.0"},
        "agents": [{"ref_key": "a1", "name": "Helper", "model": "small"}],
        "playbooks": [{"ref_key": "pb1", "agent_ref": "a1", "name": "Refunds"}],
        "automations": [{"trigger": "on_message", "agent_ref": "a1", "enabled": true}]
    });
    fs::write(&path, serde_json::to_string_pretty(&document).unwrap()).unwrap();

    let pack = load_pack(&path).unwrap();
    assert_eq!(pack.metadata.version.as_deref(), Some("0.2.0"));
    assert_eq!(pack.agents[0].fields.get("model"), Some(&json!("small")));
    assert_eq!(pack.automations[0].fields.get("enabled"), Some(&json!(true)));
    assert!(validate(&pack).valid);
}

#[test]
fn load_toml_pack_from_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("support.toml");
    fs::write(
        &path,
        r#"
[metadata]
key = "support"
name = "Support"

[[agents]]
ref_key = "a1"

[[handoff_policies]]
name = "escalate"
agent_ref = "a1"
"#,
    )
    .unwrap();

    let pack = load_pack(&path).unwrap();
    assert_eq!(pack.handoff_policies.len(), 1);
    assert_eq!(pack.handoff_policies[0].playbook_ref, None);
}

#[test]
fn load_missing_file_errors_with_path() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("absent.json");

    let err = load_pack(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("absent.json"));
}

#[test]
fn load_malformed_toml_mentions_line() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.toml");
    fs::write(&path, "[metadata]\nkey = \n").unwrap();

    let err = load_pack(&path).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("broken.toml"));
    assert!(message.contains("TOML parsing error"));
}
