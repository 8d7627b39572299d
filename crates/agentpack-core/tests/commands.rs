//! Command-level flows through `AppContext` with temporary config dirs.

use std::fs;
use std::path::Path;

use agentpack_core::commands::apply::{ApplyCommand, ApplyOptions, ApplyReport};
use agentpack_core::commands::clear::{ClearCommand, ClearOptions};
use agentpack_core::context::AppContext;
use agentpack_core::deploy::NoProgress;
use agentpack_core::types::EntityKind;
use serde_json::json;
use tempfile::TempDir;

struct Workspace {
    _temp: TempDir,
    project: std::path::PathBuf,
    global: std::path::PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("project");
        let global = temp.path().join("global");
        fs::create_dir_all(&project).unwrap();
        fs::create_dir_all(&global).unwrap();
        Self {
            _temp: temp,
            project,
            global,
        }
    }

    fn ctx(&self) -> AppContext {
        AppContext::with_global_config_dir(self.project.clone(), self.global.clone())
    }

    fn write(&self, dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn pack(&self, document: serde_json::Value) -> std::path::PathBuf {
        self.write(&self.project, "pack.json", &document.to_string())
    }
}

fn valid_pack() -> serde_json::Value {
    json!({
        "metadata": {"key": "support", "name": "Support"},
        "agents": [{"ref_key": "a1", "name": "Helper"}],
        "playbooks": [{"ref_key": "pb1", "agent_ref": "a1"}],
        "agent_states": [{"ref_key": "s1", "agent_ref": "a1"}]
    })
}

#[test]
fn context_prefers_project_config_over_global() {
    let ws = Workspace::new();
    ws.write(&ws.global, "agentpack.toml", "default_tenant = \"global\"\n");
    ws.write(&ws.project, "agentpack.toml", "default_tenant = \"project\"\n");

    let ctx = ws.ctx();
    let config = ctx.config().unwrap();
    assert_eq!(config.default_tenant.as_deref(), Some("project"));
    assert_eq!(
        ctx.config_store().config_path(),
        Some(ws.project.join("agentpack.toml").as_path())
    );
}

#[test]
fn context_falls_back_to_defaults_without_config() {
    let ws = Workspace::new();
    let ctx = ws.ctx();

    let config = ctx.config().unwrap();
    assert_eq!(config.store.kind, None);
    assert!(ctx.config_store().config_path().is_none());
    assert!(ctx.entity_store(&config).is_err());

    let err = ctx.resolve_tenant(None, &config).unwrap_err();
    assert!(err.to_string().contains("--tenant"));
    assert_eq!(ctx.resolve_tenant(Some("t9"), &config).unwrap(), "t9");
}

#[test]
fn context_explicit_config_file_wins() {
    let ws = Workspace::new();
    ws.write(&ws.project, "agentpack.toml", "default_tenant = \"project\"\n");
    let explicit = ws.write(&ws.global, "other.toml", "default_tenant = \"explicit\"\n");

    let config = ws.ctx().with_config_file(&explicit).config().unwrap();
    assert_eq!(config.default_tenant.as_deref(), Some("explicit"));
}

#[test]
fn context_http_store_requires_url() {
    let ws = Workspace::new();
    ws.write(&ws.project, "agentpack.toml", "[store]\nkind = \"http\"\n");

    let ctx = ws.ctx();
    let result = ctx.config().and_then(|config| ctx.entity_store(&config).map(|_| ()));
    assert!(result.is_err());
}

#[tokio::test]
async fn apply_command_uses_default_tenant() {
    let ws = Workspace::new();
    ws.write(
        &ws.project,
        "agentpack.toml",
        "default_tenant = \"acme\"\n\n[store]\nkind = \"memory\"\n",
    );
    let pack = ws.pack(valid_pack());

    let report = ApplyCommand::new(ws.ctx())
        .execute(&ApplyOptions::new(&pack), &mut NoProgress)
        .await
        .unwrap();

    match report {
        ApplyReport::Applied { result, dry_run } => {
            assert!(!dry_run);
            assert!(result.success, "{:?}", result.errors);
            assert_eq!(result.tenant_id, "acme");
            assert_eq!(result.pack_key, "support");
            assert_eq!(result.counts.get(EntityKind::AgentState), 1);
            assert_eq!(result.counts.total(), 3);
        }
        other => panic!("expected applied, got {:?}", other),
    }
}

#[tokio::test]
async fn apply_command_without_store_refuses_unless_dry_run() {
    let ws = Workspace::new();
    let pack = ws.pack(valid_pack());
    let command = ApplyCommand::new(ws.ctx());

    let err = command
        .execute(&ApplyOptions::new(&pack).with_tenant("acme"), &mut NoProgress)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("[store]"), "{}", err);

    let report = command
        .execute(
            &ApplyOptions::new(&pack).with_tenant("acme").with_dry_run(true),
            &mut NoProgress,
        )
        .await
        .unwrap();
    let ApplyReport::Applied { result, dry_run } = report else {
        panic!("expected the engine to run");
    };
    assert!(dry_run);
    assert!(result.success);
}

#[tokio::test]
async fn apply_command_rejects_invalid_pack() {
    let ws = Workspace::new();
    let pack = ws.pack(json!({
        "metadata": {"key": "support", "name": "Support"},
        "agents": [{"ref_key": "a1"}],
        "playbooks": [{"ref_key": "pb1", "agent_ref": "ghost"}]
    }));

    let options = ApplyOptions::new(&pack).with_tenant("t1");
    let report = ApplyCommand::new(ws.ctx())
        .execute(&options, &mut NoProgress)
        .await
        .unwrap();

    match &report {
        ApplyReport::Rejected(validation) => {
            assert!(!validation.valid);
            assert_eq!(validation.errors.len(), 1);
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["status"], json!("rejected"));
}

#[tokio::test]
async fn apply_command_skip_validation_runs_engine() {
    let ws = Workspace::new();
    let pack = ws.pack(json!({
        "metadata": {"key": "support", "name": "Support"},
        "agents": [{"ref_key": "a1"}],
        "playbooks": [{"ref_key": "pb1", "agent_ref": "ghost"}]
    }));

    let options = ApplyOptions::new(&pack)
        .with_tenant("t1")
        .with_skip_validation(true)
        .with_dry_run(true);
    let report = ApplyCommand::new(ws.ctx())
        .execute(&options, &mut NoProgress)
        .await
        .unwrap();

    let ApplyReport::Applied { result, dry_run } = report else {
        panic!("expected the engine to run");
    };
    assert!(dry_run);
    assert!(!result.success);
    assert_eq!(result.counts.get(EntityKind::Agent), 1);
    assert_eq!(result.errors, vec!["pb1: agent_ref not resolved".to_string()]);
}

#[tokio::test]
async fn clear_command_on_memory_store_clears_nothing() {
    let ws = Workspace::new();
    ws.write(&ws.project, "agentpack.toml", "[store]\nkind = \"memory\"\n");
    let command = ClearCommand::new(ws.ctx());
    let options = ClearOptions::new().with_tenant("t1");

    assert_eq!(command.target_tenant(&options).unwrap(), "t1");
    let result = command.execute(&options, &mut NoProgress).await.unwrap();
    assert!(result.success);
    assert!(result.counts.is_zero());
}

#[tokio::test]
async fn clear_command_without_store_fails() {
    let ws = Workspace::new();
    let command = ClearCommand::new(ws.ctx());
    let options = ClearOptions::new().with_tenant("t1");

    let err = command.target_tenant(&options).unwrap_err();
    assert!(err.to_string().contains("No Entity Store configured"));
    assert!(command.execute(&options, &mut NoProgress).await.is_err());
}

#[tokio::test]
async fn clear_command_without_tenant_fails() {
    let ws = Workspace::new();
    ws.write(&ws.project, "agentpack.toml", "[store]\nkind = \"memory\"\n");
    let err = ClearCommand::new(ws.ctx())
        .execute(&ClearOptions::new(), &mut NoProgress)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("No tenant given"));
}
