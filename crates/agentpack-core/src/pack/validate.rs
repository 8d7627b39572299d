//! Pre-flight validation of template packs.
//!
//! Validation is pure: it never touches the store and reports every
//! violation it finds instead of stopping at the first one.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::schema::{EntitySpec, TemplatePack};
use crate::types::EntityKind;

/// Outcome of validating a pack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Declared `ref_key`s per referenceable kind.
struct DeclaredKeys<'a> {
    keys: HashMap<EntityKind, HashSet<&'a str>>,
}

impl<'a> DeclaredKeys<'a> {
    fn contains(&self, kind: EntityKind, key: &str) -> bool {
        self.keys
            .get(&kind)
            .map(|keys| keys.contains(key))
            .unwrap_or(false)
    }
}

/// Validate a pack's structure and references.
pub fn validate(pack: &TemplatePack) -> ValidationReport {
    let mut errors = Vec::new();

    if pack.metadata.key.trim().is_empty() {
        errors.push("metadata.key is required".to_string());
    }
    if pack.metadata.name.trim().is_empty() {
        errors.push("metadata.name is required".to_string());
    }

    if pack.agents.is_empty() {
        errors.push("pack must declare at least one agent".to_string());
    }

    let mut declared = DeclaredKeys {
        keys: HashMap::new(),
    };
    declared
        .keys
        .insert(EntityKind::Agent, collect_keys(&pack.agents, &mut errors));
    declared.keys.insert(
        EntityKind::Playbook,
        collect_keys(&pack.playbooks, &mut errors),
    );
    declared.keys.insert(
        EntityKind::AgentState,
        collect_keys(&pack.agent_states, &mut errors),
    );

    check_refs(&pack.playbooks, &declared, &mut errors);
    check_refs(&pack.agent_states, &declared, &mut errors);
    check_refs(&pack.playbook_rules, &declared, &mut errors);
    check_refs(&pack.playbook_tables, &declared, &mut errors);
    check_refs(&pack.agent_state_steps, &declared, &mut errors);
    check_refs(&pack.channel_bindings, &declared, &mut errors);
    check_refs(&pack.handoff_policies, &declared, &mut errors);
    check_refs(&pack.automations, &declared, &mut errors);

    check_blank_keys(&pack.agents, &mut errors);
    check_blank_keys(&pack.playbooks, &mut errors);
    check_blank_keys(&pack.agent_states, &mut errors);

    if let Some(version) = pack.metadata.version.as_deref()
        && let Err(err) = semver::Version::parse(version)
    {
        errors.push(format!(
            "metadata.version \"{}\" is not a valid semver version: {}",
            version, err
        ));
    }

    ValidationReport::from_errors(errors)
}

/// Collect `ref_key`s of one kind, reporting duplicates.
fn collect_keys<'a, S: EntitySpec>(specs: &'a [S], errors: &mut Vec<String>) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for key in specs.iter().filter_map(|spec| spec.ref_key()) {
        if !seen.insert(key) {
            errors.push(format!(
                "duplicate {} ref_key \"{}\"",
                S::KIND.label().to_lowercase(),
                key
            ));
        }
    }
    seen
}

fn check_refs<S: EntitySpec>(specs: &[S], declared: &DeclaredKeys<'_>, errors: &mut Vec<String>) {
    for spec in specs {
        for reference in spec.references() {
            if !declared.contains(reference.target, reference.key) {
                errors.push(format!(
                    "{} \"{}\": {} \"{}\" not found",
                    S::KIND.label().to_lowercase(),
                    spec.describe(),
                    reference.field,
                    reference.key
                ));
            }
        }
    }
}

fn check_blank_keys<S: EntitySpec>(specs: &[S], errors: &mut Vec<String>) {
    let blank = specs
        .iter()
        .filter_map(|spec| spec.ref_key())
        .filter(|key| key.trim().is_empty())
        .count();
    if blank > 0 {
        errors.push(format!(
            "{} {} spec(s) missing ref_key",
            blank,
            S::KIND.label().to_lowercase()
        ));
    }
}
