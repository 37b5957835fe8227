//! Manifest files: named resource records, used both for desired
//! configuration and for persisted state.
//!
//! ```json
//! [
//!   {"name": "analysts", "resource": {"kind": "group", "id": "analysts"}},
//!   {"name": "jane-in-analysts", "resource": {"kind": "group_membership", "group_id": "analysts", "user_id": "jane"}}
//! ]
//! ```
//!
//! Desired and prior records are paired by `name`, so a changed identity
//! field shows up as a replacement rather than an unrelated delete and
//! create.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use lakefs_rbac::{ResourceKind, ResourceState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub resource: ResourceState,
}

/// One named instance with its desired and prior records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    pub name: String,
    pub desired: Option<ResourceState>,
    pub prior: Option<ResourceState>,
}

impl Pairing {
    pub fn kind(&self) -> Option<ResourceKind> {
        self.desired
            .as_ref()
            .or(self.prior.as_ref())
            .map(ResourceState::kind)
    }
}

fn read_source(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

/// Reads a single state record from `path`, or stdin.
pub fn read_record(path: Option<&Path>) -> Result<ResourceState> {
    let content = read_source(path)?;
    serde_json::from_str(&content).context("Invalid state record")
}

/// Reads a manifest, rejecting duplicate names.
pub fn read_manifest(path: &Path) -> Result<Vec<Entry>> {
    let content = read_source(Some(path))?;
    parse_manifest(&content).with_context(|| format!("Invalid manifest: {}", path.display()))
}

/// Reads a manifest if `path` is given and exists; a missing state file is
/// an empty state.
pub fn read_state(path: Option<&Path>) -> Result<Vec<Entry>> {
    match path {
        Some(path) if path.exists() => read_manifest(path),
        _ => Ok(Vec::new()),
    }
}

pub fn parse_manifest(content: &str) -> Result<Vec<Entry>> {
    let entries: Vec<Entry> = serde_json::from_str(content)?;
    let mut seen = BTreeSet::new();
    for entry in &entries {
        if !seen.insert(entry.name.as_str()) {
            anyhow::bail!("Duplicate name in manifest: {}", entry.name);
        }
    }
    Ok(entries)
}

pub fn write_manifest(path: Option<&Path>, entries: &[Entry]) -> Result<()> {
    let content = serde_json::to_string_pretty(entries)?;
    match path {
        Some(path) => fs::write(path, content + "\n")
            .with_context(|| format!("Failed to write state: {}", path.display())),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}

fn rank(kind: ResourceKind) -> usize {
    ResourceKind::ALL
        .iter()
        .position(|k| *k == kind)
        .unwrap_or(ResourceKind::ALL.len())
}

/// Pairs desired and prior entries by name, in execution order.
///
/// Removals come first, edges before the entities they reference. Then
/// everything desired, entities before edges, keeping manifest order within
/// a kind.
pub fn pair(desired: Vec<Entry>, prior: Vec<Entry>) -> Vec<Pairing> {
    let mut prior: BTreeMap<String, ResourceState> = prior
        .into_iter()
        .map(|e| (e.name, e.resource))
        .collect();

    let mut kept: Vec<Pairing> = desired
        .into_iter()
        .map(|e| Pairing {
            prior: prior.remove(&e.name),
            name: e.name,
            desired: Some(e.resource),
        })
        .collect();
    kept.sort_by_key(|p| p.kind().map(rank));

    let mut removed: Vec<Pairing> = prior
        .into_iter()
        .map(|(name, state)| Pairing {
            name,
            desired: None,
            prior: Some(state),
        })
        .collect();
    removed.sort_by_key(|p| std::cmp::Reverse(p.kind().map(rank)));

    removed.extend(kept);
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use lakefs_rbac::{Group, GroupMembership, User};

    fn entry(name: &str, resource: ResourceState) -> Entry {
        Entry {
            name: name.into(),
            resource,
        }
    }

    #[test]
    fn test_parse_manifest() {
        let entries = parse_manifest(
            r#"[
                {"name": "g", "resource": {"kind": "group", "id": "g1", "description": "d"}},
                {"name": "m", "resource": {"kind": "group_membership", "group_id": "g1", "user_id": "u1"}}
            ]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].resource.kind(), ResourceKind::GroupMembership);
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let err = parse_manifest(
            r#"[
                {"name": "x", "resource": {"kind": "user", "id": "u1"}},
                {"name": "x", "resource": {"kind": "user", "id": "u2"}}
            ]"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate name"));
    }

    #[test]
    fn test_pairing_orders_removals_then_creations() {
        let membership = ResourceState::GroupMembership(GroupMembership {
            group_id: "g1".into(),
            user_id: "u1".into(),
        });
        let desired = vec![
            entry("m", membership.clone()),
            entry("u", User::new("u1").into()),
        ];
        let prior = vec![
            entry("old-group", Group::new("g0").into()),
            entry("old-member", membership.clone()),
            entry("u", User::new("u1").into()),
        ];

        let names: Vec<String> = pair(desired, prior).into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["old-member", "old-group", "u", "m"]);
    }

    #[test]
    fn test_pairing_matches_by_name() {
        let pairs = pair(
            vec![entry("u", User::new("u2").into())],
            vec![entry("u", User::new("u1").into())],
        );
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].prior, Some(User::new("u1").into()));
        assert_eq!(pairs[0].desired, Some(User::new("u2").into()));
    }
}
