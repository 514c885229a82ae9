//! Per-spec corrections for trees the API gets wrong.
//!
//! The table is data: a JSON document embedded at build time, replaceable
//! by a file at runtime when a patch breaks a spec before a release ships.

use std::collections::HashSet;
use std::path::Path;

use common::Error;
use serde::Deserialize;

const BUILTIN_OVERRIDES: &str = include_str!("../data/tree_overrides.json");

/// How a spec's tree is built.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeStrategy {
    /// Use the spec tree endpoint as served.
    #[default]
    Standard,
    /// Ignore the spec tree endpoint and rebuild from the reference table.
    ReconstructFromReference,
    /// Use the spec tree endpoint, removing the listed nodes first.
    PatchKnownDefect { drop_nodes: Vec<u32> },
}

/// Node layout exported from the game client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReferenceNode {
    pub id: u32,
    #[serde(default)]
    pub locked_by: Vec<u32>,
    #[serde(default)]
    pub flags: u32,
    pub pos_x: i32,
    pub pos_y: i32,
    pub talent_ids: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReferenceTree {
    pub class_name: String,
    #[serde(default)]
    pub class_id: u32,
    pub spec_name: String,
    #[serde(default)]
    pub spec_id: u32,
    pub nodes: Vec<ReferenceNode>,
}

#[derive(Debug, Clone, Deserialize)]
struct StrategyEntry {
    class_name: String,
    spec_name: String,
    strategy: TreeStrategy,
}

#[derive(Debug, Clone, Deserialize)]
struct OverridesFile {
    #[serde(default)]
    known_bad_nodes: Vec<u32>,
    #[serde(default)]
    strategies: Vec<StrategyEntry>,
    #[serde(default)]
    reference_trees: Vec<ReferenceTree>,
}

#[derive(Debug, Clone)]
pub struct StrategyTable {
    known_bad_nodes: Vec<u32>,
    strategies: Vec<StrategyEntry>,
    reference_trees: Vec<ReferenceTree>,
}

impl StrategyTable {
    pub fn builtin() -> Result<Self, Error> {
        Self::from_json(BUILTIN_OVERRIDES)
    }

    /// The built-in table, or the one at `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("cannot read tree overrides {}: {e}", path.display()))
                })?;
                Self::from_json(&raw)
            }
            None => Self::builtin(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, Error> {
        let file: OverridesFile = serde_json::from_str(raw)
            .map_err(|e| Error::Config(format!("invalid tree overrides: {e}")))?;

        let mut seen = HashSet::new();
        for entry in &file.strategies {
            if !seen.insert((entry.class_name.as_str(), entry.spec_name.as_str())) {
                return Err(Error::Config(format!(
                    "tree overrides list {} - {} twice",
                    entry.class_name, entry.spec_name
                )));
            }
            let needs_reference = entry.strategy == TreeStrategy::ReconstructFromReference;
            let has_reference = file
                .reference_trees
                .iter()
                .any(|t| t.class_name == entry.class_name && t.spec_name == entry.spec_name);
            if needs_reference && !has_reference {
                return Err(Error::Config(format!(
                    "{} - {} is rebuilt from reference data but has no reference tree",
                    entry.class_name, entry.spec_name
                )));
            }
        }
        for tree in &file.reference_trees {
            if let Some(node) = tree.nodes.iter().find(|n| n.talent_ids.is_empty()) {
                return Err(Error::Config(format!(
                    "reference node {} of {} - {} has no talents",
                    node.id, tree.class_name, tree.spec_name
                )));
            }
        }

        Ok(Self {
            known_bad_nodes: file.known_bad_nodes,
            strategies: file.strategies,
            reference_trees: file.reference_trees,
        })
    }

    pub fn strategy_for(&self, class_name: &str, spec_name: &str) -> TreeStrategy {
        self.strategies
            .iter()
            .find(|e| e.class_name == class_name && e.spec_name == spec_name)
            .map(|e| e.strategy.clone())
            .unwrap_or_default()
    }

    pub fn reference_tree(&self, class_name: &str, spec_name: &str) -> Option<&ReferenceTree> {
        self.reference_trees
            .iter()
            .find(|t| t.class_name == class_name && t.spec_name == spec_name)
    }

    /// Nodes removed from a spec's tree before reachability filtering.
    pub fn deny_list(&self, strategy: &TreeStrategy) -> HashSet<u32> {
        let mut deny: HashSet<u32> = self.known_bad_nodes.iter().copied().collect();
        if let TreeStrategy::PatchKnownDefect { drop_nodes } = strategy {
            deny.extend(drop_nodes.iter().copied());
        }
        deny
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let table = StrategyTable::builtin().unwrap();
        assert_eq!(
            table.deny_list(&TreeStrategy::Standard),
            [91046, 91047].into_iter().collect()
        );
        assert_eq!(table.strategy_for("Druid", "Balance"), TreeStrategy::Standard);
        assert!(table.reference_tree("Druid", "Restoration").is_none());
    }

    #[test]
    fn test_strategies_and_deny_list() {
        let table = StrategyTable::from_json(
            r#"{
                "known_bad_nodes": [1],
                "strategies": [
                    {"class_name": "Warrior", "spec_name": "Arms",
                     "strategy": {"kind": "patch_known_defect", "drop_nodes": [7, 8]}},
                    {"class_name": "Monk", "spec_name": "Mistweaver",
                     "strategy": {"kind": "reconstruct_from_reference"}}
                ],
                "reference_trees": [
                    {"class_name": "Monk", "class_id": 10, "spec_name": "Mistweaver", "spec_id": 270,
                     "nodes": [{"id": 5, "locked_by": [], "flags": 0, "pos_x": 1, "pos_y": 2, "talent_ids": [9]}]}
                ]
            }"#,
        )
        .unwrap();

        let arms = table.strategy_for("Warrior", "Arms");
        let deny = table.deny_list(&arms);
        assert_eq!(deny, [1, 7, 8].into_iter().collect());
        assert_eq!(
            table.strategy_for("Monk", "Mistweaver"),
            TreeStrategy::ReconstructFromReference
        );
        assert_eq!(table.reference_tree("Monk", "Mistweaver").unwrap().nodes.len(), 1);
        assert_eq!(table.deny_list(&TreeStrategy::Standard), [1].into_iter().collect());
    }

    #[test]
    fn test_reference_strategy_requires_reference_tree() {
        let result = StrategyTable::from_json(
            r#"{"strategies": [{"class_name": "Monk", "spec_name": "Mistweaver",
                               "strategy": {"kind": "reconstruct_from_reference"}}]}"#,
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overrides.json");
        std::fs::write(&path, r#"{"known_bad_nodes": [42]}"#).unwrap();
        let table = StrategyTable::load(Some(&path)).unwrap();
        assert_eq!(table.deny_list(&TreeStrategy::Standard), [42].into_iter().collect());

        let missing = StrategyTable::load(Some(&dir.path().join("nope.json")));
        assert!(matches!(missing, Err(Error::Config(_))));
    }
}
