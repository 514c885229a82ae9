//! Talent tree JSON artifact consumed by the UI.
//!
//! Same shape as [`TalentTree`] with an `icon` on every node talent and PvP
//! talent.

use std::collections::HashMap;

use common::{Error, Spell, Talent, TalentNode, TalentTree};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TalentTreeJson {
    pub class_name: String,
    pub class_id: u32,
    pub spec_name: String,
    pub spec_id: u32,
    pub class_nodes: Vec<NodeJson>,
    pub spec_nodes: Vec<NodeJson>,
    pub pvp_talents: Vec<TalentJson>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeJson {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub row: i32,
    pub col: i32,
    pub unlocks: Vec<u32>,
    pub locked_by: Vec<u32>,
    pub talents: Vec<TalentJson>,
    pub max_rank: u8,
    pub node_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TalentJson {
    pub id: u32,
    pub name: String,
    pub icon: String,
    pub spell: Spell,
}

fn talent_json(talent: &Talent, icons: &HashMap<u32, String>) -> Result<TalentJson, Error> {
    let icon = icons
        .get(&talent.spell.id)
        .ok_or_else(|| Error::Other(format!("no icon for spell {}", talent.spell.id)))?;
    Ok(TalentJson {
        id: talent.id,
        name: talent.name.clone(),
        icon: icon.clone(),
        spell: talent.spell.clone(),
    })
}

fn node_json(node: &TalentNode, icons: &HashMap<u32, String>) -> Result<NodeJson, Error> {
    Ok(NodeJson {
        id: node.id,
        x: node.x,
        y: node.y,
        row: node.row,
        col: node.col,
        unlocks: node.unlocks.clone(),
        locked_by: node.locked_by.clone(),
        talents: node
            .talents
            .iter()
            .map(|t| talent_json(t, icons))
            .collect::<Result<_, _>>()?,
        max_rank: node.max_rank,
        node_type: node.node_type.clone(),
    })
}

impl TalentTreeJson {
    /// Attach icons to a tree. Every spell must have one.
    pub fn from_tree(tree: &TalentTree, icons: &HashMap<u32, String>) -> Result<Self, Error> {
        let nodes = |nodes: &[TalentNode]| -> Result<Vec<NodeJson>, Error> {
            nodes.iter().map(|n| node_json(n, icons)).collect()
        };
        Ok(Self {
            class_name: tree.class_name.clone(),
            class_id: tree.class_id,
            spec_name: tree.spec_name.clone(),
            spec_id: tree.spec_id,
            class_nodes: nodes(&tree.class_nodes)?,
            spec_nodes: nodes(&tree.spec_nodes)?,
            pvp_talents: tree
                .pvp_talents
                .iter()
                .map(|t| talent_json(t, icons))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Split an artifact back into the tree and its icon map.
    pub fn into_tree(self) -> (TalentTree, HashMap<u32, String>) {
        let mut icons = HashMap::new();
        let mut talent = |t: TalentJson| {
            icons.insert(t.spell.id, t.icon);
            Talent {
                id: t.id,
                name: t.name,
                spell: t.spell,
            }
        };
        let mut node = |n: NodeJson| TalentNode {
            id: n.id,
            x: n.x,
            y: n.y,
            row: n.row,
            col: n.col,
            unlocks: n.unlocks,
            locked_by: n.locked_by,
            talents: n.talents.into_iter().map(&mut talent).collect(),
            max_rank: n.max_rank,
            node_type: n.node_type,
        };

        let class_nodes = self.class_nodes.into_iter().map(&mut node).collect();
        let spec_nodes = self.spec_nodes.into_iter().map(&mut node).collect();
        let pvp_talents = self.pvp_talents.into_iter().map(&mut talent).collect();

        let tree = TalentTree {
            class_name: self.class_name,
            class_id: self.class_id,
            spec_name: self.spec_name,
            spec_id: self.spec_id,
            class_nodes,
            spec_nodes,
            pvp_talents,
        };
        (tree, icons)
    }

    /// Output file name, e.g. `death-knight-frost.json`.
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}.json",
            self.class_name.to_lowercase().replace(' ', "-"),
            self.spec_name.to_lowercase().replace(' ', "-")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Rank;

    fn tree() -> TalentTree {
        let talent = |id: u32, spell_id: u32| Talent {
            id,
            name: format!("Talent {id}"),
            spell: Spell {
                id: spell_id,
                name: format!("Spell {spell_id}"),
                ranks: vec![Rank::described("desc")],
            },
        };
        TalentTree {
            class_name: "Death Knight".into(),
            class_id: 812,
            spec_name: "Frost".into(),
            spec_id: 251,
            class_nodes: vec![TalentNode {
                id: 1,
                x: 0,
                y: 0,
                row: 1,
                col: 1,
                unlocks: vec![],
                locked_by: vec![],
                talents: vec![talent(10, 100), talent(11, 101)],
                max_rank: 1,
                node_type: "CHOICE".into(),
            }],
            spec_nodes: vec![],
            pvp_talents: vec![talent(20, 200)],
        }
    }

    #[test]
    fn test_icons_attached() {
        let icons: HashMap<u32, String> = [(100, "a"), (101, "b"), (200, "c")]
            .into_iter()
            .map(|(k, v)| (k, v.to_string()))
            .collect();
        let json = TalentTreeJson::from_tree(&tree(), &icons).unwrap();
        assert_eq!(json.class_nodes[0].talents[1].icon, "b");
        assert_eq!(json.pvp_talents[0].icon, "c");
        assert_eq!(json.file_name(), "death-knight-frost.json");

        let (back, back_icons) = json.into_tree();
        assert_eq!(back, tree());
        assert_eq!(back_icons, icons);
    }

    #[test]
    fn test_missing_icon_is_an_error() {
        let icons: HashMap<u32, String> = [(100, "a".to_string())].into_iter().collect();
        assert!(TalentTreeJson::from_tree(&tree(), &icons).is_err());
    }
}
