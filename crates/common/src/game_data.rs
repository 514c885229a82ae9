//! Static class/spec tables.
//!
//! Kept as data (`data/game_data.json`) so a patch that adds a spec only
//! touches the table, and the table can be tested on its own.

use std::collections::HashMap;

use serde::Deserialize;

use crate::Error;

const BUILTIN_GAME_DATA: &str = include_str!("../data/game_data.json");

#[derive(Debug, Clone, Deserialize)]
struct GameDataFile {
    classes: Vec<ClassEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassEntry {
    pub name: String,
    pub specs: Vec<SpecEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpecEntry {
    pub id: u32,
    pub name: String,
}

/// Immutable lookup tables over every playable class and specialization.
#[derive(Debug, Clone)]
pub struct GameData {
    classes: Vec<ClassEntry>,
    by_spec_id: HashMap<u32, (String, String)>,
}

impl GameData {
    /// Parse the table shipped with the binary.
    pub fn builtin() -> Result<Self, Error> {
        Self::from_json(BUILTIN_GAME_DATA)
    }

    pub fn from_json(raw: &str) -> Result<Self, Error> {
        let file: GameDataFile = serde_json::from_str(raw)?;
        let mut by_spec_id = HashMap::new();
        for class in &file.classes {
            for spec in &class.specs {
                let previous =
                    by_spec_id.insert(spec.id, (class.name.clone(), spec.name.clone()));
                if previous.is_some() {
                    return Err(Error::Config(format!(
                        "spec id {} listed twice in game data",
                        spec.id
                    )));
                }
            }
        }
        Ok(Self {
            classes: file.classes,
            by_spec_id,
        })
    }

    pub fn classes(&self) -> &[ClassEntry] {
        &self.classes
    }

    /// Every (class, spec) pair in table order.
    pub fn class_specs(&self) -> Vec<(String, String)> {
        self.classes
            .iter()
            .flat_map(|c| c.specs.iter().map(move |s| (c.name.clone(), s.name.clone())))
            .collect()
    }

    pub fn class_spec_by_spec_id(&self, spec_id: u32) -> Option<(&str, &str)> {
        self.by_spec_id
            .get(&spec_id)
            .map(|(c, s)| (c.as_str(), s.as_str()))
    }

    pub fn spec_id_by_class_spec(&self, class_name: &str, spec_name: &str) -> Option<u32> {
        self.classes
            .iter()
            .find(|c| c.name == class_name)?
            .specs
            .iter()
            .find(|s| s.name == spec_name)
            .map(|s| s.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_shape() {
        let data = GameData::builtin().expect("builtin table should parse");
        assert_eq!(data.classes().len(), 13);
        assert_eq!(data.class_specs().len(), 39);
    }

    #[test]
    fn test_spec_ids_round_trip() {
        let data = GameData::builtin().unwrap();
        for (class_name, spec_name) in data.class_specs() {
            let id = data
                .spec_id_by_class_spec(&class_name, &spec_name)
                .expect("every spec has an id");
            assert_eq!(
                data.class_spec_by_spec_id(id),
                Some((class_name.as_str(), spec_name.as_str()))
            );
        }
    }

    #[test]
    fn test_shared_spec_names_resolve_per_class() {
        let data = GameData::builtin().unwrap();
        assert_eq!(data.spec_id_by_class_spec("Druid", "Restoration"), Some(105));
        assert_eq!(data.spec_id_by_class_spec("Shaman", "Restoration"), Some(264));
        assert_eq!(data.class_spec_by_spec_id(64), Some(("Mage", "Frost")));
        assert_eq!(data.class_spec_by_spec_id(251), Some(("Death Knight", "Frost")));
        assert_eq!(data.spec_id_by_class_spec("Druid", "Frost"), None);
    }

    #[test]
    fn test_duplicate_spec_id_rejected() {
        let raw = r#"{"classes": [
            {"name": "A", "specs": [{"id": 1, "name": "X"}]},
            {"name": "B", "specs": [{"id": 1, "name": "Y"}]}
        ]}"#;
        assert!(matches!(GameData::from_json(raw), Err(Error::Config(_))));
    }
}
