//! Talent-tree index: which class and spec trees the API serves.

use std::sync::OnceLock;

use bnet_client::BnetClient;
use common::Error;
use regex::Regex;

use crate::raw::TreeIndexPayload;

pub const TREE_INDEX_RESOURCE: &str = "/data/wow/talent-tree/index";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTreeLink {
    pub id: u32,
    pub url: String,
    pub class_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTreeLink {
    pub class_id: u32,
    pub spec_id: u32,
    pub url: String,
    pub spec_name: String,
}

fn class_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/talent-tree/(\d+)").expect("valid regex"))
}

fn spec_ids_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/talent-tree/(\d+)/[^/]+/(\d+)").expect("valid regex"))
}

fn strip_query(href: &str) -> &str {
    href.split('?').next().unwrap_or(href)
}

fn capture_id(captures: &regex::Captures<'_>, group: usize, url: &str) -> Result<u32, Error> {
    captures
        .get(group)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| Error::Other(format!("Unable to find id in {url}")))
}

impl ClassTreeLink {
    pub fn parse(href: &str, class_name: &str) -> Result<Self, Error> {
        let url = strip_query(href);
        let captures = class_id_pattern()
            .captures(url)
            .ok_or_else(|| Error::Other(format!("Unable to find id in {url}")))?;
        Ok(Self {
            id: capture_id(&captures, 1, url)?,
            url: url.to_string(),
            class_name: class_name.to_string(),
        })
    }
}

impl SpecTreeLink {
    pub fn parse(href: &str, spec_name: &str) -> Result<Self, Error> {
        let url = strip_query(href);
        let captures = spec_ids_pattern()
            .captures(url)
            .ok_or_else(|| Error::Other(format!("Unable to find id in {url}")))?;
        Ok(Self {
            class_id: capture_id(&captures, 1, url)?,
            spec_id: capture_id(&captures, 2, url)?,
            url: url.to_string(),
            spec_name: spec_name.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    pub class_trees: Vec<ClassTreeLink>,
    pub spec_trees: Vec<SpecTreeLink>,
}

impl TreeIndex {
    pub async fn fetch(client: &BnetClient) -> Result<Self, Error> {
        let body = client.get_static(TREE_INDEX_RESOURCE).await?;
        Self::from_payload(Error::decode(TREE_INDEX_RESOURCE, body)?)
    }

    pub fn from_payload(payload: TreeIndexPayload) -> Result<Self, Error> {
        let class_trees = payload
            .class_talent_trees
            .iter()
            .map(|entry| ClassTreeLink::parse(&entry.key.href, &entry.name))
            .collect::<Result<Vec<_>, _>>()?;
        let spec_trees = payload
            .spec_talent_trees
            .iter()
            .map(|entry| SpecTreeLink::parse(&entry.key.href, &entry.name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            class_trees,
            spec_trees,
        })
    }

    pub fn class_link(&self, class_name: &str) -> Option<&ClassTreeLink> {
        self.class_trees.iter().find(|l| l.class_name == class_name)
    }

    pub fn class_name(&self, class_id: u32) -> Option<&str> {
        self.class_trees
            .iter()
            .find(|l| l.id == class_id)
            .map(|l| l.class_name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_links() {
        let class = ClassTreeLink::parse(
            "https://us.api.blizzard.com/data/wow/talent-tree/793?namespace=static-10.2.5_52554-us",
            "Druid",
        )
        .unwrap();
        assert_eq!(class.id, 793);
        assert_eq!(class.url, "https://us.api.blizzard.com/data/wow/talent-tree/793");

        let spec = SpecTreeLink::parse(
            "https://us.api.blizzard.com/data/wow/talent-tree/793/playable-specialization/102?namespace=static-us",
            "Balance",
        )
        .unwrap();
        assert_eq!((spec.class_id, spec.spec_id), (793, 102));
        assert!(!spec.url.contains('?'));
    }

    #[test]
    fn test_link_without_ids_is_an_error() {
        assert!(ClassTreeLink::parse("https://us.api.blizzard.com/data/wow/talent/1", "Druid").is_err());
        assert!(SpecTreeLink::parse(
            "https://us.api.blizzard.com/data/wow/talent-tree/793",
            "Balance"
        )
        .is_err());
    }

    #[test]
    fn test_index_lookups() {
        let payload: TreeIndexPayload = serde_json::from_value(json!({
            "class_talent_trees": [
                {"key": {"href": "https://us.api.blizzard.com/data/wow/talent-tree/793?x=1"}, "name": "Druid"},
                {"key": {"href": "https://us.api.blizzard.com/data/wow/talent-tree/781?x=1"}, "name": "Warrior"}
            ],
            "spec_talent_trees": [
                {"key": {"href": "https://us.api.blizzard.com/data/wow/talent-tree/793/playable-specialization/102?x=1"}, "name": "Balance"}
            ]
        }))
        .unwrap();
        let index = TreeIndex::from_payload(payload).unwrap();
        assert_eq!(index.class_name(781), Some("Warrior"));
        assert_eq!(index.class_name(1), None);
        assert_eq!(index.class_link("Druid").map(|l| l.id), Some(793));
        assert_eq!(index.spec_trees.len(), 1);
    }
}
