//! Builds a [`TalentTree`] for every targeted class/spec.
//!
//! Specs listed by the index are built from their spec tree (or from
//! reference data when the strategy table says the API is wrong for them).
//! Targeted specs missing from the index are rebuilt from the class tree
//! plus reference data.

use std::collections::{HashMap, HashSet};

use bnet_client::{BnetClient, Namespace};
use common::{Error, GameData, TalentNode, TalentTree};
use futures_util::{pin_mut, StreamExt};
use tracing::{debug, info, warn};

use crate::filter::filter_nodes;
use crate::index::{SpecTreeLink, TreeIndex};
use crate::node::{self, from_raw_node};
use crate::pvp::PvpCatalog;
use crate::raw::{ClassTreePayload, RawNode, SpecTreePayload, TalentDetail};
use crate::strategy::{ReferenceTree, StrategyTable, TreeStrategy};

/// Identity of the tree under construction.
struct TreeId<'a> {
    class_name: &'a str,
    class_id: u32,
    spec_name: &'a str,
    spec_id: u32,
}

impl TreeId<'_> {
    fn assemble(
        &self,
        class_nodes: Vec<TalentNode>,
        spec_nodes: Vec<TalentNode>,
        deny: &HashSet<u32>,
        pvp: &PvpCatalog,
        game_data: &GameData,
    ) -> TalentTree {
        TalentTree {
            class_name: self.class_name.to_string(),
            class_id: self.class_id,
            spec_name: self.spec_name.to_string(),
            spec_id: self.spec_id,
            class_nodes: filter_nodes(class_nodes, deny),
            spec_nodes: filter_nodes(spec_nodes, deny),
            pvp_talents: pvp.talents_for(self.class_name, self.spec_name, game_data),
        }
    }
}

pub struct TreeAssembler<'a> {
    client: &'a BnetClient,
    game_data: &'a GameData,
    strategies: &'a StrategyTable,
    targets: Vec<(String, String)>,
}

impl<'a> TreeAssembler<'a> {
    /// Assembler targeting every class/spec in `game_data`.
    pub fn new(client: &'a BnetClient, game_data: &'a GameData, strategies: &'a StrategyTable) -> Self {
        Self {
            client,
            game_data,
            strategies,
            targets: game_data.class_specs(),
        }
    }

    pub fn with_targets(mut self, targets: Vec<(String, String)>) -> Self {
        self.targets = targets;
        self
    }

    /// Build every targeted tree: index order first, then missing specs.
    pub async fn build_all(&self) -> Result<Vec<TalentTree>, Error> {
        let index = TreeIndex::fetch(self.client).await?;
        let pvp = PvpCatalog::fetch(self.client).await?;
        info!(
            "Talent index lists {} class trees and {} spec trees",
            index.class_trees.len(),
            index.spec_trees.len()
        );

        let mut remaining = self.targets.clone();
        let mut trees = Vec::with_capacity(remaining.len());

        for link in &index.spec_trees {
            let class_name = index.class_name(link.class_id).ok_or_else(|| {
                Error::Other(format!("Unable to find class with id: {}", link.class_id))
            })?;
            let Some(position) = remaining
                .iter()
                .position(|(c, s)| c == class_name && *s == link.spec_name)
            else {
                continue;
            };
            remaining.remove(position);

            let tree = self
                .build_listed(class_name, link, &pvp)
                .await
                .map_err(|e| e.in_tree(class_name, &link.spec_name))?;
            info!(
                "Built {} - {}: {} class nodes, {} spec nodes, {} pvp talents",
                tree.class_name,
                tree.spec_name,
                tree.class_nodes.len(),
                tree.spec_nodes.len(),
                tree.pvp_talents.len()
            );
            trees.push(tree);
        }

        for (class_name, spec_name) in &remaining {
            let tree = self
                .build_missing(class_name, spec_name, &index, &pvp)
                .await
                .map_err(|e| e.in_tree(class_name, spec_name))?;
            trees.push(tree);
        }

        Ok(trees)
    }

    async fn build_listed(
        &self,
        class_name: &str,
        link: &SpecTreeLink,
        pvp: &PvpCatalog,
    ) -> Result<TalentTree, Error> {
        let id = TreeId {
            class_name,
            class_id: link.class_id,
            spec_name: &link.spec_name,
            spec_id: link.spec_id,
        };
        let strategy = self.strategies.strategy_for(class_name, &link.spec_name);
        let deny = self.strategies.deny_list(&strategy);

        let (class_nodes, spec_nodes) = match strategy {
            TreeStrategy::ReconstructFromReference => {
                warn!("Using fallback for {} - {}", class_name, link.spec_name);
                let reference = self.reference(class_name, &link.spec_name)?;
                self.nodes_from_reference(reference).await?
            }
            TreeStrategy::Standard | TreeStrategy::PatchKnownDefect { .. } => {
                let body = self.client.get_static(&link.url).await?;
                let payload: SpecTreePayload = Error::decode(&link.url, body)?;
                (
                    convert_nodes(&payload.class_talent_nodes)?,
                    convert_nodes(&payload.spec_talent_nodes)?,
                )
            }
        };

        Ok(id.assemble(class_nodes, spec_nodes, &deny, pvp, self.game_data))
    }

    fn reference(&self, class_name: &str, spec_name: &str) -> Result<&'a ReferenceTree, Error> {
        self.strategies
            .reference_tree(class_name, spec_name)
            .ok_or_else(|| Error::Tree {
                class_name: class_name.to_string(),
                spec_name: spec_name.to_string(),
                message: "no reference data available".into(),
            })
    }

    /// Rebuild every reference node from its talents' detail payloads.
    async fn nodes_from_reference(
        &self,
        reference: &ReferenceTree,
    ) -> Result<(Vec<TalentNode>, Vec<TalentNode>), Error> {
        let requests: Vec<(String, (usize, usize))> = reference
            .nodes
            .iter()
            .enumerate()
            .flat_map(|(n, node)| {
                node.talent_ids
                    .iter()
                    .enumerate()
                    .map(move |(t, talent_id)| (talent_resource(*talent_id), (n, t)))
            })
            .collect();

        let mut details: Vec<Vec<Option<TalentDetail>>> = reference
            .nodes
            .iter()
            .map(|node| (0..node.talent_ids.len()).map(|_| None).collect())
            .collect();

        let responses = self.client.get_many(requests, Namespace::Static, true);
        pin_mut!(responses);
        while let Some(fetched) = responses.next().await {
            let fetched = fetched?;
            let (n, t) = fetched.context;
            let resource = talent_resource(reference.nodes[n].talent_ids[t]);
            let body = fetched.body.ok_or_else(|| Error::Api {
                status: fetched.status,
                url: resource.clone(),
                body: String::new(),
            })?;
            details[n][t] = Some(Error::decode(&resource, body)?);
        }

        let mut class_nodes = Vec::new();
        let mut spec_nodes = Vec::new();
        for (reference_node, node_details) in reference.nodes.iter().zip(details) {
            let node_details: Vec<TalentDetail> = node_details.into_iter().flatten().collect();
            let node = node::from_reference_node(reference_node, &node_details)?;
            if node::is_spec_node(&node_details) {
                spec_nodes.push(node);
            } else {
                class_nodes.push(node);
            }
        }
        Ok((class_nodes, spec_nodes))
    }

    /// Build a spec the index does not list, from its class tree and the
    /// reference table.
    async fn build_missing(
        &self,
        class_name: &str,
        spec_name: &str,
        index: &TreeIndex,
        pvp: &PvpCatalog,
    ) -> Result<TalentTree, Error> {
        warn!("Using fallback for {} - {}", class_name, spec_name);
        let reference = self.reference(class_name, spec_name)?;
        let class_link = index
            .class_link(class_name)
            .ok_or_else(|| Error::Other(format!("Unable to find class {class_name}")))?;
        let spec_id = self
            .game_data
            .spec_id_by_class_spec(class_name, spec_name)
            .ok_or_else(|| Error::Other(format!("Unknown spec {class_name} - {spec_name}")))?;

        let body = self.client.get_static(&class_link.url).await?;
        let payload: ClassTreePayload = Error::decode(&class_link.url, body)?;

        let mut reference_nodes: HashMap<u32, _> =
            reference.nodes.iter().map(|n| (n.id, n)).collect();
        let mut nodes = Vec::new();
        let mut hrefs = Vec::new();

        for raw in &payload.talent_nodes {
            let Some(mut node) = from_raw_node(raw)? else {
                continue;
            };
            let Some(reference_node) = reference_nodes.remove(&node.id) else {
                continue;
            };
            node.locked_by = reference_node.locked_by.clone();

            let href = raw
                .first_tooltip()
                .and_then(|t| t.talent.key.as_ref())
                .map(|k| k.href.clone())
                .ok_or_else(|| Error::Decode {
                    resource: class_link.url.clone(),
                    message: format!("node {} has no talent link", node.id),
                })?;
            hrefs.push(href);
            nodes.push(node);
        }

        let mut unmatched: Vec<u32> = reference_nodes.into_keys().collect();
        unmatched.sort_unstable();
        for node_id in unmatched {
            warn!("Missing node {} for {} {}", node_id, spec_name, class_name);
        }

        let mut is_spec = vec![false; nodes.len()];
        let requests = hrefs.iter().cloned().enumerate().map(|(i, href)| (href, i)).collect();
        let responses = self.client.get_many(requests, Namespace::Static, true);
        pin_mut!(responses);
        while let Some(fetched) = responses.next().await {
            let fetched = fetched?;
            let position = fetched.context;
            let href = &hrefs[position];
            let body = fetched.body.ok_or_else(|| Error::Api {
                status: fetched.status,
                url: href.clone(),
                body: format!("talent of node {}", nodes[position].id),
            })?;
            let detail: TalentDetail = Error::decode(href, body)?;
            is_spec[position] = detail.playable_specialization.is_some();
        }
        debug!(
            "{} - {}: {} of {} reference nodes matched",
            class_name,
            spec_name,
            nodes.len(),
            reference.nodes.len()
        );

        let (spec_nodes, class_nodes): (Vec<_>, Vec<_>) = nodes
            .into_iter()
            .zip(is_spec)
            .partition(|(_, spec)| *spec);

        let strategy = self.strategies.strategy_for(class_name, spec_name);
        let deny = self.strategies.deny_list(&strategy);
        let id = TreeId {
            class_name,
            class_id: class_link.id,
            spec_name,
            spec_id,
        };
        Ok(id.assemble(
            class_nodes.into_iter().map(|(n, _)| n).collect(),
            spec_nodes.into_iter().map(|(n, _)| n).collect(),
            &deny,
            pvp,
            self.game_data,
        ))
    }
}

/// Convert one half of a tree payload, skipping placeholder nodes.
fn convert_nodes(raw: &[RawNode]) -> Result<Vec<TalentNode>, Error> {
    raw.iter().filter_map(|node| from_raw_node(node).transpose()).collect()
}

fn talent_resource(talent_id: u32) -> String {
    format!("/data/wow/talent/{talent_id}")
}
