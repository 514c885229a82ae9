use std::time::Duration;

use bnet_client::fake::{self, FakeReply, FakeTransport};
use common::{Error, GameData, TalentTree};
use serde_json::{json, Value};
use talents::{StrategyTable, TreeAssembler};

const HOST: &str = "https://us.api.blizzard.com";
const BALANCE_TREE: &str = "/data/wow/talent-tree/793/playable-specialization/102";

fn href(path: &str) -> String {
    format!("{HOST}{path}?namespace=static-10.2.5_52554-us")
}

fn tooltip(talent_id: u32) -> Value {
    json!({
        "talent": {
            "key": {"href": href(&format!("/data/wow/talent/{talent_id}"))},
            "name": format!("Talent {talent_id}"),
            "id": talent_id
        },
        "spell_tooltip": {
            "spell": {"name": format!("Spell {talent_id}"), "id": talent_id + 100_000},
            "description": "Does a thing.",
            "cast_time": "Instant"
        }
    })
}

fn node(id: u32, locked_by: &[u32], talent_id: u32) -> Value {
    json!({
        "id": id,
        "locked_by": locked_by,
        "node_type": {"type": "ACTIVE", "id": 0},
        "ranks": [{"rank": 1, "tooltip": tooltip(talent_id)}],
        "display_row": 1,
        "display_col": 1,
        "raw_position_x": 600,
        "raw_position_y": 600
    })
}

fn choice_node(id: u32, locked_by: &[u32], first: u32, second: u32) -> Value {
    json!({
        "id": id,
        "locked_by": locked_by,
        "node_type": {"type": "CHOICE", "id": 2},
        "ranks": [{"rank": 1, "choice_of_tooltips": [tooltip(first), tooltip(second)]}],
        "display_row": 2,
        "display_col": 2,
        "raw_position_x": 1200,
        "raw_position_y": 1200
    })
}

/// A node with layout but no usable rank.
fn placeholder(id: u32, ranks: Value) -> Value {
    json!({
        "id": id,
        "node_type": {"type": "ACTIVE", "id": 0},
        "ranks": ranks,
        "display_row": 5,
        "display_col": 5,
        "raw_position_x": 3000,
        "raw_position_y": 3000
    })
}

fn talent_detail(talent_id: u32, ranks: usize, spec: Option<(u32, &str)>) -> Value {
    let mut detail = json!({
        "id": talent_id,
        "rank_descriptions": (1..=ranks)
            .map(|r| json!({"rank": r, "description": format!("Rank {r}")}))
            .collect::<Vec<_>>(),
        "spell": {"id": talent_id + 100_000, "name": format!("Spell {talent_id}")},
        "playable_class": {"id": 11, "name": "Druid"}
    });
    if let Some((id, name)) = spec {
        detail["playable_specialization"] = json!({"id": id, "name": name});
    }
    detail
}

/// Index with Druid and Warrior class trees and the given spec trees.
fn route_index(transport: &FakeTransport, specs: &[(u32, u32, &str)]) {
    transport.route_json(
        "/data/wow/talent-tree/index",
        json!({
            "class_talent_trees": [
                {"key": {"href": href("/data/wow/talent-tree/793")}, "name": "Druid"},
                {"key": {"href": href("/data/wow/talent-tree/781")}, "name": "Warrior"}
            ],
            "spec_talent_trees": specs
                .iter()
                .map(|(class_id, spec_id, name)| json!({
                    "key": {"href": href(&format!("/data/wow/talent-tree/{class_id}/playable-specialization/{spec_id}"))},
                    "name": name
                }))
                .collect::<Vec<_>>()
        }),
    );
}

/// PvP talents: (id, spec id, spec name), listed in index order.
fn route_pvp(transport: &FakeTransport, entries: &[(u32, u32, &str)]) {
    transport.route_json(
        "/data/wow/pvp-talent/index",
        json!({
            "pvp_talents": entries
                .iter()
                .map(|(id, _, _)| json!({
                    "key": {"href": href(&format!("/data/wow/pvp-talent/{id}"))},
                    "name": format!("Pvp {id}"),
                    "id": id
                }))
                .collect::<Vec<_>>()
        }),
    );
    for (id, spec_id, spec_name) in entries {
        transport.route_json(
            &format!("/data/wow/pvp-talent/{id}"),
            json!({
                "id": id,
                "spell": {"id": id + 200_000, "name": format!("Pvp {id}")},
                "playable_specialization": {"id": spec_id, "name": spec_name},
                "description": format!("Pvp talent {id}.")
            }),
        );
    }
}

fn route_balance_tree(transport: &FakeTransport) {
    transport.route_json(
        BALANCE_TREE,
        json!({
            "id": 793,
            "class_talent_nodes": [
                node(100, &[], 1000),
                node(101, &[100], 1001),
                node(91046, &[], 1002),
                node(102, &[91046], 1003),
                node(103, &[102], 1004),
                placeholder(104, json!([])),
                choice_node(105, &[100], 1005, 1006)
            ],
            "spec_talent_nodes": [
                node(200, &[], 2000),
                node(201, &[200], 2001),
                node(202, &[999], 2002)
            ]
        }),
    );
}

fn ids(nodes: &[common::TalentNode]) -> Vec<u32> {
    nodes.iter().map(|n| n.id).collect()
}

fn targets(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs.iter().map(|(c, s)| (c.to_string(), s.to_string())).collect()
}

async fn build(
    transport: &FakeTransport,
    strategies: &StrategyTable,
    wanted: &[(&str, &str)],
) -> Result<Vec<TalentTree>, Error> {
    let dir = tempfile::tempdir().unwrap();
    let client = fake::client(transport, dir.path());
    let game_data = GameData::builtin().unwrap();
    TreeAssembler::new(&client, &game_data, strategies)
        .with_targets(targets(wanted))
        .build_all()
        .await
}

#[tokio::test(start_paused = true)]
async fn standard_tree_is_filtered_and_gets_pvp_talents() {
    let transport = FakeTransport::new();
    route_index(&transport, &[(793, 102, "Balance"), (793, 103, "Feral"), (781, 71, "Arms")]);
    route_balance_tree(&transport);
    route_pvp(
        &transport,
        &[(5001, 102, "Balance"), (5002, 103, "Feral"), (5003, 102, "Balance")],
    );
    // The first pvp talent finishes last; index order must still win.
    transport.delay("/data/wow/pvp-talent/5001", Duration::from_millis(500));

    let strategies = StrategyTable::builtin().unwrap();
    let trees = build(&transport, &strategies, &[("Druid", "Balance")]).await.unwrap();

    assert_eq!(trees.len(), 1);
    let tree = &trees[0];
    assert_eq!((tree.class_id, tree.spec_id), (793, 102));
    assert_eq!(ids(&tree.class_nodes), vec![100, 101, 105]);
    assert_eq!(ids(&tree.spec_nodes), vec![200, 201]);
    assert_eq!(tree.class_nodes[2].talents.len(), 2);

    let pvp: Vec<u32> = tree.pvp_talents.iter().map(|t| t.id).collect();
    assert_eq!(pvp, vec![5001, 5003]);

    assert_eq!(
        transport.request_count("/data/wow/talent-tree/793/playable-specialization/103"),
        0
    );
    assert_eq!(transport.request_count("/data/wow/pvp-talent/index"), 1);
}

#[tokio::test(start_paused = true)]
async fn patched_spec_drops_listed_nodes() {
    let transport = FakeTransport::new();
    route_index(&transport, &[(793, 102, "Balance")]);
    route_balance_tree(&transport);
    route_pvp(&transport, &[]);

    let strategies = StrategyTable::from_json(
        r#"{
            "known_bad_nodes": [91046, 91047],
            "strategies": [{"class_name": "Druid", "spec_name": "Balance",
                            "strategy": {"kind": "patch_known_defect", "drop_nodes": [101, 200]}}]
        }"#,
    )
    .unwrap();
    let trees = build(&transport, &strategies, &[("Druid", "Balance")]).await.unwrap();

    assert_eq!(ids(&trees[0].class_nodes), vec![100, 105]);
    // 201 hung off 200.
    assert!(trees[0].spec_nodes.is_empty());
}

#[tokio::test(start_paused = true)]
async fn broken_spec_is_rebuilt_from_reference() {
    let transport = FakeTransport::new();
    route_index(&transport, &[(793, 102, "Balance")]);
    route_pvp(&transport, &[(5001, 102, "Balance")]);
    transport
        .route_json("/data/wow/talent/7001", talent_detail(7001, 2, None))
        .route_json("/data/wow/talent/7002", talent_detail(7002, 3, Some((102, "Balance"))))
        .route_json("/data/wow/talent/7003", talent_detail(7003, 1, None))
        .route_json("/data/wow/talent/7004", talent_detail(7004, 1, Some((102, "Balance"))))
        .delay("/data/wow/talent/7002", Duration::from_millis(300));

    let strategies = StrategyTable::from_json(
        r#"{
            "known_bad_nodes": [91046, 91047],
            "strategies": [{"class_name": "Druid", "spec_name": "Balance",
                            "strategy": {"kind": "reconstruct_from_reference"}}],
            "reference_trees": [{
                "class_name": "Druid", "class_id": 793, "spec_name": "Balance", "spec_id": 102,
                "nodes": [
                    {"id": 300, "locked_by": [], "flags": 0, "pos_x": 10, "pos_y": 20, "talent_ids": [7001]},
                    {"id": 301, "locked_by": [302], "flags": 0, "pos_x": 30, "pos_y": 40, "talent_ids": [7002, 7003]},
                    {"id": 302, "locked_by": [], "flags": 0, "pos_x": 50, "pos_y": 60, "talent_ids": [7004]}
                ]
            }]
        }"#,
    )
    .unwrap();
    let trees = build(&transport, &strategies, &[("Druid", "Balance")]).await.unwrap();
    let tree = &trees[0];

    assert_eq!(transport.request_count(BALANCE_TREE), 0);
    assert_eq!(ids(&tree.class_nodes), vec![300]);
    assert_eq!(ids(&tree.spec_nodes), vec![301, 302]);

    let rebuilt = &tree.spec_nodes[0];
    assert_eq!(rebuilt.node_type, "MISSING");
    assert_eq!(rebuilt.max_rank, 3);
    assert_eq!((rebuilt.x, rebuilt.y, rebuilt.row, rebuilt.col), (30, 40, 0, 0));
    let talent_ids: Vec<u32> = rebuilt.talents.iter().map(|t| t.id).collect();
    assert_eq!(talent_ids, vec![7002, 7003]);
    assert_eq!(tree.pvp_talents.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn missing_spec_uses_class_tree_and_reference() {
    let transport = FakeTransport::new();
    route_index(&transport, &[(793, 102, "Balance")]);
    route_pvp(&transport, &[(5001, 104, "Guardian"), (5002, 102, "Balance")]);
    transport.route_json(
        "/data/wow/talent-tree/793",
        json!({
            "id": 793,
            "talent_nodes": [
                node(400, &[], 8000),
                node(401, &[12345], 8001),
                choice_node(402, &[], 8002, 8003),
                node(403, &[], 8004),
                placeholder(404, json!([{"rank": 1}]))
            ]
        }),
    );
    transport
        .route_json("/data/wow/talent/8000", talent_detail(8000, 1, None))
        .route_json("/data/wow/talent/8001", talent_detail(8001, 1, None))
        .route_json("/data/wow/talent/8002", talent_detail(8002, 1, Some((104, "Guardian"))))
        .delay("/data/wow/talent/8000", Duration::from_millis(200));

    let strategies = StrategyTable::from_json(
        r#"{
            "known_bad_nodes": [91046, 91047],
            "reference_trees": [{
                "class_name": "Druid", "class_id": 793, "spec_name": "Guardian", "spec_id": 104,
                "nodes": [
                    {"id": 400, "locked_by": [], "pos_x": 0, "pos_y": 0, "talent_ids": [8000]},
                    {"id": 401, "locked_by": [400], "pos_x": 0, "pos_y": 0, "talent_ids": [8001]},
                    {"id": 402, "locked_by": [], "pos_x": 0, "pos_y": 0, "talent_ids": [8002, 8003]},
                    {"id": 499, "locked_by": [], "pos_x": 0, "pos_y": 0, "talent_ids": [8099]}
                ]
            }]
        }"#,
    )
    .unwrap();
    let trees = build(&transport, &strategies, &[("Druid", "Guardian")]).await.unwrap();
    let tree = &trees[0];

    assert_eq!(tree.spec_name, "Guardian");
    assert_eq!((tree.class_id, tree.spec_id), (793, 104));
    assert_eq!(ids(&tree.class_nodes), vec![400, 401]);
    assert_eq!(tree.class_nodes[1].locked_by, vec![400]);
    assert_eq!(ids(&tree.spec_nodes), vec![402]);
    assert_eq!(transport.request_count("/data/wow/talent/8003"), 0);
    assert_eq!(transport.request_count("/data/wow/talent/8004"), 0);
    let pvp: Vec<u32> = tree.pvp_talents.iter().map(|t| t.id).collect();
    assert_eq!(pvp, vec![5001]);
}

#[tokio::test(start_paused = true)]
async fn missing_spec_without_reference_is_fatal() {
    let transport = FakeTransport::new();
    route_index(&transport, &[(793, 102, "Balance")]);
    route_pvp(&transport, &[]);

    let strategies = StrategyTable::builtin().unwrap();
    let result = build(&transport, &strategies, &[("Druid", "Guardian")]).await;
    match result {
        Err(Error::Tree { class_name, spec_name, .. }) => {
            assert_eq!(class_name, "Druid");
            assert_eq!(spec_name, "Guardian");
        }
        other => panic!("expected tree error, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn failed_pvp_talent_is_fatal() {
    let transport = FakeTransport::new();
    route_index(&transport, &[(793, 102, "Balance")]);
    route_balance_tree(&transport);
    route_pvp(&transport, &[(5001, 102, "Balance"), (5002, 102, "Balance")]);
    transport.route("/data/wow/pvp-talent/5002", vec![FakeReply::status(404)]);

    let strategies = StrategyTable::builtin().unwrap();
    let result = build(&transport, &strategies, &[("Druid", "Balance")]).await;
    assert!(matches!(result, Err(Error::Api { status: 404, .. })));
}

#[tokio::test(start_paused = true)]
async fn malformed_spec_tree_names_the_spec() {
    let transport = FakeTransport::new();
    route_index(&transport, &[(793, 102, "Balance")]);
    route_pvp(&transport, &[]);
    transport.route_json(BALANCE_TREE, json!({"class_talent_nodes": []}));

    let strategies = StrategyTable::builtin().unwrap();
    let result = build(&transport, &strategies, &[("Druid", "Balance")]).await;
    match result {
        Err(err @ Error::Tree { .. }) => {
            assert!(err.to_string().contains("Druid - Balance"));
            assert!(err.to_string().contains("spec_talent_nodes"));
        }
        other => panic!("expected tree error, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn node_without_position_fails_the_tree() {
    let transport = FakeTransport::new();
    route_index(&transport, &[(793, 102, "Balance")]);
    route_pvp(&transport, &[]);
    let mut unplaced = node(100, &[], 1000);
    unplaced.as_object_mut().unwrap().remove("raw_position_x");
    transport.route_json(
        BALANCE_TREE,
        json!({"class_talent_nodes": [unplaced], "spec_talent_nodes": []}),
    );

    let strategies = StrategyTable::builtin().unwrap();
    let result = build(&transport, &strategies, &[("Druid", "Balance")]).await;
    match result {
        Err(err @ Error::Tree { .. }) => assert!(err.to_string().contains("raw_position_x")),
        other => panic!("expected tree error, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn one_sided_choice_fails_the_tree() {
    let transport = FakeTransport::new();
    route_index(&transport, &[(793, 102, "Balance")]);
    route_pvp(&transport, &[]);
    let mut lonely = choice_node(105, &[], 1005, 1006);
    lonely["ranks"][0]["choice_of_tooltips"] = json!([tooltip(1005)]);
    transport.route_json(
        BALANCE_TREE,
        json!({"class_talent_nodes": [node(100, &[], 1000), lonely], "spec_talent_nodes": []}),
    );

    let strategies = StrategyTable::builtin().unwrap();
    let result = build(&transport, &strategies, &[("Druid", "Balance")]).await;
    match result {
        Err(Error::Tree { class_name, spec_name, message }) => {
            assert_eq!((class_name.as_str(), spec_name.as_str()), ("Druid", "Balance"));
            assert!(message.contains("talent node 105"));
        }
        other => panic!("expected tree error, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn spec_link_for_unknown_class_is_fatal() {
    let transport = FakeTransport::new();
    route_index(&transport, &[(999, 102, "Balance")]);
    route_pvp(&transport, &[]);

    let strategies = StrategyTable::builtin().unwrap();
    let result = build(&transport, &strategies, &[("Druid", "Balance")]).await;
    assert!(matches!(result, Err(Error::Other(msg)) if msg.contains("999")));
}
