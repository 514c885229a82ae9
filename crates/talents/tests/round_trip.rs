use serde_json::Value;
use talents::TalentTreeJson;

const FIXTURE: &str = include_str!("fixtures/druid-balance.json");

#[test]
fn fixture_tree_parses() {
    let parsed: TalentTreeJson = serde_json::from_str(FIXTURE).unwrap();
    let (tree, icons) = parsed.into_tree();

    assert_eq!(tree.class_name, "Druid");
    assert_eq!(tree.spec_name, "Balance");
    assert_eq!(tree.class_nodes.len(), 48);
    assert!(!tree.spec_nodes.is_empty());
    assert!(!tree.pvp_talents.is_empty());
    assert!(tree.all_spells().all(|spell| icons.contains_key(&spell.id)));
}

#[test]
fn fixture_tree_reserializes_exactly() {
    let expected: Value = serde_json::from_str(FIXTURE).unwrap();
    let parsed: TalentTreeJson = serde_json::from_value(expected.clone()).unwrap();
    let (tree, icons) = parsed.into_tree();

    let actual = serde_json::to_value(TalentTreeJson::from_tree(&tree, &icons).unwrap()).unwrap();
    assert_eq!(actual, expected);
}
