//! Integration tests for field name addressing.

use formfield::path::{get, leaves, remove, set};
use formfield::{FieldName, PathSegment};
use serde_json::{json, Value};

fn names() -> Vec<FieldName> {
    vec![
        FieldName::from("index"),
        FieldName::from("index.number_of_shards"),
        FieldName::from(["template", "settings", "index.number_of_shards"]),
        FieldName::root().push_field("aliases").push_index(2).push_field("name"),
        FieldName::root().push_index(0),
        FieldName::parse("policy.states.1.actions"),
    ]
}

fn values() -> Vec<Value> {
    vec![
        json!(null),
        json!(0),
        json!(""),
        json!("logs-000001"),
        json!([1, 2, 3]),
        json!({"nested": {"deep": true}}),
    ]
}

#[test]
fn test_set_then_get_round_trips() {
    let trees = vec![json!({}), json!({"template": "scalar", "aliases": []}), json!([])];

    for tree in &trees {
        for name in names() {
            for value in values() {
                let mut tree = tree.clone();
                set(&mut tree, &name, value.clone());
                assert_eq!(
                    get(&tree, &name),
                    Some(&value),
                    "round trip failed for {name} in {tree}"
                );
            }
        }
    }
}

#[test]
fn test_set_creates_intermediate_containers() {
    let mut tree = json!({});
    set(
        &mut tree,
        &FieldName::root().push_field("aliases").push_index(1).push_field("name"),
        json!("read"),
    );
    assert_eq!(tree, json!({"aliases": [null, {"name": "read"}]}));
}

#[test]
fn test_set_preserves_siblings() {
    let mut tree = json!({"settings": {"replicas": 1, "shards": 2}});
    set(&mut tree, &FieldName::from(["settings", "replicas"]), json!(3));
    assert_eq!(tree, json!({"settings": {"replicas": 3, "shards": 2}}));
}

#[test]
fn test_reads_of_missing_locations() {
    let tree = json!({});
    assert_eq!(get(&tree, &FieldName::from(["a", "b", "c"])), None);
    assert_eq!(get(&json!({"a": 1}), &FieldName::from(["a", "b"])), None);
    assert_eq!(get(&json!([1]), &FieldName::root().push_index(4)), None);
}

#[test]
fn test_serialized_identity() {
    let name = FieldName::from(["template", "settings", "index.number_of_shards"]);
    assert_eq!(name.serialize(), "template.settings.index.number_of_shards");

    let name = FieldName::from_segments([PathSegment::from("aliases"), PathSegment::from(0)]);
    assert_eq!(name.serialize(), "aliases.0");
    assert_eq!(FieldName::from("a").serialize(), "a");
}

#[test]
fn test_remove_and_leaves() {
    let mut tree = json!({"a": {"b": 1, "c": 2}, "d": [1, 2]});
    assert_eq!(remove(&mut tree, &FieldName::from(["a", "b"])), Some(json!(1)));
    assert_eq!(remove(&mut tree, &FieldName::from("missing")), None);

    let found: Vec<(String, Value)> = leaves(&tree)
        .into_iter()
        .map(|(name, value)| (name.serialize(), value))
        .collect();
    assert_eq!(
        found,
        vec![("a.c".to_string(), json!(2)), ("d".to_string(), json!([1, 2]))]
    );
}
