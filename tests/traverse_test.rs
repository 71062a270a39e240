//! Integration tests for traversal orders, named searches and rendering.

use std::ops::ControlFlow;

use rstest::{fixture, rstest};
use serde_json::{json, Value};

use treekit::util::testing;
use treekit::{
    every_tree, find_all_in_tree, find_one_in_tree, find_parent_tree_node, get_left_node,
    get_right_node, some_tree, traverse_iter, traverse_tree, FieldAlias, TraverseOptions,
    TraverseOrder, TreeDisplay,
};

//        1
//      /   \
//     2     5
//    / \     \
//   3   4     6
#[fixture]
fn tree() -> Value {
    testing::init_test_setup();
    json!([{
        "id": 1,
        "name": "root",
        "children": [
            {"id": 2, "pId": 1, "name": "left", "children": [
                {"id": 3, "pId": 2, "name": "ll"},
                {"id": 4, "pId": 2, "name": "lr"}
            ]},
            {"id": 5, "pId": 1, "name": "right", "children": [
                {"id": 6, "pId": 5, "name": "rr"}
            ]}
        ]
    }])
}

#[fixture]
fn fields() -> FieldAlias {
    FieldAlias::default()
}

fn visited(tree: &Value, options: impl Into<TraverseOptions>, fields: &FieldAlias) -> Vec<i64> {
    traverse_iter(tree, options, fields)
        .filter_map(|n| n["id"].as_i64())
        .collect()
}

// ============================================================
// Orders and guards
// ============================================================

#[rstest]
#[case(TraverseOptions::breadth(), vec![1, 2, 5, 3, 4, 6])]
#[case(TraverseOptions::depth(), vec![1, 2, 3, 4, 5, 6])]
#[case(TraverseOptions::breadth().with_max_depth(1), vec![1])]
#[case(TraverseOptions::depth().with_max_depth(2), vec![1, 2, 5])]
fn given_options_when_traversing_then_visits_in_expected_order(
    tree: Value,
    fields: FieldAlias,
    #[case] options: TraverseOptions,
    #[case] expected: Vec<i64>,
) {
    assert_eq!(visited(&tree, options, &fields), expected);
}

#[rstest]
fn given_custom_children_key_when_traversing_then_descends_through_it() {
    let fields = FieldAlias::new().with_children_key("kids");
    let tree = json!({"id": 1, "kids": [{"id": 2, "kids": [{"id": 3}]}], "children": [{"id": 9}]});

    assert_eq!(visited(&tree, TraverseOrder::Depth, &fields), vec![1, 2, 3]);
}

#[rstest]
fn given_visitor_break_when_traversing_then_stops_at_that_node(tree: Value, fields: FieldAlias) {
    let mut seen = Vec::new();

    traverse_tree(&tree, TraverseOrder::Depth, &fields, |node| {
        seen.push(node["id"].as_i64().unwrap_or_default());
        if node["id"] == 3 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });

    assert_eq!(seen, vec![1, 2, 3]);
}

// ============================================================
// Named searches
// ============================================================

#[rstest]
fn given_tree_when_searching_then_any_and_all_short_circuit(tree: Value, fields: FieldAlias) {
    let mut calls = 0;
    assert!(some_tree(&tree, TraverseOrder::Breadth, &fields, |n| {
        calls += 1;
        n["id"] == 2
    }));
    assert_eq!(calls, 2);

    assert!(every_tree(&tree, TraverseOrder::Breadth, &fields, |n| n["id"].is_number()));
    assert!(!every_tree(&tree, TraverseOrder::Breadth, &fields, |n| n["id"] != 4));
}

#[rstest]
fn given_empty_forest_when_searching_then_vacuous_results(fields: FieldAlias) {
    let empty = Value::Null;

    assert!(!some_tree(&empty, TraverseOrder::Breadth, &fields, |_| true));
    assert!(every_tree(&empty, TraverseOrder::Breadth, &fields, |_| false));
    assert!(find_one_in_tree(&empty, TraverseOrder::Depth, &fields, |_| true).is_none());
}

#[rstest]
#[case(TraverseOrder::Breadth, 5)]
#[case(TraverseOrder::Depth, 3)]
fn given_order_when_finding_first_leaf_then_depends_on_order(
    tree: Value,
    fields: FieldAlias,
    #[case] order: TraverseOrder,
    #[case] expected: i64,
) {
    let found = find_one_in_tree(&tree, order, &fields, |n| {
        n["id"].as_i64().is_some_and(|id| id > 2)
    });

    assert_eq!(found.and_then(|n| n["id"].as_i64()), Some(expected));
}

#[rstest]
fn given_predicate_when_finding_all_then_returns_matches_in_order(tree: Value, fields: FieldAlias) {
    let leaves = find_all_in_tree(&tree, TraverseOrder::Breadth, &fields, |n| {
        n.get("children").is_none()
    });

    let leaf_ids: Vec<i64> = leaves.iter().filter_map(|n| n["id"].as_i64()).collect();
    assert_eq!(leaf_ids, vec![3, 4, 6]);
}

#[rstest]
fn given_child_when_looking_up_parent_and_siblings_then_resolves_by_ids(
    tree: Value,
    fields: FieldAlias,
) {
    let target = json!({"id": 4, "pId": 2});

    let parent = find_parent_tree_node(&tree, &target, &fields);

    assert_eq!(parent.map(|n| &n["name"]), Some(&json!("left")));
    assert_eq!(get_left_node(&tree, &target, &fields).map(|n| &n["id"]), Some(&json!(3)));
    assert_eq!(get_right_node(&tree, &target, &fields), None);
}

// ============================================================
// Rendering
// ============================================================

#[rstest]
fn given_tree_when_rendering_then_prints_labels_nested(tree: Value, fields: FieldAlias) {
    let rendered = tree.to_tree_string("name", &fields).to_string();

    let expected = "\
.
└── root
    ├── left
    │   ├── ll
    │   └── lr
    └── right
        └── rr
";
    assert_eq!(rendered, expected);
}

#[rstest]
fn given_missing_label_when_rendering_then_falls_back_to_id(fields: FieldAlias) {
    let node = json!({"id": "n1", "children": [{"id": 2}, {}]});

    let rendered = node.to_tree_string("name", &fields).to_string();

    assert_eq!(rendered, "n1\n├── 2\n└── <node>\n");
}
