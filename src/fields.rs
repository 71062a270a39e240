//! Field access over schema-less records.
//!
//! Operations never index records with raw strings; they go through
//! [`TreeFields`], which [`FieldAlias`] implements for the configured keys.

use serde_json::{Map, Value};

use crate::config::FieldAlias;

/// Accessors for the identifier, parent reference and children of a node.
pub trait TreeFields {
    fn id_key(&self) -> &str;
    fn parent_id_key(&self) -> &str;
    fn children_key(&self) -> &str;

    fn id<'a>(&self, node: &'a Value) -> Option<&'a Value> {
        node.get(self.id_key())
    }

    fn parent_id<'a>(&self, node: &'a Value) -> Option<&'a Value> {
        node.get(self.parent_id_key())
    }

    fn set_parent_id(&self, node: &mut Value, parent_id: Value) {
        if let Some(record) = node.as_object_mut() {
            record.insert(self.parent_id_key().to_string(), parent_id);
        }
    }

    /// The children sequence, if the field holds an array.
    fn children<'a>(&self, node: &'a Value) -> Option<&'a Vec<Value>> {
        node.get(self.children_key()).and_then(Value::as_array)
    }

    fn children_mut<'a>(&self, node: &'a mut Value) -> Option<&'a mut Vec<Value>> {
        node.get_mut(self.children_key())
            .and_then(Value::as_array_mut)
    }

    /// True if the node holds at least one child.
    fn has_children(&self, node: &Value) -> bool {
        self.children(node).is_some_and(|c| !c.is_empty())
    }

    /// Moves the children sequence out of the node, leaving the field in place.
    fn take_children(&self, node: &mut Value) -> Option<Vec<Value>> {
        self.children_mut(node).map(std::mem::take)
    }

    fn set_children(&self, node: &mut Value, children: Vec<Value>) {
        if let Some(record) = node.as_object_mut() {
            record.insert(self.children_key().to_string(), Value::Array(children));
        }
    }

    fn remove_children(&self, node: &mut Value) -> Option<Value> {
        node.as_object_mut()
            .and_then(|record| record.remove(self.children_key()))
    }

    /// True if both nodes carry an id and the ids are equal.
    fn same_id(&self, a: &Value, b: &Value) -> bool {
        matches!((self.id(a), self.id(b)), (Some(x), Some(y)) if x == y)
    }
}

impl TreeFields for FieldAlias {
    fn id_key(&self) -> &str {
        &self.id_key
    }

    fn parent_id_key(&self) -> &str {
        &self.parent_id_key
    }

    fn children_key(&self) -> &str {
        &self.children_key
    }
}

/// JavaScript-style truthiness: `null`, `false`, `0`, `NaN` and `""` are falsy.
///
/// Parent references are only followed when truthy, so a `pId` of `0` or `""`
/// marks a root.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub(crate) fn truthy(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| is_truthy(v))
}

/// Views a tree value as a forest: an array yields its elements, `null` the
/// empty forest, and any other value a single root.
pub fn forest(tree: &Value) -> &[Value] {
    match tree {
        Value::Array(roots) => roots.as_slice(),
        Value::Null => &[],
        node => std::slice::from_ref(node),
    }
}

/// Mutable counterpart of [`forest`].
pub(crate) fn forest_mut(tree: &mut Value) -> Vec<&mut Value> {
    match tree {
        Value::Array(roots) => roots.iter_mut().collect(),
        Value::Null => Vec::new(),
        node => vec![node],
    }
}

/// Owned counterpart of [`forest`]: deep copies the roots.
pub(crate) fn forest_owned(tree: &Value) -> Vec<Value> {
    forest(tree).to_vec()
}

/// Shallow merge of `patch` onto a record; non-record nodes are left alone.
pub(crate) fn merge_patch(node: &mut Value, patch: &Map<String, Value>) {
    if let Some(record) = node.as_object_mut() {
        for (key, value) in patch {
            record.insert(key.clone(), value.clone());
        }
    }
}

/// Stable string key for an id value, as used for id indexes.
pub(crate) fn id_index_key(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(null), false)]
    #[case(json!(false), false)]
    #[case(json!(0), false)]
    #[case(json!(0.0), false)]
    #[case(json!(""), false)]
    #[case(json!(true), true)]
    #[case(json!(7), true)]
    #[case(json!("0"), true)]
    #[case(json!([]), true)]
    #[case(json!({}), true)]
    fn given_value_when_checking_truthiness_then_matches_js_semantics(
        #[case] value: Value,
        #[case] expected: bool,
    ) {
        assert_eq!(is_truthy(&value), expected);
    }

    #[test]
    fn given_custom_alias_when_accessing_fields_then_uses_configured_keys() {
        let alias = FieldAlias::new()
            .with_id_key("key")
            .with_parent_id_key("parent")
            .with_children_key("nodes");
        let node = json!({"key": 1, "parent": 0, "nodes": [{"key": 2}]});

        assert_eq!(alias.id(&node), Some(&json!(1)));
        assert_eq!(alias.parent_id(&node), Some(&json!(0)));
        assert_eq!(alias.children(&node).map(Vec::len), Some(1));
        assert!(alias.has_children(&node));
    }

    #[test]
    fn given_tree_shapes_when_viewing_as_forest_then_normalizes_roots() {
        assert_eq!(forest(&json!([{"id": 1}, {"id": 2}])).len(), 2);
        assert_eq!(forest(&json!({"id": 1})).len(), 1);
        assert!(forest(&Value::Null).is_empty());
    }

    #[test]
    fn given_nodes_without_ids_when_comparing_then_not_same() {
        let alias = FieldAlias::default();
        assert!(!alias.same_id(&json!({}), &json!({})));
        assert!(alias.same_id(&json!({"id": 3}), &json!({"id": 3, "x": 1})));
    }
}
