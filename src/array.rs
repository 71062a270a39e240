//! Operations on list-like trees: flat arrays of records linked by parent id.
//!
//! Parents may appear before or after their children. Lookups compare ids
//! with value equality, so `1` and `"1"` are different ids, except in
//! [`create_tree_from_tree_like_array`], which keys its index by the id's
//! string form.

use std::collections::{HashMap, HashSet, VecDeque};

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::fields::{id_index_key, truthy, TreeFields};

fn position_by_id<F>(array: &[Value], id: &Value, fields: &F) -> Option<usize>
where
    F: TreeFields,
{
    array.iter().position(|item| fields.id(item) == Some(id))
}

fn child_indices<'a, F>(
    array: &'a [Value],
    id: &'a Value,
    fields: &'a F,
) -> impl Iterator<Item = usize> + 'a
where
    F: TreeFields,
{
    array
        .iter()
        .enumerate()
        .filter(move |(_, item)| fields.parent_id(item) == Some(id))
        .map(|(i, _)| i)
}

/// Builds a nested forest from a flat array.
///
/// Items are deep copied; each one is appended to its parent's children in
/// input order, and items whose parent id does not resolve become roots.
/// Items caught in a parent cycle are unreachable from any root and are
/// dropped.
///
/// Ids are indexed by their string form, so a `pId` of `"1"` resolves to an
/// item with id `1` and vice versa. With duplicate ids the last item wins.
#[instrument(level = "debug", skip_all, fields(len = array.len()))]
pub fn create_tree_from_tree_like_array<F>(array: &[Value], fields: &F) -> Vec<Value>
where
    F: TreeFields,
{
    let index: HashMap<String, usize> = array
        .iter()
        .enumerate()
        .filter_map(|(i, item)| fields.id(item).map(|id| (id_index_key(id), i)))
        .collect();

    let mut roots = Vec::new();
    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); array.len()];
    for (i, item) in array.iter().enumerate() {
        let parent = fields
            .parent_id(item)
            .and_then(|parent_id| index.get(&id_index_key(parent_id)));
        match parent {
            Some(&p) => children_of[p].push(i),
            None => roots.push(i),
        }
    }

    // pre-order from the roots; reversed, every child comes before its parent
    let mut order = Vec::with_capacity(array.len());
    let mut stack = roots.clone();
    while let Some(i) = stack.pop() {
        order.push(i);
        stack.extend(&children_of[i]);
    }
    if order.len() < array.len() {
        warn!(
            dropped = array.len() - order.len(),
            "items unreachable from any root, parent references form a cycle"
        );
    }

    let mut slots: Vec<Option<Value>> = array.iter().cloned().map(Some).collect();
    for &i in order.iter().rev() {
        let kids: Vec<Value> = children_of[i]
            .iter()
            .filter_map(|&child| slots[child].take())
            .collect();
        if kids.is_empty() {
            continue;
        }
        if let Some(node) = slots[i].as_mut() {
            match fields.children_mut(node) {
                Some(existing) => existing.extend(kids),
                None => fields.set_children(node, kids),
            }
        }
    }

    let forest: Vec<Value> = roots.iter().filter_map(|&r| slots[r].take()).collect();
    debug!(roots = forest.len(), "built forest");
    forest
}

/// Keeps matching items plus every ancestor of them, ancestors first.
///
/// Ancestors are looked up in the whole `array`, not only among the matches.
#[instrument(level = "debug", skip_all, fields(len = array.len()))]
pub fn filter_tree_array<F, P>(array: &[Value], fields: &F, mut predicate: P) -> Vec<Value>
where
    F: TreeFields,
    P: FnMut(&Value) -> bool,
{
    let mut result: VecDeque<usize> = (0..array.len()).filter(|&i| predicate(&array[i])).collect();
    let mut pending: Vec<usize> = result.iter().copied().collect();

    while let Some(current) = pending.pop() {
        let Some(parent_id) = truthy(fields.parent_id(&array[current])) else {
            continue;
        };
        let Some(parent) = position_by_id(array, parent_id, fields) else {
            continue;
        };
        if result
            .iter()
            .any(|&kept| fields.same_id(&array[kept], &array[parent]))
        {
            continue;
        }
        result.push_front(parent);
        pending.push(parent);
    }

    result.into_iter().map(|i| array[i].clone()).collect()
}

/// Walks up the parent chain of `start`, returning ancestors root-most first.
fn ancestor_chain<'a, F>(
    array: &'a [Value],
    start: &'a Value,
    max_depth: Option<usize>,
    fields: &F,
) -> Vec<&'a Value>
where
    F: TreeFields,
{
    let mut chain = VecDeque::new();
    let mut seen = HashSet::new();
    let mut current = start;
    while max_depth.map_or(true, |max| chain.len() < max) {
        let Some(parent_id) = truthy(fields.parent_id(current)) else {
            break;
        };
        let Some(parent) = position_by_id(array, parent_id, fields) else {
            break;
        };
        if !seen.insert(parent) {
            warn!(?parent_id, "parent chain loops back, stopping");
            break;
        }
        current = &array[parent];
        chain.push_front(current);
    }
    chain.into()
}

/// Ancestors of `node`, root-most first, at most `max_depth` of them
/// (`None` for no limit).
#[instrument(level = "debug", skip(array, node, fields), fields(len = array.len()))]
pub fn closest_parent_item_in_tree_array<F>(
    array: &[Value],
    node: &Value,
    max_depth: Option<usize>,
    fields: &F,
) -> Vec<Value>
where
    F: TreeFields,
{
    ancestor_chain(array, node, max_depth, fields)
        .into_iter()
        .cloned()
        .collect()
}

/// Ids of the ancestors of the item identified by `key`, root-most first.
/// Empty if no item carries that id.
#[instrument(level = "debug", skip(array, fields), fields(len = array.len()))]
pub fn closest_parent_keys_in_tree_array<F>(
    array: &[Value],
    key: &Value,
    max_depth: Option<usize>,
    fields: &F,
) -> Vec<Value>
where
    F: TreeFields,
{
    let Some(start) = array.iter().find(|item| fields.id(item) == Some(key)) else {
        return Vec::new();
    };
    ancestor_chain(array, start, max_depth, fields)
        .into_iter()
        .filter_map(|item| fields.id(item).cloned())
        .collect()
}

/// All transitive descendants of `target`, breadth-first in discovery order.
#[instrument(level = "debug", skip_all, fields(len = array.len()))]
pub fn find_children_item_in_tree_array<F>(
    array: &[Value],
    target: &Value,
    fields: &F,
) -> Vec<Value>
where
    F: TreeFields,
{
    let Some(target_id) = fields.id(target) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut queue: VecDeque<usize> = child_indices(array, target_id, fields).collect();
    let mut result = Vec::new();
    while let Some(i) = queue.pop_front() {
        if !seen.insert(i) {
            continue;
        }
        result.push(array[i].clone());
        if let Some(id) = fields.id(&array[i]) {
            queue.extend(child_indices(array, id, fields));
        }
    }
    result
}

/// True if any item names `target` as its parent.
pub fn has_children_node<F>(array: &[Value], target: &Value, fields: &F) -> bool
where
    F: TreeFields,
{
    fields
        .id(target)
        .is_some_and(|id| array.iter().any(|item| fields.parent_id(item) == Some(id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldAlias;
    use serde_json::json;

    #[test]
    fn given_child_before_parent_when_building_then_still_nests() {
        let fields = FieldAlias::default();
        let array = vec![json!({"id": 2, "pId": 1}), json!({"id": 1})];

        let forest = create_tree_from_tree_like_array(&array, &fields);

        assert_eq!(forest, vec![json!({"id": 1, "children": [{"id": 2, "pId": 1}]})]);
    }

    #[test]
    fn given_string_parent_id_when_building_then_links_to_numeric_id() {
        let fields = FieldAlias::default();
        let array = vec![json!({"id": 1}), json!({"id": 2, "pId": "1"})];

        let forest = create_tree_from_tree_like_array(&array, &fields);

        assert_eq!(forest, vec![json!({"id": 1, "children": [{"id": 2, "pId": "1"}]})]);
    }

    #[test]
    fn given_parent_cycle_when_building_then_drops_cyclic_items() {
        let fields = FieldAlias::default();
        let array = vec![
            json!({"id": 1}),
            json!({"id": 2, "pId": 3}),
            json!({"id": 3, "pId": 2}),
        ];

        let forest = create_tree_from_tree_like_array(&array, &fields);

        assert_eq!(forest, vec![json!({"id": 1})]);
    }

    #[test]
    fn given_parent_cycle_when_walking_ancestors_then_terminates() {
        let fields = FieldAlias::default();
        let array = vec![json!({"id": 1, "pId": 2}), json!({"id": 2, "pId": 1})];

        let keys = closest_parent_keys_in_tree_array(&array, &json!(1), None, &fields);

        assert_eq!(keys, vec![json!(1), json!(2)]);
    }
}
