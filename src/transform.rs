//! Structural rewrites of nested trees.
//!
//! Every operation deep copies its input and returns a new forest; a single
//! node comes back as a one-element forest. Descent uses explicit work stacks,
//! so tree depth is bounded by memory rather than by the call stack.

use std::cmp::Ordering;
use std::collections::VecDeque;

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::fields::{forest_mut, forest_owned, merge_patch, truthy, TreeFields};
use crate::relation::closest_parent_item_in_tree;

/// Rebuilds a forest bottom-up: each node is handed to `visit` after its
/// children have been rebuilt. Returning `None` drops the node.
fn rebuild_post_order<F, M>(roots: Vec<Value>, fields: &F, mut visit: M) -> Vec<Value>
where
    F: TreeFields + ?Sized,
    M: FnMut(Value) -> Option<Value>,
{
    struct Frame {
        parent: Option<Value>,
        pending: std::vec::IntoIter<Value>,
        done: Vec<Value>,
    }

    let mut stack = vec![Frame {
        parent: None,
        pending: roots.into_iter(),
        done: Vec::new(),
    }];

    while let Some(frame) = stack.last_mut() {
        if let Some(mut node) = frame.pending.next() {
            match fields.take_children(&mut node) {
                Some(children) => stack.push(Frame {
                    parent: Some(node),
                    pending: children.into_iter(),
                    done: Vec::new(),
                }),
                None => frame.done.extend(visit(node)),
            }
            continue;
        }

        let Some(finished) = stack.pop() else { break };
        match finished.parent {
            None => return finished.done,
            Some(mut parent) => {
                fields.set_children(&mut parent, finished.done);
                if let (Some(up), Some(out)) = (stack.last_mut(), visit(parent)) {
                    up.done.push(out);
                }
            }
        }
    }
    Vec::new()
}

/// Deep copies the tree and applies `f` to every node, children first.
#[instrument(level = "debug", skip_all)]
pub fn map_tree<F, M>(tree: &Value, fields: &F, mut f: M) -> Vec<Value>
where
    F: TreeFields,
    M: FnMut(Value) -> Value,
{
    rebuild_post_order(forest_owned(tree), fields, |node| Some(f(node)))
}

/// Sorts every children sequence, then the forest itself. The sort is stable.
#[instrument(level = "debug", skip_all)]
pub fn sort_tree<F, C>(tree: &Value, fields: &F, mut compare: C) -> Vec<Value>
where
    F: TreeFields,
    C: FnMut(&Value, &Value) -> Ordering,
{
    let mut roots = rebuild_post_order(forest_owned(tree), fields, |mut node| {
        if let Some(children) = fields.children_mut(&mut node) {
            children.sort_by(&mut compare);
        }
        Some(node)
    });
    roots.sort_by(&mut compare);
    roots
}

/// Keeps nodes matching `predicate` together with all of their ancestors.
///
/// A node with at least one surviving child is kept regardless of the
/// predicate. A matching node whose children were all filtered out keeps an
/// empty children sequence.
#[instrument(level = "debug", skip_all)]
pub fn filter_tree<F, P>(tree: &Value, fields: &F, mut predicate: P) -> Vec<Value>
where
    F: TreeFields,
    P: FnMut(&Value) -> bool,
{
    rebuild_post_order(forest_owned(tree), fields, |node| {
        (fields.has_children(&node) || predicate(&node)).then_some(node)
    })
}

/// Annotates every node that has children with a child count under
/// `statistics_key`: direct children only, or with `deep` the whole subtree.
#[instrument(level = "debug", skip(tree, fields))]
pub fn statistics_tree_node_children<F>(
    tree: &Value,
    deep: bool,
    statistics_key: &str,
    fields: &F,
) -> Vec<Value>
where
    F: TreeFields,
{
    map_tree(tree, fields, |mut node| {
        let count = match fields.children(&node).filter(|c| !c.is_empty()) {
            Some(children) if deep => children
                .iter()
                .map(|child| child.get(statistics_key).and_then(Value::as_u64).unwrap_or(0))
                .sum::<u64>()
                + children.len() as u64,
            Some(children) => children.len() as u64,
            None => return node,
        };
        if let Some(record) = node.as_object_mut() {
            record.insert(statistics_key.to_string(), Value::from(count));
        }
        node
    })
}

/// What a matched node is replaced with.
pub enum Replacement<'r> {
    /// A fixed value, cloned for every match
    Node(Value),
    /// Computed from the matched node (children already processed)
    With(Box<dyn FnMut(Value) -> Value + 'r>),
}

impl<'r> Replacement<'r> {
    pub fn with(f: impl FnMut(Value) -> Value + 'r) -> Self {
        Replacement::With(Box::new(f))
    }
}

impl From<Value> for Replacement<'_> {
    fn from(node: Value) -> Self {
        Replacement::Node(node)
    }
}

#[instrument(level = "debug", skip_all)]
pub fn replace_tree_node<'r, F, P>(
    tree: &Value,
    fields: &F,
    mut predicate: P,
    replacement: impl Into<Replacement<'r>>,
) -> Vec<Value>
where
    F: TreeFields,
    P: FnMut(&Value) -> bool,
{
    let mut replacement = replacement.into();
    map_tree(tree, fields, |node| {
        if !predicate(&node) {
            return node;
        }
        match &mut replacement {
            Replacement::Node(value) => value.clone(),
            Replacement::With(f) => f(node),
        }
    })
}

/// Shallow-merges `patch` onto every node matching `predicate`.
#[instrument(level = "debug", skip_all)]
pub fn update_tree_node<F, P>(
    tree: &Value,
    fields: &F,
    mut predicate: P,
    patch: &Map<String, Value>,
) -> Vec<Value>
where
    F: TreeFields,
    P: FnMut(&Value) -> bool,
{
    map_tree(tree, fields, |mut node| {
        if predicate(&node) {
            merge_patch(&mut node, patch);
        }
        node
    })
}

/// Merges `patch` onto every matching node and all of its descendants.
#[instrument(level = "debug", skip_all)]
pub fn update_tree_node_and_all_children_node<F, P>(
    tree: &Value,
    fields: &F,
    mut predicate: P,
    patch: &Map<String, Value>,
) -> Vec<Value>
where
    F: TreeFields,
    P: FnMut(&Value) -> bool,
{
    let mut roots = forest_owned(tree);
    let mut stack: Vec<(&mut Value, bool)> = roots.iter_mut().map(|node| (node, false)).collect();
    while let Some((node, inherited)) = stack.pop() {
        let cascade = inherited || predicate(&*node);
        if cascade {
            merge_patch(node, patch);
        }
        if let Some(children) = fields.children_mut(node) {
            stack.extend(children.iter_mut().map(|child| (child, cascade)));
        }
    }
    roots
}

/// Merges `patch` onto every matching node and all of its ancestors.
///
/// Ancestors are identified by id, so every node sharing an id with one of
/// them is patched too.
#[instrument(level = "debug", skip_all)]
pub fn update_tree_node_and_all_parent_node<F, P>(
    tree: &Value,
    fields: &F,
    predicate: P,
    patch: &Map<String, Value>,
) -> Vec<Value>
where
    F: TreeFields,
    P: FnMut(&Value) -> bool,
{
    let ids: Vec<Value> = closest_parent_item_in_tree(tree, fields, predicate, true)
        .into_iter()
        .filter_map(|node| fields.id(node).cloned())
        .collect();
    debug!(count = ids.len(), "patching ancestor chain");
    update_tree_node(
        tree,
        fields,
        |node| fields.id(node).is_some_and(|id| ids.contains(id)),
        patch,
    )
}

/// Removes the children field from every node whose children sequence is
/// empty or missing, leaving no empty sequences behind.
#[instrument(level = "debug", skip_all)]
pub fn remove_empty_children<F>(tree: &Value, fields: &F) -> Vec<Value>
where
    F: TreeFields,
{
    rebuild_post_order(forest_owned(tree), fields, |mut node| {
        if !fields.has_children(&node) {
            fields.remove_children(&mut node);
        }
        Some(node)
    })
}

pub use self::remove_empty_children as remove_empty_children_tree_node;

/// Fills in each child's parent id from its parent when the child has none.
#[instrument(level = "debug", skip_all)]
pub fn completion_tree_node_pid<F>(tree: &Value, fields: &F) -> Vec<Value>
where
    F: TreeFields,
{
    let mut roots = Value::Array(forest_owned(tree));
    completion_tree_node_pid_in_place(&mut roots, fields);
    match roots {
        Value::Array(roots) => roots,
        _ => Vec::new(),
    }
}

/// In-place variant of [`completion_tree_node_pid`]. **Mutates `tree`.**
pub fn completion_tree_node_pid_in_place<F>(tree: &mut Value, fields: &F)
where
    F: TreeFields,
{
    let mut stack = forest_mut(tree);
    while let Some(node) = stack.pop() {
        let parent_id = fields.id(node).cloned();
        let Some(children) = fields.children_mut(node) else {
            continue;
        };
        if let Some(parent_id) = parent_id {
            for child in children.iter_mut() {
                if truthy(fields.parent_id(child)).is_none() {
                    fields.set_parent_id(child, parent_id.clone());
                }
            }
        }
        stack.extend(children);
    }
}

/// Flattens the tree in pre-order, one entry per node.
///
/// With `keep_children_field` the copies keep their nested children as well;
/// otherwise the children field is stripped.
#[instrument(level = "debug", skip(tree, fields))]
pub fn flatten_tree<F>(tree: &Value, keep_children_field: bool, fields: &F) -> Vec<Value>
where
    F: TreeFields,
{
    let mut result = Vec::new();
    let mut stack: Vec<Value> = forest_owned(tree).into_iter().rev().collect();
    while let Some(mut node) = stack.pop() {
        let children = if keep_children_field {
            fields.children(&node).cloned()
        } else {
            match fields.remove_children(&mut node) {
                Some(Value::Array(children)) => Some(children),
                _ => None,
            }
        };
        result.push(node);
        stack.extend(children.unwrap_or_default().into_iter().rev());
    }
    debug!(count = result.len(), "flattened");
    result
}

/// Maximum nesting depth. Forest roots count as level 1; a single node passed
/// on its own counts as level 0.
#[instrument(level = "debug", skip_all)]
pub fn get_tree_depth<F>(tree: &Value, fields: &F) -> usize
where
    F: TreeFields,
{
    let mut queue: VecDeque<(&Value, usize)> = match tree {
        Value::Array(roots) => roots.iter().map(|root| (root, 1)).collect(),
        Value::Null => return 0,
        node => VecDeque::from([(node, 0)]),
    };

    let mut max_depth = 0;
    while let Some((node, depth)) = queue.pop_front() {
        max_depth = max_depth.max(depth);
        if let Some(children) = fields.children(node) {
            queue.extend(children.iter().map(|child| (child, depth + 1)));
        }
    }
    max_depth
}
