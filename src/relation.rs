//! Parent, sibling and ancestor lookups in nested trees.

use serde_json::Value;
use tracing::{instrument, trace};

use crate::config::TraverseOrder;
use crate::fields::{forest, truthy, TreeFields};
use crate::traverse::find_one_in_tree;

/// Finds the node whose id equals `target`'s parent id, breadth-first.
///
/// Returns `None` for roots, i.e. when the target carries no truthy parent id.
#[instrument(level = "trace", skip_all)]
pub fn find_parent_tree_node<'a, F>(
    tree: &'a Value,
    target: &Value,
    fields: &F,
) -> Option<&'a Value>
where
    F: TreeFields,
{
    let parent_id = truthy(fields.parent_id(target))?;
    find_one_in_tree(tree, TraverseOrder::Breadth, fields, |node| {
        fields.id(node) == Some(parent_id)
    })
}

/// The target's parent together with the target's position among its children.
fn locate_in_parent<'a, F>(
    tree: &'a Value,
    target: &Value,
    fields: &F,
) -> Option<(&'a [Value], usize)>
where
    F: TreeFields,
{
    let siblings = fields.children(find_parent_tree_node(tree, target, fields)?)?;
    let index = siblings
        .iter()
        .position(|node| fields.same_id(node, target))?;
    trace!(index, "located target among siblings");
    Some((siblings.as_slice(), index))
}

/// Index of `target` within its parent's children.
pub fn find_index_in_sibling_node<F>(tree: &Value, target: &Value, fields: &F) -> Option<usize>
where
    F: TreeFields,
{
    locate_in_parent(tree, target, fields).map(|(_, index)| index)
}

pub fn get_left_node<'a, F>(tree: &'a Value, target: &Value, fields: &F) -> Option<&'a Value>
where
    F: TreeFields,
{
    let (siblings, index) = locate_in_parent(tree, target, fields)?;
    index.checked_sub(1).and_then(|left| siblings.get(left))
}

/// All siblings before `target`, nearest last.
pub fn get_all_left_node<'a, F>(tree: &'a Value, target: &Value, fields: &F) -> Vec<&'a Value>
where
    F: TreeFields,
{
    locate_in_parent(tree, target, fields)
        .map(|(siblings, index)| siblings[..index].iter().collect())
        .unwrap_or_default()
}

pub fn get_right_node<'a, F>(tree: &'a Value, target: &Value, fields: &F) -> Option<&'a Value>
where
    F: TreeFields,
{
    let (siblings, index) = locate_in_parent(tree, target, fields)?;
    siblings.get(index + 1)
}

/// All siblings after `target`, nearest first.
pub fn get_all_right_node<'a, F>(tree: &'a Value, target: &Value, fields: &F) -> Vec<&'a Value>
where
    F: TreeFields,
{
    locate_in_parent(tree, target, fields)
        .map(|(siblings, index)| siblings[index + 1..].iter().collect())
        .unwrap_or_default()
}

/// Collects the ancestors of every node matching `predicate`, root first.
///
/// A node is included when one of its descendants matched, or, with
/// `include_matched`, when it matches itself. The predicate is not consulted
/// for a node whose descendant already matched. With several matches the
/// result is the reversed post-order of all included nodes.
#[instrument(level = "debug", skip(tree, fields, predicate))]
pub fn closest_parent_item_in_tree<'a, F, P>(
    tree: &'a Value,
    fields: &F,
    mut predicate: P,
    include_matched: bool,
) -> Vec<&'a Value>
where
    F: TreeFields,
    P: FnMut(&Value) -> bool,
{
    struct Frame<'n> {
        node: &'n Value,
        children: std::slice::Iter<'n, Value>,
        descendant_matched: bool,
    }

    let frame = |node: &'a Value| Frame {
        node,
        children: fields.children(node).map(|c| c.iter()).unwrap_or_default(),
        descendant_matched: false,
    };

    let mut emitted = Vec::new();
    for root in forest(tree) {
        let mut stack = vec![frame(root)];
        while let Some(top) = stack.last_mut() {
            if let Some(child) = top.children.next() {
                stack.push(frame(child));
                continue;
            }
            let Some(done) = stack.pop() else { break };
            let matched = if done.descendant_matched {
                emitted.push(done.node);
                true
            } else {
                let matched = predicate(done.node);
                if matched && include_matched {
                    emitted.push(done.node);
                }
                matched
            };
            if let Some(parent) = stack.last_mut() {
                parent.descendant_matched |= matched;
            }
        }
    }
    emitted.reverse();
    emitted
}
