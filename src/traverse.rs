//! Breadth-first / depth-first traversal over nested trees.
//!
//! One iterator, [`Traversal`], drives every search: `some_tree`,
//! `every_tree`, `find_one_in_tree` and `find_all_in_tree` are plain iterator
//! adaptors over it.

use std::collections::VecDeque;
use std::ops::ControlFlow;

use serde_json::Value;
use tracing::{instrument, warn};

pub use crate::config::{TraverseOptions, TraverseOrder};
use crate::fields::{forest, TreeFields};

/// Iterator over the nodes of a tree or forest.
///
/// A node's children are scheduled when the node is dequeued, before it is
/// yielded: at the tail of the queue for breadth-first, at the head (in
/// order) for depth-first.
pub struct Traversal<'a, 'f, F: TreeFields + ?Sized> {
    fields: &'f F,
    options: TraverseOptions,
    queue: VecDeque<(&'a Value, usize)>,
    truncated: bool,
}

impl<'a, 'f, F: TreeFields + ?Sized> Traversal<'a, 'f, F> {
    pub fn new(tree: &'a Value, options: impl Into<TraverseOptions>, fields: &'f F) -> Self {
        Self {
            fields,
            options: options.into(),
            queue: forest(tree).iter().map(|root| (root, 1)).collect(),
            truncated: false,
        }
    }

    fn schedule_children(&mut self, node: &'a Value, depth: usize) {
        let Some(children) = self.fields.children(node).filter(|c| !c.is_empty()) else {
            return;
        };
        if self.options.max_depth.is_some_and(|max| depth >= max) {
            if !self.truncated {
                warn!(depth, "traversal depth limit reached, not expanding further");
                self.truncated = true;
            }
            return;
        }
        match self.options.order {
            TraverseOrder::Breadth => {
                self.queue
                    .extend(children.iter().map(|child| (child, depth + 1)));
            }
            TraverseOrder::Depth => {
                for child in children.iter().rev() {
                    self.queue.push_front((child, depth + 1));
                }
            }
        }
    }
}

impl<'a, F: TreeFields + ?Sized> Iterator for Traversal<'a, '_, F> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.queue.pop_front()?;
        self.schedule_children(node, depth);
        Some(node)
    }
}

pub fn traverse_iter<'a, 'f, F: TreeFields>(
    tree: &'a Value,
    options: impl Into<TraverseOptions>,
    fields: &'f F,
) -> Traversal<'a, 'f, F> {
    Traversal::new(tree, options, fields)
}

/// Visits every node until `visit` breaks.
#[instrument(level = "trace", skip_all)]
pub fn traverse_tree<F, V>(
    tree: &Value,
    options: impl Into<TraverseOptions>,
    fields: &F,
    mut visit: V,
) where
    F: TreeFields,
    V: FnMut(&Value) -> ControlFlow<()>,
{
    for node in Traversal::new(tree, options, fields) {
        if visit(node).is_break() {
            break;
        }
    }
}

/// True if any node satisfies `predicate`; stops at the first match.
#[instrument(level = "trace", skip_all)]
pub fn some_tree<F, P>(
    tree: &Value,
    options: impl Into<TraverseOptions>,
    fields: &F,
    mut predicate: P,
) -> bool
where
    F: TreeFields,
    P: FnMut(&Value) -> bool,
{
    Traversal::new(tree, options, fields).any(|node| predicate(node))
}

/// True if every node satisfies `predicate`; stops at the first failure.
/// An empty forest satisfies any predicate.
#[instrument(level = "trace", skip_all)]
pub fn every_tree<F, P>(
    tree: &Value,
    options: impl Into<TraverseOptions>,
    fields: &F,
    mut predicate: P,
) -> bool
where
    F: TreeFields,
    P: FnMut(&Value) -> bool,
{
    Traversal::new(tree, options, fields).all(|node| predicate(node))
}

/// First node in traversal order satisfying `predicate`.
#[instrument(level = "trace", skip_all)]
pub fn find_one_in_tree<'a, F, P>(
    tree: &'a Value,
    options: impl Into<TraverseOptions>,
    fields: &F,
    mut predicate: P,
) -> Option<&'a Value>
where
    F: TreeFields,
    P: FnMut(&Value) -> bool,
{
    Traversal::new(tree, options, fields).find(|node| predicate(node))
}

/// All nodes satisfying `predicate`, in traversal order.
#[instrument(level = "trace", skip_all)]
pub fn find_all_in_tree<'a, F, P>(
    tree: &'a Value,
    options: impl Into<TraverseOptions>,
    fields: &F,
    mut predicate: P,
) -> Vec<&'a Value>
where
    F: TreeFields,
    P: FnMut(&Value) -> bool,
{
    Traversal::new(tree, options, fields)
        .filter(|node| predicate(node))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldAlias;
    use serde_json::json;

    //      1
    //     / \
    //    2   3
    //    |
    //    4
    fn sample() -> Value {
        json!([{
            "id": 1,
            "children": [
                {"id": 2, "children": [{"id": 4}]},
                {"id": 3}
            ]
        }])
    }

    fn ids<'a>(nodes: impl Iterator<Item = &'a Value>) -> Vec<i64> {
        nodes.filter_map(|n| n["id"].as_i64()).collect()
    }

    #[test]
    fn given_tree_when_iterating_breadth_first_then_visits_level_by_level() {
        let tree = sample();
        let fields = FieldAlias::default();
        assert_eq!(ids(traverse_iter(&tree, TraverseOrder::Breadth, &fields)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn given_tree_when_iterating_depth_first_then_visits_pre_order() {
        let tree = sample();
        let fields = FieldAlias::default();
        assert_eq!(ids(traverse_iter(&tree, TraverseOrder::Depth, &fields)), vec![1, 2, 4, 3]);
    }

    #[test]
    fn given_max_depth_when_iterating_then_does_not_expand_past_limit() {
        let tree = sample();
        let fields = FieldAlias::default();
        let options = TraverseOptions::breadth().with_max_depth(2);
        assert_eq!(ids(traverse_iter(&tree, options, &fields)), vec![1, 2, 3]);
    }

    #[test]
    fn given_break_when_traversing_then_stops_immediately() {
        let tree = sample();
        let fields = FieldAlias::default();
        let mut seen = Vec::new();
        traverse_tree(&tree, TraverseOrder::Breadth, &fields, |node| {
            seen.push(node["id"].clone());
            if node["id"] == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(seen, vec![json!(1), json!(2)]);
    }
}
