/*
Trait instead of inherent impl: `Value` is defined in serde_json (E0116),
so rendering lives behind an extension trait implemented for it here.
 */
use serde_json::Value;
use termtree::Tree;
use tracing::instrument;

use crate::fields::{forest, TreeFields};

/// Label used for a node with neither a label field nor an id.
pub const UNLABELED: &str = "<node>";

pub trait TreeDisplay {
    /// Renders the tree for printing; `label_key` picks the field shown for
    /// each node, falling back to the id.
    fn to_tree_string<F: TreeFields>(&self, label_key: &str, fields: &F) -> Tree<String>;
}

fn label<F: TreeFields>(node: &Value, label_key: &str, fields: &F) -> String {
    let shown = node.get(label_key).or_else(|| fields.id(node));
    match shown {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => UNLABELED.to_string(),
    }
}

fn render<F: TreeFields>(root: &Value, label_key: &str, fields: &F) -> Tree<String> {
    // pre-order labels with the index of their parent
    let mut nodes: Vec<(String, Option<usize>)> = Vec::new();
    let mut pending = vec![(root, None)];
    while let Some((node, parent)) = pending.pop() {
        let index = nodes.len();
        nodes.push((label(node, label_key, fields), parent));
        if let Some(children) = fields.children(node) {
            pending.extend(children.iter().rev().map(|child| (child, Some(index))));
        }
    }

    // walking pre-order backwards completes every subtree before its parent;
    // siblings arrive last to first
    let mut leaves: Vec<Vec<Tree<String>>> = nodes.iter().map(|_| Vec::new()).collect();
    while let Some((label, parent)) = nodes.pop() {
        let mut children = leaves.pop().unwrap_or_default();
        children.reverse();
        let subtree = Tree::new(label).with_leaves(children);
        match parent {
            Some(p) => leaves[p].push(subtree),
            None => return subtree,
        }
    }
    Tree::new(UNLABELED.to_string())
}

impl TreeDisplay for Value {
    #[instrument(level = "debug", skip(self, fields))]
    fn to_tree_string<F: TreeFields>(&self, label_key: &str, fields: &F) -> Tree<String> {
        match self {
            Value::Array(_) | Value::Null => Tree::new(".".to_string()).with_leaves(
                forest(self)
                    .iter()
                    .map(|root| render(root, label_key, fields)),
            ),
            node => render(node, label_key, fields),
        }
    }
}
