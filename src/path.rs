//! Path resolution and path-addressed access.
//!
//! Object paths (`a.b[2].c`) address fields of arbitrary records; tree paths
//! (`child1.child11`, `child1[0]`) address nodes by label or child index.

use std::sync::OnceLock;

use regex::{Captures, Regex, RegexBuilder};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::config::{PathOptions, DEFAULT_PATH_SEPARATOR};
use crate::errors::{TreeError, TreeResult};
use crate::fields::is_truthy;

/// A path given either as text or as already separated steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectPath<'a> {
    Text(&'a str),
    Segments(Vec<String>),
}

impl<'a> From<&'a str> for ObjectPath<'a> {
    fn from(path: &'a str) -> Self {
        ObjectPath::Text(path)
    }
}

impl<'a> From<&'a String> for ObjectPath<'a> {
    fn from(path: &'a String) -> Self {
        ObjectPath::Text(path.as_str())
    }
}

impl From<Vec<String>> for ObjectPath<'_> {
    fn from(segments: Vec<String>) -> Self {
        ObjectPath::Segments(segments)
    }
}

impl From<&[&str]> for ObjectPath<'_> {
    fn from(segments: &[&str]) -> Self {
        ObjectPath::Segments(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ObjectPath<'_> {
    fn from(segments: [&str; N]) -> Self {
        ObjectPath::Segments(segments.iter().map(|s| s.to_string()).collect())
    }
}

fn bracket_index() -> &'static Regex {
    static BRACKET: OnceLock<Regex> = OnceLock::new();
    BRACKET.get_or_init(|| Regex::new(r"\[(\d+)\]").expect("bracket index pattern"))
}

fn split_steps(text: &str, separator: &str) -> Vec<String> {
    text.split(separator)
        .filter(|step| !step.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalizes an object path into its steps.
///
/// `a.b[2].c` resolves to `["a", "b", "2", "c"]`. Segments are returned as
/// given.
pub fn resolve_object_path<'a>(path: impl Into<ObjectPath<'a>>) -> Vec<String> {
    match path.into() {
        ObjectPath::Segments(segments) => segments,
        ObjectPath::Text(text) => {
            let dotted = bracket_index().replace_all(text, ".$1");
            split_steps(&dotted, DEFAULT_PATH_SEPARATOR)
        }
    }
}

/// Normalizes a tree path into its steps.
///
/// Every occurrence of `children_key` is removed (case-insensitively) before
/// splitting, so `child1.children[0]` and `child1[0]` are the same path.
pub fn resolve_tree_path<'a>(
    path: impl Into<ObjectPath<'a>>,
    separator: &str,
    children_key: &str,
) -> Vec<String> {
    let text = match path.into() {
        ObjectPath::Segments(segments) => return segments,
        ObjectPath::Text(text) => text,
    };
    let separator = if separator.is_empty() {
        DEFAULT_PATH_SEPARATOR
    } else {
        separator
    };

    let stripped = match RegexBuilder::new(&regex::escape(children_key))
        .case_insensitive(true)
        .build()
    {
        Ok(re) if !children_key.is_empty() => re.replace_all(text, "").into_owned(),
        _ => text.to_string(),
    };
    let separated = bracket_index()
        .replace_all(&stripped, |caps: &Captures| format!("{}{}", separator, &caps[1]));
    split_steps(&separated, separator)
}

fn is_digits(step: &str) -> bool {
    !step.is_empty() && step.bytes().all(|b| b.is_ascii_digit())
}

fn parse_index(step: &str) -> Option<usize> {
    is_digits(step).then(|| step.parse().ok()).flatten()
}

/// Reads the value at `path`, or `None` if any step is absent.
pub fn get_by_path<'v, 'p>(root: &'v Value, path: impl Into<ObjectPath<'p>>) -> Option<&'v Value> {
    resolve_object_path(path)
        .iter()
        .try_fold(root, |node, step| match node {
            Value::Object(record) => record.get(step),
            Value::Array(items) => parse_index(step).and_then(|i| items.get(i)),
            _ => None,
        })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn conflict(path: &[String], segment: &str, found: &Value) -> TreeError {
    TreeError::PathConflict {
        path: path.to_vec(),
        segment: segment.to_string(),
        found: type_name(found),
    }
}

/// Upper bound on the `null` padding a single array write may add.
pub const MAX_ARRAY_GROWTH: usize = 10_000;

fn out_of_range(path: &[String], segment: &str, len: usize) -> TreeError {
    TreeError::IndexOutOfRange {
        path: path.to_vec(),
        segment: segment.to_string(),
        len,
        max_growth: MAX_ARRAY_GROWTH,
    }
}

/// Slot `step` of `items`, padding with `null` up to it when it lies past
/// the end, by no more than [`MAX_ARRAY_GROWTH`] slots.
fn array_slot<'a>(
    items: &'a mut Vec<Value>,
    step: &str,
    path: &[String],
) -> TreeResult<&'a mut Value> {
    let Some(index) = parse_index(step) else {
        return Err(if is_digits(step) {
            out_of_range(path, step, items.len())
        } else {
            conflict(path, step, &Value::Array(Vec::new()))
        });
    };
    if index >= items.len() {
        let len = index
            .checked_add(1)
            .filter(|&len| len - items.len() <= MAX_ARRAY_GROWTH)
            .ok_or_else(|| out_of_range(path, step, items.len()))?;
        items.resize(len, Value::Null);
    }
    Ok(&mut items[index])
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Descends one step, replacing a missing or falsy slot with a new container.
fn descend_or_create<'a>(
    node: &'a mut Value,
    step: &str,
    next_is_index: bool,
    path: &[String],
) -> TreeResult<&'a mut Value> {
    let slot = match node {
        Value::Object(record) => record.entry(step.to_string()).or_insert(Value::Null),
        Value::Array(items) => array_slot(items, step, path)?,
        other => return Err(conflict(path, step, other)),
    };

    if !is_container(slot) {
        if is_truthy(slot) {
            return Err(conflict(path, step, slot));
        }
        *slot = if next_is_index {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        };
    }
    Ok(slot)
}

/// Descends one step through existing containers only.
fn descend_existing<'a>(node: &'a mut Value, step: &str) -> Option<&'a mut Value> {
    let child = match node {
        Value::Object(record) => record.get_mut(step),
        Value::Array(items) => parse_index(step).and_then(|i| items.get_mut(i)),
        _ => None,
    }?;
    is_container(child).then_some(child)
}

fn assign(container: &mut Value, leaf: &str, value: Value, path: &[String]) -> TreeResult<()> {
    match container {
        Value::Object(record) => {
            record.insert(leaf.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            *array_slot(items, leaf, path)? = value;
            Ok(())
        }
        other => Err(conflict(path, leaf, other)),
    }
}

/// Writes `value` at `path`. **Mutates `root`.**
///
/// Missing intermediate containers are created on a scratch copy of `root`,
/// not on `root` itself, while the leaf is written through the live `root`.
/// The leaf therefore lands in `root` only when every intermediate container
/// already exists there:
///
/// - `Ok(true)`: the value was written into `root`
/// - `Ok(false)`: an intermediate was missing, `root` is unchanged
///
/// # Errors
/// * `TreeError::EmptyPath` if the path has no steps
/// * `TreeError::PathConflict` if a step must descend into a non-empty scalar
/// * `TreeError::IndexOutOfRange` if an array index would need more than
///   [`MAX_ARRAY_GROWTH`] padding slots, or does not fit in `usize`
#[instrument(level = "debug", skip(root, path, value))]
pub fn set_by_path<'p>(
    root: &mut Value,
    path: impl Into<ObjectPath<'p>>,
    value: Value,
) -> TreeResult<bool> {
    let steps = resolve_object_path(path);
    let Some((leaf, intermediates)) = steps.split_last() else {
        return Err(TreeError::EmptyPath);
    };

    let mut scratch = root.clone();
    let mut cursor = &mut scratch;
    let mut live = Some(root);
    for (i, step) in intermediates.iter().enumerate() {
        let next_is_index = parse_index(&steps[i + 1]).is_some();
        cursor = descend_or_create(cursor, step, next_is_index, &steps)?;
        live = live.and_then(|node| descend_existing(node, step));
    }
    assign(cursor, leaf, value.clone(), &steps)?;

    match live {
        Some(target) => {
            assign(target, leaf, value, &steps)?;
            Ok(true)
        }
        None => {
            debug!(?steps, "intermediate container missing on original, leaf not written");
            Ok(false)
        }
    }
}

fn is_numeric(step: &str) -> bool {
    step.trim().parse::<f64>().is_ok_and(f64::is_finite)
}

/// Looks up a node by label or child index along a tree path.
///
/// ```text
/// ""               -> tree
/// "child1"         -> child of tree whose title is "child1"
/// "children[1]"    -> second child of tree
/// "child1.child11" -> grandchild titled "child11" under "child1"
/// "child1[0]"      -> first child of "child1"
/// ```
///
/// When `tree` is a forest, the first step selects among its roots.
pub fn get_tree_node_by_path<'v, 'p>(
    tree: &'v Value,
    path: impl Into<ObjectPath<'p>>,
    options: &PathOptions,
) -> Option<&'v Value> {
    let steps = resolve_tree_path(path, &options.path_separator, &options.children_key);
    steps.iter().try_fold(tree, |branch, step| {
        let children = match branch {
            Value::Array(roots) => roots,
            node => node.get(&options.children_key)?.as_array()?,
        };
        // only plain digit steps index; "1.0", "1e0" or " 1" address nothing
        if let Some(index) = parse_index(step) {
            return children.get(index);
        }
        if is_numeric(step) {
            return None;
        }
        children.iter().find(|child| {
            child.get(&options.field_name).and_then(Value::as_str) == Some(step.as_str())
        })
    })
}
