//! Generic operations over hierarchical data.
//!
//! Trees are nested JSON records whose children live under a configurable
//! key; list-like trees are flat arrays whose items point at their parent by
//! id. A [`Value::Array`] is treated as a forest, `null` as an empty forest
//! and any other value as a single root.
//!
//! Field names are never hard-coded: every operation receives a
//! [`TreeFields`] implementation, normally a [`FieldAlias`].
//!
//! ```
//! use serde_json::json;
//! use treekit::{create_tree_from_tree_like_array, get_tree_depth, FieldAlias};
//!
//! let fields = FieldAlias::default();
//! let array = vec![json!({"id": 1}), json!({"id": 2, "pId": 1})];
//! let tree = serde_json::Value::Array(create_tree_from_tree_like_array(&array, &fields));
//! assert_eq!(get_tree_depth(&tree, &fields), 2);
//! ```

pub mod array;
pub mod config;
pub mod display;
pub mod errors;
pub mod fields;
pub mod path;
pub mod relation;
pub mod transform;
pub mod traverse;
pub mod util;

pub use serde_json::Value;

pub use array::{
    closest_parent_item_in_tree_array, closest_parent_keys_in_tree_array,
    create_tree_from_tree_like_array, filter_tree_array, find_children_item_in_tree_array,
    has_children_node,
};
pub use config::{FieldAlias, PathOptions, TraverseOptions, TraverseOrder, TreeConfig};
pub use display::TreeDisplay;
pub use errors::{TreeError, TreeResult};
pub use fields::{forest, is_truthy, TreeFields};
pub use path::{
    get_by_path, get_tree_node_by_path, resolve_object_path, resolve_tree_path, set_by_path,
    ObjectPath,
};
pub use relation::{
    closest_parent_item_in_tree, find_index_in_sibling_node, find_parent_tree_node,
    get_all_left_node, get_all_right_node, get_left_node, get_right_node,
};
pub use transform::{
    completion_tree_node_pid, completion_tree_node_pid_in_place, filter_tree, flatten_tree,
    get_tree_depth, map_tree, remove_empty_children, remove_empty_children_tree_node,
    replace_tree_node, sort_tree, statistics_tree_node_children, update_tree_node,
    update_tree_node_and_all_children_node, update_tree_node_and_all_parent_node, Replacement,
};
pub use traverse::{
    every_tree, find_all_in_tree, find_one_in_tree, some_tree, traverse_iter, traverse_tree,
    Traversal,
};
