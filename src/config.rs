//! Configuration: field aliases, path options and traversal options
//!
//! Every operation takes its options as explicit structs. `TreeConfig` bundles
//! them and supports layered loading.
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Optional TOML file supplied by the caller
//! 3. Environment variables: `TREEKIT_*` prefix, `__` as section separator
//!    (e.g. `TREEKIT_FIELDS__PARENT_ID_KEY=parentId`)

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::errors::{config_err, TreeResult};

pub const DEFAULT_ID_KEY: &str = "id";
pub const DEFAULT_PARENT_ID_KEY: &str = "pId";
pub const DEFAULT_CHILDREN_KEY: &str = "children";
pub const DEFAULT_PATH_SEPARATOR: &str = ".";
pub const DEFAULT_FIELD_NAME: &str = "title";
pub const DEFAULT_STATISTICS_KEY: &str = "statistics";

/// Names of the fields holding the identifier, the parent reference and the
/// children sequence of a record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FieldAlias {
    pub id_key: String,
    pub parent_id_key: String,
    pub children_key: String,
}

impl Default for FieldAlias {
    fn default() -> Self {
        Self {
            id_key: DEFAULT_ID_KEY.into(),
            parent_id_key: DEFAULT_PARENT_ID_KEY.into(),
            children_key: DEFAULT_CHILDREN_KEY.into(),
        }
    }
}

impl FieldAlias {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id_key(mut self, key: impl Into<String>) -> Self {
        self.id_key = key.into();
        self
    }

    pub fn with_parent_id_key(mut self, key: impl Into<String>) -> Self {
        self.parent_id_key = key.into();
        self
    }

    pub fn with_children_key(mut self, key: impl Into<String>) -> Self {
        self.children_key = key.into();
        self
    }
}

/// Options for string-path lookup of tree nodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathOptions {
    /// Delimiter between path steps
    pub path_separator: String,
    /// Label field matched against non-numeric path steps
    pub field_name: String,
    /// Field holding nested children
    pub children_key: String,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            path_separator: DEFAULT_PATH_SEPARATOR.into(),
            field_name: DEFAULT_FIELD_NAME.into(),
            children_key: DEFAULT_CHILDREN_KEY.into(),
        }
    }
}

impl PathOptions {
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.path_separator = separator.into();
        self
    }

    pub fn with_field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    pub fn with_children_key(mut self, key: impl Into<String>) -> Self {
        self.children_key = key.into();
        self
    }
}

/// Order in which a traversal expands children.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TraverseOrder {
    #[default]
    #[serde(alias = "breath")]
    Breadth,
    Depth,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TraverseOptions {
    pub order: TraverseOrder,
    /// Nodes at this depth (roots are depth 1) are visited but not expanded.
    /// `None` walks the whole tree.
    pub max_depth: Option<usize>,
}

impl TraverseOptions {
    pub fn breadth() -> Self {
        Self::default()
    }

    pub fn depth() -> Self {
        Self {
            order: TraverseOrder::Depth,
            max_depth: None,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

impl From<TraverseOrder> for TraverseOptions {
    fn from(order: TraverseOrder) -> Self {
        Self {
            order,
            max_depth: None,
        }
    }
}

/// Unified configuration for all tree operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TreeConfig {
    pub fields: FieldAlias,
    pub path: PathOptions,
    pub traversal: TraverseOptions,
}

impl TreeConfig {
    /// Load configuration with layered precedence.
    ///
    /// # Arguments
    /// * `file` - Optional TOML file; a missing file is an error when given
    #[instrument(level = "debug")]
    pub fn load(file: Option<&Path>) -> TreeResult<Self> {
        let mut builder = Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("TREEKIT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;
        let settings: Self = config.try_deserialize().map_err(config_err)?;
        debug!(?settings, "loaded tree config");
        Ok(settings)
    }

    /// Parse a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(content: &str) -> TreeResult<Self> {
        toml::from_str(content).map_err(config_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_defaults_when_created_then_uses_conventional_keys() {
        let alias = FieldAlias::default();
        assert_eq!(alias.id_key, "id");
        assert_eq!(alias.parent_id_key, "pId");
        assert_eq!(alias.children_key, "children");

        let path = PathOptions::default();
        assert_eq!(path.path_separator, ".");
        assert_eq!(path.field_name, "title");
    }

    #[test]
    fn given_partial_toml_when_parsing_then_keeps_remaining_defaults() {
        let config = TreeConfig::from_toml_str(
            r#"
[fields]
children_key = "nodes"

[traversal]
order = "depth"
"#,
        )
        .expect("parse toml");

        assert_eq!(config.fields.children_key, "nodes");
        assert_eq!(config.fields.id_key, "id");
        assert_eq!(config.traversal.order, TraverseOrder::Depth);
        assert_eq!(config.traversal.max_depth, None);
        assert_eq!(config.path, PathOptions::default());
    }

    #[test]
    fn given_legacy_breath_spelling_when_parsing_then_maps_to_breadth() {
        let config = TreeConfig::from_toml_str("[traversal]\norder = \"breath\"\n").unwrap();
        assert_eq!(config.traversal.order, TraverseOrder::Breadth);
    }

    #[test]
    fn given_malformed_toml_when_parsing_then_returns_config_error() {
        let err = TreeConfig::from_toml_str("[fields\nid_key = 1").unwrap_err();
        assert!(err.to_string().starts_with("config error"));
    }
}
