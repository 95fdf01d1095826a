//! Stream and model metadata.
//!
//! This module provides:
//! - Stream: namespace/slug identity plus the optional title column
//! - EntryModel: table, primary key, and the relation registry of a model
//! - Relation: closed set of relation variants
//! - SchemaRegistry: lookup of models by name or stream

mod registry;
mod relation;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use registry::SchemaRegistry;
pub use relation::{Relation, RelationKind};

/// A stream definition: the schema entries conform to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    /// Stream namespace (e.g. "blog").
    pub namespace: String,

    /// Stream slug (e.g. "posts").
    pub slug: String,

    /// Column shown when another stream sorts through a belongs-to relation.
    #[serde(default)]
    pub title_column: Option<String>,
}

impl Stream {
    pub fn new(namespace: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            slug: slug.into(),
            title_column: None,
        }
    }

    pub fn with_title_column(mut self, column: impl Into<String>) -> Self {
        self.title_column = Some(column.into());
        self
    }

    /// Whether the given namespace and slug identify this stream.
    pub fn matches(&self, namespace: &str, slug: &str) -> bool {
        self.namespace == namespace && self.slug == slug
    }

    /// Name of a stream-scoped request parameter, e.g. `order-blog-posts`.
    pub fn param(&self, prefix: &str) -> String {
        format!("{prefix}-{}-{}", self.namespace, self.slug)
    }
}

fn default_key_name() -> String {
    "id".to_string()
}

/// Model metadata for a table, optionally backed by a stream.
///
/// Models with a stream are entry models; models without one are plain
/// tables that entries relate to (users, files, …).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryModel {
    /// Registry name (e.g. "blog.posts", "users").
    pub name: String,

    /// Database table.
    pub table: String,

    /// Primary key column (default: "id").
    #[serde(default = "default_key_name")]
    pub key_name: String,

    /// Backing stream, if this is an entry model.
    #[serde(default)]
    pub stream: Option<Stream>,

    /// Default display/order column (default: "id").
    #[serde(default = "default_key_name")]
    pub order_by_column: String,

    /// Relations by accessor name.
    #[serde(default)]
    pub relations: BTreeMap<String, Relation>,
}

impl EntryModel {
    /// Create a plain table model.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            key_name: default_key_name(),
            stream: None,
            order_by_column: default_key_name(),
            relations: BTreeMap::new(),
        }
    }

    /// Create an entry model backed by `stream`, named `namespace.slug`.
    pub fn entry(stream: Stream, table: impl Into<String>) -> Self {
        let name = format!("{}.{}", stream.namespace, stream.slug);
        Self {
            stream: Some(stream),
            ..Self::new(name, table)
        }
    }

    pub fn with_key_name(mut self, key_name: impl Into<String>) -> Self {
        self.key_name = key_name.into();
        self
    }

    pub fn with_order_by_column(mut self, column: impl Into<String>) -> Self {
        self.order_by_column = column.into();
        self
    }

    pub fn with_relation(mut self, name: impl Into<String>, relation: Relation) -> Self {
        self.relations.insert(name.into(), relation);
        self
    }

    /// Look up a relation by accessor name.
    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    /// Column used when another model orders by this one.
    ///
    /// Entry models use their stream's title column when one is set;
    /// everything else falls back to `order_by_column`.
    pub fn display_column(&self) -> &str {
        self.stream
            .as_ref()
            .and_then(|s| s.title_column.as_deref())
            .filter(|c| !c.is_empty())
            .unwrap_or(self.order_by_column.as_str())
    }
}
