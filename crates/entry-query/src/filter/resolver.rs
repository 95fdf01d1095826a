//! Relation resolver.
//!
//! Decides whether a directive's field path names a plain column or a
//! relation, and for relations walks nested slugs down to the deepest
//! relation that resolves.

use std::sync::Arc;

use tracing::debug;

use crate::error::FilterResult;
use crate::schema::{EntryModel, Relation, SchemaRegistry};

/// What a field path points at.
#[derive(Debug, Clone)]
pub enum FieldTarget {
    /// A column on the active model.
    Field(String),
    /// A relation chain starting on the active model.
    Relation(ResolvedRelation),
}

/// A resolved relation chain.
#[derive(Debug, Clone)]
pub struct ResolvedRelation {
    /// Foreign key of the base relation; the active query is constrained on it.
    pub foreign_key: String,
    /// Deepest relation that resolved.
    pub relation: Relation,
    /// Related model of `relation`; the subquery runs against its table.
    pub related: Arc<EntryModel>,
    /// Column plucked from the subquery rows.
    pub other_key: String,
    /// Relation slugs that resolved, base first.
    pub traversed: Vec<String>,
}

/// Resolves field paths against a [`SchemaRegistry`].
pub struct RelationResolver<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> RelationResolver<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    /// Resolve `base` (and `nested` relation slugs) on `model`.
    ///
    /// A nested slug that is not a relation of the current related model is
    /// skipped; the walk keeps the last relation that did resolve. When any
    /// nested slugs were given, `other_key` is the last component of the
    /// deepest relation's foreign key; otherwise it is `model`'s primary key.
    pub fn resolve(
        &self,
        model: &EntryModel,
        base: &str,
        nested: &[String],
    ) -> FilterResult<FieldTarget> {
        let Some(relation) = model.relation(base) else {
            return Ok(FieldTarget::Field(base.to_string()));
        };

        let foreign_key = relation.foreign_key().to_string();
        let mut current = relation.clone();
        let mut traversed = vec![base.to_string()];

        for slug in nested {
            let related = self.registry.require(current.related())?;
            match related.relation(slug) {
                Some(next) => {
                    current = next.clone();
                    traversed.push(slug.clone());
                }
                None => debug!(
                    model = %related.name,
                    relation = %slug,
                    "nested relation not found; keeping current relation"
                ),
            }
        }

        let other_key = if nested.is_empty() {
            model.key_name.clone()
        } else {
            current.foreign_key_column().to_string()
        };
        let related = self.registry.require(current.related())?;

        Ok(FieldTarget::Relation(ResolvedRelation {
            foreign_key,
            relation: current,
            related,
            other_key,
            traversed,
        }))
    }
}
