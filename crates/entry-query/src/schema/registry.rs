//! Model registry.
//!
//! Models are registered once, validated, and then shared read-only by every
//! filter pass.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use super::EntryModel;
use crate::error::{FilterError, FilterResult};

/// Registry of models by name.
#[derive(Clone, Default)]
pub struct SchemaRegistry {
    models: Arc<DashMap<String, Arc<EntryModel>>>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model. Names must be unique.
    pub fn register(&self, model: EntryModel) -> FilterResult<Arc<EntryModel>> {
        match self.models.entry(model.name.clone()) {
            Entry::Occupied(_) => Err(FilterError::DuplicateModel(model.name)),
            Entry::Vacant(slot) => {
                let model = Arc::new(model);
                debug!(
                    model = %model.name,
                    table = %model.table,
                    relations = model.relations.len(),
                    "registered model"
                );
                slot.insert(model.clone());
                Ok(model)
            }
        }
    }

    /// Get a model by name.
    pub fn get(&self, name: &str) -> Option<Arc<EntryModel>> {
        self.models.get(name).map(|m| m.clone())
    }

    /// Get a model by name, failing if it is not registered.
    pub fn require(&self, name: &str) -> FilterResult<Arc<EntryModel>> {
        self.get(name)
            .ok_or_else(|| FilterError::UnknownModel(name.to_string()))
    }

    /// Find the entry model backing a stream.
    pub fn find_stream(&self, namespace: &str, slug: &str) -> Option<Arc<EntryModel>> {
        self.models
            .iter()
            .find(|m| {
                m.stream
                    .as_ref()
                    .is_some_and(|s| s.matches(namespace, slug))
            })
            .map(|m| m.value().clone())
    }

    /// Check that every relation targets a registered model.
    pub fn validate(&self) -> FilterResult<()> {
        let mut names: Vec<String> = self.models.iter().map(|m| m.key().clone()).collect();
        names.sort();

        for name in names {
            let Some(model) = self.get(&name) else {
                continue;
            };
            for (relation_name, relation) in &model.relations {
                if !self.models.contains_key(relation.related()) {
                    return Err(FilterError::UnresolvedRelation {
                        model: model.name.clone(),
                        relation: relation_name.clone(),
                        related: relation.related().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether no models are registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
