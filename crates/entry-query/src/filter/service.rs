//! Entry query filter service.
//!
//! Runs a filter pass: parses the directives addressed to the active stream,
//! applies filters (running one subquery per relation directive), then the
//! order directive.

use std::sync::Arc;

use tracing::{debug, error};

use super::constraint::ConstraintCompiler;
use super::directive::{Directives, FilterDirective, QueryParams};
use super::resolver::{FieldTarget, RelationResolver, ResolvedRelation};
use super::sort::apply_order;
use crate::config::{EmptyRelationMatch, FilterConfig};
use crate::error::{FilterError, FilterResult};
use crate::query::{EntryQuery, QueryExecutor};
use crate::schema::{EntryModel, SchemaRegistry};

/// Applies request filter and order directives to entry queries.
pub struct EntryQueryFilter {
    registry: SchemaRegistry,
    executor: Arc<dyn QueryExecutor>,
    config: FilterConfig,
    compiler: ConstraintCompiler,
}

impl EntryQueryFilter {
    /// Create a filter with default configuration.
    pub fn new(registry: SchemaRegistry, executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            registry,
            executor,
            config: FilterConfig::default(),
            compiler: ConstraintCompiler::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: FilterConfig) -> Self {
        self.compiler = ConstraintCompiler::from_config(&config);
        self.config = config;
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Build a query for the stream `namespace.slug` and apply `params` to it.
    pub async fn query_stream(
        &self,
        namespace: &str,
        slug: &str,
        params: &QueryParams,
    ) -> FilterResult<EntryQuery> {
        let model = self
            .registry
            .find_stream(namespace, slug)
            .ok_or_else(|| FilterError::UnknownStream {
                namespace: namespace.to_string(),
                slug: slug.to_string(),
            })?;
        self.apply(&model, EntryQuery::for_model(&model), params)
            .await
    }

    /// Apply the filter and order directives in `params` to `query`.
    ///
    /// Directives addressed to other streams are ignored. With no matching
    /// directives the query is returned unchanged.
    pub async fn apply(
        &self,
        model: &EntryModel,
        mut query: EntryQuery,
        params: &QueryParams,
    ) -> FilterResult<EntryQuery> {
        let stream = model
            .stream
            .as_ref()
            .ok_or_else(|| FilterError::MissingStream(model.name.clone()))?;

        let directives = Directives::parse(params, stream);
        if directives.is_empty() {
            return Ok(query);
        }

        self.apply_filters(model, &mut query, &directives.filters)
            .await?;

        if let Some(ref order) = directives.order {
            apply_order(&self.registry, model, &mut query, order)?;
        }

        Ok(query)
    }

    /// Apply parsed filter directives, in order.
    pub async fn apply_filters(
        &self,
        model: &EntryModel,
        query: &mut EntryQuery,
        filters: &[FilterDirective],
    ) -> FilterResult<()> {
        let resolver = RelationResolver::new(&self.registry);

        for directive in filters {
            if let Some(ref stream) = model.stream
                && !directive.targets(stream)
            {
                continue;
            }

            let Some(base) = directive.base() else {
                debug!(
                    namespace = %directive.namespace,
                    slug = %directive.slug,
                    "filter directive without a field skipped"
                );
                continue;
            };

            match resolver.resolve(model, base, directive.nested())? {
                FieldTarget::Field(column) => {
                    if !directive.columns.is_empty() {
                        debug!(
                            field = %column,
                            "direct field directive with target columns skipped"
                        );
                        continue;
                    }
                    self.compiler
                        .constrain(query, &directive.constraint, &column, &directive.value);
                }
                FieldTarget::Relation(resolved) => {
                    self.apply_relation_filter(query, directive, &resolved)
                        .await?;
                }
            }
        }

        Ok(())
    }

    /// Constrain `query` by the keys of related rows matching `directive`.
    async fn apply_relation_filter(
        &self,
        query: &mut EntryQuery,
        directive: &FilterDirective,
        resolved: &ResolvedRelation,
    ) -> FilterResult<()> {
        if directive.columns.is_empty() {
            debug!(
                relation = ?resolved.traversed,
                "relation directive without target columns skipped"
            );
            return Ok(());
        }

        let mut subquery = EntryQuery::for_model(&resolved.related);
        subquery.select([resolved.other_key.as_str()]);
        for column in &directive.columns {
            self.compiler
                .constrain(&mut subquery, &directive.constraint, column, &directive.value);
        }
        if !subquery.has_constraints() {
            return Ok(());
        }

        let rows = subquery
            .get(self.executor.as_ref())
            .await
            .inspect_err(|e| {
                error!(
                    table = %resolved.related.table,
                    error = %e,
                    "relation filter subquery failed"
                );
            })?;

        let keys = rows.pluck(&resolved.other_key);
        debug!(
            table = %resolved.related.table,
            path = ?resolved.traversed,
            kind = ?resolved.relation.kind(),
            matches = keys.len(),
            "relation filter subquery executed"
        );

        if !keys.is_empty() {
            query.where_in(&resolved.foreign_key, keys);
            return Ok(());
        }

        match self.config.empty_relation_match {
            EmptyRelationMatch::Ignore => {}
            EmptyRelationMatch::MatchNothing => {
                query.where_false();
            }
        }
        Ok(())
    }
}
