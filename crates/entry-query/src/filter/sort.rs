//! Sort orchestrator.
//!
//! Applies an order directive either as a plain ORDER BY or, through a
//! belongs-to relation, as a join plus ORDER BY on the related display
//! column.

use convert_case::{Case, Casing};
use tracing::debug;

use super::directive::OrderDirective;
use crate::error::FilterResult;
use crate::query::EntryQuery;
use crate::schema::{EntryModel, Relation, SchemaRegistry};

/// Apply `order` to `query` for `model`.
pub fn apply_order(
    registry: &SchemaRegistry,
    model: &EntryModel,
    query: &mut EntryQuery,
    order: &OrderDirective,
) -> FilterResult<()> {
    let Some(relation) = order_relation(model, &order.order_by) else {
        query.order_by(&order.order_by, order.direction);
        return Ok(());
    };

    match relation {
        Relation::BelongsTo {
            foreign_key,
            related,
        } => {
            let related = registry.require(related)?;
            let related_table = &related.table;

            query
                .join(
                    related_table,
                    &format!("{}.{foreign_key}", model.table),
                    &format!("{related_table}.{}", related.key_name),
                )
                .order_by(
                    &format!("{related_table}.{}", related.display_column()),
                    order.direction,
                );
        }
        Relation::HasOne { .. }
        | Relation::HasMany { .. }
        | Relation::BelongsToMany { .. }
        | Relation::Polymorphic { .. } => {
            debug!(
                order_by = %order.order_by,
                kind = ?relation.kind(),
                "ordering only follows belongs-to relations; skipped"
            );
        }
    }

    Ok(())
}

/// Relation accessor for an order field: `created_by` → `createdBy`,
/// falling back to the name as given.
fn order_relation<'m>(model: &'m EntryModel, order_by: &str) -> Option<&'m Relation> {
    model
        .relation(&order_by.to_case(Case::Camel))
        .or_else(|| model.relation(order_by))
}
