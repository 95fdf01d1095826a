//! Entry query filters.
//!
//! Turns request-style `f-{namespace}-{slug}-…` filter parameters and
//! `order-`/`sort-` parameters into a relation-aware SQL query over a stream
//! of entries. The entry point is [`EntryQueryFilter`].

pub mod config;
pub mod db;
pub mod error;
pub mod filter;
pub mod query;
pub mod schema;

pub use config::{DatabaseConfig, EmptyRelationMatch, FilterConfig};
pub use error::{FilterError, FilterResult};
pub use filter::{
    ConstraintCompiler, ConstraintType, Directives, EntryQueryFilter, FieldTarget,
    FilterDirective, OrderDirective, QueryParams, RelationResolver, ResolvedRelation, apply_order,
    constrain, filtering_enabled,
};
pub use query::{
    EntryQuery, Operator, PgQueryExecutor, Predicate, QueryExecutor, ResultSet, SortDirection,
};
pub use schema::{EntryModel, Relation, RelationKind, SchemaRegistry, Stream};
