//! Request-driven filtering for entry queries.
//!
//! A filter pass runs in four stages: directives are parsed from request
//! parameters, field paths are resolved against the schema registry,
//! constraints are compiled onto the active query (through a subquery for
//! relation fields), and finally the order directive is applied.

mod constraint;
mod directive;
mod resolver;
mod service;
mod sort;

pub use constraint::{ConstraintCompiler, ConstraintType, constrain};
pub use directive::{Directives, FilterDirective, OrderDirective, QueryParams, filtering_enabled};
pub use resolver::{FieldTarget, RelationResolver, ResolvedRelation};
pub use service::EntryQueryFilter;
pub use sort::apply_order;
