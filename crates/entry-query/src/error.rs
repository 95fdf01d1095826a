//! Filter error types.

use thiserror::Error;

/// Errors raised while applying entry query filters.
///
/// Malformed or unmatched directives are never errors; they are skipped.
/// Only schema lookups and query execution can fail a filter pass.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error("model has no stream: {0}")]
    MissingStream(String),

    #[error("no model registered for stream {namespace}.{slug}")]
    UnknownStream { namespace: String, slug: String },

    #[error("model already registered: {0}")]
    DuplicateModel(String),

    #[error("relation '{relation}' on '{model}' targets unknown model '{related}'")]
    UnresolvedRelation {
        model: String,
        relation: String,
        related: String,
    },

    #[error("query execution failed: {0}")]
    Execution(#[from] anyhow::Error),
}

/// Result type alias using FilterError.
pub type FilterResult<T> = Result<T, FilterError>;
