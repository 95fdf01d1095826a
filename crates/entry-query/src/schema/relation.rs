//! Relation descriptors between models.

use serde::{Deserialize, Serialize};

/// A directed edge from one model to another.
///
/// `foreign_key` is the owning-side key. For `BelongsTo` it is a column on
/// the declaring model; for the other variants it usually lives on the
/// related (or pivot) table and may be table-qualified, e.g.
/// `profiles.author_id`. `related` names a model in the
/// [`SchemaRegistry`](super::SchemaRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Relation {
    BelongsTo {
        foreign_key: String,
        related: String,
    },
    HasOne {
        foreign_key: String,
        related: String,
    },
    HasMany {
        foreign_key: String,
        related: String,
    },
    BelongsToMany {
        pivot_table: String,
        foreign_key: String,
        other_key: String,
        related: String,
    },
    Polymorphic {
        morph_type: String,
        foreign_key: String,
        related: String,
    },
}

/// Variant tag of a [`Relation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    BelongsTo,
    HasOne,
    HasMany,
    BelongsToMany,
    Polymorphic,
}

impl Relation {
    pub fn belongs_to(foreign_key: impl Into<String>, related: impl Into<String>) -> Self {
        Self::BelongsTo {
            foreign_key: foreign_key.into(),
            related: related.into(),
        }
    }

    pub fn has_one(foreign_key: impl Into<String>, related: impl Into<String>) -> Self {
        Self::HasOne {
            foreign_key: foreign_key.into(),
            related: related.into(),
        }
    }

    pub fn has_many(foreign_key: impl Into<String>, related: impl Into<String>) -> Self {
        Self::HasMany {
            foreign_key: foreign_key.into(),
            related: related.into(),
        }
    }

    /// Many-to-many through `pivot_table`. The foreign key is qualified with
    /// the pivot table.
    pub fn belongs_to_many(
        pivot_table: impl Into<String>,
        foreign_key: &str,
        other_key: &str,
        related: impl Into<String>,
    ) -> Self {
        let pivot_table = pivot_table.into();
        Self::BelongsToMany {
            foreign_key: format!("{pivot_table}.{foreign_key}"),
            other_key: format!("{pivot_table}.{other_key}"),
            pivot_table,
            related: related.into(),
        }
    }

    pub fn polymorphic(
        morph_type: impl Into<String>,
        foreign_key: impl Into<String>,
        related: impl Into<String>,
    ) -> Self {
        Self::Polymorphic {
            morph_type: morph_type.into(),
            foreign_key: foreign_key.into(),
            related: related.into(),
        }
    }

    pub fn kind(&self) -> RelationKind {
        match self {
            Self::BelongsTo { .. } => RelationKind::BelongsTo,
            Self::HasOne { .. } => RelationKind::HasOne,
            Self::HasMany { .. } => RelationKind::HasMany,
            Self::BelongsToMany { .. } => RelationKind::BelongsToMany,
            Self::Polymorphic { .. } => RelationKind::Polymorphic,
        }
    }

    /// Owning-side foreign key, as declared (possibly table-qualified).
    pub fn foreign_key(&self) -> &str {
        match self {
            Self::BelongsTo { foreign_key, .. }
            | Self::HasOne { foreign_key, .. }
            | Self::HasMany { foreign_key, .. }
            | Self::BelongsToMany { foreign_key, .. }
            | Self::Polymorphic { foreign_key, .. } => foreign_key,
        }
    }

    /// Last path component of the foreign key (`profiles.author_id` → `author_id`).
    pub fn foreign_key_column(&self) -> &str {
        let key = self.foreign_key();
        key.rsplit('.').next().unwrap_or(key)
    }

    /// Name of the related model.
    pub fn related(&self) -> &str {
        match self {
            Self::BelongsTo { related, .. }
            | Self::HasOne { related, .. }
            | Self::HasMany { related, .. }
            | Self::BelongsToMany { related, .. }
            | Self::Polymorphic { related, .. } => related,
        }
    }
}
