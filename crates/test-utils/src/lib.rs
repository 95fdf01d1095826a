//! Entry query test utilities.
//!
//! Helpers for integration testing: a canned query executor, a blog schema
//! fixture, and assertion helpers for rendered SQL.

use std::collections::HashMap;

use async_trait::async_trait;
use entry_query::{
    EntryModel, EntryQuery, FilterResult, QueryExecutor, QueryParams, Relation, ResultSet,
    SchemaRegistry, Stream,
};
use parking_lot::Mutex;
use serde_json::Value as JsonValue;

/// Executor returning canned rows per table.
///
/// Every query it receives is recorded as rendered SQL so tests can assert
/// on the subqueries a filter pass ran.
#[derive(Default)]
pub struct CannedExecutor {
    rows: HashMap<String, Vec<JsonValue>>,
    failure: Option<String>,
    executed: Mutex<Vec<String>>,
}

impl CannedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `rows` for queries against `table`.
    pub fn with_rows(mut self, table: &str, rows: Vec<JsonValue>) -> Self {
        self.rows.insert(table.to_string(), rows);
        self
    }

    /// An executor whose every query fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// SQL of every query received, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }
}

#[async_trait]
impl QueryExecutor for CannedExecutor {
    async fn fetch(&self, query: &EntryQuery) -> anyhow::Result<ResultSet> {
        self.executed.lock().push(query.to_sql());

        if let Some(ref message) = self.failure {
            anyhow::bail!("{message}");
        }

        let rows = self
            .rows
            .get(query.table_name())
            .cloned()
            .unwrap_or_default();
        Ok(ResultSet::new(rows))
    }
}

/// Build request parameters from name/value pairs.
pub fn params(pairs: &[(&str, &str)]) -> QueryParams {
    pairs.iter().copied().collect()
}

/// A blog schema.
///
/// `blog.posts` (table `blog_posts`) relates to:
/// - `author`: belongs to `blog.authors` via `author_id`
/// - `createdBy`: belongs to `users` via `created_by_id`
/// - `category`: belongs to `blog.categories` via `category_id`
/// - `comments`: has many `blog.comments` via `blog_comments.post_id`
/// - `tags`: belongs to many `blog.tags` through `blog_post_tags`
/// - `attachment`: polymorphic to `files` via `attachable_type`/`attachable_id`
///
/// `blog.authors` has one `blog.profiles` via `profiles.author_id`.
pub fn blog_registry() -> FilterResult<SchemaRegistry> {
    let registry = SchemaRegistry::new();

    registry.register(
        EntryModel::entry(
            Stream::new("blog", "posts").with_title_column("title"),
            "blog_posts",
        )
        .with_relation("author", Relation::belongs_to("author_id", "blog.authors"))
        .with_relation("createdBy", Relation::belongs_to("created_by_id", "users"))
        .with_relation(
            "category",
            Relation::belongs_to("category_id", "blog.categories"),
        )
        .with_relation(
            "comments",
            Relation::has_many("blog_comments.post_id", "blog.comments"),
        )
        .with_relation(
            "tags",
            Relation::belongs_to_many("blog_post_tags", "post_id", "tag_id", "blog.tags"),
        )
        .with_relation(
            "attachment",
            Relation::polymorphic("attachable_type", "attachable_id", "files"),
        ),
    )?;

    registry.register(
        EntryModel::entry(
            Stream::new("blog", "authors").with_title_column("display_name"),
            "authors",
        )
        .with_relation(
            "profile",
            Relation::has_one("profiles.author_id", "blog.profiles"),
        ),
    )?;
    registry.register(EntryModel::new("blog.profiles", "profiles"))?;
    registry.register(EntryModel::new("users", "users").with_order_by_column("username"))?;
    registry.register(EntryModel::entry(
        Stream::new("blog", "categories").with_title_column("name"),
        "blog_categories",
    ))?;
    registry.register(EntryModel::entry(
        Stream::new("blog", "comments"),
        "blog_comments",
    ))?;
    registry.register(EntryModel::entry(Stream::new("blog", "tags"), "blog_tags"))?;
    registry.register(EntryModel::new("files", "files").with_order_by_column("filename"))?;

    registry.validate()?;
    Ok(registry)
}

/// Assertion helpers for rendered SQL.
pub mod assert {
    /// Assert that `sql` contains `fragment`.
    pub fn sql_contains(sql: &str, fragment: &str) {
        assert!(
            sql.contains(fragment),
            "Expected SQL to contain '{fragment}'\nActual: {sql}"
        );
    }

    /// Assert that `sql` does not contain `fragment`.
    pub fn sql_not_contains(sql: &str, fragment: &str) {
        assert!(
            !sql.contains(fragment),
            "Expected SQL to NOT contain '{fragment}'\nActual: {sql}"
        );
    }
}
