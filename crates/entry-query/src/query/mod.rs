//! Entry query builder using SeaQuery.
//!
//! `EntryQuery` is the mutable query object a filter pass works on. It
//! accumulates predicates, joins, order clauses, and an optional projection
//! for one base table, and renders them as PostgreSQL on demand.
//!
//! Column names may be table-qualified (`authors.display_name`); anything
//! else is rendered as a bare column.

mod executor;

use sea_query::{
    Alias, Asterisk, ColumnRef, Expr, IntoColumnRef, Order, PostgresQueryBuilder, Query,
    SelectStatement, SimpleExpr, Value, Values,
};
use serde::{Deserialize, Serialize};

use crate::schema::EntryModel;

pub use executor::{PgQueryExecutor, QueryExecutor, ResultSet};

/// Comparison operators accepted by [`EntryQuery::and_where`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// `=`
    Eq,
    /// `<>`
    NotEq,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `>`
    Gt,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse `asc`/`desc`, ignoring case.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if raw.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    fn order(self) -> Order {
        match self {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

/// A predicate recorded on an [`EntryQuery`].
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `column op value`
    Compare {
        column: String,
        op: Operator,
        value: String,
    },
    /// `column IS NULL`
    IsNull(String),
    /// `column IN (values)`
    In { column: String, values: Vec<Value> },
    /// `FALSE`
    False,
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    pub fn compare(column: &str, op: Operator, value: impl Into<String>) -> Self {
        Self::Compare {
            column: column.to_string(),
            op,
            value: value.into(),
        }
    }

    pub fn is_null(column: &str) -> Self {
        Self::IsNull(column.to_string())
    }

    pub fn and(self, other: Predicate) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    fn to_expr(&self) -> SimpleExpr {
        match self {
            Self::Compare { column, op, value } => {
                let col = Expr::col(column_ref(column));
                let value = value.as_str();
                match op {
                    Operator::Eq => col.eq(value),
                    Operator::NotEq => col.ne(value),
                    Operator::Like => col.like(value),
                    Operator::NotLike => col.not_like(value),
                    Operator::Gt => col.gt(value),
                }
            }
            Self::IsNull(column) => Expr::col(column_ref(column)).is_null(),
            Self::In { column, values } => Expr::col(column_ref(column)).is_in(values.clone()),
            Self::False => Expr::cust("FALSE"),
            Self::And(left, right) => left.to_expr().and(right.to_expr()),
            Self::Or(left, right) => left.to_expr().or(right.to_expr()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Join {
    table: String,
    left: String,
    right: String,
}

/// Mutable query over one base table.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryQuery {
    table: String,
    columns: Vec<String>,
    joins: Vec<Join>,
    condition: Option<Predicate>,
    orders: Vec<(String, SortDirection)>,
}

impl EntryQuery {
    /// Start a query selecting every column of `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            joins: Vec::new(),
            condition: None,
            orders: Vec::new(),
        }
    }

    /// Start a query on a model's table.
    pub fn for_model(model: &EntryModel) -> Self {
        Self::table(&model.table)
    }

    /// Base table name.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Restrict the projection to `columns`.
    pub fn select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Add `column op value`, combined with AND.
    pub fn and_where(&mut self, column: &str, op: Operator, value: &str) -> &mut Self {
        self.where_predicate(Predicate::compare(column, op, value))
    }

    /// Add `column op value`, combined with OR.
    pub fn or_where(&mut self, column: &str, op: Operator, value: &str) -> &mut Self {
        self.or_where_predicate(Predicate::compare(column, op, value))
    }

    /// Add a predicate, combined with AND.
    pub fn where_predicate(&mut self, predicate: Predicate) -> &mut Self {
        self.condition = Some(match self.condition.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// Add a predicate, combined with OR.
    pub fn or_where_predicate(&mut self, predicate: Predicate) -> &mut Self {
        self.condition = Some(match self.condition.take() {
            Some(existing) => existing.or(predicate),
            None => predicate,
        });
        self
    }

    /// Add a parenthesised group built by `build`, combined with AND.
    ///
    /// A group that ends up empty adds nothing.
    pub fn where_nested<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut EntryQuery),
    {
        let mut group = EntryQuery::table(self.table.clone());
        build(&mut group);
        match group.condition {
            Some(predicate) => self.where_predicate(predicate),
            None => self,
        }
    }

    /// Add `column IN (values)`.
    pub fn where_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.where_predicate(Predicate::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Add a predicate no row satisfies.
    pub fn where_false(&mut self) -> &mut Self {
        self.where_predicate(Predicate::False)
    }

    /// Inner join `table` on `left = right`.
    pub fn join(&mut self, table: &str, left: &str, right: &str) -> &mut Self {
        self.joins.push(Join {
            table: table.to_string(),
            left: left.to_string(),
            right: right.to_string(),
        });
        self
    }

    /// Append an ORDER BY clause.
    pub fn order_by(&mut self, column: &str, direction: SortDirection) -> &mut Self {
        self.orders.push((column.to_string(), direction));
        self
    }

    /// Whether any predicate has been added.
    pub fn has_constraints(&self) -> bool {
        self.condition.is_some()
    }

    /// Render to a SeaQuery statement.
    pub fn statement(&self) -> SelectStatement {
        let mut statement = Query::select();

        if self.columns.is_empty() {
            statement.column((Alias::new(&self.table), Asterisk));
        } else {
            for column in &self.columns {
                statement.column(column_ref(column));
            }
        }

        statement.from(Alias::new(&self.table));

        for join in &self.joins {
            statement.inner_join(
                Alias::new(&join.table),
                Expr::col(column_ref(&join.left)).equals(column_ref(&join.right)),
            );
        }

        if let Some(ref condition) = self.condition {
            statement.and_where(condition.to_expr());
        }

        for (column, direction) in &self.orders {
            statement.order_by(column_ref(column), direction.order());
        }

        statement
    }

    /// Render to SQL with inlined values.
    pub fn to_sql(&self) -> String {
        self.statement().to_string(PostgresQueryBuilder)
    }

    /// Render to parameterised SQL plus bound values.
    pub fn build(&self) -> (String, Values) {
        self.statement().build(PostgresQueryBuilder)
    }

    /// Execute through `executor`.
    pub async fn get(&self, executor: &dyn QueryExecutor) -> anyhow::Result<ResultSet> {
        executor.fetch(self).await
    }
}

/// Resolve a possibly table-qualified column name.
fn column_ref(name: &str) -> ColumnRef {
    match name.split_once('.') {
        Some((table, column)) => (Alias::new(table), Alias::new(column)).into_column_ref(),
        None => Alias::new(name).into_column_ref(),
    }
}
