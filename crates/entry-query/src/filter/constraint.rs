//! Constraint compiler.
//!
//! Maps a constraint keyword from a filter directive onto a predicate.

use tracing::debug;

use crate::config::FilterConfig;
use crate::query::{EntryQuery, Operator, Predicate};

/// Constraint keywords understood in filter directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintType {
    /// `column = value`
    Is,
    /// `column <> value`
    IsNot,
    /// `column LIKE '%value%'`
    Contains,
    /// `column NOT LIKE '%value%'`
    DoesNotContain,
    /// `column LIKE 'value%'`
    StartsWith,
    /// `column LIKE '%value'`
    EndsWith,
    /// `(column IS NULL OR column = '')`
    IsEmpty,
    /// `column > ''`
    IsNotEmpty,
    /// Any other keyword; applies nothing.
    Unrecognized(String),
}

impl ConstraintType {
    /// Parse a keyword. Matching is exact.
    pub fn parse(keyword: &str) -> Self {
        match keyword {
            "is" => Self::Is,
            "isnot" => Self::IsNot,
            "contains" => Self::Contains,
            "doesnotcontain" => Self::DoesNotContain,
            "startswith" => Self::StartsWith,
            "endswith" => Self::EndsWith,
            "isempty" => Self::IsEmpty,
            "isnotempty" => Self::IsNotEmpty,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    pub fn keyword(&self) -> &str {
        match self {
            Self::Is => "is",
            Self::IsNot => "isnot",
            Self::Contains => "contains",
            Self::DoesNotContain => "doesnotcontain",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
            Self::IsEmpty => "isempty",
            Self::IsNotEmpty => "isnotempty",
            Self::Unrecognized(keyword) => keyword,
        }
    }

    /// Whether the constraint is skipped when the value is empty.
    pub fn requires_value(&self) -> bool {
        !matches!(
            self,
            Self::IsEmpty | Self::IsNotEmpty | Self::Unrecognized(_)
        )
    }
}

/// Compiles constraint keywords into predicates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstraintCompiler {
    escape_like_wildcards: bool,
}

impl ConstraintCompiler {
    pub fn new(escape_like_wildcards: bool) -> Self {
        Self {
            escape_like_wildcards,
        }
    }

    pub fn from_config(config: &FilterConfig) -> Self {
        Self::new(config.escape_like_wildcards)
    }

    /// Build the predicate for one constraint, or `None` when nothing applies.
    pub fn condition(
        &self,
        constraint: &ConstraintType,
        column: &str,
        value: &str,
    ) -> Option<Predicate> {
        if constraint.requires_value() && value.is_empty() {
            return None;
        }

        match constraint {
            ConstraintType::Is => Some(Predicate::compare(column, Operator::Eq, value)),
            ConstraintType::IsNot => Some(Predicate::compare(column, Operator::NotEq, value)),
            ConstraintType::Contains => {
                let value = self.like_operand(value);
                Some(Predicate::compare(column, Operator::Like, format!("%{value}%")))
            }
            ConstraintType::DoesNotContain => {
                let value = self.like_operand(value);
                Some(Predicate::compare(column, Operator::NotLike, format!("%{value}%")))
            }
            ConstraintType::StartsWith => {
                let value = self.like_operand(value);
                Some(Predicate::compare(column, Operator::Like, format!("{value}%")))
            }
            ConstraintType::EndsWith => {
                let value = self.like_operand(value);
                Some(Predicate::compare(column, Operator::Like, format!("%{value}")))
            }
            ConstraintType::IsEmpty => Some(
                Predicate::is_null(column).or(Predicate::compare(column, Operator::Eq, "")),
            ),
            ConstraintType::IsNotEmpty => Some(Predicate::compare(column, Operator::Gt, "")),
            ConstraintType::Unrecognized(_) => None,
        }
    }

    /// Narrow `query` by one constraint. Returns whether a predicate was added.
    pub fn constrain(
        &self,
        query: &mut EntryQuery,
        constraint: &ConstraintType,
        column: &str,
        value: &str,
    ) -> bool {
        match self.condition(constraint, column, value) {
            Some(predicate) => {
                query.where_predicate(predicate);
                true
            }
            None => {
                debug!(
                    constraint = constraint.keyword(),
                    column,
                    "constraint skipped"
                );
                false
            }
        }
    }

    fn like_operand(&self, value: &str) -> String {
        if self.escape_like_wildcards {
            escape_like_wildcards(value)
        } else {
            value.to_string()
        }
    }
}

/// Narrow `query` by one constraint with default compiler settings.
pub fn constrain<'q>(
    query: &'q mut EntryQuery,
    constraint: &ConstraintType,
    column: &str,
    value: &str,
) -> &'q mut EntryQuery {
    ConstraintCompiler::default().constrain(query, constraint, column, value);
    query
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql_for(constraint: &str, value: &str) -> String {
        let mut query = EntryQuery::table("people");
        constrain(&mut query, &ConstraintType::parse(constraint), "name", value);
        query.to_sql()
    }

    #[test]
    fn is_equals_value() {
        let sql = sql_for("is", "bob");
        assert!(sql.ends_with(r#"WHERE "name" = 'bob'"#), "{sql}");
    }

    #[test]
    fn is_without_value_adds_nothing() {
        let sql = sql_for("is", "");
        assert!(!sql.contains("WHERE"), "{sql}");
    }

    #[test]
    fn isnot_not_equal() {
        let sql = sql_for("isnot", "bob");
        assert!(sql.contains(r#""name" <> 'bob'"#), "{sql}");
        assert!(!sql_for("isnot", "").contains("WHERE"));
    }

    #[test]
    fn like_operators() {
        assert!(sql_for("contains", "ob").contains(r#""name" LIKE '%ob%'"#));
        assert!(sql_for("doesnotcontain", "ob").contains(r#""name" NOT LIKE '%ob%'"#));
        assert!(sql_for("startswith", "bo").contains(r#""name" LIKE 'bo%'"#));
        assert!(sql_for("endswith", "ob").contains(r#""name" LIKE '%ob'"#));
    }

    #[test]
    fn like_operators_without_value_add_nothing() {
        for keyword in ["contains", "doesnotcontain", "startswith", "endswith"] {
            let sql = sql_for(keyword, "");
            assert!(!sql.contains("WHERE"), "{keyword}: {sql}");
        }
    }

    #[test]
    fn isempty_ignores_value() {
        for value in ["", "anything"] {
            let sql = sql_for("isempty", value);
            assert!(
                sql.contains(r#""name" IS NULL OR "name" = ''"#),
                "{value}: {sql}"
            );
        }
    }

    #[test]
    fn isnotempty_greater_than_empty() {
        let sql = sql_for("isnotempty", "");
        assert!(sql.contains(r#""name" > ''"#), "{sql}");
    }

    #[test]
    fn unrecognized_adds_nothing() {
        let sql = sql_for("resembles", "bob");
        assert!(!sql.contains("WHERE"), "{sql}");
        assert_eq!(
            ConstraintType::parse("resembles"),
            ConstraintType::Unrecognized("resembles".to_string())
        );
    }

    #[test]
    fn keywords_are_case_sensitive() {
        assert_eq!(
            ConstraintType::parse("IS"),
            ConstraintType::Unrecognized("IS".to_string())
        );
    }

    #[test]
    fn keyword_round_trips() {
        for keyword in [
            "is",
            "isnot",
            "contains",
            "doesnotcontain",
            "startswith",
            "endswith",
            "isempty",
            "isnotempty",
        ] {
            assert_eq!(ConstraintType::parse(keyword).keyword(), keyword);
        }
    }

    #[test]
    fn constrain_reports_whether_applied() {
        let compiler = ConstraintCompiler::default();
        let mut query = EntryQuery::table("people");
        assert!(!compiler.constrain(&mut query, &ConstraintType::Is, "name", ""));
        assert!(!query.has_constraints());
        assert!(compiler.constrain(&mut query, &ConstraintType::Is, "name", "bob"));
        assert!(query.has_constraints());
    }

    #[test]
    fn wildcards_pass_through_by_default() {
        let sql = sql_for("contains", "100%");
        assert!(sql.contains("'%100%%'"), "{sql}");
    }

    #[test]
    fn wildcards_escaped_when_enabled() {
        let compiler = ConstraintCompiler::new(true);
        let mut query = EntryQuery::table("people");
        compiler.constrain(&mut query, &ConstraintType::Contains, "name", "100%_done");
        let sql = query.to_sql();
        assert!(
            sql.contains("100\\\\%\\\\_done") || sql.contains("100\\%\\_done"),
            "LIKE wildcards should be escaped: {sql}"
        );
    }

    #[test]
    fn escape_like_wildcards_function() {
        assert_eq!(super::escape_like_wildcards("hello"), "hello");
        assert_eq!(super::escape_like_wildcards("100%"), "100\\%");
        assert_eq!(super::escape_like_wildcards("a_b"), "a\\_b");
        assert_eq!(super::escape_like_wildcards("a\\b"), "a\\\\b");
    }
}
