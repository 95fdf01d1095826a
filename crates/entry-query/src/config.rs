//! Configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// What to do when a relation filter's subquery matches no related rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyRelationMatch {
    /// Leave the active query unconstrained by that directive.
    #[default]
    Ignore,
    /// Constrain the active query so it returns no rows.
    MatchNothing,
}

impl FromStr for EmptyRelationMatch {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "match_nothing" => Ok(Self::MatchNothing),
            other => anyhow::bail!("unknown empty relation match policy '{other}'"),
        }
    }
}

/// Filter pass configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Policy for relation filters whose subquery returns nothing.
    #[serde(default)]
    pub empty_relation_match: EmptyRelationMatch,

    /// Escape `%`, `_` and `\` in LIKE operands (default: false).
    #[serde(default)]
    pub escape_like_wildcards: bool,
}

impl FilterConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through a key lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let empty_relation_match = lookup("ENTRY_FILTER_EMPTY_RELATION_MATCH")
            .map(|v| v.parse::<EmptyRelationMatch>())
            .transpose()
            .context("ENTRY_FILTER_EMPTY_RELATION_MATCH must be 'ignore' or 'match_nothing'")?
            .unwrap_or_default();

        let escape_like_wildcards: bool = lookup("ENTRY_FILTER_ESCAPE_LIKE")
            .unwrap_or_else(|| "false".to_string())
            .trim()
            .to_lowercase()
            .parse()
            .context("ENTRY_FILTER_ESCAPE_LIKE must be 'true' or 'false'")?;

        Ok(Self {
            empty_relation_match,
            escape_like_wildcards,
        })
    }
}

/// Database connection settings for [`crate::PgQueryExecutor`].
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Per-statement timeout applied to every executed query (default: 10s).
    pub statement_timeout: Duration,
}

impl DatabaseConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through a key lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections: u32 = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let timeout_secs: u64 = lookup("DATABASE_STATEMENT_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .context("DATABASE_STATEMENT_TIMEOUT_SECS must be a valid u64")?;

        Ok(Self {
            database_url,
            database_max_connections,
            statement_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn filter_config_defaults() {
        let config = FilterConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, FilterConfig::default());
        assert_eq!(config.empty_relation_match, EmptyRelationMatch::Ignore);
        assert!(!config.escape_like_wildcards);
    }

    #[test]
    fn filter_config_overrides() {
        let config = FilterConfig::from_lookup(lookup(&[
            ("ENTRY_FILTER_EMPTY_RELATION_MATCH", "MATCH_NOTHING"),
            ("ENTRY_FILTER_ESCAPE_LIKE", "true"),
        ]))
        .unwrap();
        assert_eq!(config.empty_relation_match, EmptyRelationMatch::MatchNothing);
        assert!(config.escape_like_wildcards);
    }

    #[test]
    fn filter_config_rejects_unknown_policy() {
        let err = FilterConfig::from_lookup(lookup(&[(
            "ENTRY_FILTER_EMPTY_RELATION_MATCH",
            "sometimes",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("ENTRY_FILTER_EMPTY_RELATION_MATCH"));
    }

    #[test]
    fn filter_config_deserializes_from_json() {
        let json = r#"{"empty_relation_match": "match_nothing"}"#;
        let config: FilterConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.empty_relation_match, EmptyRelationMatch::MatchNothing);
        assert!(!config.escape_like_wildcards);
    }

    #[test]
    fn database_config_requires_url() {
        assert!(DatabaseConfig::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn database_config_defaults() {
        let config =
            DatabaseConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/cms")]))
                .unwrap();
        assert_eq!(config.database_url, "postgres://localhost/cms");
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.statement_timeout, Duration::from_secs(10));
    }
}
