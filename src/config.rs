//! Runtime configuration
//!
//! Everything the pipeline needs from outside (file paths, join settings,
//! destination table, credentials) is gathered once at the process boundary
//! into explicit structs. Core types never read the environment.
//!
//! Expected environment variables:
//! - TRAIN_CSV, TEST_CSV, LABELS_CSV: input files (required)
//! - OUTPUT_CSV: combined file (required)
//! - JOIN_KEY: join column (optional, defaults to `PassengerId`)
//! - JOIN_POLICY: `strict` or `inner` (optional, defaults to `strict`)
//! - HOST, DB_NAME, DB_USER, DB_PASSWORD: credentials (required)
//! - DB_PORT: port (optional, defaults to 5432)
//! - DB_TABLE: destination table (optional, defaults to `titanic`)
//! - DB_PAGE_SIZE: rows per INSERT statement (optional, defaults to 100)

use crate::postgres::{ConnectionParams, DEFAULT_PAGE_SIZE, DEFAULT_PORT};
use crate::transform::JoinPolicy;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_JOIN_KEY: &str = "PassengerId";
pub const DEFAULT_TABLE: &str = "titanic";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Settings for the merge stage
#[derive(Debug, Clone, PartialEq)]
pub struct MergeConfig {
    pub training: PathBuf,
    pub unlabeled: PathBuf,
    pub labels: PathBuf,
    pub output: PathBuf,
    pub join_key: String,
    pub join_policy: JoinPolicy,
}

/// Settings for the load stage
#[derive(Debug, Clone, PartialEq)]
pub struct LoadConfig {
    pub connection: ConnectionParams,
    pub table: String,
    pub page_size: usize,
}

/// Variable lookup; empty values count as unset
struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn optional(&self, name: &'static str) -> Option<String> {
        (self.0)(name).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.optional(name).ok_or(ConfigError::Missing(name))
    }

    fn parsed<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: ToString,
    {
        match self.optional(name) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            }),
        }
    }
}

impl MergeConfig {
    /// Read the merge settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the merge settings through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(lookup);
        Ok(Self {
            training: vars.required("TRAIN_CSV")?.into(),
            unlabeled: vars.required("TEST_CSV")?.into(),
            labels: vars.required("LABELS_CSV")?.into(),
            output: vars.required("OUTPUT_CSV")?.into(),
            join_key: vars
                .optional("JOIN_KEY")
                .unwrap_or_else(|| DEFAULT_JOIN_KEY.to_string()),
            join_policy: vars.parsed("JOIN_POLICY", JoinPolicy::default())?,
        })
    }
}

impl LoadConfig {
    /// Read the load settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the load settings through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(lookup);
        let connection = ConnectionParams::new(
            vars.required("HOST")?,
            vars.required("DB_NAME")?,
            vars.required("DB_USER")?,
            vars.required("DB_PASSWORD")?,
        )
        .with_port(vars.parsed("DB_PORT", DEFAULT_PORT)?);

        let page_size = vars.parsed("DB_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            return Err(ConfigError::Invalid {
                name: "DB_PAGE_SIZE",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            connection,
            table: vars
                .optional("DB_TABLE")
                .unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            page_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    const MERGE_VARS: &[(&str, &str)] = &[
        ("TRAIN_CSV", "data/train.csv"),
        ("TEST_CSV", "data/test.csv"),
        ("LABELS_CSV", "data/gender_submission.csv"),
        ("OUTPUT_CSV", "data/titanic_data.csv"),
    ];

    const LOAD_VARS: &[(&str, &str)] = &[
        ("HOST", "localhost"),
        ("DB_NAME", "mlops"),
        ("DB_USER", "loader"),
        ("DB_PASSWORD", "secret"),
    ];

    #[test]
    fn test_merge_defaults() {
        let config = MergeConfig::from_lookup(lookup(MERGE_VARS)).unwrap();
        assert_eq!(config.training, PathBuf::from("data/train.csv"));
        assert_eq!(config.output, PathBuf::from("data/titanic_data.csv"));
        assert_eq!(config.join_key, "PassengerId");
        assert_eq!(config.join_policy, JoinPolicy::Strict);
    }

    #[test]
    fn test_merge_missing_path() {
        let err = MergeConfig::from_lookup(lookup(&MERGE_VARS[..3])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("OUTPUT_CSV"));
    }

    #[test]
    fn test_merge_join_settings() {
        let mut vars = MERGE_VARS.to_vec();
        vars.extend([("JOIN_KEY", "id"), ("JOIN_POLICY", "Inner")]);
        let config = MergeConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.join_key, "id");
        assert_eq!(config.join_policy, JoinPolicy::Inner);

        vars.push(("JOIN_POLICY", "outer"));
        let err = MergeConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "JOIN_POLICY", .. }));
    }

    #[test]
    fn test_load_defaults() {
        let config = LoadConfig::from_lookup(lookup(LOAD_VARS)).unwrap();
        assert_eq!(config.connection.host, "localhost");
        assert_eq!(config.connection.port, 5432);
        assert_eq!(config.table, "titanic");
        assert_eq!(config.page_size, 100);
    }

    #[test]
    fn test_load_empty_credential_is_missing() {
        let mut vars = LOAD_VARS.to_vec();
        vars.push(("DB_PASSWORD", ""));
        let err = LoadConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DB_PASSWORD"));
    }

    #[test]
    fn test_load_invalid_numbers() {
        let mut vars = LOAD_VARS.to_vec();
        vars.push(("DB_PORT", "postgres"));
        let err = LoadConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DB_PORT", .. }));

        let mut vars = LOAD_VARS.to_vec();
        vars.push(("DB_PAGE_SIZE", "0"));
        let err = LoadConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DB_PAGE_SIZE", .. }));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        // SAFETY: serialized with the other env-mutating tests
        unsafe {
            for (name, value) in LOAD_VARS {
                std::env::set_var(name, value);
            }
            std::env::set_var("DB_TABLE", "passengers");
        }

        let config = LoadConfig::from_env().unwrap();
        assert_eq!(config.table, "passengers");
        assert_eq!(config.connection.user, "loader");

        unsafe {
            for (name, _) in LOAD_VARS {
                std::env::remove_var(name);
            }
            std::env::remove_var("DB_TABLE");
        }
    }
}
