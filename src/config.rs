//! Configuration file support.
//!
//! ```toml
//! dialect = "postgres"
//!
//! [database]
//! url = "postgres://localhost/library"
//! max_connections = 5
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dialect::Dialect;
use crate::engine::DEFAULT_MAX_CONNECTIONS;
use crate::error::{SqlError, SqlResult};

/// File name looked up in the working directory.
pub const LOCAL_CONFIG: &str = "sqlweave.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    pub dialect: Option<Dialect>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

impl Config {
    pub fn from_toml(content: &str) -> SqlResult<Self> {
        toml::from_str(content).map_err(|e| SqlError::Config(e.to_string()))
    }

    pub fn from_file(path: &Path) -> SqlResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load `explicit` if given, otherwise the first of `./sqlweave.toml` and
    /// the user config file that exists. Defaults when none does.
    pub fn load(explicit: Option<&Path>) -> SqlResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        for path in Self::search_paths() {
            if path.exists() {
                tracing::debug!("Loading config from {}", path.display());
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    /// Candidate config locations, in priority order.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("sqlweave").join("config.toml"));
        }
        paths
    }

    /// Dialect precedence: explicit, configured, inferred from `url`, Postgres.
    pub fn resolve_dialect(&self, explicit: Option<Dialect>, url: Option<&str>) -> Dialect {
        explicit
            .or(self.dialect)
            .or_else(|| url.and_then(|u| Dialect::from_url(u).ok()))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml(
            r#"
            dialect = "sqlite"

            [database]
            url = "sqlite::memory:"
            max_connections = 1
            "#,
        )
        .unwrap();
        assert_eq!(config.dialect, Some(Dialect::Sqlite));
        assert_eq!(config.database.url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(config.database.max_connections, 1);
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.dialect, None);
        assert_eq!(config.database.max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(matches!(
            Config::from_toml("colour = \"blue\""),
            Err(SqlError::Config(_))
        ));
        assert!(Config::from_toml("dialect = \"oracle\"").is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/nonexistent/sqlweave.toml"))).unwrap_err();
        assert!(matches!(err, SqlError::Io(_)));
    }

    #[test]
    fn test_resolve_dialect() {
        let config = Config::default();
        assert_eq!(config.resolve_dialect(None, None), Dialect::Postgres);
        assert_eq!(
            config.resolve_dialect(None, Some("mysql://localhost/db")),
            Dialect::MySql
        );
        assert_eq!(
            config.resolve_dialect(Some(Dialect::SqlServer), Some("mysql://localhost/db")),
            Dialect::SqlServer
        );

        let configured = Config {
            dialect: Some(Dialect::Sqlite),
            ..Config::default()
        };
        assert_eq!(
            configured.resolve_dialect(None, Some("mysql://localhost/db")),
            Dialect::Sqlite
        );
    }
}
