//! Supported SQL dialects.
//!
//! Postgres and SQL Server number their placeholders (`$1`, `@p1`), MySQL and
//! SQLite repeat a single `?`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SqlError, SqlResult};

/// Supported SQL Dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    #[serde(alias = "postgresql", alias = "psql")]
    Postgres,
    #[serde(alias = "mariadb")]
    MySql,
    Sqlite,
    #[serde(alias = "mssql")]
    SqlServer,
}

impl Dialect {
    /// Every dialect, in declaration order.
    pub const ALL: [Dialect; 4] = [
        Dialect::Postgres,
        Dialect::MySql,
        Dialect::Sqlite,
        Dialect::SqlServer,
    ];

    /// Whether placeholders carry a positional number.
    pub fn numbered_placeholders(&self) -> bool {
        matches!(self, Dialect::Postgres | Dialect::SqlServer)
    }

    /// Placeholder token for the parameter at `index` (1-based).
    ///
    /// Numbered dialects reject `index <= 0`; repeated-token dialects ignore it.
    pub fn placeholder(&self, index: i64) -> SqlResult<String> {
        match self {
            Dialect::Postgres | Dialect::SqlServer if index <= 0 => {
                Err(SqlError::InvalidPlaceholderIndex {
                    dialect: *self,
                    index,
                })
            }
            Dialect::Postgres => Ok(format!("${}", index)),
            Dialect::SqlServer => Ok(format!("@p{}", index)),
            Dialect::MySql | Dialect::Sqlite => Ok("?".to_string()),
        }
    }

    /// Infer the dialect from a connection URL scheme.
    pub fn from_url(url: &str) -> SqlResult<Self> {
        let scheme = url
            .split_once(':')
            .map(|(scheme, _)| scheme)
            .ok_or_else(|| SqlError::UnsupportedDialect(format!("no scheme in '{}'", url)))?;
        scheme.parse()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
            Dialect::SqlServer => "sqlserver",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "psql" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            "sqlserver" | "mssql" => Ok(Dialect::SqlServer),
            other => Err(SqlError::UnsupportedDialect(other.to_string())),
        }
    }
}
