//! Column types and table schemas.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::SqlResult;

/// Storage type of a single column.
///
/// In TOML: `{ type = "text", max_length = 64, not_null = true }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColumnType {
    /// Character data. `max_length == 0` means unbounded.
    Text {
        #[serde(default)]
        max_length: u32,
        #[serde(default)]
        not_null: bool,
    },
    Integer {
        #[serde(default)]
        not_null: bool,
    },
    Float {
        #[serde(default)]
        not_null: bool,
    },
    #[serde(alias = "timestamp")]
    DateTime {
        #[serde(default)]
        not_null: bool,
    },
}

impl ColumnType {
    /// Unbounded text.
    pub fn text() -> Self {
        ColumnType::Text {
            max_length: 0,
            not_null: false,
        }
    }

    pub fn varchar(max_length: u32) -> Self {
        ColumnType::Text {
            max_length,
            not_null: false,
        }
    }

    pub fn integer() -> Self {
        ColumnType::Integer { not_null: false }
    }

    pub fn float() -> Self {
        ColumnType::Float { not_null: false }
    }

    pub fn datetime() -> Self {
        ColumnType::DateTime { not_null: false }
    }

    /// Same type with the NOT NULL constraint set.
    pub fn not_null(self) -> Self {
        match self {
            ColumnType::Text { max_length, .. } => ColumnType::Text {
                max_length,
                not_null: true,
            },
            ColumnType::Integer { .. } => ColumnType::Integer { not_null: true },
            ColumnType::Float { .. } => ColumnType::Float { not_null: true },
            ColumnType::DateTime { .. } => ColumnType::DateTime { not_null: true },
        }
    }

    pub fn is_not_null(&self) -> bool {
        match *self {
            ColumnType::Text { not_null, .. }
            | ColumnType::Integer { not_null }
            | ColumnType::Float { not_null }
            | ColumnType::DateTime { not_null } => not_null,
        }
    }

    /// Type keyword for `dialect`, plus ` NOT NULL` when constrained.
    pub fn to_sql(&self, dialect: Dialect) -> SqlResult<String> {
        let mut sql = match (self, dialect) {
            (ColumnType::Text { .. }, Dialect::Sqlite) => "TEXT".to_string(),
            (
                ColumnType::Text { max_length, .. },
                Dialect::Postgres | Dialect::MySql | Dialect::SqlServer,
            ) => {
                if *max_length > 0 {
                    format!("VARCHAR({})", max_length)
                } else {
                    "TEXT".to_string()
                }
            }
            (ColumnType::Integer { .. }, _) => "INTEGER".to_string(),
            (ColumnType::Float { .. }, _) => "FLOAT".to_string(),
            (ColumnType::DateTime { .. }, Dialect::Postgres) => "TIMESTAMP".to_string(),
            (ColumnType::DateTime { .. }, Dialect::MySql | Dialect::SqlServer) => {
                "DATETIME".to_string()
            }
            (ColumnType::DateTime { .. }, Dialect::Sqlite) => "TEXT".to_string(),
        };

        if self.is_not_null() {
            sql.push_str(" NOT NULL");
        }
        Ok(sql)
    }
}

/// A table name and its columns, kept in insertion order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    #[serde(default)]
    pub columns: IndexMap<String, ColumnType>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: IndexMap::new(),
        }
    }

    /// Add (or replace) a column.
    pub fn column(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        self.columns.insert(name.into(), ty);
        self
    }

    /// Parse a schema from TOML.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
