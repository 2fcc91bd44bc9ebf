//! # sqlweave
//!
//! > **Describe the query. Get safe SQL back.**
//!
//! sqlweave renders table schemas and boolean predicate trees into
//! parameterized SQL for PostgreSQL, MySQL, SQLite and SQL Server, and runs the
//! result through sqlx, optionally inside a transaction that rolls itself back
//! on the first failure.
//!
//! ## Quick Example
//!
//! ```rust
//! use sqlweave::prelude::*;
//!
//! let stmt = Select::new(Dialect::Postgres)
//!     .columns(["id", "name", "author"])
//!     .from(["books"])
//!     .filter(Predicate::or([
//!         Predicate::eq("id", "1659"),
//!         Predicate::and([
//!             Predicate::substring("name", "%dune%"),
//!             Predicate::less_than("price", 20.0),
//!         ]),
//!     ]))
//!     .to_statement()
//!     .unwrap();
//!
//! assert_eq!(
//!     stmt.sql(),
//!     "SELECT id, name, author\nFROM books\nWHERE id=$1 OR (name LIKE $2 AND price<$3);"
//! );
//! assert_eq!(stmt.params(), ["1659", "%dune%", "20.00"]);
//! ```
//!
//! ## Placeholders
//!
//! | Dialect    | Placeholder    |
//! |------------|----------------|
//! | Postgres   | `$1`, `$2`     |
//! | SQL Server | `@p1`, `@p2`   |
//! | MySQL      | `?`            |
//! | SQLite     | `?`            |

pub mod config;
pub mod context;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod ident;
pub mod parser;
pub mod predicate;
pub mod statement;
pub mod transaction;
pub mod types;

pub mod prelude {
    pub use crate::context::{CancelHandle, Context};
    pub use crate::dialect::Dialect;
    pub use crate::engine::{Database, RowMap};
    pub use crate::error::*;
    pub use crate::predicate::{Clause, ColumnRef, CompareOp, LogicalOp, Predicate};
    pub use crate::statement::{CreateTable, Select, Statement, ToStatement};
    pub use crate::transaction::{TransactionSession, TransactionState};
    pub use crate::types::{ColumnType, TableSchema};
}

/// Parse a filter expression into a predicate tree.
///
/// # Example
///
/// ```
/// use sqlweave::dialect::Dialect;
///
/// let filter = sqlweave::parse_filter("active=1 & age>30").unwrap();
/// let clause = filter.render(Dialect::SqlServer, 1).unwrap();
/// assert_eq!(clause.sql, "active=@p1 AND age>@p2");
/// ```
pub fn parse_filter(input: &str) -> Result<predicate::Predicate, error::SqlError> {
    parser::parse_filter(input)
}
