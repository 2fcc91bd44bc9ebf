//! Error types for sqlweave.

use thiserror::Error;

use crate::dialect::Dialect;
use crate::transaction::TransactionState;

/// The main error type for statement rendering and execution.
#[derive(Debug, Error)]
pub enum SqlError {
    /// A table, column or alias name failed identifier validation.
    #[error("Invalid identifier: '{token}' (only ASCII letters and digits are allowed)")]
    IdentifierValidation { token: String },

    /// No rendering rule exists for the requested dialect.
    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    /// SELECT without any FROM target.
    #[error("SELECT must read from at least one table")]
    EmptyTableList,

    /// Numbered placeholders start at 1.
    #[error("Invalid placeholder index {index} for {dialect}: index must be greater than 0")]
    InvalidPlaceholderIndex { dialect: Dialect, index: i64 },

    /// Failure reported by the underlying driver.
    #[error("Driver error: {0}")]
    Driver(#[from] sqlx::Error),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Operation attempted on a session that is no longer active.
    #[error("Cannot {operation}: transaction is {state}")]
    TransactionState {
        state: TransactionState,
        operation: &'static str,
    },

    /// The caller's context was cancelled or ran past its deadline.
    #[error("Operation cancelled: {0}")]
    Cancelled(&'static str),

    /// Failed to parse a filter expression.
    #[error("Parse error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SqlError {
    /// Create an identifier validation error for the given token.
    pub fn identifier(token: impl Into<String>) -> Self {
        Self::IdentifierValidation {
            token: token.into(),
        }
    }

    /// Create a parse error at the given position.
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            position,
            message: message.into(),
        }
    }

    /// True for the cancellation kind.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Result type alias for sqlweave operations.
pub type SqlResult<T> = Result<T, SqlError>;
