//! Identifier validation.
//!
//! Table and column names are concatenated into statement text, so every one
//! of them must pass [`is_valid_identifier`] first. Values never reach the text;
//! they travel as parameters.

use crate::error::{SqlError, SqlResult};

/// True iff `token` is non-empty and made only of ASCII letters and digits.
pub fn is_valid_identifier(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Validate `token`, returning it unchanged on success.
pub fn validate_identifier(token: &str) -> SqlResult<&str> {
    if is_valid_identifier(token) {
        Ok(token)
    } else {
        Err(SqlError::identifier(token))
    }
}
