//! Transaction sessions.
//!
//! A [`TransactionSession`] wraps one driver transaction and moves through
//! `Active -> Committed` or `Active -> RolledBack` exactly once. The first
//! failed execution rolls the transaction back before the error is returned;
//! every later call fails with [`SqlError::TransactionState`].

use std::fmt;

use sqlx::{Any, Transaction};

use crate::context::Context;
use crate::engine::{RowMap, bind_params, log_statement, row_to_map};
use crate::error::{SqlError, SqlResult};
use crate::statement::Statement;

/// Lifecycle state of a [`TransactionSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Committed,
    RolledBack,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionState::Active => write!(f, "active"),
            TransactionState::Committed => write!(f, "committed"),
            TransactionState::RolledBack => write!(f, "rolled back"),
        }
    }
}

/// One sequential unit of work. Not meant for concurrent use.
pub struct TransactionSession {
    tx: Option<Transaction<'static, Any>>,
    state: TransactionState,
}

impl TransactionSession {
    pub(crate) fn new(tx: Transaction<'static, Any>) -> Self {
        Self {
            tx: Some(tx),
            state: TransactionState::Active,
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Execute a statement that returns no rows inside the transaction.
    /// Rolls back if the statement fails.
    pub async fn execute_statement(&mut self, stmt: &Statement, ctx: &Context) -> SqlResult<u64> {
        let tx = self.active_tx("execute statement")?;
        log_statement(stmt);
        let result = ctx
            .run(async {
                bind_params(stmt)
                    .execute(&mut **tx)
                    .await
                    .map_err(SqlError::from)
            })
            .await;

        match result {
            Ok(done) => Ok(done.rows_affected()),
            Err(err) => Err(self.abort(err).await),
        }
    }

    /// Execute a query inside the transaction.
    /// Rolls back if the query fails.
    pub async fn execute_query(
        &mut self,
        stmt: &Statement,
        ctx: &Context,
    ) -> SqlResult<Vec<RowMap>> {
        let tx = self.active_tx("execute query")?;
        log_statement(stmt);
        let result = ctx
            .run(async {
                bind_params(stmt)
                    .fetch_all(&mut **tx)
                    .await
                    .map_err(SqlError::from)
            })
            .await;

        match result {
            Ok(rows) => Ok(rows.iter().map(row_to_map).collect()),
            Err(err) => Err(self.abort(err).await),
        }
    }

    /// Commit all changes. Fails unless the session is active.
    ///
    /// If the driver rejects the commit the transaction is gone; the session
    /// ends up rolled back.
    pub async fn commit(&mut self) -> SqlResult<()> {
        let tx = self.take_active("commit")?;
        match tx.commit().await {
            Ok(()) => {
                self.state = TransactionState::Committed;
                tracing::info!("Transaction committed");
                Ok(())
            }
            Err(e) => {
                self.state = TransactionState::RolledBack;
                tracing::warn!("Commit failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Discard all changes. Fails unless the session is active.
    pub async fn rollback(&mut self) -> SqlResult<()> {
        let tx = self.take_active("rollback")?;
        self.state = TransactionState::RolledBack;
        tx.rollback().await?;
        tracing::info!("Transaction rolled back");
        Ok(())
    }

    fn active_tx(&mut self, operation: &'static str) -> SqlResult<&mut Transaction<'static, Any>> {
        match self.tx.as_mut() {
            Some(tx) if self.state == TransactionState::Active => Ok(tx),
            _ => Err(SqlError::TransactionState {
                state: self.state,
                operation,
            }),
        }
    }

    fn take_active(&mut self, operation: &'static str) -> SqlResult<Transaction<'static, Any>> {
        match (self.state, self.tx.take()) {
            (TransactionState::Active, Some(tx)) => Ok(tx),
            (state, _) => Err(SqlError::TransactionState { state, operation }),
        }
    }

    /// Single rollback attempt after a failed execution. Returns `err` unchanged.
    async fn abort(&mut self, err: SqlError) -> SqlError {
        tracing::warn!("Execution failed inside transaction, rolling back: {}", err);
        self.state = TransactionState::RolledBack;
        if let Some(tx) = self.tx.take() {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Automatic rollback failed: {}", rollback_err);
            }
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(TransactionState::Active.to_string(), "active");
        assert_eq!(TransactionState::Committed.to_string(), "committed");
        assert_eq!(TransactionState::RolledBack.to_string(), "rolled back");
    }
}
