use async_trait::async_trait;

use crate::clause::SqlValue;
use crate::error::SqlError;

/// The tabular result of a `query`: column names in projection order plus
/// the row values.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

/// The opaque database driver this crate depends on but never implements
/// directly in terms of a concrete engine.
///
/// A process-wide connection factory is the only shared mutable state
/// (§5); each call here is expected to perform scoped acquisition of a
/// connection with guaranteed release on every exit path, including error.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn query(&self, sql: &str, params: &[SqlValue]) -> Result<QueryResult, SqlError>;

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64, SqlError>;

    /// Begins a scoped transaction. The returned handle must roll back on
    /// drop if neither `commit` nor `rollback` was called, so callers can
    /// rely on "guaranteed release on every exit path including error".
    async fn begin(&self) -> Result<Box<dyn Transaction>, SqlError>;
}

#[async_trait]
pub trait Transaction: Send {
    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<QueryResult, SqlError>;

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, SqlError>;

    async fn commit(self: Box<Self>) -> Result<(), SqlError>;

    async fn rollback(self: Box<Self>) -> Result<(), SqlError>;
}
