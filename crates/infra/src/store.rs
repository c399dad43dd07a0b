use serde_json::Value;

use crate::{BackendResult, Filter, Select};

/// Table-style CRUD over the backend's record collections.
///
/// Rows travel as JSON objects; typing happens in [`crate::records`].
#[async_trait::async_trait]
pub trait DataService: Send + Sync {
    /// Rows matching the query, in the query's order.
    async fn select(&self, query: &Select) -> BackendResult<Vec<Value>>;

    /// Exactly one row. Zero matches is [`crate::BackendError::NotFound`].
    async fn select_single(&self, query: &Select) -> BackendResult<Value>;

    /// Insert one row and return it as stored (with generated columns).
    async fn insert(&self, table: &str, row: Value) -> BackendResult<Value>;

    /// Patch the single row matching `filter` and return it as stored.
    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> BackendResult<Value>;

    /// Delete every row matching `filter`.
    async fn delete(&self, table: &str, filter: &Filter) -> BackendResult<()>;
}
