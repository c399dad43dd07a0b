use reqwest::RequestBuilder;
use serde_json::Value;

use crate::{BackendResult, DataService, Filter, Select};

use super::{SupabaseClient, table_error};

/// Ask PostgREST for a bare object instead of a one-element array.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
const RETURN_REPRESENTATION: &str = "return=representation";

impl SupabaseClient {
    /// Bearer for table requests: the live session's token, else the anon key.
    async fn table_bearer(&self) -> String {
        match self.live_session().await {
            Ok(Some(session)) => session.access_token,
            Ok(None) => self.anon_key.clone(),
            Err(err) => {
                tracing::warn!(error = %err, "could not refresh session; using anon key");
                self.anon_key.clone()
            }
        }
    }

    async fn table_request(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.table_bearer().await;
        self.authorize(request, &bearer)
    }

    async fn send_for_rows(&self, request: RequestBuilder) -> BackendResult<Vec<Value>> {
        let response = self.table_request(request).await.send().await?;
        if !response.status().is_success() {
            return Err(table_error(response, false).await);
        }
        Ok(response.json().await?)
    }

    async fn send_for_row(&self, request: RequestBuilder) -> BackendResult<Value> {
        let response = self
            .table_request(request.header("Accept", SINGLE_OBJECT))
            .await
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(table_error(response, true).await);
        }
        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl DataService for SupabaseClient {
    async fn select(&self, query: &Select) -> BackendResult<Vec<Value>> {
        tracing::debug!(table = %query.table, filters = query.filters.len(), "select");
        let request = self
            .http
            .get(self.rest_url(&query.table))
            .query(&query.query_pairs());
        self.send_for_rows(request).await
    }

    async fn select_single(&self, query: &Select) -> BackendResult<Value> {
        tracing::debug!(table = %query.table, "select single");
        let request = self
            .http
            .get(self.rest_url(&query.table))
            .query(&query.query_pairs());
        self.send_for_row(request).await
    }

    async fn insert(&self, table: &str, row: Value) -> BackendResult<Value> {
        tracing::debug!(table, "insert");
        let request = self
            .http
            .post(self.rest_url(table))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&row);
        self.send_for_row(request).await
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> BackendResult<Value> {
        tracing::debug!(table, column = %filter.column, "update");
        let request = self
            .http
            .patch(self.rest_url(table))
            .query(&[(filter.column.as_str(), filter.operand())])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(&patch);
        self.send_for_row(request).await
    }

    async fn delete(&self, table: &str, filter: &Filter) -> BackendResult<()> {
        tracing::debug!(table, column = %filter.column, "delete");
        let request = self
            .http
            .delete(self.rest_url(table))
            .query(&[(filter.column.as_str(), filter.operand())]);
        let response = self.table_request(request).await.send().await?;
        if !response.status().is_success() {
            return Err(table_error(response, false).await);
        }
        Ok(())
    }
}

