use crate::domain::model::{HealthReport, ObjectListing, SqlParam, SqlValue, TableDescription};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// A read-only probe of one external dependency. Implementations must never
/// fail: every upstream error is folded into the returned report.
#[async_trait]
pub trait HealthIndicator: Send + Sync {
    fn name(&self) -> &str;
    async fn health(&self) -> HealthReport;
}

#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Returns the requested attributes keyed by their SQS attribute name.
    async fn queue_attributes(
        &self,
        queue_url: &str,
        attribute_names: &[&str],
    ) -> Result<HashMap<String, String>>;
}

#[async_trait]
pub trait BucketClient: Send + Sync {
    async fn head_bucket(&self, bucket: &str) -> Result<()>;
    async fn bucket_location(&self, bucket: &str) -> Result<String>;
    /// One page only, at most `max_keys` objects.
    async fn list_objects(&self, bucket: &str, max_keys: i32) -> Result<ObjectListing>;
}

#[async_trait]
pub trait TableClient: Send + Sync {
    async fn list_tables(&self) -> Result<Vec<String>>;
    async fn describe_table(&self, table_name: &str) -> Result<TableDescription>;
}

/// Raw SQL access to the primary store, used for aggregate queries.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// First column of the first row, `None` when the query returns no rows.
    async fn query_scalar(&self, sql: &str, params: Vec<SqlParam>) -> Result<Option<SqlValue>>;
    async fn query_rows(&self, sql: &str, params: Vec<SqlParam>) -> Result<Vec<Vec<SqlValue>>>;
}
