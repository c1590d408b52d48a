use crate::domain::model::{SqlParam, SqlValue};
use crate::domain::ports::MetricsStore;
use crate::utils::error::{OpsError, Result};
use async_trait::async_trait;
use libsql::{Builder, Connection, Value};
use std::fmt::Debug;
use std::path::Path;

pub const MEMORY_PATH: &str = ":memory:";

/// Timestamps are stored as sortable text so range predicates compare correctly.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone)]
pub struct LibsqlMetricsStore {
    connection: Connection,
}

impl Debug for LibsqlMetricsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibsqlMetricsStore").finish()
    }
}

impl LibsqlMetricsStore {
    /// Opens an existing local database; `":memory:"` gives a private in-memory one.
    /// A missing file is an error: the probe never creates the metrics database.
    pub async fn open(path: &str) -> Result<Self> {
        if path != MEMORY_PATH && !Path::new(path).exists() {
            tracing::error!("❌ Metrics database not found at {}", path);
            return Err(OpsError::MissingConfigError {
                field: format!("database.path ({} does not exist)", path),
            });
        }

        let connection = Builder::new_local(path).build().await?.connect()?;
        tracing::debug!("Opened metrics database at {}", path);
        Ok(Self { connection })
    }

    /// Runs a statement that returns no rows (schema setup, seeding).
    pub async fn execute(&self, sql: &str, params: Vec<SqlParam>) -> Result<u64> {
        Ok(self
            .connection
            .execute(sql, Self::convert_params(params))
            .await?)
    }

    fn convert_params(params: Vec<SqlParam>) -> Vec<Value> {
        params
            .into_iter()
            .map(|p| match p {
                SqlParam::Integer(i) => Value::Integer(i),
                SqlParam::Real(r) => Value::Real(r),
                SqlParam::Text(s) => Value::Text(s),
                SqlParam::Timestamp(ts) => Value::Text(ts.format(TIMESTAMP_FORMAT).to_string()),
            })
            .collect()
    }

    fn convert_value(value: Value) -> SqlValue {
        match value {
            Value::Null => SqlValue::Null,
            Value::Integer(i) => SqlValue::Integer(i),
            Value::Real(r) => SqlValue::Real(r),
            Value::Text(s) => SqlValue::Text(s),
            Value::Blob(_) => SqlValue::Null,
        }
    }
}

#[async_trait]
impl MetricsStore for LibsqlMetricsStore {
    async fn query_scalar(&self, sql: &str, params: Vec<SqlParam>) -> Result<Option<SqlValue>> {
        let mut rows = self
            .connection
            .query(sql, Self::convert_params(params))
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::convert_value(row.get_value(0)?))),
            None => Ok(None),
        }
    }

    async fn query_rows(&self, sql: &str, params: Vec<SqlParam>) -> Result<Vec<Vec<SqlValue>>> {
        let mut rows = self
            .connection
            .query(sql, Self::convert_params(params))
            .await?;
        let column_count = rows.column_count();

        let mut result = Vec::new();
        while let Some(row) = rows.next().await? {
            let mut values = Vec::with_capacity(column_count.max(0) as usize);
            for index in 0..column_count {
                values.push(Self::convert_value(row.get_value(index)?));
            }
            result.push(values);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scalar_and_rows() {
        let store = LibsqlMetricsStore::open(":memory:").await.unwrap();
        store
            .execute("CREATE TABLE t (id INTEGER, name TEXT)", vec![])
            .await
            .unwrap();
        store
            .execute(
                "INSERT INTO t (id, name) VALUES (?1, ?2)",
                vec![SqlParam::Integer(1), SqlParam::Text("seoul".to_string())],
            )
            .await
            .unwrap();

        let count = store
            .query_scalar("SELECT COUNT(*) FROM t", vec![])
            .await
            .unwrap();
        assert_eq!(count, Some(SqlValue::Integer(1)));

        let rows = store
            .query_rows("SELECT id, name FROM t", vec![])
            .await
            .unwrap();
        assert_eq!(
            rows,
            vec![vec![SqlValue::Integer(1), SqlValue::Text("seoul".to_string())]]
        );
    }

    #[tokio::test]
    async fn test_open_does_not_create_missing_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.db");
        let path_str = path.to_str().unwrap();

        let err = LibsqlMetricsStore::open(path_str).await.unwrap_err();

        assert!(matches!(err, OpsError::MissingConfigError { .. }));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_open_existing_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.db");
        std::fs::File::create(&path).unwrap();

        let store = LibsqlMetricsStore::open(path.to_str().unwrap()).await.unwrap();
        let value = store.query_scalar("SELECT 1", vec![]).await.unwrap();
        assert_eq!(value, Some(SqlValue::Integer(1)));
    }

    #[tokio::test]
    async fn test_missing_table_is_an_error() {
        let store = LibsqlMetricsStore::open(":memory:").await.unwrap();
        assert!(store
            .query_scalar("SELECT COUNT(*) FROM pg_stat_activity", vec![])
            .await
            .is_err());
    }
}
