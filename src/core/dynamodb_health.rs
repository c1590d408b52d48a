use crate::domain::model::{ErrorKind, HealthReport};
use crate::domain::ports::{HealthIndicator, TableClient};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Describes every table in the account/region. One failing describe call is
/// recorded against its table and the scan continues with the rest.
pub struct DynamoDbHealthIndicator {
    client: Arc<dyn TableClient>,
}

#[derive(Debug, Default)]
struct TableScan {
    tables: Map<String, Value>,
    active: u64,
    inactive: u64,
    describe_errors: u64,
    total_items: i64,
    total_size_bytes: i64,
}

impl DynamoDbHealthIndicator {
    pub fn new(client: Arc<dyn TableClient>) -> Self {
        Self { client }
    }

    async fn scan(&self, table_names: &[String]) -> TableScan {
        let mut scan = TableScan::default();

        for name in table_names {
            match self.client.describe_table(name).await {
                Ok(table) => {
                    if table.is_active() {
                        scan.active += 1;
                    } else {
                        scan.inactive += 1;
                    }
                    scan.total_items = scan.total_items.saturating_add(table.item_count);
                    scan.total_size_bytes = scan.total_size_bytes.saturating_add(table.size_bytes);
                    scan.tables.insert(
                        name.clone(),
                        json!({
                            "status": table.status,
                            "itemCount": table.item_count,
                            "sizeBytes": table.size_bytes,
                        }),
                    );
                }
                Err(e) => {
                    tracing::warn!("Failed to describe DynamoDB table {}: {}", name, e);
                    scan.describe_errors += 1;
                    scan.tables.insert(
                        name.clone(),
                        json!({
                            "error": e.to_string(),
                            "errorCode": e.kind().as_str(),
                        }),
                    );
                }
            }
        }

        scan
    }
}

#[async_trait]
impl HealthIndicator for DynamoDbHealthIndicator {
    fn name(&self) -> &str {
        "dynamodb"
    }

    async fn health(&self) -> HealthReport {
        let base = HealthReport::up().with_detail("service", "DynamoDB");

        let table_names = match self.client.list_tables().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!("DynamoDB health check failed: {}", e);
                let message = match e.kind() {
                    ErrorKind::AccessDenied => format!("Access denied listing tables: {}", e),
                    _ => format!("DynamoDB health check failed: {}", e),
                };
                return base.with_error(e.kind(), message);
            }
        };

        let scan = self.scan(&table_names).await;

        let report = base
            .with_detail("tableCount", table_names.len())
            .with_detail("activeTableCount", scan.active)
            .with_detail("inactiveTableCount", scan.inactive)
            .with_detail("describeErrorCount", scan.describe_errors)
            .with_detail("totalItemCount", scan.total_items)
            .with_detail("totalSizeBytes", scan.total_size_bytes)
            .with_detail("tables", Value::Object(scan.tables));

        if table_names.is_empty() {
            return report.with_error(ErrorKind::NotFound, "No DynamoDB tables found");
        }
        if scan.active == 0 {
            return report.with_error(ErrorKind::Error, "No active DynamoDB tables");
        }

        tracing::debug!(
            "DynamoDB: {}/{} tables active",
            scan.active,
            table_names.len()
        );
        report
    }
}
