use crate::adapters::aws::classify_sdk_error;
use crate::domain::model::TableDescription;
use crate::domain::ports::TableClient;
use crate::utils::error::{OpsError, Result};
use async_trait::async_trait;
use aws_sdk_dynamodb::Client as DynamoDbClient;

#[derive(Debug, Clone)]
pub struct DynamoDbTableClient {
    client: DynamoDbClient,
}

impl DynamoDbTableClient {
    pub fn new(client: DynamoDbClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TableClient for DynamoDbTableClient {
    /// Follows `LastEvaluatedTableName` until every table name has been read.
    async fn list_tables(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut start: Option<String> = None;

        loop {
            let output = self
                .client
                .list_tables()
                .set_exclusive_start_table_name(start.take())
                .send()
                .await
                .map_err(|e| classify_sdk_error("ListTables", "tables", e))?;

            names.extend(output.table_names().iter().cloned());

            match output.last_evaluated_table_name() {
                Some(last) => start = Some(last.to_string()),
                None => break,
            }
        }

        Ok(names)
    }

    async fn describe_table(&self, table_name: &str) -> Result<TableDescription> {
        let output = self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| classify_sdk_error("DescribeTable", table_name, e))?;

        let table = output.table().ok_or_else(|| OpsError::UpstreamError {
            message: format!("DescribeTable returned no description for {}", table_name),
        })?;

        Ok(TableDescription {
            name: table_name.to_string(),
            status: table
                .table_status()
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            item_count: table.item_count().unwrap_or(0),
            size_bytes: table.table_size_bytes().unwrap_or(0),
        })
    }
}
