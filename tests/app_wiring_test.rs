use anyhow::Result;
use async_trait::async_trait;
use ops_probe::adapters::LibsqlMetricsStore;
use ops_probe::app::{build_registry, ProbeApp, UpstreamClients};
use ops_probe::domain::model::{HealthStatus, ObjectListing, TableDescription};
use ops_probe::domain::ports::{BucketClient, QueueClient, TableClient};
use ops_probe::utils::error::OpsError;
use ops_probe::ProbeConfig;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// Every upstream answers with a small, healthy footprint.
struct HealthyUpstream;

#[async_trait]
impl QueueClient for HealthyUpstream {
    async fn queue_attributes(
        &self,
        _queue_url: &str,
        _attribute_names: &[&str],
    ) -> ops_probe::Result<HashMap<String, String>> {
        Ok(HashMap::from([(
            "ApproximateNumberOfMessages".to_string(),
            "3".to_string(),
        )]))
    }
}

#[async_trait]
impl BucketClient for HealthyUpstream {
    async fn head_bucket(&self, _bucket: &str) -> ops_probe::Result<()> {
        Ok(())
    }

    async fn bucket_location(&self, _bucket: &str) -> ops_probe::Result<String> {
        Ok("ap-northeast-2".to_string())
    }

    async fn list_objects(&self, _bucket: &str, _max_keys: i32) -> ops_probe::Result<ObjectListing> {
        Ok(ObjectListing {
            object_sizes: vec![512, 512],
            key_count: 2,
            is_truncated: false,
        })
    }
}

#[async_trait]
impl TableClient for HealthyUpstream {
    async fn list_tables(&self) -> ops_probe::Result<Vec<String>> {
        Ok(vec!["travel_plans".to_string()])
    }

    async fn describe_table(&self, table_name: &str) -> ops_probe::Result<TableDescription> {
        Ok(TableDescription {
            name: table_name.to_string(),
            status: "ACTIVE".to_string(),
            item_count: 12,
            size_bytes: 4096,
        })
    }
}

fn clients() -> UpstreamClients {
    let upstream = Arc::new(HealthyUpstream);
    UpstreamClients {
        queue: upstream.clone(),
        bucket: upstream.clone(),
        table: upstream,
    }
}

fn configured() -> Result<ProbeConfig> {
    Ok(ProbeConfig::from_toml_str(
        r#"
[sqs]
queue_url = "http://localhost:4566/000000000000/plan-events"
high_message_threshold = 2

[s3]
bucket = "travel-media"

[database]
path = ":memory:"
"#,
    )?)
}

#[test]
fn test_registry_follows_enabled_flags() -> Result<()> {
    let mut config = configured()?;
    assert_eq!(build_registry(&config, &clients()).names(), vec!["sqs", "s3", "dynamodb"]);

    config.s3.enabled = false;
    config.dynamodb.enabled = false;
    assert_eq!(build_registry(&config, &clients()).names(), vec!["sqs"]);
    Ok(())
}

#[tokio::test]
async fn test_app_health_with_configured_services() -> Result<()> {
    let config = configured()?;
    let store = LibsqlMetricsStore::open(":memory:").await?;
    let app = ProbeApp::from_parts(&config, &clients(), Some(Arc::new(store)));

    let health = app.health().await;

    assert_eq!(health.status, HealthStatus::Up);
    // threshold of 2 comes from the config file
    assert_eq!(
        health.components["sqs"]["details"]["warning"],
        json!("High message count: 3")
    );
    assert_eq!(health.components["s3"]["details"]["totalSizeBytes"], json!(1024));
    assert_eq!(
        health.components["dynamodb"]["details"]["activeTableCount"],
        json!(1)
    );
    Ok(())
}

#[tokio::test]
async fn test_app_reports_unconfigured_bucket() -> Result<()> {
    let mut config = configured()?;
    config.s3.bucket = None;
    let store = LibsqlMetricsStore::open(":memory:").await?;
    let app = ProbeApp::from_parts(&config, &clients(), Some(Arc::new(store)));

    let health = app.health().await;
    assert_eq!(health.status, HealthStatus::Down);
    assert_eq!(
        health.components["s3"]["details"]["errorCode"],
        json!("not_configured")
    );

    let s3 = app.component_health("S3").await.unwrap();
    assert!(!s3.is_up());
    assert!(app.component_health("redis").await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_app_metrics_without_schema() -> Result<()> {
    let config = configured()?;
    let store = LibsqlMetricsStore::open(":memory:").await?;
    let app = ProbeApp::from_parts(&config, &clients(), Some(Arc::new(store)));

    // 沒有資料表時所有 SQL 數字退回 0
    let body = app.metrics_report(Some("travel-plans")).await?;
    assert_eq!(body["travelPlans"]["totalTravelPlans"], json!(0));
    assert_eq!(body["travelPlans"]["popularDestinations"], json!([]));

    let full = app.metrics_report(None).await?;
    assert!(full["timestamp"].is_i64());
    Ok(())
}

#[tokio::test]
async fn test_health_leaves_missing_database_alone() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("metrics.db");
    let mut config = configured()?;
    config.database.path = db_path.display().to_string();
    let app = ProbeApp::from_parts(&config, &clients(), None);

    let health = app.health().await;
    assert_eq!(health.status, HealthStatus::Up);
    assert!(!db_path.exists());

    // 指標要求時才開啟資料庫，檔案不存在就回報錯誤
    let err = app.metrics_report(None).await.unwrap_err();
    assert!(matches!(err, OpsError::MissingConfigError { .. }));
    assert!(!db_path.exists());
    Ok(())
}

#[tokio::test]
async fn test_app_opens_configured_database_on_demand() -> Result<()> {
    let config = configured()?;
    let app = ProbeApp::from_parts(&config, &clients(), None);

    let body = app.metrics_report(Some("ai-usage")).await?;
    assert_eq!(body["aiUsage"]["totalAIGeneratedPlans"], json!(0));
    Ok(())
}
