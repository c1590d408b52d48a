//! Wires configuration, upstream clients and the metrics store into a ready-to-run probe.

use crate::adapters::LibsqlMetricsStore;
use crate::config::ProbeConfig;
use crate::core::{
    BusinessMetricsCollector, CompositeHealth, DynamoDbHealthIndicator, HealthRegistry,
    MetricsReport, S3HealthIndicator, SqsHealthIndicator,
};
use crate::domain::model::HealthReport;
use crate::domain::ports::{BucketClient, MetricsStore, QueueClient, TableClient};
use crate::utils::error::Result;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// One client per upstream service. Tests hand in fakes here.
#[derive(Clone)]
pub struct UpstreamClients {
    pub queue: Arc<dyn QueueClient>,
    pub bucket: Arc<dyn BucketClient>,
    pub table: Arc<dyn TableClient>,
}

/// Registers one indicator per enabled service, in sqs, s3, dynamodb order.
pub fn build_registry(config: &ProbeConfig, clients: &UpstreamClients) -> HealthRegistry {
    let mut registry = HealthRegistry::new();

    if config.sqs.enabled {
        registry.register(Arc::new(
            SqsHealthIndicator::new(
                clients.queue.clone(),
                config.sqs.queue_url.clone(),
                config.sqs.dead_letter_queue_url.clone(),
            )
            .with_high_message_threshold(config.sqs.high_message_threshold),
        ));
    }

    if config.s3.enabled {
        registry.register(Arc::new(
            S3HealthIndicator::new(clients.bucket.clone(), config.s3.bucket.clone())
                .with_max_keys(config.s3.max_keys),
        ));
    }

    if config.dynamodb.enabled {
        registry.register(Arc::new(DynamoDbHealthIndicator::new(clients.table.clone())));
    }

    tracing::debug!("Registered health indicators: {:?}", registry.names());
    registry
}

pub fn build_collector(
    config: &ProbeConfig,
    store: Arc<dyn MetricsStore>,
) -> Result<Arc<BusinessMetricsCollector>> {
    Ok(Arc::new(
        BusinessMetricsCollector::new(store)?
            .with_slow_query_threshold(config.metrics.slow_query_threshold_ms),
    ))
}

pub struct ProbeApp {
    config: ProbeConfig,
    registry: HealthRegistry,
    /// Preset store; when absent the database at `config.database.path` is opened on demand.
    store: Option<Arc<dyn MetricsStore>>,
    metrics: OnceCell<MetricsReport>,
}

impl ProbeApp {
    pub fn from_parts(
        config: &ProbeConfig,
        clients: &UpstreamClients,
        store: Option<Arc<dyn MetricsStore>>,
    ) -> Self {
        Self {
            config: config.clone(),
            registry: build_registry(config, clients),
            store,
            metrics: OnceCell::new(),
        }
    }

    /// Builds real SDK clients. The metrics database is only opened by the
    /// first metrics request, so health checks never touch it.
    #[cfg(feature = "aws")]
    pub async fn from_config(config: &ProbeConfig) -> Self {
        use crate::adapters::aws::load_sdk_config;
        use crate::adapters::{DynamoDbTableClient, S3BucketClient, SqsQueueClient};

        tracing::info!("🔧 Loading AWS configuration for region {}", config.aws.region);
        let sdk_config = load_sdk_config(&config.aws).await;

        let clients = UpstreamClients {
            queue: Arc::new(SqsQueueClient::new(aws_sdk_sqs::Client::new(&sdk_config))),
            bucket: Arc::new(S3BucketClient::from_sdk_config(
                &sdk_config,
                config.s3.force_path_style,
            )),
            table: Arc::new(DynamoDbTableClient::new(aws_sdk_dynamodb::Client::new(
                &sdk_config,
            ))),
        };

        Self::from_parts(config, &clients, None)
    }

    pub fn registry(&self) -> &HealthRegistry {
        &self.registry
    }

    pub async fn health(&self) -> CompositeHealth {
        self.registry.health().await
    }

    pub async fn component_health(&self, name: &str) -> Option<HealthReport> {
        self.registry.component(name).await
    }

    async fn report(&self) -> Result<&MetricsReport> {
        self.metrics
            .get_or_try_init(|| async {
                let store: Arc<dyn MetricsStore> = match &self.store {
                    Some(store) => Arc::clone(store),
                    None => Arc::new(LibsqlMetricsStore::open(&self.config.database.path).await?),
                };
                Ok(MetricsReport::new(build_collector(&self.config, store)?))
            })
            .await
    }

    /// Full report, or one section when `category` is given. Fails only when
    /// the metrics database cannot be opened.
    pub async fn metrics_report(&self, category: Option<&str>) -> Result<Value> {
        let metrics = self.report().await?;
        Ok(match category {
            Some(selector) => metrics.category(selector).await,
            None => metrics.full().await,
        })
    }
}
