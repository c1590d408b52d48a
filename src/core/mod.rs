pub mod dynamodb_health;
pub mod health_registry;
pub mod metrics_collector;
pub mod metrics_report;
pub mod s3_health;
pub mod sqs_health;

pub use dynamodb_health::DynamoDbHealthIndicator;
pub use health_registry::{CompositeHealth, HealthRegistry};
pub use metrics_collector::BusinessMetricsCollector;
pub use metrics_report::{MetricsCategory, MetricsReport};
pub use s3_health::S3HealthIndicator;
pub use sqs_health::SqsHealthIndicator;

pub use crate::domain::model::{HealthReport, HealthStatus};
pub use crate::domain::ports::HealthIndicator;
pub use crate::utils::error::Result;
