use crate::core::sqs_health::non_blank;
use crate::domain::model::{ErrorKind, HealthReport};
use crate::domain::ports::{BucketClient, HealthIndicator};
use async_trait::async_trait;
use std::sync::Arc;

pub const DEFAULT_MAX_KEYS: i32 = 1000;

pub struct S3HealthIndicator {
    client: Arc<dyn BucketClient>,
    bucket: Option<String>,
    max_keys: i32,
}

impl S3HealthIndicator {
    pub fn new(client: Arc<dyn BucketClient>, bucket: Option<String>) -> Self {
        Self {
            client,
            bucket: non_blank(bucket),
            max_keys: DEFAULT_MAX_KEYS,
        }
    }

    pub fn with_max_keys(mut self, max_keys: i32) -> Self {
        self.max_keys = max_keys;
        self
    }
}

#[async_trait]
impl HealthIndicator for S3HealthIndicator {
    fn name(&self) -> &str {
        "s3"
    }

    async fn health(&self) -> HealthReport {
        let base = HealthReport::up().with_detail("service", "S3");

        let Some(bucket) = self.bucket.as_deref() else {
            return base.with_error(ErrorKind::NotConfigured, "S3 bucket name not configured");
        };
        let base = base.with_detail("bucket", bucket);

        if let Err(e) = self.client.head_bucket(bucket).await {
            tracing::warn!("S3 health check failed for bucket {}: {}", bucket, e);
            let message = match e.kind() {
                ErrorKind::NotFound => format!("Bucket does not exist: {}", bucket),
                ErrorKind::AccessDenied => format!("Access denied to bucket: {}", bucket),
                _ => format!("S3 health check failed: {}", e),
            };
            return base.with_error(e.kind(), message);
        }

        // 區域查詢失敗不影響狀態
        let region = match self.client.bucket_location(bucket).await {
            Ok(region) => region,
            Err(e) => {
                tracing::debug!("Could not resolve location of bucket {}: {}", bucket, e);
                "unknown".to_string()
            }
        };
        let base = base.with_detail("region", region);

        let listing = match self.client.list_objects(bucket, self.max_keys).await {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!("Listing objects in bucket {} failed: {}", bucket, e);
                return base.with_error(e.kind(), format!("Failed to list objects: {}", e));
            }
        };

        let mut report = base
            .with_detail("objectCount", listing.key_count)
            .with_detail("totalSizeBytes", listing.total_size())
            .with_detail("isTruncated", listing.is_truncated);

        if listing.is_truncated {
            report = report.with_detail(
                "note",
                format!(
                    "Bucket holds more than {} objects; objectCount and totalSizeBytes cover the first page only",
                    self.max_keys
                ),
            );
        }

        report
    }
}
