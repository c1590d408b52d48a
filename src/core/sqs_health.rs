use crate::domain::model::{ErrorKind, HealthReport};
use crate::domain::ports::{HealthIndicator, QueueClient};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

pub const ATTR_MESSAGES_AVAILABLE: &str = "ApproximateNumberOfMessages";
pub const ATTR_MESSAGES_IN_FLIGHT: &str = "ApproximateNumberOfMessagesNotVisible";
pub const ATTR_MESSAGES_DELAYED: &str = "ApproximateNumberOfMessagesDelayed";

pub const DEFAULT_HIGH_MESSAGE_THRESHOLD: u64 = 1000;

/// Reports queue depth for the main queue and, when configured, its dead-letter queue.
pub struct SqsHealthIndicator {
    client: Arc<dyn QueueClient>,
    queue_url: Option<String>,
    dead_letter_queue_url: Option<String>,
    high_message_threshold: u64,
}

impl SqsHealthIndicator {
    pub fn new(
        client: Arc<dyn QueueClient>,
        queue_url: Option<String>,
        dead_letter_queue_url: Option<String>,
    ) -> Self {
        Self {
            client,
            queue_url: non_blank(queue_url),
            dead_letter_queue_url: non_blank(dead_letter_queue_url),
            high_message_threshold: DEFAULT_HIGH_MESSAGE_THRESHOLD,
        }
    }

    pub fn with_high_message_threshold(mut self, threshold: u64) -> Self {
        self.high_message_threshold = threshold;
        self
    }

    async fn check_dead_letter_queue(&self, dlq_url: &str, report: HealthReport) -> HealthReport {
        match self
            .client
            .queue_attributes(dlq_url, &[ATTR_MESSAGES_AVAILABLE])
            .await
        {
            Ok(attributes) => {
                let available = attribute_count(&attributes, ATTR_MESSAGES_AVAILABLE);
                let report = report.with_detail(
                    "deadLetterQueue",
                    json!({ "url": dlq_url, "messagesAvailable": available }),
                );
                if available > 0 {
                    tracing::warn!("⚠️ {} messages waiting in dead letter queue", available);
                    report.with_warning(format!("Messages in dead letter queue: {}", available))
                } else {
                    report
                }
            }
            Err(e) => {
                tracing::warn!("Dead letter queue check failed for {}: {}", dlq_url, e);
                report
                    .with_detail(
                        "deadLetterQueue",
                        json!({
                            "url": dlq_url,
                            "error": e.to_string(),
                            "errorCode": e.kind().as_str(),
                        }),
                    )
                    .with_warning(format!("Dead letter queue check failed: {}", e))
            }
        }
    }
}

#[async_trait]
impl HealthIndicator for SqsHealthIndicator {
    fn name(&self) -> &str {
        "sqs"
    }

    async fn health(&self) -> HealthReport {
        let base = HealthReport::up().with_detail("service", "SQS");

        let Some(queue_url) = self.queue_url.as_deref() else {
            return base.with_error(ErrorKind::NotConfigured, "SQS queue URL not configured");
        };
        let base = base.with_detail("queueUrl", queue_url);

        let attributes = match self
            .client
            .queue_attributes(
                queue_url,
                &[
                    ATTR_MESSAGES_AVAILABLE,
                    ATTR_MESSAGES_IN_FLIGHT,
                    ATTR_MESSAGES_DELAYED,
                ],
            )
            .await
        {
            Ok(attributes) => attributes,
            Err(e) => {
                tracing::warn!("SQS health check failed for {}: {}", queue_url, e);
                let message = match e.kind() {
                    ErrorKind::NotFound => format!("Queue does not exist: {}", queue_url),
                    ErrorKind::AccessDenied => format!("Access denied to queue: {}", e),
                    _ => format!("SQS health check failed: {}", e),
                };
                return base.with_error(e.kind(), message);
            }
        };

        let available = attribute_count(&attributes, ATTR_MESSAGES_AVAILABLE);
        let in_flight = attribute_count(&attributes, ATTR_MESSAGES_IN_FLIGHT);
        let delayed = attribute_count(&attributes, ATTR_MESSAGES_DELAYED);
        let total = available.saturating_add(in_flight).saturating_add(delayed);

        let mut report = base
            .with_detail("messagesAvailable", available)
            .with_detail("messagesInFlight", in_flight)
            .with_detail("messagesDelayed", delayed)
            .with_detail("totalMessages", total);

        if total > self.high_message_threshold {
            report = report.with_warning(format!("High message count: {}", total));
        }

        if let Some(dlq_url) = self.dead_letter_queue_url.as_deref() {
            report = self.check_dead_letter_queue(dlq_url, report).await;
        }

        tracing::debug!("SQS queue {} holds {} messages", queue_url, total);
        report
    }
}

/// Missing or non-numeric attributes count as zero.
fn attribute_count(attributes: &HashMap<String, String>, name: &str) -> u64 {
    attributes
        .get(name)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
