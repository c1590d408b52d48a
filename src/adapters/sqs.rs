use crate::adapters::aws::classify_sdk_error;
use crate::domain::ports::QueueClient;
use crate::utils::error::Result;
use async_trait::async_trait;
use aws_sdk_sqs::types::QueueAttributeName;
use aws_sdk_sqs::Client as SqsClient;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct SqsQueueClient {
    client: SqsClient,
}

impl SqsQueueClient {
    pub fn new(client: SqsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QueueClient for SqsQueueClient {
    async fn queue_attributes(
        &self,
        queue_url: &str,
        attribute_names: &[&str],
    ) -> Result<HashMap<String, String>> {
        let names = attribute_names
            .iter()
            .map(|name| QueueAttributeName::from(*name))
            .collect::<Vec<_>>();

        let output = self
            .client
            .get_queue_attributes()
            .queue_url(queue_url)
            .set_attribute_names(Some(names))
            .send()
            .await
            .map_err(|e| classify_sdk_error("GetQueueAttributes", queue_url, e))?;

        Ok(output
            .attributes()
            .map(|attributes| {
                attributes
                    .iter()
                    .map(|(name, value)| (name.as_str().to_string(), value.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}
