use crate::adapters::aws::classify_sdk_error;
use crate::domain::model::ObjectListing;
use crate::domain::ports::BucketClient;
use crate::utils::error::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;

#[derive(Debug, Clone)]
pub struct S3BucketClient {
    client: S3Client,
}

impl S3BucketClient {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    /// Path-style addressing keeps LocalStack and custom endpoints working.
    pub fn from_sdk_config(config: &aws_config::SdkConfig, force_path_style: bool) -> Self {
        let config = aws_sdk_s3::config::Builder::from(config)
            .force_path_style(force_path_style)
            .build();
        Self::new(S3Client::from_conf(config))
    }
}

#[async_trait]
impl BucketClient for S3BucketClient {
    async fn head_bucket(&self, bucket: &str) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify_sdk_error("HeadBucket", bucket, e))?;
        Ok(())
    }

    async fn bucket_location(&self, bucket: &str) -> Result<String> {
        let output = self
            .client
            .get_bucket_location()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify_sdk_error("GetBucketLocation", bucket, e))?;

        // 空的 location constraint 代表 us-east-1
        Ok(output
            .location_constraint()
            .map(|c| c.as_str())
            .filter(|c| !c.is_empty())
            .unwrap_or("us-east-1")
            .to_string())
    }

    async fn list_objects(&self, bucket: &str, max_keys: i32) -> Result<ObjectListing> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .max_keys(max_keys)
            .send()
            .await
            .map_err(|e| classify_sdk_error("ListObjectsV2", bucket, e))?;

        let object_sizes = output
            .contents()
            .iter()
            .map(|object| object.size().unwrap_or(0))
            .collect::<Vec<_>>();

        Ok(ObjectListing {
            key_count: output
                .key_count()
                .map(i64::from)
                .unwrap_or(object_sizes.len() as i64),
            is_truncated: output.is_truncated().unwrap_or(false),
            object_sizes,
        })
    }
}
