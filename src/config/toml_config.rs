use crate::utils::error::{OpsError, Result};
use crate::utils::validation::{
    validate_aws_region, validate_optional_url, validate_path, validate_range,
    validate_s3_bucket_name, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_REGION: &str = "ap-northeast-2";
pub const DEFAULT_DATABASE_PATH: &str = "./metrics.db";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub aws: AwsSettings,
    pub sqs: SqsSettings,
    pub s3: S3Settings,
    pub dynamodb: DynamoDbSettings,
    pub database: DatabaseSettings,
    pub metrics: MetricsSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsSettings {
    pub region: String,
    /// Overrides every client endpoint, e.g. `http://localhost:4566`.
    pub endpoint_url: Option<String>,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SqsSettings {
    pub enabled: bool,
    pub queue_url: Option<String>,
    pub dead_letter_queue_url: Option<String>,
    pub high_message_threshold: u64,
}

impl Default for SqsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_url: None,
            dead_letter_queue_url: None,
            high_message_threshold: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Settings {
    pub enabled: bool,
    pub bucket: Option<String>,
    pub max_keys: i32,
    pub force_path_style: bool,
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            bucket: None,
            max_keys: 1000,
            force_path_style: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamoDbSettings {
    pub enabled: bool,
}

impl Default for DynamoDbSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: DEFAULT_DATABASE_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    pub slow_query_threshold_ms: u64,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            slow_query_threshold_ms: 1000,
        }
    }
}

impl ProbeConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${SQS_QUEUE_URL})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| OpsError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn summary(&self) -> String {
        format!(
            "region={}, sqs={}, s3={}, dynamodb={}, database={}",
            self.aws.region,
            describe(self.sqs.enabled, self.sqs.queue_url.as_deref()),
            describe(self.s3.enabled, self.s3.bucket.as_deref()),
            if self.dynamodb.enabled { "enabled" } else { "disabled" },
            self.database.path
        )
    }
}

fn describe(enabled: bool, identifier: Option<&str>) -> String {
    match (enabled, identifier) {
        (false, _) => "disabled".to_string(),
        (true, Some(id)) if !id.trim().is_empty() => id.to_string(),
        (true, _) => "not configured".to_string(),
    }
}

impl Validate for ProbeConfig {
    fn validate(&self) -> Result<()> {
        validate_aws_region("aws.region", &self.aws.region)?;
        validate_optional_url("aws.endpoint_url", self.aws.endpoint_url.as_deref())?;

        // 空白的佇列/儲存桶名稱交由健康檢查回報，不在此拒絕
        validate_optional_url("sqs.queue_url", self.sqs.queue_url.as_deref())?;
        validate_optional_url(
            "sqs.dead_letter_queue_url",
            self.sqs.dead_letter_queue_url.as_deref(),
        )?;
        validate_range(
            "sqs.high_message_threshold",
            self.sqs.high_message_threshold,
            1,
            100_000_000,
        )?;

        if let Some(bucket) = self.s3.bucket.as_deref().filter(|b| !b.trim().is_empty()) {
            validate_s3_bucket_name("s3.bucket", bucket)?;
        }
        validate_range("s3.max_keys", self.s3.max_keys, 1, 1000)?;

        validate_path("database.path", &self.database.path)?;
        validate_range(
            "metrics.slow_query_threshold_ms",
            self.metrics.slow_query_threshold_ms,
            1,
            3_600_000,
        )?;

        tracing::debug!("✅ Probe configuration validation passed");
        Ok(())
    }
}
