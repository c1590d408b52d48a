use crate::config::toml_config::ProbeConfig;
use crate::utils::error::{OpsError, Result};
use std::str::FromStr;

impl ProbeConfig {
    /// Builds the configuration from environment variables (Lambda, containers).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ProbeConfig::default();

        if let Some(region) = lookup("AWS_REGION") {
            config.aws.region = region;
        }
        config.aws.endpoint_url = lookup("AWS_ENDPOINT_URL");

        config.sqs.enabled = parse_or(&lookup, "SQS_ENABLED", config.sqs.enabled)?;
        config.sqs.queue_url = lookup("SQS_QUEUE_URL");
        config.sqs.dead_letter_queue_url = lookup("SQS_DEAD_LETTER_QUEUE_URL");
        config.sqs.high_message_threshold = parse_or(
            &lookup,
            "SQS_HIGH_MESSAGE_THRESHOLD",
            config.sqs.high_message_threshold,
        )?;

        config.s3.enabled = parse_or(&lookup, "S3_ENABLED", config.s3.enabled)?;
        config.s3.bucket = lookup("S3_BUCKET");
        config.s3.max_keys = parse_or(&lookup, "S3_MAX_KEYS", config.s3.max_keys)?;
        config.s3.force_path_style =
            parse_or(&lookup, "S3_FORCE_PATH_STYLE", config.s3.force_path_style)?;

        config.dynamodb.enabled = parse_or(&lookup, "DYNAMODB_ENABLED", config.dynamodb.enabled)?;

        if let Some(path) = lookup("METRICS_DB_PATH") {
            config.database.path = path;
        }
        config.metrics.slow_query_threshold_ms = parse_or(
            &lookup,
            "SLOW_QUERY_THRESHOLD_MS",
            config.metrics.slow_query_threshold_ms,
        )?;

        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| OpsError::InvalidConfigValueError {
                field: key.to_string(),
                value: raw.clone(),
                reason: "Value could not be parsed".to_string(),
            }),
    }
}
