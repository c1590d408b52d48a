use crate::domain::model::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpsError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] libsql::Error),

    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    #[error("Upstream call failed: {message}")]
    UpstreamError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Upstream,
    Storage,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl OpsError {
    /// Maps the error onto the code surfaced in health details.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OpsError::NotFound { .. } => ErrorKind::NotFound,
            OpsError::AccessDenied { .. } => ErrorKind::AccessDenied,
            OpsError::MissingConfigError { .. } => ErrorKind::NotConfigured,
            _ => ErrorKind::Error,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            OpsError::ConfigError { .. }
            | OpsError::InvalidConfigValueError { .. }
            | OpsError::MissingConfigError { .. }
            | OpsError::TomlError(_) => ErrorCategory::Configuration,
            OpsError::NotFound { .. }
            | OpsError::AccessDenied { .. }
            | OpsError::UpstreamError { .. } => ErrorCategory::Upstream,
            OpsError::DatabaseError(_) => ErrorCategory::Storage,
            OpsError::IoError(_)
            | OpsError::SerializationError(_)
            | OpsError::MetricsError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::Storage => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            OpsError::ConfigError { .. } | OpsError::TomlError(_) => {
                "Check the configuration file syntax and section names"
            }
            OpsError::InvalidConfigValueError { .. } => {
                "Correct the highlighted configuration value and retry"
            }
            OpsError::MissingConfigError { .. } => {
                "Set the missing value in the config file or environment"
            }
            OpsError::NotFound { .. } => "Verify the resource name and the configured AWS region",
            OpsError::AccessDenied { .. } => {
                "Grant the probe's IAM role read access to the resource"
            }
            OpsError::UpstreamError { .. } => "Retry later; check AWS service status and network",
            OpsError::DatabaseError(_) => "Check the database path and schema",
            OpsError::IoError(_) => "Check file permissions and available disk space",
            OpsError::SerializationError(_) | OpsError::MetricsError(_) => "Report this as a bug",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Upstream => format!("AWS dependency problem: {}", self),
            ErrorCategory::Storage => format!("Metrics database problem: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, OpsError>;
