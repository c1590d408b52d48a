use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Up,
    Down,
}

impl HealthStatus {
    pub fn is_up(&self) -> bool {
        matches!(self, HealthStatus::Up)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Up => write!(f, "UP"),
            HealthStatus::Down => write!(f, "DOWN"),
        }
    }
}

/// Triage code written to the `errorCode` detail of a DOWN report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotConfigured,
    NotFound,
    AccessDenied,
    Error,
}

const NOT_FOUND_CODES: &[&str] = &[
    "NotFound",
    "NoSuchBucket",
    "QueueDoesNotExist",
    "AWS.SimpleQueueService.NonExistentQueue",
    "ResourceNotFoundException",
    "TableNotFoundException",
];

const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "Forbidden",
    "InvalidSecurity",
    "InvalidClientTokenId",
    "UnrecognizedClientException",
    "AllAccessDisabled",
];

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotConfigured => "not_configured",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AccessDenied => "access_denied",
            ErrorKind::Error => "error",
        }
    }

    /// Classifies an upstream failure from its service error code and HTTP status.
    /// The code wins over the status when both are present.
    pub fn classify(code: Option<&str>, http_status: Option<u16>) -> Self {
        if let Some(code) = code {
            if NOT_FOUND_CODES.contains(&code) {
                return ErrorKind::NotFound;
            }
            if ACCESS_DENIED_CODES.contains(&code) {
                return ErrorKind::AccessDenied;
            }
        }

        match http_status {
            Some(404) => ErrorKind::NotFound,
            Some(403) => ErrorKind::AccessDenied,
            _ => ErrorKind::Error,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time diagnostic report for one dependency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub details: Map<String, Value>,
}

impl HealthReport {
    pub fn up() -> Self {
        Self {
            status: HealthStatus::Up,
            details: Map::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    /// Flips the report to DOWN and records the error message and its triage code.
    pub fn with_error(mut self, kind: ErrorKind, message: impl Into<String>) -> Self {
        self.status = HealthStatus::Down;
        self.details
            .insert("error".to_string(), Value::String(message.into()));
        self.details
            .insert("errorCode".to_string(), Value::String(kind.as_str().to_string()));
        self
    }

    /// Adds a soft warning without touching the status. Repeated warnings are
    /// joined into the single `warning` field.
    pub fn with_warning(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        let merged = match self.details.get("warning").and_then(Value::as_str) {
            Some(existing) => format!("{}; {}", existing, message),
            None => message,
        };
        self.details
            .insert("warning".to_string(), Value::String(merged));
        self
    }

    pub fn is_up(&self) -> bool {
        self.status.is_up()
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("status".to_string(), Value::String(self.status.to_string()));
        map.insert("details".to_string(), Value::Object(self.details.clone()));
        Value::Object(map)
    }
}

/// One table as reported by `DescribeTable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescription {
    pub name: String,
    pub status: String,
    pub item_count: i64,
    pub size_bytes: i64,
}

impl TableDescription {
    /// `ACTIVE` and `UPDATING` tables serve traffic; every other state does not.
    pub fn is_active(&self) -> bool {
        matches!(self.status.as_str(), "ACTIVE" | "UPDATING")
    }
}

/// A single page of a bucket listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectListing {
    pub object_sizes: Vec<i64>,
    pub key_count: i64,
    pub is_truncated: bool,
}

impl ObjectListing {
    /// Sum of the object sizes, clamped at `i64::MAX`.
    pub fn total_size(&self) -> i64 {
        self.object_sizes
            .iter()
            .copied()
            .fold(0i64, i64::saturating_add)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Integer(i64),
    Real(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(i) => Some(*i),
            SqlValue::Real(r) => Some(*r as i64),
            SqlValue::Text(s) => s.trim().parse().ok(),
            SqlValue::Null => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Integer(i) => Some(*i as f64),
            SqlValue::Real(r) => Some(*r),
            SqlValue::Text(s) => s.trim().parse().ok(),
            SqlValue::Null => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationStat {
    pub destination: String,
    pub plan_count: i64,
    pub average_rating: Option<f64>,
}
