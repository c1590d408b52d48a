use crate::domain::model::{HealthReport, HealthStatus};
use crate::domain::ports::HealthIndicator;
use chrono::Utc;
use serde::Serialize;
use serde_json::Map;
use std::sync::Arc;

/// Composite of all per-dependency reports.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeHealth {
    pub status: HealthStatus,
    pub components: Map<String, serde_json::Value>,
    pub checked_at: String,
}

impl CompositeHealth {
    pub fn is_up(&self) -> bool {
        self.status.is_up()
    }
}

#[derive(Default, Clone)]
pub struct HealthRegistry {
    indicators: Vec<Arc<dyn HealthIndicator>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, indicator: Arc<dyn HealthIndicator>) {
        self.indicators.push(indicator);
    }

    pub fn with_indicator(mut self, indicator: Arc<dyn HealthIndicator>) -> Self {
        self.register(indicator);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.indicators.iter().map(|i| i.name()).collect()
    }

    /// Probes every indicator in registration order. DOWN if any component is DOWN.
    pub async fn health(&self) -> CompositeHealth {
        let mut components = Map::new();
        let mut status = HealthStatus::Up;

        for indicator in &self.indicators {
            let report = indicator.health().await;
            if !report.is_up() {
                tracing::warn!("❌ {} is DOWN", indicator.name());
                status = HealthStatus::Down;
            }
            components.insert(indicator.name().to_string(), report.to_json());
        }

        CompositeHealth {
            status,
            components,
            checked_at: Utc::now().to_rfc3339(),
        }
    }

    pub async fn component(&self, name: &str) -> Option<HealthReport> {
        let indicator = self
            .indicators
            .iter()
            .find(|i| i.name().eq_ignore_ascii_case(name))?;
        Some(indicator.health().await)
    }
}
