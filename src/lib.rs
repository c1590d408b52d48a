pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use app::{ProbeApp, UpstreamClients};
pub use config::ProbeConfig;
pub use core::{BusinessMetricsCollector, HealthRegistry, MetricsReport};
pub use domain::model::{ErrorKind, HealthReport, HealthStatus};
pub use utils::error::{OpsError, Result};
