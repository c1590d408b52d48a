pub mod env_config;
pub mod toml_config;

pub use toml_config::ProbeConfig;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "ops-probe")]
#[command(about = "Health checks and business metrics for the travel planner backend")]
pub struct CliConfig {
    /// Path to TOML configuration file (falls back to environment variables)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Probe SQS, S3 and DynamoDB
    Health {
        /// Only probe one component (sqs, s3, dynamodb)
        #[arg(long)]
        component: Option<String>,
    },
    /// Print the business metrics report
    Metrics {
        /// user-engagement, ai-usage, travel-plans, performance or system
        #[arg(long)]
        category: Option<String>,
    },
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// `--config` wins, then `ops-probe.toml` in the working directory, then the environment.
    pub fn load_probe_config(&self) -> crate::utils::error::Result<ProbeConfig> {
        match self.config.as_deref() {
            Some(path) => ProbeConfig::from_file(path),
            None if std::path::Path::new("ops-probe.toml").exists() => {
                ProbeConfig::from_file("ops-probe.toml")
            }
            None => ProbeConfig::from_env(),
        }
    }
}
