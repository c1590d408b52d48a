use clap::Parser;
use ops_probe::config::Command;
use ops_probe::utils::{logger, validation::Validate};
use ops_probe::{CliConfig, ProbeApp};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);
    tracing::info!("Starting ops-probe CLI");

    let config = match cli.load_probe_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(
                "❌ Failed to load configuration: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }
    tracing::debug!("Configuration: {}", config.summary());

    let app = ProbeApp::from_config(&config).await;

    match cli.command {
        Command::Health { component: None } => {
            let health = app.health().await;
            println!("{}", serde_json::to_string_pretty(&health)?);
            if !health.is_up() {
                tracing::warn!("⚠️ At least one component is DOWN");
                std::process::exit(1);
            }
        }
        Command::Health {
            component: Some(name),
        } => match app.component_health(&name).await {
            Some(report) => {
                println!("{}", serde_json::to_string_pretty(&report.to_json())?);
                if !report.is_up() {
                    std::process::exit(1);
                }
            }
            None => {
                eprintln!(
                    "❌ Unknown component '{}'. Available: {}",
                    name,
                    app.registry().names().join(", ")
                );
                std::process::exit(2);
            }
        },
        Command::Metrics { category } => {
            let report = match app.metrics_report(category.as_deref()).await {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!("❌ Failed to open metrics store: {}", e);
                    eprintln!("❌ {}", e.user_friendly_message());
                    eprintln!("💡 建議: {}", e.recovery_suggestion());
                    std::process::exit(1);
                }
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
