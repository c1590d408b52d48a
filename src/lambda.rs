use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use ops_probe::utils::{logger, validation::Validate};
use ops_probe::{ProbeApp, ProbeConfig};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Request {
    /// "health" (default) or "metrics"
    pub action: Option<String>,
    pub component: Option<String>,
    pub category: Option<String>,
}

async fn function_handler(app: &ProbeApp, event: LambdaEvent<Request>) -> Result<Value, Error> {
    let request = event.payload;
    tracing::info!("Handling probe request: {:?}", request);

    let response = match request.action.as_deref().unwrap_or("health") {
        "health" => match request.component.as_deref() {
            Some(name) => match app.component_health(name).await {
                Some(report) => report.to_json(),
                None => json!({ "error": format!("Unknown component: {}", name) }),
            },
            None => serde_json::to_value(app.health().await)?,
        },
        "metrics" => app.metrics_report(request.category.as_deref()).await?,
        other => json!({ "error": format!("Unknown action: {}", other) }),
    };

    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    // 冷啟動時建立一次，之後的呼叫共用
    let config = ProbeConfig::from_env()?;
    config.validate()?;
    tracing::info!("Probe configuration: {}", config.summary());

    let app = Arc::new(ProbeApp::from_config(&config).await);

    run(service_fn(move |event: LambdaEvent<Request>| {
        let app = Arc::clone(&app);
        async move { function_handler(&app, event).await }
    }))
    .await
}
