use crate::config::toml_config::AwsSettings;
use crate::domain::model::ErrorKind;
use crate::utils::error::OpsError;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};

/// Shared SDK configuration for every client. `endpoint_url` points all
/// clients at a local emulator such as LocalStack.
pub async fn load_sdk_config(settings: &AwsSettings) -> SdkConfig {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(settings.region.clone()));

    if let Some(endpoint) = settings.endpoint_url.as_deref() {
        tracing::info!("🔧 Using custom AWS endpoint: {}", endpoint);
        loader = loader.endpoint_url(endpoint);
    }

    loader.load().await
}

/// Converts an SDK failure into the crate error, keeping the
/// not-found / access-denied distinction.
pub(crate) fn classify_sdk_error<E>(
    operation: &str,
    resource: &str,
    err: SdkError<E, HttpResponse>,
) -> OpsError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let code = err.code().map(str::to_string);
    let status = err.raw_response().map(|r| r.status().as_u16());
    let message = format!("{} {} failed: {}", operation, resource, DisplayErrorContext(&err));

    match ErrorKind::classify(code.as_deref(), status) {
        ErrorKind::NotFound => OpsError::NotFound {
            resource: resource.to_string(),
        },
        ErrorKind::AccessDenied => OpsError::AccessDenied { message },
        _ => OpsError::UpstreamError { message },
    }
}
