// Adapters layer: concrete port implementations for external systems.

#[cfg(feature = "aws")]
pub mod aws;
#[cfg(feature = "aws")]
pub mod dynamodb;
pub mod libsql_store;
#[cfg(feature = "aws")]
pub mod s3;
#[cfg(feature = "aws")]
pub mod sqs;

#[cfg(feature = "aws")]
pub use self::{dynamodb::DynamoDbTableClient, s3::S3BucketClient, sqs::SqsQueueClient};
pub use libsql_store::LibsqlMetricsStore;
