use thiserror::Error;

pub mod aws;
pub use aws::Endpoints;

pub mod storage;
pub use storage::{
    notification_key, tweet_id, tweet_key, BlobStore, MemoryBlobStore, PutReceipt, S3BlobStore,
    StoredObject,
};

pub mod queue;
pub use queue::{MemoryQueue, MessageQueue, SqsQueue};

pub mod invoker;
pub use invoker::{FunctionInvoker, InvokeAccepted, Invocation, LambdaInvoker, RecordingInvoker};

pub mod config;
pub use config::{FlattenerConfig, ForwarderConfig};

pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("environment variable {0} must be set")]
    MissingVar(&'static str),

    #[error("tweet has no usable id")]
    MissingId,

    #[error("notification {0} has no body")]
    MissingBody(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("injected failure: {0}")]
    Injected(String),
}
