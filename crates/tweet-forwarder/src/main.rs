use std::sync::Arc;

use lambda_runtime::{service_fn, Error};
use tracing_subscriber::EnvFilter;
use tweet_forwarder::{function_handler, BatchForwarder};
use tweet_store::{aws, Endpoints, ForwarderConfig, LambdaInvoker, S3BlobStore};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_ansi(false)
        .without_time()
        .init();

    let config = ForwarderConfig::from_env()?;
    let endpoints = Endpoints::from_env();

    let shared_config = aws::load_shared_config().await;
    let store = S3BlobStore::new(aws::s3_client(&shared_config, &endpoints), config.bucket);
    let invoker = LambdaInvoker::new(aws::lambda_client(&shared_config, &endpoints));
    let forwarder = BatchForwarder::new(Arc::new(store), Arc::new(invoker), config.sentiment_function);

    tracing::info!("Batch forwarder function initialized");

    let func = service_fn(move |event| {
        let forwarder = forwarder.clone();
        async move { function_handler(&forwarder, event).await }
    });

    lambda_runtime::run(func).await?;
    Ok(())
}
