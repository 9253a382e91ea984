use std::sync::Arc;

use lambda_runtime::{service_fn, Error};
use tracing_subscriber::EnvFilter;
use tweet_flattener::{function_handler, Flattener};
use tweet_store::{aws, Endpoints, FlattenerConfig, S3BlobStore, SqsQueue};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_ansi(false)
        .without_time()
        .init();

    let config = FlattenerConfig::from_env()?;
    let endpoints = Endpoints::from_env();

    let shared_config = aws::load_shared_config().await;
    let store = S3BlobStore::new(aws::s3_client(&shared_config, &endpoints), config.bucket);
    let queue = SqsQueue::new(aws::sqs_client(&shared_config, &endpoints), config.queue_url);
    let flattener = Flattener::new(Arc::new(store), Arc::new(queue), config.prefix);

    tracing::info!("Flattener function initialized");

    let func = service_fn(move |event| {
        let flattener = flattener.clone();
        async move { function_handler(&flattener, event).await }
    });

    lambda_runtime::run(func).await?;
    Ok(())
}
