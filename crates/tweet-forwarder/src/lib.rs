use std::sync::Arc;

use anyhow::Context;
use aws_lambda_events::event::sqs::{SqsEvent, SqsMessage};
use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::{debug, error, info};
use tweet_store::{notification_key, BlobStore, FunctionInvoker, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub struct ForwardOutcome {
    pub forwarded: usize,
    /// Whether the analysis function accepted the invocation.
    pub accepted: bool,
}

/// Reassembles the tweets a batch of notifications points at and hands them
/// to the sentiment analysis function in a single asynchronous call.
#[derive(Debug, Clone)]
pub struct BatchForwarder {
    store: Arc<dyn BlobStore>,
    invoker: Arc<dyn FunctionInvoker>,
    function_name: String,
}

impl BatchForwarder {
    pub fn new(
        store: Arc<dyn BlobStore>,
        invoker: Arc<dyn FunctionInvoker>,
        function_name: String,
    ) -> Self {
        Self {
            store,
            invoker,
            function_name,
        }
    }

    /// Fetches every referenced tweet in notification order, then invokes the
    /// analysis function once. The first missing or malformed object aborts the
    /// batch before anything is forwarded. A rejected invocation is only logged.
    pub async fn forward(&self, event: &SqsEvent) -> anyhow::Result<ForwardOutcome> {
        info!("Number of events received: {}", event.records.len());

        let mut tweets = Vec::with_capacity(event.records.len());
        for record in &event.records {
            tweets.push(self.fetch_tweet(record).await?);
        }

        info!("Invoking lambda: {}", self.function_name);
        let payload = serde_json::to_vec(&tweets)?;
        let accepted = match self.invoker.invoke_async(&self.function_name, payload).await {
            Ok(ack) => {
                info!("Invocation accepted with status {}", ack.status_code);
                true
            }
            Err(e) => {
                error!("Failed to invoke {}: {:#}", self.function_name, e);
                false
            }
        };

        Ok(ForwardOutcome {
            forwarded: tweets.len(),
            accepted,
        })
    }

    async fn fetch_tweet(&self, record: &SqsMessage) -> anyhow::Result<Value> {
        let body = record
            .body
            .as_deref()
            .ok_or_else(|| StoreError::MissingBody(record.message_id.clone().unwrap_or_default()))?;
        let key = notification_key(body);
        info!("SQS message received: {}", key);

        let bytes = self.store.get(&key).await?;
        debug!("Response is: {}", String::from_utf8_lossy(&bytes));

        let tweet: Value = serde_json::from_slice(&bytes)
            .with_context(|| format!("Object {} is not valid JSON", key))?;
        if let Some(text) = tweet.get("full_text").and_then(Value::as_str) {
            info!("Tweet is: {}", text);
        }
        Ok(tweet)
    }
}

pub async fn function_handler(
    forwarder: &BatchForwarder,
    event: LambdaEvent<SqsEvent>,
) -> Result<(), Error> {
    forwarder.forward(&event.payload).await?;
    Ok(())
}
