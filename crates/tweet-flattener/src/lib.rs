use std::sync::Arc;

use anyhow::Context;
use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info};
use tweet_store::{tweet_id, tweet_key, BlobStore, MessageQueue};

/// Counts of what happened to one batch.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FlattenSummary {
    pub received: usize,
    pub stored: usize,
    pub published: usize,
    pub failed: usize,
}

/// Writes each tweet of a batch to its own object and announces it on the queue.
#[derive(Debug, Clone)]
pub struct Flattener {
    store: Arc<dyn BlobStore>,
    queue: Arc<dyn MessageQueue>,
    prefix: String,
}

impl Flattener {
    pub fn new(store: Arc<dyn BlobStore>, queue: Arc<dyn MessageQueue>, prefix: String) -> Self {
        Self {
            store,
            queue,
            prefix,
        }
    }

    /// Processes the batch one tweet at a time.
    /// A failing tweet is logged and skipped; the batch itself never fails.
    pub async fn flatten(&self, tweets: Vec<Value>) -> FlattenSummary {
        info!("Number of tweets {}", tweets.len());

        let mut summary = FlattenSummary {
            received: tweets.len(),
            ..Default::default()
        };

        for tweet in &tweets {
            if let Err(e) = self.store_and_notify(tweet, &mut summary).await {
                error!("Failed to flatten tweet: {:#}", e);
                summary.failed += 1;
            }
        }

        info!(
            "Flattening completed: stored={} published={} failed={}",
            summary.stored, summary.published, summary.failed
        );
        summary
    }

    async fn store_and_notify(
        &self,
        tweet: &Value,
        summary: &mut FlattenSummary,
    ) -> anyhow::Result<()> {
        let id = tweet_id(tweet)?;
        let key = tweet_key(&self.prefix, &id);
        info!("Key: {}", key);

        let body = serde_json::to_string(tweet)?;
        let receipt = self.store.put_json(&key, body).await?;
        summary.stored += 1;

        // Not transactional: the object stays even if the publish below fails.
        let message = serde_json::to_string(&receipt)?;
        self.queue
            .send(message)
            .await
            .with_context(|| format!("Stored {} but could not publish it", key))?;
        summary.published += 1;

        Ok(())
    }
}

pub async fn function_handler(
    flattener: &Flattener,
    event: LambdaEvent<Vec<Value>>,
) -> Result<(), Error> {
    flattener.flatten(event.payload).await;
    Ok(())
}
