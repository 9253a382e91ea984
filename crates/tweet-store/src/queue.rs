use std::fmt::Debug;
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_sqs::Client;

use crate::StoreError;

/// Destination for "tweet object is ready" notifications.
#[async_trait]
pub trait MessageQueue: Send + Sync + Debug {
    /// Publishes one message. Returns the message id when the service reports one.
    async fn send(&self, body: String) -> Result<Option<String>>;
}

#[derive(Debug, Clone)]
pub struct SqsQueue {
    client: Client,
    pub queue_url: String,
}

impl SqsQueue {
    pub fn new(client: Client, queue_url: String) -> Self {
        Self { client, queue_url }
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn send(&self, body: String) -> Result<Option<String>> {
        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .with_context(|| format!("Failed to send message to {}", self.queue_url))?;

        Ok(output.message_id().map(str::to_string))
    }
}

/// Queue kept in process memory; records bodies in publish order.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    messages: Mutex<Vec<String>>,
    attempts: Mutex<usize>,
    fail_on: Mutex<Option<usize>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the `attempt`-th send (zero based) fail.
    pub fn fail_send_at(&self, attempt: usize) {
        *self.fail_on.lock().unwrap_or_else(|e| e.into_inner()) = Some(attempt);
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn send(&self, body: String) -> Result<Option<String>> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
            let current = *attempts;
            *attempts += 1;
            current
        };

        if *self.fail_on.lock().unwrap_or_else(|e| e.into_inner()) == Some(attempt) {
            return Err(StoreError::Injected(format!("send #{}", attempt)).into());
        }

        let mut messages = self.messages.lock().unwrap_or_else(|e| e.into_inner());
        messages.push(body);
        Ok(Some(format!("msg-{}", messages.len())))
    }
}
