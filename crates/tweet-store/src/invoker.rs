use std::fmt::Debug;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use aws_sdk_lambda::Client;

use crate::StoreError;

pub const EVENT_ACCEPTED: i32 = 202;

/// Acknowledgement that an asynchronous invocation was queued by the target runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeAccepted {
    pub status_code: i32,
}

#[async_trait]
pub trait FunctionInvoker: Send + Sync + Debug {
    /// Submits `payload` to `function` without waiting for it to run.
    async fn invoke_async(&self, function: &str, payload: Vec<u8>) -> Result<InvokeAccepted>;
}

#[derive(Debug, Clone)]
pub struct LambdaInvoker {
    client: Client,
}

impl LambdaInvoker {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FunctionInvoker for LambdaInvoker {
    async fn invoke_async(&self, function: &str, payload: Vec<u8>) -> Result<InvokeAccepted> {
        let output = self
            .client
            .invoke()
            .function_name(function)
            .invocation_type(InvocationType::Event)
            .payload(Blob::new(payload))
            .send()
            .await
            .with_context(|| format!("Failed to invoke {}", function))?;

        check_event_status(function, output.status_code())
    }
}

/// Event invocations are queued with 202; any other status was not accepted.
fn check_event_status(function: &str, status_code: i32) -> Result<InvokeAccepted> {
    if status_code != EVENT_ACCEPTED {
        tracing::error!(
            "Invocation of {} returned status code {}",
            function,
            status_code
        );
        return Err(anyhow!(
            "Invocation of {} returned status code {}",
            function,
            status_code
        ));
    }
    Ok(InvokeAccepted { status_code })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub function: String,
    pub payload: Vec<u8>,
}

/// Invoker that only records what it was asked to submit.
#[derive(Debug, Default)]
pub struct RecordingInvoker {
    calls: Mutex<Vec<Invocation>>,
    reject: Mutex<bool>,
}

impl RecordingInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records calls but answers every one of them with an error.
    pub fn rejecting() -> Self {
        let invoker = Self::default();
        *invoker.reject.lock().unwrap_or_else(|e| e.into_inner()) = true;
        invoker
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl FunctionInvoker for RecordingInvoker {
    async fn invoke_async(&self, function: &str, payload: Vec<u8>) -> Result<InvokeAccepted> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Invocation {
                function: function.to_string(),
                payload,
            });

        if *self.reject.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(StoreError::Injected(format!("invoke {}", function)).into());
        }
        Ok(InvokeAccepted {
            status_code: EVENT_ACCEPTED,
        })
    }
}
