use crate::StoreError;

pub const TWEET_BUCKET: &str = "TWEET_BUCKET";
pub const TWEET_BUCKET_PREFIX: &str = "TWEET_BUCKET_PREFIX";
pub const TWEET_QUEUE: &str = "TWEET_QUEUE";
pub const TWEET_SENTIMENT_LAMBDA: &str = "TWEET_SENTIMENT_LAMBDA";

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, StoreError> {
    match lookup(name) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(StoreError::MissingVar(name)),
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Settings of the flattener function.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenerConfig {
    pub bucket: String,
    pub prefix: String,
    pub queue_url: String,
}

impl FlattenerConfig {
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StoreError> {
        Ok(Self {
            bucket: required(&lookup, TWEET_BUCKET)?,
            prefix: required(&lookup, TWEET_BUCKET_PREFIX)?,
            queue_url: required(&lookup, TWEET_QUEUE)?,
        })
    }
}

/// Settings of the batch forwarder function.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwarderConfig {
    pub bucket: String,
    pub sentiment_function: String,
}

impl ForwarderConfig {
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StoreError> {
        Ok(Self {
            bucket: required(&lookup, TWEET_BUCKET)?,
            sentiment_function: required(&lookup, TWEET_SENTIMENT_LAMBDA)?,
        })
    }
}
