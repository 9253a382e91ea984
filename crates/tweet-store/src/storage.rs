use std::collections::{BTreeMap, HashSet};
use std::fmt::Debug;
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{StoreError, JSON_CONTENT_TYPE};

/// Key-addressed object storage holding one JSON document per tweet.
#[async_trait]
pub trait BlobStore: Send + Sync + Debug {
    /// Writes `body` at `key` tagged as `application/json`.
    /// Returns the receipt describing where the object landed.
    async fn put_json(&self, key: &str, body: String) -> Result<PutReceipt>;

    /// Reads the full body of the object at `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;
}

/// Result of a successful write. Serialized as the queue notification body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutReceipt {
    pub bucket: String,
    pub key: String,
    pub location: String,
    #[serde(rename = "ETag", skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,
}

impl PutReceipt {
    pub fn new(bucket: &str, key: &str, e_tag: Option<String>) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
            location: format!("s3://{}/{}", bucket, key),
            e_tag,
        }
    }
}

/// Storage key for a tweet.
/// Input: ("tweets", "1")
/// Output: "tweets/1.tweet.json"
pub fn tweet_key(prefix: &str, id: &str) -> String {
    format!("{}/{}.tweet.json", prefix, id)
}

/// Extracts the `id` of a tweet record as it appears in the storage key.
/// Strings are taken verbatim, other values in their JSON form. Only an
/// absent or null `id` is rejected.
pub fn tweet_id(tweet: &Value) -> Result<String, StoreError> {
    match tweet.get("id") {
        None | Some(Value::Null) => Err(StoreError::MissingId),
        Some(Value::String(id)) => Ok(id.clone()),
        Some(other) => Ok(other.to_string()),
    }
}

/// Resolves the storage key a notification body refers to.
/// A serialized [`PutReceipt`] yields its `Key`; anything else is taken as the key itself.
pub fn notification_key(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("Key").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: Client,
    pub bucket: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put_json(&self, key: &str, body: String) -> Result<PutReceipt> {
        let output = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(JSON_CONTENT_TYPE)
            .body(ByteStream::from(body.into_bytes()))
            .send()
            .await
            .with_context(|| format!("Failed to put object {} to {}", key, self.bucket))?;

        Ok(PutReceipt::new(
            &self.bucket,
            key,
            output.e_tag().map(str::to_string),
        ))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to get object {} from {}", key, self.bucket))?;

        let data = resp
            .body
            .collect()
            .await
            .with_context(|| format!("Failed to read body of {}", key))?;
        Ok(data.into_bytes().to_vec())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Blob store kept in process memory. Used by tests and local runs.
#[derive(Debug)]
pub struct MemoryBlobStore {
    pub bucket: String,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    failing_puts: Mutex<HashSet<String>>,
    reads: Mutex<Vec<String>>,
}

impl MemoryBlobStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Mutex::new(BTreeMap::new()),
            failing_puts: Mutex::new(HashSet::new()),
            reads: Mutex::new(Vec::new()),
        }
    }

    /// Seeds an object as if it had been written earlier.
    pub fn insert(&self, key: &str, body: impl Into<Vec<u8>>) {
        let mut objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects.insert(
            key.to_string(),
            StoredObject {
                content_type: JSON_CONTENT_TYPE.to_string(),
                body: body.into(),
            },
        );
    }

    /// Makes every subsequent write to `key` fail.
    pub fn fail_put_on(&self, key: &str) {
        let mut failing = self.failing_puts.lock().unwrap_or_else(|e| e.into_inner());
        failing.insert(key.to_string());
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects.get(key).cloned()
    }

    /// Keys passed to `get`, in call order, including ones that were not found.
    pub fn gets(&self) -> Vec<String> {
        self.reads.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn keys(&self) -> Vec<String> {
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects.keys().cloned().collect()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put_json(&self, key: &str, body: String) -> Result<PutReceipt> {
        let failing = self
            .failing_puts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key);
        if failing {
            return Err(StoreError::Injected(format!("put {}", key)).into());
        }

        // Same shape S3 reports for single-part uploads.
        let e_tag = format!("\"{:x}\"", md5::compute(body.as_bytes()));
        self.insert(key, body.into_bytes());
        Ok(PutReceipt::new(&self.bucket, key, Some(e_tag)))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.reads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(key.to_string());
        self.object(key)
            .map(|o| o.body)
            .ok_or_else(|| StoreError::NotFound(key.to_string()).into())
    }
}
