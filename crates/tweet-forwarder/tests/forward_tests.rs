use std::sync::Arc;

use aws_lambda_events::event::sqs::SqsEvent;
use lambda_runtime::{Context, Error, LambdaEvent};
use serde_json::{json, Value};
use tweet_flattener::Flattener;
use tweet_forwarder::{function_handler, BatchForwarder, ForwardOutcome};
use tweet_store::{MemoryBlobStore, MemoryQueue, RecordingInvoker};

const ANALYSER: &str = "tweet-sentiment-analyser";

fn sqs_event(bodies: &[&str]) -> SqsEvent {
    let records: Vec<Value> = bodies
        .iter()
        .enumerate()
        .map(|(i, body)| json!({"messageId": format!("m{}", i), "body": body}))
        .collect();
    serde_json::from_value(json!({ "Records": records })).expect("Valid SQS event")
}

fn seeded_store() -> Arc<MemoryBlobStore> {
    let store = Arc::new(MemoryBlobStore::new("tweet-bucket"));
    store.insert("tweets/1.tweet.json", r#"{"id":"1","full_text":"hello"}"#);
    store.insert("tweets/2.tweet.json", r#"{"id":"2","full_text":"world"}"#);
    store.insert("tweets/3.tweet.json", r#"{"id":"3","full_text":"again"}"#);
    store
}

fn payload_of(invoker: &RecordingInvoker) -> Value {
    let calls = invoker.calls();
    assert_eq!(calls.len(), 1, "Expected exactly one invocation");
    assert_eq!(calls[0].function, ANALYSER);
    serde_json::from_slice(&calls[0].payload).expect("Payload is JSON")
}

#[tokio::test]
async fn test_two_notifications_forwarded_once_in_order() -> Result<(), Error> {
    let store = seeded_store();
    let invoker = Arc::new(RecordingInvoker::new());
    let forwarder = BatchForwarder::new(store, invoker.clone(), ANALYSER.to_string());

    let event = LambdaEvent::new(
        sqs_event(&["tweets/1.tweet.json", "tweets/2.tweet.json"]),
        Context::default(),
    );
    function_handler(&forwarder, event).await?;

    assert_eq!(
        payload_of(&invoker),
        json!([{"id": "1", "full_text": "hello"}, {"id": "2", "full_text": "world"}])
    );
    Ok(())
}

#[tokio::test]
async fn test_notification_order_is_kept() {
    let store = seeded_store();
    let invoker = Arc::new(RecordingInvoker::new());
    let forwarder = BatchForwarder::new(store, invoker.clone(), ANALYSER.to_string());

    let outcome = forwarder
        .forward(&sqs_event(&[
            "tweets/3.tweet.json",
            "tweets/1.tweet.json",
            "tweets/2.tweet.json",
        ]))
        .await
        .expect("Forward failed");

    assert_eq!(
        outcome,
        ForwardOutcome {
            forwarded: 3,
            accepted: true
        }
    );
    let ids: Vec<Value> = payload_of(&invoker)
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!("3"), json!("1"), json!("2")]);
}

#[tokio::test]
async fn test_missing_object_aborts_without_invoking() {
    let store = seeded_store();
    let invoker = Arc::new(RecordingInvoker::new());
    let forwarder = BatchForwarder::new(store.clone(), invoker.clone(), ANALYSER.to_string());

    let event = LambdaEvent::new(
        sqs_event(&["tweets/1.tweet.json", "tweets/404.tweet.json", "tweets/2.tweet.json"]),
        Context::default(),
    );
    let result = function_handler(&forwarder, event).await;

    assert!(result.is_err());
    assert!(invoker.calls().is_empty());
    // Nothing after the failed fetch is read.
    assert_eq!(
        store.gets(),
        vec![
            "tweets/1.tweet.json".to_string(),
            "tweets/404.tweet.json".to_string()
        ]
    );
}

#[tokio::test]
async fn test_malformed_object_aborts_without_invoking() {
    let store = seeded_store();
    store.insert("tweets/bad.tweet.json", "{not json");
    let invoker = Arc::new(RecordingInvoker::new());
    let forwarder = BatchForwarder::new(store.clone(), invoker.clone(), ANALYSER.to_string());

    let err = forwarder
        .forward(&sqs_event(&["tweets/bad.tweet.json", "tweets/1.tweet.json"]))
        .await
        .expect_err("Malformed JSON should abort");

    assert!(err.to_string().contains("tweets/bad.tweet.json"));
    assert!(invoker.calls().is_empty());
    assert_eq!(store.gets(), vec!["tweets/bad.tweet.json".to_string()]);
}

#[tokio::test]
async fn test_record_without_body_aborts() {
    let store = seeded_store();
    let invoker = Arc::new(RecordingInvoker::new());
    let forwarder = BatchForwarder::new(store, invoker.clone(), ANALYSER.to_string());

    let event: SqsEvent =
        serde_json::from_value(json!({"Records": [{"messageId": "m0"}]})).unwrap();
    assert!(forwarder.forward(&event).await.is_err());
    assert!(invoker.calls().is_empty());
}

#[tokio::test]
async fn test_rejected_invocation_is_not_an_error() -> Result<(), Error> {
    let store = seeded_store();
    let invoker = Arc::new(RecordingInvoker::rejecting());
    let forwarder = BatchForwarder::new(store, invoker.clone(), ANALYSER.to_string());

    let outcome = forwarder.forward(&sqs_event(&["tweets/1.tweet.json"])).await?;
    assert_eq!(outcome.forwarded, 1);
    assert!(!outcome.accepted);

    let event = LambdaEvent::new(sqs_event(&["tweets/2.tweet.json"]), Context::default());
    function_handler(&forwarder, event).await?;

    // One attempt per invocation, no retries.
    assert_eq!(invoker.calls().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_empty_batch_still_invokes_with_empty_array() {
    let store = seeded_store();
    let invoker = Arc::new(RecordingInvoker::new());
    let forwarder = BatchForwarder::new(store, invoker.clone(), ANALYSER.to_string());

    let outcome = forwarder.forward(&sqs_event(&[])).await.unwrap();
    assert_eq!(outcome.forwarded, 0);
    assert_eq!(payload_of(&invoker), json!([]));
}

#[tokio::test]
async fn test_flattened_tweets_reach_the_analyser() {
    let store = Arc::new(MemoryBlobStore::new("tweet-bucket"));
    let queue = Arc::new(MemoryQueue::new());
    let flattener = Flattener::new(store.clone(), queue.clone(), "tweets".to_string());

    let tweets = vec![
        json!({"id": "1", "full_text": "hello"}),
        json!({"id": "2", "full_text": "world"}),
    ];
    flattener.flatten(tweets.clone()).await;

    // Notifications carry put receipts rather than bare keys.
    let messages = queue.messages();
    let bodies: Vec<&str> = messages.iter().map(String::as_str).collect();

    let invoker = Arc::new(RecordingInvoker::new());
    let forwarder = BatchForwarder::new(store, invoker.clone(), ANALYSER.to_string());
    forwarder.forward(&sqs_event(&bodies)).await.expect("Forward failed");

    assert_eq!(payload_of(&invoker), Value::Array(tweets));
}
