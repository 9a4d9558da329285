//! Bloom and Top-K command round trips against the mock server.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::{Arc, Mutex};

use redisbloom::{Client, Error, Value};
use redisbloom_testing::{MockServer, Reply};

async fn client(server: &MockServer) -> Client {
    Client::new(&server.address(), "test", None).unwrap()
}

#[tokio::test]
async fn test_bloom_reserve_add_exists() {
    let server = MockServer::start().await.unwrap();
    let client = client(&server).await;

    client.bf_reserve("seen", 0.01, 1000).await.unwrap();
    assert!(client.bf_add("seen", "a").await.unwrap());
    assert!(!client.bf_add("seen", "a").await.unwrap());
    assert!(client.bf_exists("seen", "a").await.unwrap());
    assert!(!client.bf_exists("seen", "b").await.unwrap());
}

#[tokio::test]
async fn test_bloom_reserve_existing_key_is_server_error() {
    let server = MockServer::start().await.unwrap();
    let client = client(&server).await;

    client.bf_reserve("seen", 0.01, 1000).await.unwrap();
    let err = client.bf_reserve("seen", 0.01, 1000).await.unwrap_err();
    assert!(err.is_server_error());
    assert!(matches!(err, Error::Server(ref m) if m.contains("exists")));

    // The connection survives a server error and is reused.
    assert!(client.bf_add("seen", "x").await.unwrap());
    assert_eq!(server.connections_accepted(), 1);
}

#[tokio::test]
async fn test_bloom_multi_and_info() {
    let server = MockServer::start().await.unwrap();
    let client = client(&server).await;

    client.bf_reserve("seen", 0.01, 500).await.unwrap();
    assert_eq!(
        client.bf_add_multi("seen", ["a", "b", "a"]).await.unwrap(),
        vec![true, true, false]
    );
    assert_eq!(
        client
            .bf_exists_multi("seen", vec!["a".to_string(), "z".to_string()])
            .await
            .unwrap(),
        vec![true, false]
    );

    let info = client.bf_info("seen").await.unwrap();
    assert_eq!(info["Capacity"], 500);
    assert_eq!(info["Number of items inserted"], 2);
}

#[tokio::test]
async fn test_reserve_sends_shortest_float_form() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&seen);
    let server = MockServer::builder()
        .handler(move |args| {
            record.lock().unwrap().push(args.to_vec());
            None
        })
        .start()
        .await
        .unwrap();
    let client = client(&server).await;

    client.bf_reserve("f", 0.001, 100).await.unwrap();
    client.topk_reserve("t", 5, 50, 4, 0.9).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0], ["BF.RESERVE", "f", "0.001", "100"]);
    assert_eq!(seen[1], ["TOPK.RESERVE", "t", "5", "50", "4", "0.9"]);
}

#[tokio::test]
async fn test_topk_flow() {
    let server = MockServer::start().await.unwrap();
    let client = client(&server).await;

    assert_eq!(client.topk_reserve("hot", 2, 8, 7, 0.9).await.unwrap(), "OK");
    assert_eq!(
        client.topk_add("hot", ["a", "b"]).await.unwrap(),
        vec![None, None]
    );
    assert_eq!(
        client.topk_incr_by("hot", &[("c", 10)]).await.unwrap(),
        vec![Some("a".to_string())]
    );
    assert_eq!(
        client.topk_query("hot", ["a", "b", "c"]).await.unwrap(),
        vec![false, true, true]
    );
    assert_eq!(
        client.topk_count("hot", ["a", "c"]).await.unwrap(),
        vec![1, 10]
    );
    assert_eq!(client.topk_list("hot").await.unwrap(), vec!["c", "b"]);

    let info = client.topk_info("hot").await.unwrap();
    assert_eq!(info["k"], "2");
    assert_eq!(info["width"], "8");
    assert_eq!(info["decay"], "0.9");
}

#[tokio::test]
async fn test_topk_missing_key_is_server_error() {
    let server = MockServer::start().await.unwrap();
    let client = client(&server).await;

    let err = client.topk_list("nope").await.unwrap_err();
    assert!(err.is_server_error(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_unexpected_reply_shape_is_protocol_error() {
    let server = MockServer::builder()
        .handler(|args| (args[0] == "BF.ADD").then(|| Reply::Value(Value::from(vec!["x"]))))
        .start()
        .await
        .unwrap();
    let client = client(&server).await;

    let err = client.bf_add("f", "x").await.unwrap_err();
    assert!(matches!(err, Error::Protocol(_)), "unexpected error: {err}");
    assert_eq!(client.pool().status().in_use, 0);
}
