//! Pool behavior against an in-process mock server.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::time::{Duration, Instant};

use redisbloom_auth::Credentials;
use redisbloom_pool::{MultiHostPool, Pool, PoolConfig, PoolError, SingleHostPool};
use redisbloom_testing::{MockServer, Reply, init_tracing};
use resp_protocol::{Command, Value};

fn config(max: u32) -> PoolConfig {
    PoolConfig::new()
        .max_connections(max)
        .connection_timeout(Duration::from_secs(2))
}

fn ping() -> Command {
    Command::new("PING")
}

#[tokio::test]
async fn test_ceiling_blocks_until_release() {
    init_tracing();
    let server = MockServer::start().await.unwrap();
    let pool = SingleHostPool::new(server.address(), None, config(2)).unwrap();

    let first = pool.get().await.unwrap();
    let second = pool.get().await.unwrap();
    assert_eq!(pool.status().in_use, 2);
    assert!(pool.status().is_at_capacity());

    let waiter_pool = pool.clone();
    let waiter = tokio::spawn(async move { waiter_pool.get().await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!waiter.is_finished(), "third caller must wait for a release");
    assert_eq!(pool.status().in_use, 2);

    let first_id = first.metadata().id;
    drop(first);

    let third = tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .expect("waiter woke up")
        .unwrap()
        .unwrap();
    assert_eq!(third.metadata().id, first_id, "released connection is reused");
    assert_eq!(pool.status().in_use, 2);
    server.wait_for_connections(2).await.unwrap();
    assert_eq!(server.connections_accepted(), 2);

    drop(second);
    drop(third);
    assert_eq!(pool.status().in_use, 0);
    assert_eq!(pool.status().available, 2);
}

#[tokio::test]
async fn test_many_concurrent_callers_never_exceed_ceiling() {
    let server = MockServer::builder()
        .handler(|args| {
            (args[0] == "SLOW").then(|| Reply::Delayed(Duration::from_millis(10), Value::ok()))
        })
        .start()
        .await
        .unwrap();
    let pool = SingleHostPool::new(server.address(), None, config(4)).unwrap();

    let mut tasks = Vec::new();
    for _ in 0..40 {
        let pool = pool.clone();
        tasks.push(tokio::spawn(async move {
            let mut conn = pool.get().await.unwrap();
            assert!(pool.status().in_use <= 4);
            conn.execute(&Command::new("SLOW")).await.unwrap()
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), Value::ok());
    }

    assert!(server.connections_accepted() <= 4);
    assert_eq!(pool.status().in_use, 0);
    assert_eq!(pool.metrics().checkouts_successful, 40);
}

#[tokio::test]
async fn test_exhausted_pool_times_out_after_configured_wait() {
    let server = MockServer::start().await.unwrap();
    let wait = Duration::from_millis(200);
    let pool = SingleHostPool::new(
        server.address(),
        None,
        PoolConfig::new().max_connections(1).connection_timeout(wait),
    )
    .unwrap();

    let _held = pool.get().await.unwrap();
    let start = Instant::now();
    let err = pool.get().await.unwrap_err();
    let elapsed = start.elapsed();

    assert!(err.is_pool_exhausted(), "unexpected error: {err}");
    assert!(elapsed >= wait, "gave up too early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "waited too long: {elapsed:?}");
    assert_eq!(pool.metrics().checkouts_failed, 1);
    assert_eq!(pool.status().in_use, 1);
}

#[tokio::test]
async fn test_release_returns_to_issuing_sub_pool() {
    let a = MockServer::start().await.unwrap();
    let b = MockServer::start().await.unwrap();
    let pool = MultiHostPool::new([a.address(), b.address()], None, config(50)).unwrap();

    let mut held = Vec::new();
    for _ in 0..40 {
        held.push(pool.get().await.unwrap());
    }
    let mut issued: HashMap<String, u32> = HashMap::new();
    for conn in &held {
        *issued.entry(conn.address().to_string()).or_default() += 1;
    }
    for conn in held {
        pool.release(conn);
    }

    for sub in pool.pools() {
        let status = sub.status();
        assert_eq!(status.in_use, 0);
        assert_eq!(
            status.available,
            issued.get(sub.address()).copied().unwrap_or(0),
            "sub-pool {} holds exactly the connections it issued",
            sub.address()
        );
    }
    for server in [&a, &b] {
        let issued = issued.get(&server.address()).copied().unwrap_or(0) as usize;
        server.wait_for_connections(issued).await.unwrap();
        assert_eq!(server.connections_accepted(), issued);
    }
}

#[tokio::test]
async fn test_random_selection_spreads_evenly() {
    let servers = [
        MockServer::start().await.unwrap(),
        MockServer::start().await.unwrap(),
        MockServer::start().await.unwrap(),
    ];
    let pool = MultiHostPool::new(
        servers.iter().map(MockServer::address),
        None,
        config(10),
    )
    .unwrap();

    let mut hits: HashMap<String, u32> = HashMap::new();
    for _ in 0..3000 {
        let conn = pool.get().await.unwrap();
        *hits.entry(conn.address().to_string()).or_default() += 1;
    }

    assert_eq!(hits.len(), 3);
    for (address, count) in &hits {
        assert!(
            (700..=1300).contains(count),
            "{address} received {count} of 3000 checkouts"
        );
    }
}

#[tokio::test]
async fn test_connection_broken_mid_command_is_not_recycled() {
    let server = MockServer::builder()
        .handler(|args| (args[0] == "BOOM").then_some(Reply::Disconnect))
        .start()
        .await
        .unwrap();
    let pool = SingleHostPool::new(server.address(), None, config(1)).unwrap();

    let mut conn = pool.get().await.unwrap();
    let broken_id = conn.metadata().id;
    let err = conn.execute(&Command::new("BOOM")).await.unwrap_err();
    assert!(err.is_connection_error(), "unexpected error: {err}");
    assert!(conn.is_broken());
    drop(conn);

    let status = pool.status();
    assert_eq!(status.available, 0);
    assert_eq!(status.total, 0);

    let mut fresh = pool.get().await.unwrap();
    assert_ne!(fresh.metadata().id, broken_id);
    assert!(!fresh.is_broken());
    assert_eq!(fresh.execute(&ping()).await.unwrap(), Value::simple("PONG"));
    assert_eq!(server.connections_accepted(), 2);
}

#[tokio::test]
async fn test_cancelled_command_breaks_connection() {
    let server = MockServer::builder()
        .handler(|args| {
            (args[0] == "SLOW").then(|| Reply::Delayed(Duration::from_millis(500), Value::ok()))
        })
        .start()
        .await
        .unwrap();
    let pool = SingleHostPool::new(server.address(), None, config(1)).unwrap();

    let mut conn = pool.get().await.unwrap();
    let cancelled =
        tokio::time::timeout(Duration::from_millis(50), conn.execute(&Command::new("SLOW"))).await;
    assert!(cancelled.is_err());
    assert!(conn.is_broken(), "unread reply must poison the connection");
    drop(conn);

    assert_eq!(pool.status().available, 0);
    let mut next = pool.get().await.unwrap();
    assert_eq!(next.execute(&ping()).await.unwrap(), Value::simple("PONG"));
}

#[tokio::test]
async fn test_command_timeout_marks_connection_broken() {
    let server = MockServer::builder()
        .handler(|args| {
            (args[0] == "SLOW").then(|| Reply::Delayed(Duration::from_millis(500), Value::ok()))
        })
        .start()
        .await
        .unwrap();
    let pool = SingleHostPool::new(
        server.address(),
        None,
        config(1).command_timeout(Duration::from_millis(50)),
    )
    .unwrap();

    let mut conn = pool.get().await.unwrap();
    let err = conn.execute(&Command::new("SLOW")).await.unwrap_err();
    assert!(matches!(err, PoolError::Timeout { .. }), "unexpected error: {err}");
    assert!(conn.is_broken());
}

#[tokio::test]
async fn test_server_error_reply_keeps_connection() {
    let server = MockServer::start().await.unwrap();
    let pool = SingleHostPool::new(server.address(), None, config(1)).unwrap();

    let mut conn = pool.get().await.unwrap();
    let reply = conn.execute(&Command::new("NOPE")).await.unwrap();
    assert!(reply.is_error());
    assert!(!conn.is_broken());
    drop(conn);

    assert_eq!(pool.status().available, 1);
    let _again = pool.get().await.unwrap();
    assert_eq!(server.connections_accepted(), 1);
}

#[tokio::test]
async fn test_stale_idle_connection_fails_health_check() {
    let server = MockServer::start().await.unwrap();
    let pool = SingleHostPool::new(
        server.address(),
        None,
        config(1).health_check_interval(Duration::ZERO),
    )
    .unwrap();

    drop(pool.get().await.unwrap());
    assert_eq!(pool.status().available, 1);

    server.wait_for_connections(1).await.unwrap();
    server.drop_connections().await.unwrap();
    assert_eq!(server.active_connections(), 0);

    let mut conn = pool.get().await.unwrap();
    assert_eq!(conn.execute(&ping()).await.unwrap(), Value::simple("PONG"));

    let metrics = pool.metrics();
    assert_eq!(metrics.health_checks_failed, 1);
    assert_eq!(metrics.connections_created, 2);
    assert_eq!(metrics.connections_closed, 1);
    assert_eq!(server.connections_accepted(), 2);
}

#[tokio::test]
async fn test_cancelled_health_check_discards_connection() {
    let server = MockServer::builder()
        .handler(|args| {
            (args[0] == "PING")
                .then(|| Reply::Delayed(Duration::from_millis(500), Value::simple("PONG")))
        })
        .start()
        .await
        .unwrap();
    let pool = SingleHostPool::new(
        server.address(),
        None,
        config(1).health_check_interval(Duration::ZERO),
    )
    .unwrap();

    drop(pool.get().await.unwrap());
    assert_eq!(pool.status().total, 1);

    let cancelled = tokio::time::timeout(Duration::from_millis(50), pool.get()).await;
    assert!(cancelled.is_err(), "health check should still be waiting on PONG");

    let status = pool.status();
    assert_eq!(status.available, 0);
    assert_eq!(status.in_use, 0);
    assert_eq!(status.total, 0);
    assert_eq!(pool.metrics().connections_closed, 1);

    // A fresh connection skips the check and is handed out at once.
    let conn = pool.get().await.unwrap();
    assert_eq!(pool.status().total, 1);
    drop(conn);
}

#[tokio::test]
async fn test_healthy_idle_connection_passes_health_check() {
    let server = MockServer::start().await.unwrap();
    let pool = SingleHostPool::new(
        server.address(),
        None,
        config(1).health_check_interval(Duration::ZERO),
    )
    .unwrap();

    drop(pool.get().await.unwrap());
    let _conn = pool.get().await.unwrap();

    let metrics = pool.metrics();
    assert_eq!(metrics.health_checks_performed, 1);
    assert_eq!(metrics.health_checks_failed, 0);
    assert_eq!(server.connections_accepted(), 1);
}

#[tokio::test]
async fn test_bad_credentials_fail_without_leaking_slots() {
    let server = MockServer::builder().password("secret").start().await.unwrap();
    let pool = SingleHostPool::new(
        server.address(),
        Some(Credentials::password("wrong")),
        config(1),
    )
    .unwrap();

    for _ in 0..3 {
        let err = pool.get().await.unwrap_err();
        assert!(err.is_authentication_error(), "unexpected error: {err}");
    }
    let status = pool.status();
    assert_eq!(status.in_use, 0);
    assert_eq!(status.total, 0);
    assert_eq!(pool.metrics().checkouts_failed, 3);
}

#[tokio::test]
async fn test_valid_credentials_authenticate_each_connection() {
    let server = MockServer::builder()
        .acl("app", "secret")
        .start()
        .await
        .unwrap();
    let pool = SingleHostPool::new(
        server.address(),
        Some(Credentials::acl("app", "secret")),
        config(2),
    )
    .unwrap();

    let mut a = pool.get().await.unwrap();
    let mut b = pool.get().await.unwrap();
    assert_eq!(a.execute(&ping()).await.unwrap(), Value::simple("PONG"));
    assert_eq!(b.execute(&ping()).await.unwrap(), Value::simple("PONG"));
}

#[tokio::test]
async fn test_unreachable_address_is_connection_error() {
    let server = MockServer::start().await.unwrap();
    let address = server.address();
    drop(server);
    tokio::time::sleep(Duration::from_millis(20)).await;

    let pool = SingleHostPool::new(address, None, config(1)).unwrap();
    let err = pool.get().await.unwrap_err();
    assert!(err.is_connection_error(), "unexpected error: {err}");
    assert_eq!(pool.status().in_use, 0);
}

#[tokio::test]
async fn test_close_rejects_new_checkouts_and_discards_returns() {
    let server = MockServer::start().await.unwrap();
    let pool = Pool::new(vec![server.address()], None, config(2)).unwrap();

    let held = pool.get().await.unwrap();
    drop(pool.get().await.unwrap());
    assert_eq!(pool.status().available, 1);

    pool.close();
    assert!(pool.is_closed());
    assert_eq!(pool.status().available, 0);
    assert!(matches!(pool.get().await, Err(PoolError::PoolClosed)));

    drop(held);
    let status = pool.status();
    assert_eq!(status.total, 0);
    assert_eq!(status.in_use, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_close_racing_returns_leaves_nothing_idle() {
    let server = MockServer::start().await.unwrap();

    for _ in 0..20 {
        let pool = SingleHostPool::new(server.address(), None, config(8)).unwrap();
        let mut held = Vec::new();
        for _ in 0..8 {
            held.push(pool.get().await.unwrap());
        }
        let returns = tokio::spawn(async move {
            for conn in held {
                drop(conn);
                tokio::task::yield_now().await;
            }
        });
        tokio::task::yield_now().await;
        pool.close();
        returns.await.unwrap();

        let status = pool.status();
        assert_eq!(status.available, 0);
        assert_eq!(status.in_use, 0);
        assert_eq!(status.total, 0);
    }
}

#[tokio::test]
async fn test_failed_sub_pool_is_returned_without_fallback() {
    let live = MockServer::start().await.unwrap();
    let dead = MockServer::start().await.unwrap();
    let dead_address = dead.address();
    drop(dead);
    tokio::time::sleep(Duration::from_millis(20)).await;

    let pool = MultiHostPool::new([live.address(), dead_address.clone()], None, config(4)).unwrap();

    let (mut succeeded, mut failed) = (0u64, 0u64);
    for _ in 0..200 {
        match pool.get().await {
            Ok(conn) => {
                assert_eq!(conn.address(), live.address());
                succeeded += 1;
            }
            Err(err) => {
                assert!(err.is_connection_error(), "unexpected error: {err}");
                if let PoolError::Connection { address, .. } = &err {
                    assert_eq!(address, &dead_address);
                }
                failed += 1;
            }
        }
    }
    assert!(succeeded > 0, "live address never chosen");
    assert!(failed > 0, "dead address never chosen");

    // Each call touched exactly one sub-pool.
    let [live_pool, dead_pool] = pool.pools() else {
        panic!("expected two sub-pools");
    };
    assert_eq!(live_pool.metrics().checkouts_successful, succeeded);
    assert_eq!(live_pool.metrics().checkouts_failed, 0);
    assert_eq!(dead_pool.metrics().checkouts_successful, 0);
    assert_eq!(dead_pool.metrics().checkouts_failed, failed);
    assert_eq!(dead_pool.status().in_use, 0);
    assert_eq!(dead_pool.status().total, 0);
    assert_eq!(live_pool.status().in_use, 0);
}

#[tokio::test]
async fn test_detach_frees_the_slot() {
    let server = MockServer::start().await.unwrap();
    let pool = SingleHostPool::new(server.address(), None, config(1)).unwrap();

    let mut conn = pool.get().await.unwrap().detach();
    assert_eq!(pool.status().in_use, 0);
    assert_eq!(pool.status().total, 0);
    assert_eq!(conn.execute(&ping()).await.unwrap(), Value::simple("PONG"));

    let _pooled = pool.get().await.unwrap();
    server.wait_for_connections(2).await.unwrap();
    assert_eq!(server.connections_accepted(), 2);
}
