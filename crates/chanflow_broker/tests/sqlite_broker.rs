//! SQLite broker tests
//!
//! Two broker handles opened on the same file stand in for the coordinator
//! and a worker running as separate processes.

use chanflow_broker::{connect, QueueBroker, SqliteBroker};
use std::time::{Duration, Instant};
use tempfile::TempDir;

#[tokio::test]
async fn test_fifo_across_handles() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("broker.sqlite");

    let producer = SqliteBroker::open(&path).await.unwrap();
    let consumer = SqliteBroker::open(&path).await.unwrap();

    for payload in ["first", "second", "third"] {
        producer.push("tasks_queue", payload.as_bytes().to_vec()).await.unwrap();
    }
    assert_eq!(consumer.depth("tasks_queue").await.unwrap(), 3);

    let wait = Duration::from_millis(50);
    for expected in ["first", "second", "third"] {
        let popped = consumer.pop("tasks_queue", wait).await.unwrap().unwrap();
        assert_eq!(popped, expected.as_bytes());
    }
    assert_eq!(consumer.depth("tasks_queue").await.unwrap(), 0);
}

#[tokio::test]
async fn test_queues_are_independent() {
    let tmp = TempDir::new().unwrap();
    let broker = SqliteBroker::open(tmp.path().join("broker.sqlite")).await.unwrap();

    broker.push("results_queue", b"r1".to_vec()).await.unwrap();

    let task = broker.pop("tasks_queue", Duration::from_millis(20)).await.unwrap();
    assert!(task.is_none());
    assert_eq!(broker.depth("results_queue").await.unwrap(), 1);
}

#[tokio::test]
async fn test_pop_waits_for_late_push() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("broker.sqlite");
    let consumer = SqliteBroker::open(&path)
        .await
        .unwrap()
        .with_poll_interval(Duration::from_millis(10));
    let producer = SqliteBroker::open(&path).await.unwrap();

    let waiter = tokio::spawn(async move {
        consumer.pop("results_queue", Duration::from_secs(5)).await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    producer.push("results_queue", b"late".to_vec()).await.unwrap();

    let popped = waiter.await.unwrap().unwrap();
    assert_eq!(popped, Some(b"late".to_vec()));
}

#[tokio::test]
async fn test_pop_times_out() {
    let tmp = TempDir::new().unwrap();
    let broker = SqliteBroker::open(tmp.path().join("broker.sqlite"))
        .await
        .unwrap()
        .with_poll_interval(Duration::from_millis(10));

    let started = Instant::now();
    let popped = broker.pop("tasks_queue", Duration::from_millis(100)).await.unwrap();

    assert!(popped.is_none());
    assert!(started.elapsed() >= Duration::from_millis(100));
}

#[tokio::test]
async fn test_payloads_survive_reopen() {
    let tmp = TempDir::new().unwrap();
    let url = format!("sqlite:{}", tmp.path().join("broker.sqlite").display());

    {
        let broker = connect(&url).await.unwrap();
        broker.push("tasks_queue", b"persisted".to_vec()).await.unwrap();
    }

    let broker = connect(&url).await.unwrap();
    let popped = broker.pop("tasks_queue", Duration::from_millis(20)).await.unwrap();
    assert_eq!(popped, Some(b"persisted".to_vec()));
}
