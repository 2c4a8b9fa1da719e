#![cfg(feature = "database")]

use std::time::Duration;

use neowatch_core::infrastructure::{PostgresMessageQueue, PostgresResultStore};
use neowatch_core::ports::{MessageQueue, ReceiptHandle, ReceiveRequest, ResultStore};
use neowatch_core::types::ResultRecord;
use sqlx::PgPool;

fn immediate(visibility: Duration) -> ReceiveRequest {
    ReceiveRequest {
        max_messages: 10,
        wait: Duration::ZERO,
        visibility_timeout: visibility,
    }
}

#[sqlx::test(migrator = "neowatch_core::MIGRATOR")]
#[ignore = "requires a PostgreSQL server at DATABASE_URL"]
async fn leased_message_is_hidden_then_deleted(pool: PgPool) {
    let queue = PostgresMessageQueue::new(pool, 5).await.unwrap();
    let id = queue.send("{\"id\":\"1\"}").await.unwrap();

    let batch = queue.receive(immediate(Duration::from_secs(30))).await.unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].message_id, id.to_string());

    let again = queue.receive(immediate(Duration::from_secs(30))).await.unwrap();
    assert!(again.is_empty());

    queue.delete(&batch[0].receipt).await.unwrap();
    assert!(queue.delete(&batch[0].receipt).await.is_err());
}

#[sqlx::test(migrator = "neowatch_core::MIGRATOR")]
#[ignore = "requires a PostgreSQL server at DATABASE_URL"]
async fn expired_lease_gets_new_receipt(pool: PgPool) {
    let queue = PostgresMessageQueue::new(pool, 5).await.unwrap();
    queue.send("payload").await.unwrap();

    let first = queue.receive(immediate(Duration::from_millis(50))).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    let second = queue.receive(immediate(Duration::from_secs(30))).await.unwrap();

    assert_eq!(second.len(), 1);
    assert_ne!(first[0].receipt, second[0].receipt);
    assert!(queue.delete(&first[0].receipt).await.is_err());
    queue.delete(&second[0].receipt).await.unwrap();
}

#[sqlx::test(migrator = "neowatch_core::MIGRATOR")]
#[ignore = "requires a PostgreSQL server at DATABASE_URL"]
async fn exhausted_message_is_dead_lettered(pool: PgPool) {
    let queue = PostgresMessageQueue::new(pool, 2).await.unwrap();
    queue.send("poison").await.unwrap();

    for _ in 0..2 {
        let batch = queue.receive(immediate(Duration::from_millis(20))).await.unwrap();
        assert_eq!(batch.len(), 1);
        tokio::time::sleep(Duration::from_millis(60)).await;
    }

    let batch = queue.receive(immediate(Duration::from_secs(30))).await.unwrap();
    assert!(batch.is_empty());
    assert_eq!(queue.dead_letter_count().await.unwrap(), 1);
}

#[sqlx::test(migrator = "neowatch_core::MIGRATOR")]
#[ignore = "requires a PostgreSQL server at DATABASE_URL"]
async fn long_poll_returns_empty_after_wait(pool: PgPool) {
    let queue = PostgresMessageQueue::new(pool, 5)
        .await
        .unwrap()
        .with_poll_interval(Duration::from_millis(20));

    let started = std::time::Instant::now();
    let batch = queue
        .receive(ReceiveRequest {
            max_messages: 1,
            wait: Duration::from_millis(100),
            visibility_timeout: Duration::from_secs(30),
        })
        .await
        .unwrap();

    assert!(batch.is_empty());
    assert!(started.elapsed() >= Duration::from_millis(100));
}

#[sqlx::test(migrator = "neowatch_core::MIGRATOR")]
#[ignore = "requires a PostgreSQL server at DATABASE_URL"]
async fn malformed_receipt_is_rejected(pool: PgPool) {
    let queue = PostgresMessageQueue::new(pool, 5).await.unwrap();
    let err = queue
        .delete(&ReceiptHandle("not-a-uuid".into()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("malformed receipt"));
}

#[sqlx::test(migrator = "neowatch_core::MIGRATOR")]
#[ignore = "requires a PostgreSQL server at DATABASE_URL"]
async fn dangerous_results_are_sorted_by_distance(pool: PgPool) {
    let store = PostgresResultStore::new(pool).await.unwrap();
    for (id, distance, dangerous) in [
        ("a", 4_000.0, true),
        ("b", 1_000.0, true),
        ("c", 2.0e7, false),
    ] {
        store
            .save_result(&ResultRecord {
                asteroid_id: id.into(),
                name: format!("Rock {id}"),
                closest_distance_km: distance,
                impact_date: if dangerous { 2_470_000.5 } else { 0.0 },
                is_dangerous: dangerous,
            })
            .await
            .unwrap();
    }

    let rows = store.dangerous_results(10).await.unwrap();
    let ids: Vec<_> = rows.iter().map(|r| r.asteroid_id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert!(rows.iter().all(|r| r.is_dangerous));

    let top = store.dangerous_results(1).await.unwrap();
    assert_eq!(top.len(), 1);
}
