//! Postgres store tests. They need a reachable database:
//! `DATABASE_URL=postgres://... cargo test --test pg_store_test -- --ignored`

use std::collections::HashMap;
use std::env;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use hookwatch::{
    error::Error,
    models::webhook_log::{NewWebhookLog, Payload, WebhookLog, WebhookStatus},
    services::log_store::{PgWebhookLogStore, WebhookLogStore},
};
use serde_json::json;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to create test pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// Postgres keeps microseconds, so timestamps are truncated before they are stored.
fn at(offset_secs: i64) -> DateTime<Utc> {
    (Utc::now() + Duration::seconds(offset_secs)).trunc_subsecs(6)
}

fn record(endpoint_id: &str, body: Payload, created_at: DateTime<Utc>) -> WebhookLog {
    WebhookLog::received(
        NewWebhookLog {
            endpoint_id: endpoint_id.to_string(),
            method: "POST".into(),
            headers: HashMap::from([
                ("Content-Type".to_string(), "application/json".to_string()),
                ("X-Multi".to_string(), "a, b".to_string()),
            ]),
            body,
            ip_address: "203.0.113.7".into(),
            user_agent: "hook-sender/1.0".into(),
        },
        created_at,
    )
}

fn unique_endpoint(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn insert_and_get_round_trips_every_payload_kind() {
    let store = PgWebhookLogStore::new(setup_test_db().await);
    let endpoint = unique_endpoint("columns");

    let payloads = [
        Payload::Json(json!({ "order": { "id": 42, "tags": ["a", "b"] } })),
        Payload::Raw("not=json&at=all".into()),
        Payload::Empty,
    ];

    for payload in payloads {
        let log = record(&endpoint, payload.clone(), at(0));
        store.insert(&log).await.expect("insert");

        let stored = store.get_by_id(log.id).await.expect("get_by_id");
        assert_eq!(stored.id, log.id);
        assert_eq!(stored.endpoint_id, endpoint);
        assert_eq!(stored.method, "POST");
        assert_eq!(stored.headers, log.headers);
        assert_eq!(stored.body, payload);
        assert_eq!(stored.ip_address, "203.0.113.7");
        assert_eq!(stored.user_agent, "hook-sender/1.0");
        assert_eq!(stored.status, WebhookStatus::Received);
        assert_eq!(stored.processed_at, None);
        assert_eq!(stored.created_at, log.created_at);
        assert_eq!(stored.updated_at, log.updated_at);
    }

    store.delete_by_endpoint(&endpoint).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn get_unknown_id_is_not_found() {
    let store = PgWebhookLogStore::new(setup_test_db().await);
    let err = store.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn update_status_rewrites_lifecycle_fields_only() {
    let store = PgWebhookLogStore::new(setup_test_db().await);
    let endpoint = unique_endpoint("status");

    let log = record(&endpoint, Payload::Json(json!({ "n": 1 })), at(0));
    store.insert(&log).await.expect("insert");

    let processed_at = at(1);
    store
        .update_status(log.id, WebhookStatus::Processed, Some(processed_at), processed_at)
        .await
        .expect("update_status");

    let stored = store.get_by_id(log.id).await.expect("get_by_id");
    assert_eq!(stored.status, WebhookStatus::Processed);
    assert_eq!(stored.processed_at, Some(processed_at));
    assert_eq!(stored.updated_at, processed_at);
    assert_eq!(stored.created_at, log.created_at);
    assert_eq!(stored.body, log.body);

    let err = store
        .update_status(Uuid::new_v4(), WebhookStatus::Failed, None, at(2))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    store.delete_by_endpoint(&endpoint).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn list_is_newest_first_and_respects_limit() {
    let store = PgWebhookLogStore::new(setup_test_db().await);
    let endpoint = unique_endpoint("listing");
    let other = unique_endpoint("other");

    let mut ids = Vec::new();
    for i in 0..5 {
        let log = record(&endpoint, Payload::Json(json!({ "n": i })), at(i));
        store.insert(&log).await.expect("insert");
        ids.push(log.id);
    }
    store
        .insert(&record(&other, Payload::Empty, at(10)))
        .await
        .expect("insert other");

    let all = store.list_by_endpoint(&endpoint, 50).await.expect("list");
    let listed: Vec<Uuid> = all.iter().map(|log| log.id).collect();
    let newest_first: Vec<Uuid> = ids.iter().rev().copied().collect();
    assert_eq!(listed, newest_first);
    assert!(all.iter().all(|log| log.endpoint_id == endpoint));

    let limited = store.list_by_endpoint(&endpoint, 2).await.expect("list");
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].id, ids[4]);
    assert_eq!(limited[1].id, ids[3]);

    let missing = store
        .list_by_endpoint(&unique_endpoint("nobody"), 50)
        .await
        .expect("list");
    assert!(missing.is_empty());

    store.delete_by_endpoint(&endpoint).await.expect("cleanup");
    store.delete_by_endpoint(&other).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn delete_by_endpoint_counts_and_scopes_rows() {
    let store = PgWebhookLogStore::new(setup_test_db().await);
    let endpoint = unique_endpoint("clear");
    let keep = unique_endpoint("keep");

    for i in 0..3 {
        store
            .insert(&record(&endpoint, Payload::Raw(format!("raw {}", i)), at(i)))
            .await
            .expect("insert");
    }
    let kept = record(&keep, Payload::Empty, at(0));
    store.insert(&kept).await.expect("insert kept");

    assert_eq!(store.delete_by_endpoint(&endpoint).await.expect("delete"), 3);
    assert_eq!(store.delete_by_endpoint(&endpoint).await.expect("delete again"), 0);
    assert!(store.list_by_endpoint(&endpoint, 50).await.expect("list").is_empty());
    assert_eq!(store.get_by_id(kept.id).await.expect("kept survives").id, kept.id);

    store.delete_by_endpoint(&keep).await.expect("cleanup");
}
