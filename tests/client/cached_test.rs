/*!
 * Cached Client Read Path Tests
 * TTL, force refresh, introspection and error handling
 */

use super::gated::{wait_for_gets, GatedTransport};
use super::mock::MockTransport;
use lms_core::client::{CachedClient, QueryParams, RequestOptions, TransportError};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::advance;

const SUBJECTS: &str = "/subjects/institute/abc";

fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

#[derive(Debug, Deserialize, PartialEq)]
struct Subject {
    id: String,
    name: String,
}

#[tokio::test(start_paused = true)]
async fn test_repeated_get_within_ttl_hits_network_once() {
    let transport = MockTransport::new();
    transport.respond(SUBJECTS, json!([{ "id": "s1", "name": "Physics" }]));
    let client = CachedClient::new(transport.clone());
    let opts = RequestOptions::new().ttl_minutes(30.0);

    let first: Vec<Subject> = client.get(SUBJECTS, &QueryParams::new(), opts).await.unwrap();
    advance(minutes(29)).await;
    let second: Vec<Subject> = client.get(SUBJECTS, &QueryParams::new(), opts).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first[0].name, "Physics");
    assert_eq!(transport.get_count(SUBJECTS), 1);

    let stats = client.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.size, 1);
}

#[tokio::test(start_paused = true)]
async fn test_parameter_order_shares_an_entry() {
    let transport = MockTransport::new();
    transport.respond("/institute-classes", json!(["7A"]));
    let client = CachedClient::new(transport.clone());

    let a = QueryParams::new().with("instituteId", "x").with("year", 2024);
    let b = QueryParams::new().with("year", "2024").with("instituteId", "x").with("grade", None::<u8>);

    let _: Value = client.get("/institute-classes", &a, RequestOptions::new()).await.unwrap();
    let _: Value = client.get("/institute-classes", &b, RequestOptions::new()).await.unwrap();

    assert_eq!(transport.get_count("/institute-classes"), 1);
    let sent = transport.last_params("/institute-classes").unwrap();
    assert_eq!(sent.get("year"), Some("2024"));
    assert_eq!(sent.get("grade"), None);
}

#[tokio::test(start_paused = true)]
async fn test_expired_entry_without_swr_refetches() {
    let transport = MockTransport::new();
    transport.respond(SUBJECTS, json!("A"));
    let client = CachedClient::new(transport.clone());
    let opts = RequestOptions::new().ttl_minutes(5.0);

    let a: String = client.get(SUBJECTS, &QueryParams::new(), opts).await.unwrap();
    transport.respond(SUBJECTS, json!("B"));
    advance(minutes(5)).await;
    let b: String = client.get(SUBJECTS, &QueryParams::new(), opts).await.unwrap();

    assert_eq!((a.as_str(), b.as_str()), ("A", "B"));
    assert_eq!(transport.get_count(SUBJECTS), 2);
}

#[tokio::test(start_paused = true)]
async fn test_default_ttl_applies_when_unset() {
    let transport = MockTransport::new();
    transport.respond(SUBJECTS, json!(1));
    let client = CachedClient::builder(transport.clone())
        .with_default_ttl(minutes(2))
        .build();
    assert_eq!(client.default_ttl(), minutes(2));

    let _: Value = client.get(SUBJECTS, &QueryParams::new(), RequestOptions::new()).await.unwrap();
    advance(Duration::from_secs(119)).await;
    let _: Value = client.get(SUBJECTS, &QueryParams::new(), RequestOptions::new()).await.unwrap();
    assert_eq!(transport.get_count(SUBJECTS), 1);

    advance(Duration::from_secs(1)).await;
    let _: Value = client.get(SUBJECTS, &QueryParams::new(), RequestOptions::new()).await.unwrap();
    assert_eq!(transport.get_count(SUBJECTS), 2);
}

#[tokio::test(start_paused = true)]
async fn test_zero_and_negative_ttl_always_refetch() {
    let transport = MockTransport::new();
    transport.respond(SUBJECTS, json!(1));
    let client = CachedClient::new(transport.clone());

    for ttl in [0.0, -5.0, 0.0] {
        let _: Value = client
            .get(SUBJECTS, &QueryParams::new(), RequestOptions::new().ttl_minutes(ttl))
            .await
            .unwrap();
    }

    assert_eq!(transport.get_count(SUBJECTS), 3);
    assert!(client.has_cache(SUBJECTS, &QueryParams::new()));
}

#[tokio::test(start_paused = true)]
async fn test_force_refresh_ignores_fresh_entry() {
    let transport = MockTransport::new();
    transport.respond(SUBJECTS, json!("A"));
    let client = CachedClient::new(transport.clone());
    let opts = RequestOptions::new().ttl_minutes(60.0);

    let _: String = client.get(SUBJECTS, &QueryParams::new(), opts).await.unwrap();
    transport.respond(SUBJECTS, json!("B"));

    let forced: String = client
        .get(SUBJECTS, &QueryParams::new(), opts.force_refresh())
        .await
        .unwrap();
    assert_eq!(forced, "B");
    assert_eq!(transport.get_count(SUBJECTS), 2);

    let cached: String = client.get(SUBJECTS, &QueryParams::new(), opts).await.unwrap();
    assert_eq!(cached, "B");
    assert_eq!(transport.get_count(SUBJECTS), 2);
}

#[tokio::test(start_paused = true)]
async fn test_force_refresh_resets_fetched_at() {
    let transport = MockTransport::new();
    transport.respond(SUBJECTS, json!("A"));
    let client = CachedClient::new(transport.clone());
    let opts = RequestOptions::new().ttl_minutes(5.0);

    let _: String = client.get(SUBJECTS, &QueryParams::new(), opts).await.unwrap();
    advance(minutes(4)).await;
    let _: String = client.get(SUBJECTS, &QueryParams::new(), opts.force_refresh()).await.unwrap();
    advance(minutes(4)).await;

    let entry = client.cache_entry(SUBJECTS, &QueryParams::new()).unwrap();
    assert_eq!(entry.ttl, minutes(5));
    assert!(entry.is_fresh(tokio::time::Instant::now()));
    let _: String = client.get(SUBJECTS, &QueryParams::new(), opts).await.unwrap();
    assert_eq!(transport.get_count(SUBJECTS), 2);
}

#[tokio::test(start_paused = true)]
async fn test_has_cache_before_and_after_get() {
    let transport = MockTransport::new();
    transport.respond("/institute-classes", json!([]));
    let client = CachedClient::new(transport.clone());
    let params = QueryParams::new().with("instituteId", "x");

    assert!(!client.has_cache("/institute-classes", &params));
    let _: Value = client
        .get("/institute-classes", &params, RequestOptions::new().ttl_minutes(0.0))
        .await
        .unwrap();
    assert!(client.has_cache("/institute-classes", &params));
    assert!(!client.has_cache("/institute-classes", &QueryParams::new().with("instituteId", "y")));
    assert_eq!(transport.total_gets(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_get_cached_only_never_fetches() {
    let transport = MockTransport::new();
    transport.respond(SUBJECTS, json!({ "id": "s1", "name": "Maths" }));
    let client = CachedClient::new(transport.clone());

    let missing: Option<Subject> = client.get_cached_only(SUBJECTS, &QueryParams::new()).unwrap();
    assert!(missing.is_none());
    assert_eq!(transport.total_gets(), 0);

    let _: Subject = client
        .get(SUBJECTS, &QueryParams::new(), RequestOptions::new().ttl_minutes(1.0))
        .await
        .unwrap();
    advance(minutes(10)).await;

    // Stale entries are still returned
    let stale: Option<Subject> = client.get_cached_only(SUBJECTS, &QueryParams::new()).unwrap();
    assert_eq!(stale.unwrap().name, "Maths");
    assert_eq!(transport.total_gets(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_preload_then_cached_only() {
    let transport = MockTransport::new();
    transport.respond("/exams", json!([{ "id": "e1" }]));
    let client = CachedClient::new(transport.clone());

    client.preload("/exams", &QueryParams::new(), Some(10.0)).await;
    let cached: Option<Value> = client.get_cached_only("/exams", &QueryParams::new()).unwrap();

    assert_eq!(cached, Some(json!([{ "id": "e1" }])));
    assert_eq!(transport.get_count("/exams"), 1);
    assert_eq!(
        client.cache_entry("/exams", &QueryParams::new()).unwrap().ttl,
        minutes(10)
    );

    // A fresh entry is not fetched again by a second preload
    client.preload("/exams", &QueryParams::new(), Some(10.0)).await;
    assert_eq!(transport.get_count("/exams"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_preload_swallows_failures() {
    let transport = MockTransport::new();
    transport.fail_next("/exams", TransportError::Network("offline".into()));
    let client = CachedClient::new(transport.clone());

    client.preload("/exams", &QueryParams::new(), None).await;

    assert!(!client.has_cache("/exams", &QueryParams::new()));
    assert_eq!(transport.get_count("/exams"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_network_failure_propagates_and_is_not_cached() {
    let transport = MockTransport::new();
    transport.fail_next(SUBJECTS, TransportError::Network("connection reset".into()));
    transport.respond(SUBJECTS, json!("A"));
    let client = CachedClient::new(transport.clone());

    let err = client
        .get::<Value>(SUBJECTS, &QueryParams::new(), RequestOptions::new())
        .await
        .unwrap_err();
    assert!(err.is_transport());
    assert!(!client.has_cache(SUBJECTS, &QueryParams::new()));

    // Retry succeeds
    let value: String = client.get(SUBJECTS, &QueryParams::new(), RequestOptions::new()).await.unwrap();
    assert_eq!(value, "A");
}

#[tokio::test(start_paused = true)]
async fn test_status_error_propagates_unchanged() {
    let transport = MockTransport::new();
    let client = CachedClient::new(transport.clone());

    let err = client
        .get::<Value>("/missing", &QueryParams::new(), RequestOptions::new())
        .await
        .unwrap_err();
    match err {
        lms_core::ClientError::Transport(e) => assert_eq!(e.status_code(), Some(404)),
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_decode_failure_keeps_previous_entry() {
    let transport = MockTransport::new();
    transport.respond(SUBJECTS, json!({ "id": "s1", "name": "Physics" }));
    let client = CachedClient::new(transport.clone());

    let _: Subject = client.get(SUBJECTS, &QueryParams::new(), RequestOptions::new()).await.unwrap();

    transport.respond(SUBJECTS, json!({ "unexpected": true }));
    let err = client
        .get::<Subject>(SUBJECTS, &QueryParams::new(), RequestOptions::new().force_refresh())
        .await
        .unwrap_err();
    assert!(err.is_decode());

    let kept: Option<Subject> = client.get_cached_only(SUBJECTS, &QueryParams::new()).unwrap();
    assert_eq!(kept.unwrap().name, "Physics");
}

#[tokio::test(start_paused = true)]
async fn test_decode_failure_on_first_fetch_is_not_cached() {
    let transport = MockTransport::new();
    transport.respond(SUBJECTS, json!("not a subject"));
    let client = CachedClient::new(transport.clone());

    let err = client
        .get::<Subject>(SUBJECTS, &QueryParams::new(), RequestOptions::new())
        .await
        .unwrap_err();
    assert!(err.is_decode());
    assert!(!client.has_cache(SUBJECTS, &QueryParams::new()));
}

#[tokio::test(start_paused = true)]
async fn test_invalidation_helpers() {
    let transport = MockTransport::new();
    for path in ["/homework", "/homework/1", "/exams"] {
        transport.respond(path, json!(path));
    }
    let client = CachedClient::new(transport.clone());
    for path in ["/homework", "/homework/1", "/exams"] {
        let _: Value = client.get(path, &QueryParams::new(), RequestOptions::new()).await.unwrap();
    }
    assert_eq!(client.len(), 3);

    assert_eq!(client.invalidate_prefix("/homework"), 2);
    assert!(client.invalidate("/exams", &QueryParams::new()));
    assert!(client.is_empty());

    let _: Value = client.get("/exams", &QueryParams::new(), RequestOptions::new()).await.unwrap();
    client.clear();
    assert!(!client.has_cache("/exams", &QueryParams::new()));
    assert_eq!(transport.get_count("/exams"), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_gets_keep_store_consistent() {
    let transport = MockTransport::new();
    transport.respond("/users", json!(["u1", "u2"]));
    let client = CachedClient::new(transport.clone());

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                let params = QueryParams::new().with("page", i % 4);
                client
                    .get::<Vec<String>>("/users", &params, RequestOptions::new())
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), vec!["u1", "u2"]);
    }
    assert_eq!(client.len(), 4);
    assert!(transport.get_count("/users") >= 4);
}

fn spawn_get(
    client: &CachedClient,
    path: &'static str,
    options: RequestOptions,
) -> tokio::task::JoinHandle<lms_core::ClientResult<Value>> {
    let client = client.clone();
    tokio::spawn(async move { client.get::<Value>(path, &QueryParams::new(), options).await })
}

#[tokio::test(start_paused = true)]
async fn test_invalidating_other_keys_keeps_in_flight_get() {
    let transport = GatedTransport::new();
    for path in ["/slow", "/exams", "/homework"] {
        transport.respond(path, json!(path));
    }
    let client = CachedClient::builder(transport.clone())
        .with_invalidate_on_write(true)
        .build();

    transport.hold_next("/slow");
    let pending = spawn_get(&client, "/slow", RequestOptions::new());
    wait_for_gets(&transport, "/slow", 1).await;

    client.invalidate("/exams", &QueryParams::new());
    client.invalidate_prefix("/homework");
    let _: Value = client.post("/homework", &json!({ "title": "Essay" })).await.unwrap();

    transport.release("/slow");
    assert_eq!(pending.await.unwrap().unwrap(), json!("/slow"));
    assert!(client.has_cache("/slow", &QueryParams::new()));
}

#[tokio::test(start_paused = true)]
async fn test_invalidating_the_key_drops_in_flight_get() {
    let transport = GatedTransport::new();
    transport.respond("/homework/7", json!("draft"));
    let client = CachedClient::new(transport.clone());

    transport.hold_next("/homework/7");
    let pending = spawn_get(&client, "/homework/7", RequestOptions::new());
    wait_for_gets(&transport, "/homework/7", 1).await;

    assert_eq!(client.invalidate_prefix("/homework"), 0);
    transport.release("/homework/7");

    // The caller still gets its response, but it is not stored
    assert_eq!(pending.await.unwrap().unwrap(), json!("draft"));
    assert!(!client.has_cache("/homework/7", &QueryParams::new()));
}

#[tokio::test(start_paused = true)]
async fn test_older_response_landing_late_does_not_overwrite() {
    let transport = GatedTransport::new();
    transport.respond(SUBJECTS, json!("old"));
    let client = CachedClient::new(transport.clone());

    transport.hold_next(SUBJECTS);
    let slow = spawn_get(&client, SUBJECTS, RequestOptions::new().force_refresh());
    wait_for_gets(&transport, SUBJECTS, 1).await;

    transport.respond(SUBJECTS, json!("new"));
    let fast: String = client
        .get(SUBJECTS, &QueryParams::new(), RequestOptions::new().force_refresh())
        .await
        .unwrap();
    assert_eq!(fast, "new");

    transport.release(SUBJECTS);
    assert_eq!(slow.await.unwrap().unwrap(), json!("old"));

    let cached: Option<String> = client.get_cached_only(SUBJECTS, &QueryParams::new()).unwrap();
    assert_eq!(cached.as_deref(), Some("new"));
}

#[tokio::test(start_paused = true)]
async fn test_preload_survives_unrelated_invalidation() {
    let transport = GatedTransport::new();
    transport.respond("/exams", json!(["e1"]));
    transport.respond("/payments", json!([]));
    let client = CachedClient::new(transport.clone());

    transport.hold_next("/exams");
    let preloading = {
        let client = client.clone();
        tokio::spawn(async move { client.preload("/exams", &QueryParams::new(), None).await })
    };
    wait_for_gets(&transport, "/exams", 1).await;

    client.invalidate("/payments", &QueryParams::new());
    transport.release("/exams");
    preloading.await.unwrap();

    let cached: Option<Value> = client.get_cached_only("/exams", &QueryParams::new()).unwrap();
    assert_eq!(cached, Some(json!(["e1"])));
    assert_eq!(transport.get_count("/exams"), 1);
}
