/*!
 * Write Path Tests
 */

use super::mock::{MockTransport, SentRequest};
use lms_core::client::{CachedClient, QueryParams, RequestOptions, TransportError, WriteMethod};
use pretty_assertions::assert_eq;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewHomework<'a> {
    title: &'a str,
    class_id: u32,
}

async fn warm(client: &CachedClient, paths: &[&str]) {
    for path in paths {
        let _: Value = client.get(path, &QueryParams::new(), RequestOptions::new()).await.unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn test_writes_reach_the_network() {
    let transport = MockTransport::new();
    transport.respond("/homework", json!({ "id": 7 }));
    transport.respond("/homework/7", json!({ "ok": true }));
    let client = CachedClient::new(transport.clone());

    let created: Value = client
        .post("/homework", &NewHomework { title: "Essay", class_id: 4 })
        .await
        .unwrap();
    let patched: Value = client.patch("/homework/7", &json!({ "title": "Essay v2" })).await.unwrap();
    let deleted: Value = client.delete("/homework/7").await.unwrap();

    assert_eq!(created, json!({ "id": 7 }));
    assert_eq!(patched, json!({ "ok": true }));
    assert_eq!(deleted, json!({ "ok": true }));
    assert_eq!(
        transport.sends(),
        vec![
            SentRequest {
                method: WriteMethod::Post,
                path: "/homework".into(),
                body: Some(json!({ "title": "Essay", "classId": 4 })),
            },
            SentRequest {
                method: WriteMethod::Patch,
                path: "/homework/7".into(),
                body: Some(json!({ "title": "Essay v2" })),
            },
            SentRequest {
                method: WriteMethod::Delete,
                path: "/homework/7".into(),
                body: None,
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_writes_are_never_cached() {
    let transport = MockTransport::new();
    transport.respond("/payments", json!({ "status": "pending" }));
    let client = CachedClient::new(transport.clone());

    for _ in 0..2 {
        let _: Value = client.post("/payments", &json!({ "amount": 100 })).await.unwrap();
    }

    assert_eq!(transport.sends().len(), 2);
    assert_eq!(transport.total_gets(), 0);
    assert!(!client.has_cache("/payments", &QueryParams::new()));
    assert!(client.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_writes_leave_cache_alone_by_default() {
    let transport = MockTransport::new();
    for path in ["/homework", "/homework/7"] {
        transport.respond(path, json!([]));
    }
    let client = CachedClient::new(transport.clone());
    warm(&client, &["/homework", "/homework/7"]).await;

    let _: Value = client.delete("/homework/7").await.unwrap();

    assert!(client.has_cache("/homework", &QueryParams::new()));
    assert!(client.has_cache("/homework/7", &QueryParams::new()));
}

#[tokio::test(start_paused = true)]
async fn test_invalidate_on_write_drops_resource_entries() {
    let transport = MockTransport::new();
    for path in ["/homework", "/homework/7", "/homeworks", "/exams"] {
        transport.respond(path, json!([]));
    }
    let client = CachedClient::builder(transport.clone())
        .with_invalidate_on_write(true)
        .build();
    warm(&client, &["/homework", "/homework/7", "/homeworks", "/exams"]).await;

    let _: Value = client.patch("/homework/7", &json!({ "title": "x" })).await.unwrap();

    assert!(!client.has_cache("/homework", &QueryParams::new()));
    assert!(!client.has_cache("/homework/7", &QueryParams::new()));
    assert!(client.has_cache("/homeworks", &QueryParams::new()));
    assert!(client.has_cache("/exams", &QueryParams::new()));
}

#[tokio::test(start_paused = true)]
async fn test_failed_write_propagates_and_keeps_cache() {
    let transport = MockTransport::new();
    transport.respond("/homework", json!([]));
    transport.fail_next("/homework", TransportError::Status {
        status: 422,
        body: "title required".into(),
    });
    let client = CachedClient::builder(transport.clone())
        .with_invalidate_on_write(true)
        .build();

    let err = client.post::<Value, _>("/homework", &json!({})).await.unwrap_err();
    assert!(err.is_transport());

    warm(&client, &["/homework"]).await;
    transport.fail_next("/homework", TransportError::Network("reset".into()));
    assert!(client.delete::<Value>("/homework").await.is_err());
    assert!(client.has_cache("/homework", &QueryParams::new()));
}
