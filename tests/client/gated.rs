/*!
 * Transport whose GETs can be held in flight
 */

use futures::future::BoxFuture;
use lms_core::client::{
    CachedClient, QueryParams, Transport, TransportError, TransportResult, WriteMethod,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;

/// Answers each path with its current payload
///
/// After `hold_next(path)` the next GET for that path captures its payload
/// when issued but does not complete until `release(path)`.
#[derive(Default)]
pub struct GatedTransport {
    payloads: Mutex<HashMap<String, Value>>,
    armed: Mutex<HashMap<String, Arc<Notify>>>,
    held: Mutex<HashMap<String, Arc<Notify>>>,
    gets: Mutex<Vec<String>>,
}

impl GatedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, payload: Value) {
        self.payloads.lock().insert(path.to_string(), payload);
    }

    pub fn hold_next(&self, path: &str) {
        let gate = Arc::new(Notify::new());
        self.armed.lock().insert(path.to_string(), gate.clone());
        self.held.lock().insert(path.to_string(), gate);
    }

    /// Let the held GET for `path` complete
    pub fn release(&self, path: &str) {
        if let Some(gate) = self.held.lock().remove(path) {
            // Stores a permit if the GET has not parked yet
            gate.notify_one();
        }
    }

    pub fn get_count(&self, path: &str) -> usize {
        self.gets.lock().iter().filter(|p| *p == path).count()
    }

    fn payload(&self, path: &str) -> TransportResult<Value> {
        self.payloads
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                status: 404,
                body: format!("no route for {}", path),
            })
    }
}

impl Transport for GatedTransport {
    fn get<'a>(
        &'a self,
        path: &'a str,
        _params: &'a QueryParams,
    ) -> BoxFuture<'a, TransportResult<Value>> {
        self.gets.lock().push(path.to_string());
        let result = self.payload(path);
        let gate = self.armed.lock().remove(path);
        Box::pin(async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            result
        })
    }

    fn send<'a>(
        &'a self,
        _method: WriteMethod,
        path: &'a str,
        _body: Option<&'a Value>,
    ) -> BoxFuture<'a, TransportResult<Value>> {
        let result = self.payload(path);
        Box::pin(async move { result })
    }
}

/// Run spawned tasks until `path` has seen `count` GETs
pub async fn wait_for_gets(transport: &GatedTransport, path: &str, count: usize) {
    for _ in 0..100 {
        if transport.get_count(path) >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("expected {} GETs for {}", count, path);
}

/// Let spawned refreshes run to completion
pub async fn settle(client: &CachedClient, path: &str, params: &QueryParams) {
    for _ in 0..100 {
        if !client.is_revalidating(path, params) {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("background refresh for {} never finished", path);
}
