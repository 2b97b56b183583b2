/*!
 * Cached Client
 * Caching decorator over a plain transport
 *
 * GETs are served from the response store while fresh, optionally served
 * stale while a background refresh runs, and otherwise fetched from the
 * network. Writes always go to the network.
 */

use super::config::ClientConfig;
use super::errors::{ClientError, ClientResult};
use super::http::HttpTransport;
use super::key::{resource_root, CacheKey, QueryParams};
use super::options::RequestOptions;
use super::store::{CacheEntry, CacheStats, CacheStore, Lookup};
use super::transport::{Transport, WriteMethod};
use crate::core::limits::DEFAULT_CACHE_TTL_MINUTES;
use crate::monitoring::generate_request_id;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, field, info_span, warn, Instrument};

struct ClientInner {
    transport: Arc<dyn Transport>,
    store: CacheStore,
    default_ttl: Duration,
    invalidate_on_write: bool,
}

/// Caching request client
///
/// Clones share one store.
#[derive(Clone)]
pub struct CachedClient {
    inner: Arc<ClientInner>,
}

/// Builder for [`CachedClient`]
pub struct CachedClientBuilder {
    transport: Arc<dyn Transport>,
    default_ttl: Duration,
    invalidate_on_write: bool,
}

impl CachedClientBuilder {
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_invalidate_on_write(mut self, enabled: bool) -> Self {
        self.invalidate_on_write = enabled;
        self
    }

    pub fn build(self) -> CachedClient {
        CachedClient {
            inner: Arc::new(ClientInner {
                transport: self.transport,
                store: CacheStore::new(),
                default_ttl: self.default_ttl,
                invalidate_on_write: self.invalidate_on_write,
            }),
        }
    }
}

fn decode<T: DeserializeOwned>(path: &str, payload: &Value) -> ClientResult<T> {
    T::deserialize(payload).map_err(|source| ClientError::Decode {
        path: path.to_string(),
        source,
    })
}

impl CachedClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::builder(transport).build()
    }

    pub fn builder(transport: Arc<dyn Transport>) -> CachedClientBuilder {
        CachedClientBuilder {
            transport,
            default_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_MINUTES * 60),
            invalidate_on_write: false,
        }
    }

    /// Client over any transport using the configured cache settings
    pub fn with_config(transport: Arc<dyn Transport>, config: &ClientConfig) -> Self {
        Self::builder(transport)
            .with_default_ttl(config.default_ttl)
            .with_invalidate_on_write(config.invalidate_on_write)
            .build()
    }

    /// Client over an HTTP transport for `config.base_url`
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let transport = HttpTransport::new(config)?;
        Ok(Self::with_config(Arc::new(transport), config))
    }

    pub fn default_ttl(&self) -> Duration {
        self.inner.default_ttl
    }

    /// GET through the cache
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &QueryParams,
        options: RequestOptions,
    ) -> ClientResult<T> {
        let key = CacheKey::new(path, params);
        let span = info_span!(
            "cached_get",
            request_id = %generate_request_id(),
            key = %key,
            outcome = field::Empty,
        );

        async {
            let ttl = options.ttl.unwrap_or(self.inner.default_ttl);

            if !options.force_refresh {
                match self.inner.store.lookup(&key, Instant::now()) {
                    Lookup::Fresh(payload) => {
                        tracing::Span::current().record("outcome", "fresh");
                        return decode(path, &payload);
                    }
                    Lookup::Stale(payload) if options.stale_while_revalidate => {
                        tracing::Span::current().record("outcome", "stale");
                        self.spawn_revalidation(key.clone(), path, params, ttl);
                        return decode(path, &payload);
                    }
                    Lookup::Stale(_) | Lookup::Missing => {}
                }
            }

            tracing::Span::current().record("outcome", "network");
            self.fetch(key, path, params, ttl).await
        }
        .instrument(span)
        .await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        key: CacheKey,
        path: &str,
        params: &QueryParams,
        ttl: Duration,
    ) -> ClientResult<T> {
        let ticket = self.inner.store.ticket();
        let payload = self.inner.transport.get(path, params).await?;
        let decoded = decode(path, &payload)?;
        if !self
            .inner
            .store
            .commit(key, ticket, Arc::new(payload), ttl, Instant::now())
        {
            debug!(path, "superseded response not stored");
        }
        Ok(decoded)
    }

    fn spawn_revalidation(&self, key: CacheKey, path: &str, params: &QueryParams, ttl: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(key = %key, "no async runtime for background refresh");
            return;
        };
        if !self.inner.store.begin_revalidation(&key) {
            debug!(key = %key, "background refresh already running");
            return;
        }

        let inner = Arc::clone(&self.inner);
        let path = path.to_string();
        let params = params.clone();
        let span = info_span!("revalidate", key = %key);

        runtime.spawn(
            async move {
                let ticket = inner.store.ticket();
                match inner.transport.get(&path, &params).await {
                    Ok(payload) => {
                        let stored = inner.store.commit(
                            key.clone(),
                            ticket,
                            Arc::new(payload),
                            ttl,
                            Instant::now(),
                        );
                        inner.store.end_revalidation(&key, stored);
                        if stored {
                            debug!("background refresh stored");
                        } else {
                            debug!("background refresh superseded, not stored");
                        }
                    }
                    Err(e) => {
                        // Keep serving the stale entry
                        warn!(error = %e, "background refresh failed");
                        inner.store.end_revalidation(&key, false);
                    }
                }
            }
            .instrument(span),
        );
    }

    /// Whether any entry, fresh or stale, exists for the request
    pub fn has_cache(&self, path: &str, params: &QueryParams) -> bool {
        self.inner.store.contains(&CacheKey::new(path, params))
    }

    /// Cached payload regardless of freshness; never touches the network
    pub fn get_cached_only<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &QueryParams,
    ) -> ClientResult<Option<T>> {
        match self.inner.store.peek(&CacheKey::new(path, params)) {
            Some(payload) => decode(path, &payload).map(Some),
            None => Ok(None),
        }
    }

    /// Whether a background refresh for the request is in flight
    pub fn is_revalidating(&self, path: &str, params: &QueryParams) -> bool {
        self.inner.store.is_revalidating(&CacheKey::new(path, params))
    }

    /// Raw entry with its timestamps
    pub fn cache_entry(&self, path: &str, params: &QueryParams) -> Option<CacheEntry> {
        self.inner.store.entry(&CacheKey::new(path, params))
    }

    /// Warm the cache; failures are logged and dropped
    pub async fn preload(&self, path: &str, params: &QueryParams, ttl_minutes: Option<f64>) {
        let options = match ttl_minutes {
            Some(minutes) => RequestOptions::new().ttl_minutes(minutes),
            None => RequestOptions::new(),
        };
        if let Err(e) = self.get::<IgnoredAny>(path, params, options).await {
            warn!(path, error = %e, "preload failed");
        }
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let body = serde_json::to_value(body).map_err(ClientError::Encode)?;
        self.send(WriteMethod::Post, path, Some(body)).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let body = serde_json::to_value(body).map_err(ClientError::Encode)?;
        self.send(WriteMethod::Patch, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(WriteMethod::Delete, path, None).await
    }

    /// Uncached write
    pub async fn send<T: DeserializeOwned>(
        &self,
        method: WriteMethod,
        path: &str,
        body: Option<Value>,
    ) -> ClientResult<T> {
        let span = info_span!(
            "write",
            request_id = %generate_request_id(),
            method = %method,
            path,
        );

        async {
            let payload = self.inner.transport.send(method, path, body.as_ref()).await?;
            if self.inner.invalidate_on_write {
                let root = resource_root(path);
                let removed = self.inner.store.remove_under(root);
                debug!(root, removed, "invalidated after write");
            }
            decode(path, &payload)
        }
        .instrument(span)
        .await
    }

    /// Drop one entry
    pub fn invalidate(&self, path: &str, params: &QueryParams) -> bool {
        self.inner.store.remove(&CacheKey::new(path, params))
    }

    /// Drop every entry whose path lies under `prefix`
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        self.inner.store.remove_under(prefix)
    }

    pub fn clear(&self) {
        self.inner.store.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.store.stats()
    }
}
