/*!
 * Client Module
 * Cached request client for the LMS backends
 *
 * ## Usage
 * ```ignore
 * use lms_core::client::{CachedClient, ClientConfig, QueryParams, RequestOptions};
 *
 * let client = CachedClient::from_config(&ClientConfig::from_env()?)?;
 * let params = QueryParams::new().with("instituteId", institute_id);
 *
 * // Served from cache for 30 minutes, then stale while a refresh runs
 * let classes: Vec<Class> = client
 *     .get("/institute-classes", &params, RequestOptions::new().ttl_minutes(30.0).stale_while_revalidate())
 *     .await?;
 * ```
 */

pub mod backends;
pub mod cached;
pub mod config;
pub mod errors;
pub mod http;
pub mod key;
pub mod options;
pub mod store;
pub mod transport;

pub use backends::{Backends, Service};
pub use cached::{CachedClient, CachedClientBuilder};
pub use config::{ClientConfig, ConfigError};
pub use errors::{ClientError, ClientResult, TransportError, TransportResult};
pub use http::HttpTransport;
pub use key::{resource_root, CacheKey, QueryParams};
pub use options::{ttl_from_minutes, RequestOptions};
pub use store::{CacheEntry, CacheStats, CacheStore, Lookup};
pub use transport::{Transport, WriteMethod};
