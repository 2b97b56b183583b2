/*!
 * Transport
 * Plain request interface the cached client decorates
 */

use super::errors::TransportResult;
use super::key::QueryParams;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Methods that modify backend state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WriteMethod {
    Post,
    Patch,
    Delete,
}

impl WriteMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteMethod::Post => "POST",
            WriteMethod::Patch => "PATCH",
            WriteMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for WriteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uncached JSON request interface
///
/// Timeouts and retries belong to the implementation.
pub trait Transport: Send + Sync {
    fn get<'a>(
        &'a self,
        path: &'a str,
        params: &'a QueryParams,
    ) -> BoxFuture<'a, TransportResult<Value>>;

    fn send<'a>(
        &'a self,
        method: WriteMethod,
        path: &'a str,
        body: Option<&'a Value>,
    ) -> BoxFuture<'a, TransportResult<Value>>;
}
