/*!
 * HTTP Transport
 * reqwest-backed JSON transport
 */

use super::config::ClientConfig;
use super::errors::{TransportError, TransportResult};
use super::key::QueryParams;
use super::transport::{Transport, WriteMethod};
use crate::core::limits::MAX_ERROR_BODY_CHARS;
use futures::future::BoxFuture;
use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;
use tracing::{debug, warn};

/// JSON-over-HTTP transport rooted at a base URL
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    bearer_token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> TransportResult<Self> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url =
            Url::parse(&base).map_err(|e| TransportError::InvalidUrl(format!("{}: {}", base, e)))?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TransportError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            bearer_token: config.bearer_token.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a request path against the base URL
    ///
    /// Leading slashes are ignored so `/subjects` stays under a base such as
    /// `https://host/api/v1/`.
    pub fn url(&self, path: &str) -> TransportResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", path, e)))
    }

    async fn execute(&self, request: RequestBuilder, url: &Url) -> TransportResult<Value> {
        let request = match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            warn!(url = %url, error = %e, "request failed");
            TransportError::Network(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "non-success response");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body)
                    .chars()
                    .take(MAX_ERROR_BODY_CHARS)
                    .collect(),
            });
        }

        debug!(url = %url, status = status.as_u16(), bytes = body.len(), "response received");

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

impl Transport for HttpTransport {
    fn get<'a>(
        &'a self,
        path: &'a str,
        params: &'a QueryParams,
    ) -> BoxFuture<'a, TransportResult<Value>> {
        Box::pin(async move {
            let url = self.url(path)?;
            let query: Vec<(&str, &str)> = params.iter().collect();
            let request = self.client.get(url.clone()).query(&query);
            self.execute(request, &url).await
        })
    }

    fn send<'a>(
        &'a self,
        method: WriteMethod,
        path: &'a str,
        body: Option<&'a Value>,
    ) -> BoxFuture<'a, TransportResult<Value>> {
        Box::pin(async move {
            let url = self.url(path)?;
            let request = match method {
                WriteMethod::Post => self.client.post(url.clone()),
                WriteMethod::Patch => self.client.patch(url.clone()),
                WriteMethod::Delete => self.client.delete(url.clone()),
            };
            let request = match body {
                Some(body) => request.json(body),
                None => request,
            };
            self.execute(request, &url).await
        })
    }
}
