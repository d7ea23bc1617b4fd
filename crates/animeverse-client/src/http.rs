//! Authenticated transport for the REST API.
//!
//! # Design
//! - Every request is described by an [`ApiRequest`] value so it can be sent
//!   again verbatim after a token refresh.
//! - The bearer token and the `profileid` header are read fresh before each
//!   attempt; a resend therefore carries the refreshed token.
//! - A 401 triggers at most one refresh-and-resend per call, tracked by an
//!   explicit attempt marker. A failed refresh clears the session and yields
//!   [`ClientError::SessionExpired`].
//! - Non-success statuses become [`ClientError::Api`] carrying the server's
//!   `message`, or a generic fallback when the body has none.

use std::sync::Arc;

use animeverse_api_models::{Envelope, ErrorBody};
use animeverse_config::ClientConfig;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::storage::{ACTIVE_PROFILE_KEY, KeyValueStore};

/// Header carrying the active profile identifier.
pub const HEADER_PROFILE_ID: &str = "profileid";
/// Correlation header attached when a request context is active.
pub const HEADER_REQUEST_ID: &str = "x-request-id";

/// Supplies and renews bearer tokens for the transport.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Token to attach, if signed in.
    fn bearer(&self) -> Option<String>;

    /// Obtain a fresh token after `stale` was rejected.
    ///
    /// Returns `true` when a usable token is now available. Implementations
    /// clear the session before returning `false`.
    async fn refresh(&self, stale: Option<&str>) -> bool;
}

/// A request that can be replayed.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    /// Request with `method` against `path` (relative to the API base).
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// `GET path`.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// `POST path`.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// `PUT path`.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// `PATCH path`.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// `DELETE path`.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append query-string pairs.
    #[must_use]
    pub fn query<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(key, value)| (key.into(), value.into())));
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidField`] if `body` cannot be encoded.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> ClientResult<Self> {
        let value = serde_json::to_value(body).map_err(|err| ClientError::InvalidField {
            field: "body".to_string(),
            message: err.to_string(),
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// Path relative to the API base.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Attempt {
    Initial,
    Retried,
}

/// Authenticated REST client shared by the data stores.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
    storage: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Wrap an existing HTTP client.
    #[must_use]
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            inner: Arc::new(Inner {
                http,
                base_url,
                tokens,
                storage,
            }),
        }
    }

    /// API base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Send `request`, recovering once from a 401, and decode the `{data}` envelope.
    ///
    /// # Errors
    ///
    /// Propagates transport, status, and decode failures.
    pub async fn fetch<T: DeserializeOwned>(&self, request: &ApiRequest) -> ClientResult<Envelope<T>> {
        let response = self.send(request).await?;
        decode_body(request.path(), response).await
    }

    /// Like [`fetch`](Self::fetch) but returns only `data`.
    ///
    /// # Errors
    ///
    /// Propagates transport, status, and decode failures.
    pub async fn data<T: DeserializeOwned>(&self, request: &ApiRequest) -> ClientResult<T> {
        self.fetch(request).await.map(|envelope| envelope.data)
    }

    /// Send `request` and discard any body.
    ///
    /// # Errors
    ///
    /// Propagates transport and status failures.
    pub async fn execute(&self, request: &ApiRequest) -> ClientResult<()> {
        self.send(request).await.map(drop)
    }

    /// Send `request` and return the successful response untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::SessionExpired`] when a 401 survives the refresh,
    /// [`ClientError::Api`] for other failure statuses, and
    /// [`ClientError::Transport`] when no response arrives.
    pub async fn send(&self, request: &ApiRequest) -> ClientResult<Response> {
        let mut attempt = Attempt::Initial;
        loop {
            let token = self.inner.tokens.bearer();
            let response = self.dispatch(request, token.as_deref()).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                return ensure_success(request.path(), response).await;
            }

            match attempt {
                Attempt::Retried => {
                    debug!(path = %request.path(), "401 after refresh; not retrying again");
                    return Err(error_from_response(response).await);
                }
                Attempt::Initial => {
                    debug!(path = %request.path(), "401 received; refreshing token");
                    if self.inner.tokens.refresh(token.as_deref()).await {
                        attempt = Attempt::Retried;
                        continue;
                    }
                    warn!(path = %request.path(), "token refresh failed; session cleared");
                    return Err(ClientError::SessionExpired);
                }
            }
        }
    }

    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> ClientResult<Response> {
        let url = format!("{}{}", self.inner.base_url, request.path);
        let mut builder = self.inner.http.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
            if let Some(profile_id) = self.inner.storage.get(ACTIVE_PROFILE_KEY) {
                builder = builder.header(HEADER_PROFILE_ID, profile_id);
            }
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        debug!(method = %request.method, path = %request.path, "sending request");
        send_with_context(builder, &request.path).await
    }
}

pub(crate) async fn send_with_context(
    builder: RequestBuilder,
    path: &str,
) -> ClientResult<Response> {
    let builder = match animeverse_telemetry::current_request_id() {
        Some(request_id) => builder.header(HEADER_REQUEST_ID, request_id),
        None => builder,
    };
    builder.send().await.map_err(|source| ClientError::Transport {
        path: path.to_string(),
        source,
    })
}

pub(crate) async fn ensure_success(path: &str, response: Response) -> ClientResult<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let err = error_from_response(response).await;
        debug!(path, error = %err, "request rejected");
        Err(err)
    }
}

pub(crate) async fn decode_body<T: DeserializeOwned>(path: &str, response: Response) -> ClientResult<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|source| ClientError::Transport {
            path: path.to_string(),
            source,
        })?;
    serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode {
        path: path.to_string(),
        source,
    })
}

pub(crate) async fn error_from_response(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let bytes = response.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ErrorBody>(&bytes)
        .ok()
        .and_then(|body| body.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("request failed with status {status}"));
    ClientError::Api { status, message }
}

/// Build the shared HTTP client from configuration.
///
/// # Errors
///
/// Returns [`ClientError::InvalidField`] if the TLS backend cannot initialise.
pub fn build_http_client(config: &ClientConfig) -> ClientResult<Client> {
    Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|err| ClientError::InvalidField {
            field: "http client".to_string(),
            message: err.to_string(),
        })
}
