//! HTTP transport for the platform REST API.
//!
//! Every call is a single attempt bounded by the same fixed timeout. Bodies
//! are read to completion inside the call that issued the request, so no
//! response outlives the method that opened it.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, ProtocolError};

/// Media type the platform recommends for its REST API.
const ACCEPT_HEADER: &str = "application/vnd.github+json";

/// HTTP transport with bearer authentication and status/decode mapping.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    token: String,
    client: Client,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL for API requests (e.g., "<https://api.github.com>")
    /// * `token` - Bearer token sent with every request
    /// * `timeout` - Per-call timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("streak-keeper/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Network(format!("could not build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client,
        })
    }

    /// Resolve an API path against the base URL; absolute URLs pass through.
    #[must_use]
    pub fn url(&self, path_or_url: &str) -> String {
        if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            path_or_url.to_string()
        } else {
            format!("{}/{}", self.base_url, path_or_url.trim_start_matches('/'))
        }
    }

    /// GET a resource and decode it, failing on any non-success status.
    ///
    /// # Errors
    ///
    /// `Error::Network` on transport failure, `ProtocolError::Status` on a
    /// non-success status, `ProtocolError::Decode` on an unexpected body.
    pub async fn get_json<T: DeserializeOwned>(&self, path_or_url: &str) -> Result<T, Error> {
        let url = self.url(path_or_url);
        let (status, body) = self.send(self.request(Method::GET, &url)).await?;
        debug!(%url, status = status.as_u16(), "GET");
        decode_success(&url, status, &body)
    }

    /// GET a resource and return its status and JSON body without judging
    /// the status.
    ///
    /// Used where a 404 body carries meaning (existence probes). An empty
    /// body decodes as `Value::Null`.
    ///
    /// # Errors
    ///
    /// `Error::Network` on transport failure, `ProtocolError::Decode` if the
    /// body is not JSON.
    pub async fn get_value(&self, path_or_url: &str) -> Result<(StatusCode, Value), Error> {
        let url = self.url(path_or_url);
        let (status, body) = self.send(self.request(Method::GET, &url)).await?;
        debug!(%url, status = status.as_u16(), "GET");
        let value = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).map_err(|e| ProtocolError::Decode {
                url: url.clone(),
                message: e.to_string(),
            })?
        };
        Ok((status, value))
    }

    /// PUT a JSON body and decode the response.
    ///
    /// # Errors
    ///
    /// Same as [`HttpTransport::get_json`].
    pub async fn put_json<B, T>(&self, path_or_url: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path_or_url);
        let (status, text) = self
            .send(self.request(Method::PUT, &url).json(body))
            .await?;
        debug!(%url, status = status.as_u16(), "PUT");
        decode_success(&url, status, &text)
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client.request(method, url).bearer_auth(&self.token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<(StatusCode, String), Error> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

/// Decode a successful body, or turn a failure status into a typed error.
fn decode_success<T: DeserializeOwned>(url: &str, status: StatusCode, body: &str) -> Result<T, Error> {
    if !status.is_success() {
        return Err(status_error(url, status, body).into());
    }

    serde_json::from_str(body).map_err(|e| {
        ProtocolError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Build a status error, preferring the platform's `message` field.
pub(crate) fn status_error(url: &str, status: StatusCode, body: &str) -> ProtocolError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });

    ProtocolError::Status {
        status: status.as_u16(),
        url: url.to_string(),
        message,
    }
}
