//! Repositories resource client.

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::Value;

use crate::error::Error;
use crate::transport::{status_error, HttpTransport};

/// Message the platform puts in the body of a missing resource.
pub const NOT_FOUND_MESSAGE: &str = "Not Found";

/// Client for repository-related operations.
#[derive(Debug, Clone)]
pub struct ReposClient {
    transport: Arc<HttpTransport>,
}

impl ReposClient {
    /// Create a new repos client.
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }

    /// Check whether a repository exists.
    ///
    /// A body whose `message` is "Not Found" means the repository is gone.
    /// A success or redirect status means it exists; a renamed repository
    /// answers "Moved Permanently" and still counts. Any other failure that
    /// carries a `message` (a blocked or disabled repository) also counts as
    /// existing, except "Bad credentials".
    ///
    /// # Arguments
    ///
    /// * `full_name` - Repository as `owner/repo`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-JSON body, a 401, or a
    /// failure status without a `message`.
    pub async fn exists(&self, full_name: &str) -> Result<bool, Error> {
        let path = format!("/repos/{full_name}");
        let (status, body) = self.transport.get_value(&path).await?;

        existence_from(status, &body).ok_or_else(|| {
            status_error(&self.transport.url(&path), status, &body.to_string()).into()
        })
    }
}

/// Read an existence answer off a probe response, `None` if it has none.
fn existence_from(status: StatusCode, body: &Value) -> Option<bool> {
    match message_of(body) {
        Some(NOT_FOUND_MESSAGE) => Some(false),
        _ if status.is_success() || status.is_redirection() => Some(true),
        Some(_) if status != StatusCode::UNAUTHORIZED => Some(true),
        _ => None,
    }
}

pub(crate) fn message_of(body: &Value) -> Option<&str> {
    body.get("message").and_then(Value::as_str)
}
