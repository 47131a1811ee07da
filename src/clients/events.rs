//! Activity-feed resource client.

use std::sync::Arc;

use crate::error::Error;
use crate::transport::HttpTransport;
use crate::types::ActivityEvent;

/// Client for the user activity feed.
#[derive(Debug, Clone)]
pub struct EventsClient {
    transport: Arc<HttpTransport>,
}

impl EventsClient {
    /// Create a new events client.
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }

    /// List the most recent events of a user.
    ///
    /// Private activity is included when the token belongs to that user.
    /// Only the first page is fetched; the feed is newest first.
    ///
    /// # Arguments
    ///
    /// * `username` - Login whose events to list
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the status is not a success,
    /// or the body is not a list of events.
    pub async fn list(&self, username: &str) -> Result<Vec<ActivityEvent>, Error> {
        self.transport
            .get_json(&format!("/users/{username}/events"))
            .await
    }
}
