//! Platform client.
//!
//! Aggregates the resource clients behind one value and implements
//! [`Platform`] over them.

use std::sync::Arc;

use async_trait::async_trait;

use crate::clients::{ContentsClient, EventsClient, ReposClient};
use crate::config::Config;
use crate::error::Error;
use crate::platform::Platform;
use crate::transport::HttpTransport;
use crate::types::{ActivityEvent, FileDescriptor, PutFileRequest};

/// Main client for the platform REST API.
///
/// # Example
///
/// ```rust,ignore
/// use streak_keeper::{Config, GitHubClient};
///
/// let config = Config::from_env()?;
/// let client = GitHubClient::from_config(&config)?;
///
/// let events = client.events().list(&config.username).await?;
/// let exists = client.repos().exists("octo/streak").await?;
/// ```
#[derive(Debug, Clone)]
pub struct GitHubClient {
    transport: Arc<HttpTransport>,
    events: EventsClient,
    repos: ReposClient,
    contents: ContentsClient,
}

impl GitHubClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `transport` - Shared HTTP transport
    /// * `owner` - Owner of the repository files are written to
    /// * `repo` - Name of the repository files are written to
    pub fn new(transport: HttpTransport, owner: &str, repo: &str) -> Self {
        let transport = Arc::new(transport);

        Self {
            events: EventsClient::new(Arc::clone(&transport)),
            repos: ReposClient::new(Arc::clone(&transport)),
            contents: ContentsClient::new(Arc::clone(&transport), owner, repo),
            transport,
        }
    }

    /// Create a client from the run configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP transport cannot be created.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let transport = HttpTransport::new(&config.api_url, &config.token, config.timeout)?;
        Ok(Self::new(transport, &config.repo_owner, &config.repo))
    }

    /// Get the underlying HTTP transport.
    #[must_use]
    pub fn transport(&self) -> &Arc<HttpTransport> {
        &self.transport
    }

    /// Get the events client.
    #[must_use]
    pub fn events(&self) -> &EventsClient {
        &self.events
    }

    /// Get the repos client.
    #[must_use]
    pub fn repos(&self) -> &ReposClient {
        &self.repos
    }

    /// Get the contents client.
    #[must_use]
    pub fn contents(&self) -> &ContentsClient {
        &self.contents
    }
}

#[async_trait]
impl Platform for GitHubClient {
    async fn list_events(&self, username: &str) -> Result<Vec<ActivityEvent>, Error> {
        self.events.list(username).await
    }

    async fn repository_exists(&self, full_name: &str) -> Result<bool, Error> {
        self.repos.exists(full_name).await
    }

    async fn list_directory(&self, url: &str) -> Result<Vec<FileDescriptor>, Error> {
        self.contents.list(url).await
    }

    async fn get_file(&self, path: &str) -> Result<Option<FileDescriptor>, Error> {
        self.contents.get(path).await
    }

    async fn put_file(&self, path: &str, request: &PutFileRequest) -> Result<String, Error> {
        self.contents.put(path, request).await
    }

    fn contents_url(&self, path: &str) -> String {
        self.contents.url_for(path)
    }
}
