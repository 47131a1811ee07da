//! The seam between the run's components and the hosting platform.
//!
//! `GitHubClient` implements this over HTTP; `testing::MockPlatform`
//! implements it in memory.

use async_trait::async_trait;

use crate::error::Error;
use crate::types::{ActivityEvent, FileDescriptor, PutFileRequest};

/// Operations the counter, scanner and mutator need from the platform.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Recent activity of `username`, newest first (first page only).
    async fn list_events(&self, username: &str) -> Result<Vec<ActivityEvent>, Error>;

    /// Whether the repository `owner/repo` currently exists.
    async fn repository_exists(&self, full_name: &str) -> Result<bool, Error>;

    /// Entries of the directory listed at `url`.
    async fn list_directory(&self, url: &str) -> Result<Vec<FileDescriptor>, Error>;

    /// Metadata of a single file in the target repository, `None` if absent.
    async fn get_file(&self, path: &str) -> Result<Option<FileDescriptor>, Error>;

    /// Create or update a file in the target repository; returns the new
    /// content identifier.
    async fn put_file(&self, path: &str, request: &PutFileRequest) -> Result<String, Error>;

    /// Listing URL of `path` in the target repository (`""` is the root).
    fn contents_url(&self, path: &str) -> String;
}
