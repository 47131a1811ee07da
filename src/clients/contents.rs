//! Repository-contents resource client.

use std::sync::Arc;

use crate::clients::repos::{message_of, NOT_FOUND_MESSAGE};
use crate::error::{Error, ProtocolError};
use crate::transport::{status_error, HttpTransport};
use crate::types::{ContentsResponse, FileDescriptor, PutFileRequest, PutFileResponse};

/// Client for reading and writing files of one repository.
#[derive(Debug, Clone)]
pub struct ContentsClient {
    transport: Arc<HttpTransport>,
    owner: String,
    repo: String,
}

impl ContentsClient {
    /// Create a new contents client bound to `owner/repo`.
    pub fn new(transport: Arc<HttpTransport>, owner: &str, repo: &str) -> Self {
        Self {
            transport,
            owner: owner.to_string(),
            repo: repo.to_string(),
        }
    }

    /// Absolute contents URL of `path` (`""` is the repository root).
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        let base = format!("/repos/{}/{}/contents", self.owner, self.repo);
        if path.is_empty() {
            self.transport.url(&base)
        } else {
            self.transport.url(&format!("{base}/{path}"))
        }
    }

    /// List a directory.
    ///
    /// Listing a file yields a one-entry listing.
    ///
    /// # Arguments
    ///
    /// * `url` - Contents URL, usually an entry's self-link
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is neither a
    /// listing nor a single entry.
    pub async fn list(&self, url: &str) -> Result<Vec<FileDescriptor>, Error> {
        let response: ContentsResponse = self.transport.get_json(url).await?;
        Ok(response.into_entries())
    }

    /// Get metadata of a single file.
    ///
    /// # Returns
    ///
    /// `None` if the platform answers "Not Found".
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, any other failure status, or
    /// if `path` names a directory.
    pub async fn get(&self, path: &str) -> Result<Option<FileDescriptor>, Error> {
        let url = self.url_for(path);
        let (status, body) = self.transport.get_value(&url).await?;

        if status.as_u16() == 404 || message_of(&body) == Some(NOT_FOUND_MESSAGE) {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error(&url, status, &body.to_string()).into());
        }

        match serde_json::from_value::<ContentsResponse>(body) {
            Ok(ContentsResponse::Single(entry)) => Ok(Some(*entry)),
            Ok(ContentsResponse::Listing(_)) => Err(ProtocolError::Decode {
                url,
                message: format!("{path} is a directory"),
            }
            .into()),
            Err(e) => Err(ProtocolError::Decode {
                url,
                message: e.to_string(),
            }
            .into()),
        }
    }

    /// Create or update a file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path of the file in the repository
    /// * `request` - Commit message, base64 content and, for updates, the
    ///   current content identifier
    ///
    /// # Returns
    ///
    /// The new content identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the platform rejects the
    /// write (for example a stale `sha`).
    pub async fn put(&self, path: &str, request: &PutFileRequest) -> Result<String, Error> {
        let response: PutFileResponse = self.transport.put_json(&self.url_for(path), request).await?;
        Ok(response.content.sha)
    }
}
