//! In-memory platform for testing.
//!
//! Provides a `MockPlatform` that implements [`Platform`] from configured
//! data and records every call, without making network requests.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::error::{Error, ProtocolError};
use crate::platform::Platform;
use crate::types::{ActivityEvent, FileDescriptor, PutFileRequest};

/// URL prefix used by [`MockPlatform::contents_url`].
pub const MOCK_CONTENTS_URL: &str = "mock://contents";

/// Record of a method call.
#[derive(Debug, Clone)]
pub struct MockCall {
    /// Method name (e.g., "events.list", "contents.put")
    pub method: String,
    /// Arguments passed to the method
    pub args: Vec<String>,
    /// Timestamp of the call
    pub timestamp: DateTime<Utc>,
}

impl MockCall {
    /// Create a new mock call record.
    pub fn new(method: &str, args: Vec<String>) -> Self {
        Self {
            method: method.to_string(),
            args,
            timestamp: Utc::now(),
        }
    }
}

/// A canned failure: HTTP status plus platform message.
#[derive(Debug, Clone)]
struct Failure {
    status: u16,
    message: String,
}

impl Failure {
    fn new(status: u16, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }

    fn to_error(&self, url: &str) -> Error {
        Error::Protocol(ProtocolError::Status {
            status: self.status,
            url: url.to_string(),
            message: self.message.clone(),
        })
    }
}

#[derive(Default)]
struct MockState {
    calls: Vec<MockCall>,
    events: Vec<ActivityEvent>,
    events_failure: Option<Failure>,
    events_delay: Option<Duration>,
    repositories: HashMap<String, bool>,
    repository_failures: HashMap<String, Failure>,
    directories: HashMap<String, Vec<FileDescriptor>>,
    directory_failures: HashMap<String, Failure>,
    listing_delay: Option<Duration>,
    cancel_after: Option<(usize, watch::Sender<bool>)>,
    files: HashMap<String, String>,
    put_failures: HashMap<String, Failure>,
    uploads: Vec<(String, PutFileRequest)>,
    next_sha: u64,
}

impl MockState {
    fn record_call(&mut self, method: &str, args: Vec<String>) {
        self.calls.push(MockCall::new(method, args));
    }

    fn count(&self, method: &str) -> usize {
        self.calls.iter().filter(|c| c.method == method).count()
    }
}

/// Mock platform for testing.
///
/// Unknown repositories exist, unknown directory URLs answer 404, unknown
/// files are absent, and every upload succeeds unless configured otherwise.
#[derive(Default)]
pub struct MockPlatform {
    state: Mutex<MockState>,
}

impl MockPlatform {
    /// Create a new mock platform.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Configure the activity feed returned by `list_events`.
    pub fn set_events(&self, events: Vec<ActivityEvent>) {
        self.state().events = events;
    }

    /// Make `list_events` fail with a status error.
    pub fn fail_events(&self, status: u16, message: &str) {
        self.state().events_failure = Some(Failure::new(status, message));
    }

    /// Delay every `list_events` call.
    pub fn set_events_delay(&self, delay: Duration) {
        self.state().events_delay = Some(delay);
    }

    /// Configure the existence answer for a repository.
    pub fn set_repository_exists(&self, full_name: &str, exists: bool) {
        self.state().repositories.insert(full_name.to_string(), exists);
    }

    /// Make the existence probe for a repository fail.
    pub fn fail_repository(&self, full_name: &str, status: u16, message: &str) {
        self.state()
            .repository_failures
            .insert(full_name.to_string(), Failure::new(status, message));
    }

    /// Configure the listing served at `url`.
    pub fn add_directory(&self, url: &str, entries: Vec<FileDescriptor>) {
        self.state().directories.insert(url.to_string(), entries);
    }

    /// Make the listing at `url` fail.
    pub fn fail_directory(&self, url: &str, status: u16, message: &str) {
        self.state()
            .directory_failures
            .insert(url.to_string(), Failure::new(status, message));
    }

    /// Delay every `list_directory` call.
    pub fn set_listing_delay(&self, delay: Duration) {
        self.state().listing_delay = Some(delay);
    }

    /// Send `true` on `cancel` while serving the `n`th listing, simulating
    /// a cancellation that arrives while that request is in flight.
    pub fn cancel_after_listings(&self, n: usize, cancel: watch::Sender<bool>) {
        self.state().cancel_after = Some((n, cancel));
    }

    /// Configure an existing file for `get_file`.
    pub fn add_file(&self, path: &str, sha: &str) {
        self.state().files.insert(path.to_string(), sha.to_string());
    }

    /// Make uploads to `path` fail.
    pub fn fail_put(&self, path: &str, status: u16, message: &str) {
        self.state()
            .put_failures
            .insert(path.to_string(), Failure::new(status, message));
    }

    /// Successful uploads, in order.
    #[must_use]
    pub fn uploads(&self) -> Vec<(String, PutFileRequest)> {
        self.state().uploads.clone()
    }

    /// Check if a method was called.
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.state().calls.iter().any(|call| call.method == method)
    }

    /// Get the number of times a method was called.
    #[must_use]
    pub fn call_count(&self, method: &str) -> usize {
        self.state().count(method)
    }

    /// Get recorded calls, optionally filtered by method.
    #[must_use]
    pub fn get_calls(&self, method: Option<&str>) -> Vec<MockCall> {
        let state = self.state();
        match method {
            Some(m) => state.calls.iter().filter(|call| call.method == m).cloned().collect(),
            None => state.calls.clone(),
        }
    }

    /// Reset all recorded calls and uploads.
    pub fn reset(&self) {
        let mut state = self.state();
        state.calls.clear();
        state.uploads.clear();
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn list_events(&self, username: &str) -> Result<Vec<ActivityEvent>, Error> {
        let delay = {
            let mut state = self.state();
            state.record_call("events.list", vec![username.to_string()]);
            state.events_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state();
        match &state.events_failure {
            Some(failure) => Err(failure.to_error(&format!("mock://users/{username}/events"))),
            None => Ok(state.events.clone()),
        }
    }

    async fn repository_exists(&self, full_name: &str) -> Result<bool, Error> {
        let mut state = self.state();
        state.record_call("repos.exists", vec![full_name.to_string()]);

        if let Some(failure) = state.repository_failures.get(full_name) {
            return Err(failure.to_error(&format!("mock://repos/{full_name}")));
        }
        Ok(state.repositories.get(full_name).copied().unwrap_or(true))
    }

    async fn list_directory(&self, url: &str) -> Result<Vec<FileDescriptor>, Error> {
        let delay = {
            let mut state = self.state();
            state.record_call("contents.list", vec![url.to_string()]);

            let listings = state.count("contents.list");
            if let Some((n, cancel)) = &state.cancel_after {
                if listings >= *n {
                    let _ = cancel.send(true);
                }
            }
            state.listing_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state();
        if let Some(failure) = state.directory_failures.get(url) {
            return Err(failure.to_error(url));
        }
        state
            .directories
            .get(url)
            .cloned()
            .ok_or_else(|| Failure::new(404, "Not Found").to_error(url))
    }

    async fn get_file(&self, path: &str) -> Result<Option<FileDescriptor>, Error> {
        let mut state = self.state();
        state.record_call("contents.get", vec![path.to_string()]);

        Ok(state.files.get(path).map(|sha| {
            let name = path.rsplit('/').next().unwrap_or(path);
            FileDescriptor::file(name, path, sha.clone())
        }))
    }

    async fn put_file(&self, path: &str, request: &PutFileRequest) -> Result<String, Error> {
        let mut state = self.state();
        state.record_call(
            "contents.put",
            vec![path.to_string(), request.sha.clone().unwrap_or_default()],
        );

        if let Some(failure) = state.put_failures.get(path) {
            return Err(failure.to_error(&format!("{MOCK_CONTENTS_URL}/{path}")));
        }

        state.next_sha += 1;
        let sha = format!("sha-{}", state.next_sha);
        state.files.insert(path.to_string(), sha.clone());
        state.uploads.push((path.to_string(), request.clone()));
        Ok(sha)
    }

    fn contents_url(&self, path: &str) -> String {
        let path = path.trim_matches('/');
        if path.is_empty() {
            MOCK_CONTENTS_URL.to_string()
        } else {
            format!("{MOCK_CONTENTS_URL}/{path}")
        }
    }
}

/// Builders for activity events.
pub mod event {
    use chrono::{DateTime, Utc};

    use crate::types::{ActivityEvent, CommitRecord, EventKind, EventPayload, EventRepo};

    fn base(kind: EventKind, at: DateTime<Utc>, repo: &str, payload: EventPayload) -> ActivityEvent {
        ActivityEvent {
            kind,
            created_at: at,
            repo: EventRepo {
                name: repo.to_string(),
            },
            payload,
        }
    }

    /// A push carrying one commit per message.
    pub fn push(at: DateTime<Utc>, repo: &str, messages: &[&str]) -> ActivityEvent {
        let commits = messages
            .iter()
            .enumerate()
            .map(|(i, message)| CommitRecord {
                sha: format!("c{i}"),
                message: (*message).to_string(),
            })
            .collect();
        base(
            EventKind::Push,
            at,
            repo,
            EventPayload {
                commits,
                ..EventPayload::default()
            },
        )
    }

    pub fn pull_request(at: DateTime<Utc>, repo: &str) -> ActivityEvent {
        base(EventKind::PullRequest, at, repo, EventPayload::default())
    }

    pub fn create_branch(at: DateTime<Utc>, repo: &str, branch: &str) -> ActivityEvent {
        base(
            EventKind::RepositoryCreate,
            at,
            repo,
            EventPayload {
                git_ref: Some(branch.to_string()),
                ref_type: Some("branch".to_string()),
                commits: Vec::new(),
            },
        )
    }

    pub fn create_repository(at: DateTime<Utc>, repo: &str) -> ActivityEvent {
        base(
            EventKind::RepositoryCreate,
            at,
            repo,
            EventPayload {
                git_ref: None,
                ref_type: Some("repository".to_string()),
                commits: Vec::new(),
            },
        )
    }

    /// A feed entry that never counts (a star, a fork, ...).
    pub fn other(at: DateTime<Utc>, repo: &str) -> ActivityEvent {
        base(EventKind::Other, at, repo, EventPayload::default())
    }
}

/// Build listings for a mock tree keyed by path.
///
/// Each `(path, files)` pair becomes a directory at
/// `mock://contents/{path}` holding `files`; a directory's subdirectories are
/// the other paths exactly one level below it.
pub fn mock_tree(mock: &MockPlatform, dirs: &[(&str, &[&str])]) {
    let paths: HashSet<&str> = dirs.iter().map(|(p, _)| *p).collect();

    for (path, files) in dirs {
        let mut entries: Vec<FileDescriptor> = files
            .iter()
            .map(|name| {
                let full = join(path, name);
                FileDescriptor::file(*name, full.clone(), format!("sha-of-{full}"))
            })
            .collect();

        let mut children: Vec<&str> = paths
            .iter()
            .copied()
            .filter(|p| parent_of(p) == Some(*path))
            .collect();
        children.sort_unstable();
        for child in children {
            let name = child.rsplit('/').next().unwrap_or(child);
            entries.push(FileDescriptor::directory(name, child, mock.contents_url(child)));
        }

        mock.add_directory(&mock.contents_url(path), entries);
    }
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

fn parent_of(path: &str) -> Option<&str> {
    if path.is_empty() {
        return None;
    }
    Some(path.rsplit_once('/').map_or("", |(parent, _)| parent))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_calls() {
        let mock = MockPlatform::new();

        mock.list_events("octo").await.unwrap();
        assert!(mock.repository_exists("octo/r").await.unwrap());
        assert!(mock.repository_exists("octo/s").await.unwrap());

        assert!(mock.was_called("events.list"));
        assert_eq!(mock.call_count("repos.exists"), 2);
        assert_eq!(mock.get_calls(None).len(), 3);
        assert_eq!(mock.get_calls(Some("repos.exists"))[1].args, vec!["octo/s"]);

        mock.reset();
        assert!(!mock.was_called("events.list"));
    }

    #[tokio::test]
    async fn test_unknown_directory_is_not_found() {
        let mock = MockPlatform::new();

        let error = mock.list_directory("mock://nowhere").await.unwrap_err();
        assert!(error.is_not_found());
    }

    #[tokio::test]
    async fn test_put_assigns_fresh_sha() {
        let mock = MockPlatform::new();
        let request = PutFileRequest {
            message: "m".to_string(),
            content: "Yw==".to_string(),
            sha: None,
        };

        let first = mock.put_file("a.go", &request).await.unwrap();
        let second = mock.put_file("a.go", &request).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(mock.uploads().len(), 2);
        let file = mock.get_file("a.go").await.unwrap().expect("file exists after put");
        assert_eq!(file.sha, second);
    }

    #[tokio::test]
    async fn test_mock_tree_links_children() {
        let mock = MockPlatform::new();
        mock_tree(&mock, &[("", &["a.go"]), ("src", &["b.c"]), ("src/deep", &[])]);

        let root = mock.list_directory("mock://contents").await.unwrap();
        assert_eq!(root.len(), 2);
        assert_eq!(root[1].self_url(), Some("mock://contents/src"));

        let src = mock.list_directory("mock://contents/src").await.unwrap();
        assert_eq!(src[0].path, "src/b.c");
        assert_eq!(src[1].path, "src/deep");
    }
}
