//! Activity-feed data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of an activity event.
///
/// Only the kinds that can count as a contribution are distinguished; every
/// other feed entry (stars, forks, comments, ...) decodes as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// A repository, branch or tag was created
    #[serde(rename = "CreateEvent")]
    RepositoryCreate,
    /// A pull request was opened, closed, merged, ...
    #[serde(rename = "PullRequestEvent")]
    PullRequest,
    /// Commits were pushed
    #[serde(rename = "PushEvent")]
    Push,
    #[serde(other)]
    Other,
}

/// Repository an event happened in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRepo {
    /// Full name, `owner/repo`
    pub name: String,
}

/// A commit carried by a push event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    #[serde(default)]
    pub sha: String,
    #[serde(default)]
    pub message: String,
}

/// Kind-specific event payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Ref name for create events (branch or tag name)
    #[serde(rename = "ref", default)]
    pub git_ref: Option<String>,
    /// "repository", "branch" or "tag" for create events
    #[serde(default)]
    pub ref_type: Option<String>,
    /// Commits of a push event, oldest first
    #[serde(default)]
    pub commits: Vec<CommitRecord>,
}

/// One entry of the user's activity feed.
///
/// The feed is ordered newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub created_at: DateTime<Utc>,
    pub repo: EventRepo,
    #[serde(default)]
    pub payload: EventPayload,
}

impl ActivityEvent {
    /// Full name of the repository the event targets.
    #[must_use]
    pub fn repo_name(&self) -> &str {
        &self.repo.name
    }

    /// Ref name, for create events.
    #[must_use]
    pub fn git_ref(&self) -> Option<&str> {
        self.payload.git_ref.as_deref()
    }

    /// Commits carried by the event (empty unless it is a push).
    #[must_use]
    pub fn commits(&self) -> &[CommitRecord] {
        &self.payload.commits
    }
}
