//! Contribution counting.
//!
//! Counts how many contributions the user's activity feed shows for one
//! local calendar day. The feed is newest first, so the walk stops at the
//! first event that falls on another day.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use tracing::{debug, info};

use crate::config::DEFAULT_COMMIT_MESSAGE;
use crate::error::Error;
use crate::platform::Platform;
use crate::types::{ActivityEvent, EventKind};

/// Outcome of one counting run.
pub type ContributionResult = Result<u32, Error>;

/// Rules deciding which events count and how much.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountPolicy {
    /// Creating this branch counts as a contribution
    pub primary_branch: String,
    /// Creating any branch counts, not just the primary one
    pub count_all_branch_creates: bool,
    /// Push commits with exactly this message do not count
    pub excluded_commit_message: Option<String>,
    /// Only count events whose repository still exists
    pub check_repo_existence: bool,
}

impl Default for CountPolicy {
    fn default() -> Self {
        Self {
            primary_branch: "main".to_string(),
            count_all_branch_creates: false,
            excluded_commit_message: Some(DEFAULT_COMMIT_MESSAGE.to_string()),
            check_repo_existence: true,
        }
    }
}

impl CountPolicy {
    /// Contributions an event is worth, assuming its repository exists.
    #[must_use]
    pub fn value_of(&self, event: &ActivityEvent) -> u32 {
        match event.kind {
            EventKind::RepositoryCreate => {
                let ref_type = event.payload.ref_type.as_deref();
                let counts = ref_type == Some("repository")
                    || event.git_ref() == Some(self.primary_branch.as_str())
                    || (self.count_all_branch_creates && ref_type == Some("branch"));
                u32::from(counts)
            }
            EventKind::PullRequest => 1,
            EventKind::Push => {
                let counted = event
                    .commits()
                    .iter()
                    .filter(|c| self.excluded_commit_message.as_deref() != Some(c.message.as_str()))
                    .count();
                u32::try_from(counted).unwrap_or(u32::MAX)
            }
            EventKind::Other => 0,
        }
    }
}

/// Memoized repository existence checks for a single counting run.
#[derive(Debug, Default)]
pub struct RepositoryExistenceCache {
    known: HashMap<String, bool>,
}

impl RepositoryExistenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `full_name` exists, asking the platform at most once per name.
    ///
    /// # Errors
    ///
    /// Propagates the platform error; nothing is cached on failure.
    pub async fn resolve(&mut self, platform: &dyn Platform, full_name: &str) -> Result<bool, Error> {
        if let Some(&exists) = self.known.get(full_name) {
            return Ok(exists);
        }

        let exists = platform.repository_exists(full_name).await?;
        debug!(repo = full_name, exists, "Resolved repository existence");
        self.known.insert(full_name.to_string(), exists);
        Ok(exists)
    }

    /// Cached answer for `full_name`, if it has been resolved.
    #[must_use]
    pub fn get(&self, full_name: &str) -> Option<bool> {
        self.known.get(full_name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.known.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

/// Whether `at`, seen in `tz`, falls on `day`.
#[must_use]
pub fn is_same_day<Tz: TimeZone>(at: &DateTime<Utc>, day: NaiveDate, tz: &Tz) -> bool {
    at.with_timezone(tz).date_naive() == day
}

/// Counts today's contributions of one user.
pub struct ContributionCounter {
    platform: Arc<dyn Platform>,
    username: String,
    policy: CountPolicy,
}

impl ContributionCounter {
    pub fn new(platform: Arc<dyn Platform>, username: &str, policy: CountPolicy) -> Self {
        Self {
            platform,
            username: username.to_string(),
            policy,
        }
    }

    /// Count contributions for the current local calendar day.
    pub async fn count_today(&self) -> ContributionResult {
        self.count_on(Local::now().date_naive(), &Local).await
    }

    /// Count contributions on `day` as seen in `tz`.
    ///
    /// # Errors
    ///
    /// Any network, status or decode failure aborts the count; no partial
    /// count is returned.
    pub async fn count_on<Tz: TimeZone>(&self, day: NaiveDate, tz: &Tz) -> ContributionResult {
        let events = self.platform.list_events(&self.username).await?;
        debug!(events = events.len(), user = %self.username, "Fetched activity feed");
        self.tally(&events, day, tz).await
    }

    /// Count contributions in an already fetched feed.
    ///
    /// `events` must be newest first: the first event off `day` ends the walk.
    ///
    /// # Errors
    ///
    /// Propagates existence-check failures.
    pub async fn tally<Tz: TimeZone>(
        &self,
        events: &[ActivityEvent],
        day: NaiveDate,
        tz: &Tz,
    ) -> ContributionResult {
        let mut cache = RepositoryExistenceCache::new();
        let mut total: u32 = 0;

        for event in events {
            if !is_same_day(&event.created_at, day, tz) {
                debug!(at = %event.created_at, "Reached an event from another day");
                break;
            }

            let exists = if self.policy.check_repo_existence {
                cache
                    .resolve(self.platform.as_ref(), event.repo_name())
                    .await?
            } else {
                true
            };
            if !exists {
                debug!(repo = event.repo_name(), "Repository no longer exists, skipping event");
                continue;
            }

            total = total.saturating_add(self.policy.value_of(event));
        }

        info!(
            "Counted {} contribution(s) on {} across {} repository check(s)",
            total,
            day,
            cache.len()
        );
        Ok(total)
    }
}
