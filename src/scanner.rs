//! Repository tree scanning.
//!
//! Walks a repository depth-first through repeated directory listings and
//! collects files that can safely take a `//` comment. The walk keeps its
//! own stack of pending directory URLs, so each listing is fully read and
//! released before the next one is requested.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::Error;
use crate::platform::Platform;
use crate::types::FileDescriptor;

/// How a scan ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The target was reached or the tree was exhausted
    Finished(Vec<FileDescriptor>),
    /// Cancellation was observed before the walk finished
    Cancelled,
}

impl ScanOutcome {
    /// Files found, empty if the scan was cancelled.
    #[must_use]
    pub fn into_files(self) -> Vec<FileDescriptor> {
        match self {
            Self::Finished(files) => files,
            Self::Cancelled => Vec::new(),
        }
    }
}

/// Finds modifiable files in a repository tree.
pub struct TreeScanner {
    platform: Arc<dyn Platform>,
    extensions: Vec<String>,
}

impl TreeScanner {
    /// Create a scanner accepting files with any of `extensions`.
    pub fn new(platform: Arc<dyn Platform>, extensions: Vec<String>) -> Self {
        Self {
            platform,
            extensions,
        }
    }

    /// Whether a file called `name` may be modified.
    #[must_use]
    pub fn is_modifiable(&self, name: &str) -> bool {
        self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
    }

    /// Collect up to `max_files` modifiable files below `root_url`.
    ///
    /// Cancellation is checked before every listing request; a request
    /// already in flight completes, but nothing further is issued. Each
    /// directory URL is listed at most once, so self-links and links back to
    /// an ancestor cannot loop.
    ///
    /// # Errors
    ///
    /// The first failed listing ends the walk with `Error::Walk`.
    pub async fn scan(
        &self,
        root_url: &str,
        max_files: usize,
        cancel: &watch::Receiver<bool>,
    ) -> Result<ScanOutcome, Error> {
        let mut found: Vec<FileDescriptor> = Vec::new();
        if max_files == 0 {
            return Ok(ScanOutcome::Finished(found));
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut pending: Vec<String> = vec![root_url.to_string()];

        while let Some(url) = pending.pop() {
            if !visited.insert(url.clone()) {
                continue;
            }

            let cancelled = *cancel.borrow();
            if cancelled {
                info!(listed = visited.len() - 1, "Tree scan cancelled");
                return Ok(ScanOutcome::Cancelled);
            }

            let entries = self
                .platform
                .list_directory(&url)
                .await
                .map_err(|e| Error::walk(url.as_str(), e))?;
            debug!(%url, entries = entries.len(), "Listed directory");

            let mut subdirs: Vec<String> = Vec::new();
            for entry in entries {
                if entry.is_file() && self.is_modifiable(&entry.name) {
                    found.push(entry);
                    if found.len() >= max_files {
                        info!(found = found.len(), listed = visited.len(), "Tree scan reached its target");
                        return Ok(ScanOutcome::Finished(found));
                    }
                } else if entry.is_dir() {
                    match entry.self_url() {
                        Some(link) if !visited.contains(link) => subdirs.push(link.to_string()),
                        Some(_) => {}
                        None => debug!(path = %entry.path, "Directory without a self-link, skipping"),
                    }
                }
            }

            // Reversed so the first subdirectory is walked first.
            pending.extend(subdirs.into_iter().rev());
        }

        info!(found = found.len(), listed = visited.len(), "Tree scan exhausted the tree");
        Ok(ScanOutcome::Finished(found))
    }

    /// Run [`TreeScanner::scan`] as a background task.
    pub fn spawn(self, root_url: String, max_files: usize) -> ScanHandle {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let task = tokio::spawn(async move { self.scan(&root_url, max_files, &cancel_rx).await });

        ScanHandle {
            cancel: cancel_tx,
            task,
        }
    }
}

/// A scan running in the background.
///
/// The task's result is stored until joined, so the scan can always finish
/// and exit even if nobody is waiting for it.
pub struct ScanHandle {
    cancel: watch::Sender<bool>,
    task: JoinHandle<Result<ScanOutcome, Error>>,
}

impl ScanHandle {
    /// Ask the scan to stop before its next listing request.
    pub fn cancel(&self) {
        // Nobody listening means the scan already finished.
        let _ = self.cancel.send(true);
    }

    /// Wait for the scan's result.
    ///
    /// # Errors
    ///
    /// The scan's own error, or `Error::Task` if the task panicked.
    pub async fn join(self) -> Result<ScanOutcome, Error> {
        self.task.await?
    }

    /// Cancel the scan and wait for it to wind down, discarding its result.
    pub async fn cancel_and_drain(self) {
        self.cancel();
        match self.task.await {
            Ok(Ok(ScanOutcome::Finished(files))) => {
                debug!(found = files.len(), "Discarded finished scan");
            }
            Ok(Ok(ScanOutcome::Cancelled)) => debug!("Scan stopped after cancellation"),
            Ok(Err(e)) => debug!(error = %e, "Discarded failed scan"),
            Err(e) => debug!(error = %e, "Scan task ended abnormally"),
        }
    }
}
