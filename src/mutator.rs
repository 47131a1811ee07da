//! File mutation.
//!
//! Fills the list of files to touch up to the required size with freshly
//! named files, then writes each one exactly once. New content is a single
//! `//` comment derived from the file name (for new files) or from the
//! previous content identifier (for updates), so every write differs from
//! the version it replaces.

use std::collections::HashSet;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};

use crate::config::DEFAULT_COMMIT_MESSAGE;
use crate::error::Error;
use crate::platform::Platform;
use crate::types::{FileDescriptor, PutFileRequest};

/// How files are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationSettings {
    /// Commit message of every write
    pub commit_message: String,
    /// Directory synthesized files are created in (`""` is the root)
    pub generated_dir: String,
    /// Extension of synthesized files, including the dot
    pub generated_extension: String,
}

impl Default for MutationSettings {
    fn default() -> Self {
        Self {
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            generated_dir: String::new(),
            generated_extension: ".go".to_string(),
        }
    }
}

/// Result of writing one file.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: String,
    /// The write created the file rather than updating it
    pub created: bool,
    /// New content identifier, or why the write failed
    pub result: Result<String, Error>,
}

impl FileOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-file results of a mutation pass.
#[derive(Debug, Default)]
pub struct MutationReport {
    pub outcomes: Vec<FileOutcome>,
}

impl MutationReport {
    /// Number of files written.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Files that could not be written.
    #[must_use]
    pub fn failures(&self) -> Vec<&FileOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success()).collect()
    }

    /// Every file was written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(FileOutcome::is_success)
    }
}

/// Turn arbitrary text into a safe file stem.
///
/// Keeps ASCII letters, digits, `-` and `_`; everything else becomes `_`.
#[must_use]
pub fn sanitize_file_stem(raw: &str) -> String {
    let stem: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.is_empty() {
        "file".to_string()
    } else {
        stem
    }
}

/// Nanosecond UTC timestamp, e.g. `2024-01-15T10:30:00.123456789Z`.
#[must_use]
pub fn timestamp_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Plain-text content written to `descriptor`.
#[must_use]
pub fn comment_for(descriptor: &FileDescriptor) -> String {
    if descriptor.is_new() {
        format!("// {}\n", descriptor.name)
    } else {
        format!("// {}\n", descriptor.sha)
    }
}

fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// First name built from `stem` whose path is not yet taken.
fn unique_name(stem: &str, ext: &str, dir: &str, taken: &HashSet<String>) -> String {
    let candidate = |n: usize| {
        if n == 0 {
            format!("{stem}{ext}")
        } else {
            format!("{stem}-{n}{ext}")
        }
    };

    // One more candidate than there are taken paths: at least one is free.
    (0..=taken.len())
        .map(candidate)
        .find(|name| !taken.contains(&join_path(dir, name)))
        .unwrap_or_else(|| candidate(taken.len() + 1))
}

/// Creates and updates files in the target repository.
pub struct FileMutator {
    platform: Arc<dyn Platform>,
    settings: MutationSettings,
}

impl FileMutator {
    pub fn new(platform: Arc<dyn Platform>, settings: MutationSettings) -> Self {
        Self { platform, settings }
    }

    /// Exactly `required` descriptors: `existing` first, then new files
    /// named after the current time.
    #[must_use]
    pub fn plan(&self, existing: Vec<FileDescriptor>, required: usize) -> Vec<FileDescriptor> {
        self.plan_with_clock(existing, required, timestamp_stamp)
    }

    /// Like [`FileMutator::plan`], with names stemmed from `stamp`.
    pub fn plan_with_clock<F>(
        &self,
        existing: Vec<FileDescriptor>,
        required: usize,
        mut stamp: F,
    ) -> Vec<FileDescriptor>
    where
        F: FnMut() -> String,
    {
        let mut taken: HashSet<String> = existing.iter().map(|d| d.path.clone()).collect();
        let mut planned: Vec<FileDescriptor> = existing.into_iter().take(required).collect();

        let dir = self.settings.generated_dir.as_str();
        let ext = self.settings.generated_extension.as_str();
        while planned.len() < required {
            let stem = sanitize_file_stem(&stamp());
            let name = unique_name(&stem, ext, dir, &taken);
            let path = join_path(dir, &name);

            taken.insert(path.clone());
            planned.push(FileDescriptor::new_file(name, path));
        }

        planned
    }

    /// Request body that writes `descriptor`.
    #[must_use]
    pub fn request_for(&self, descriptor: &FileDescriptor) -> PutFileRequest {
        PutFileRequest {
            message: self.settings.commit_message.clone(),
            content: STANDARD.encode(comment_for(descriptor)),
            sha: (!descriptor.is_new()).then(|| descriptor.sha.clone()),
        }
    }

    /// Write every descriptor once, in order.
    ///
    /// A failed write is recorded and the remaining files are still attempted.
    pub async fn apply(&self, descriptors: &[FileDescriptor]) -> MutationReport {
        let mut report = MutationReport::default();

        for descriptor in descriptors {
            let request = self.request_for(descriptor);
            let result = self.platform.put_file(&descriptor.path, &request).await;

            match &result {
                Ok(sha) => info!(
                    path = %descriptor.path,
                    sha = %sha,
                    "{} file",
                    if descriptor.is_new() { "Created" } else { "Updated" }
                ),
                Err(e) => warn!(path = %descriptor.path, error = %e, "Failed to write file"),
            }

            report.outcomes.push(FileOutcome {
                path: descriptor.path.clone(),
                created: descriptor.is_new(),
                result,
            });
        }

        report
    }

    /// Plan `required` files and write them.
    pub async fn run(&self, existing: Vec<FileDescriptor>, required: usize) -> MutationReport {
        let plan = self.plan(existing, required);
        self.apply(&plan).await
    }
}
