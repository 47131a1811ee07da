//! Run coordination.
//!
//! A run moves through `COUNTING`, `DECIDING` and then either ends early or
//! goes on to `MUTATING`. Any fatal failure moves it to `ABORTED`. The tree
//! scan starts alongside the count so its latency hides behind the feed
//! request; it is cancelled and drained whenever its result is not needed.

use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDate, TimeZone};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::contributions::ContributionCounter;
use crate::error::Error;
use crate::mutator::{FileMutator, MutationReport};
use crate::platform::Platform;
use crate::scanner::TreeScanner;
use crate::types::FileDescriptor;

/// Phase of a run, used in log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Counting,
    Deciding,
    Mutating,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Counting => "COUNTING",
            Self::Deciding => "DECIDING",
            Self::Mutating => "MUTATING",
            Self::Aborted => "ABORTED",
        };
        f.write_str(name)
    }
}

/// How a completed run ended.
#[derive(Debug)]
pub enum RunReport {
    /// The minimum was already met; nothing was written
    NotNeeded { count: u32, minimum: u32 },
    /// Files were written
    Mutated {
        count: u32,
        required: usize,
        report: MutationReport,
    },
}

/// Whether `count` calls for new commits. No minimum means always.
#[must_use]
pub fn mutation_needed(count: u32, minimum: Option<u32>) -> bool {
    minimum.map_or(true, |minimum| count < minimum)
}

/// Number of files to write: the desired amount, raised to cover the
/// shortfall below `minimum`.
#[must_use]
pub fn required_changes(count: u32, minimum: Option<u32>, desired: usize) -> usize {
    let shortfall = minimum.map_or(0, |minimum| minimum.saturating_sub(count));
    desired.max(usize::try_from(shortfall).unwrap_or(usize::MAX))
}

/// Number of files the tree scan looks for. No run needs more than the
/// larger of the desired amount and the minimum.
#[must_use]
pub fn scan_target(minimum: Option<u32>, desired: usize) -> usize {
    let minimum = minimum.map_or(0, |minimum| usize::try_from(minimum).unwrap_or(usize::MAX));
    desired.max(minimum)
}

/// Drives a single run against one platform.
pub struct Coordinator {
    platform: Arc<dyn Platform>,
    config: Config,
}

impl Coordinator {
    pub fn new(platform: Arc<dyn Platform>, config: Config) -> Self {
        Self { platform, config }
    }

    /// Run for the current local calendar day.
    ///
    /// # Errors
    ///
    /// See [`Coordinator::run_on`].
    pub async fn run(&self) -> Result<RunReport, Error> {
        self.run_on(Local::now().date_naive(), Local).await
    }

    /// Run for `day` as seen in `tz`.
    ///
    /// # Errors
    ///
    /// A failed count, a failed scan when files are needed, or a failed
    /// lookup of the configured target file. Individual upload failures are
    /// reported in the [`MutationReport`] instead.
    pub async fn run_on<Tz>(&self, day: NaiveDate, tz: Tz) -> Result<RunReport, Error>
    where
        Tz: TimeZone + Send + Sync + 'static,
    {
        let config = &self.config;
        info!(
            state = %RunState::Counting,
            user = %config.username,
            owner = %config.repo_owner,
            repo = %config.repo,
            "Starting run"
        );

        let counter = ContributionCounter::new(
            self.platform.clone(),
            &config.username,
            config.count_policy(),
        );
        let counting = tokio::spawn(async move { counter.count_on(day, &tz).await });

        let scan = TreeScanner::new(self.platform.clone(), config.extensions.clone()).spawn(
            self.platform.contents_url(&config.scan_root),
            scan_target(config.minimum, config.desired_changes),
        );

        let counted = match counting.await {
            Ok(result) => result,
            Err(e) => Err(Error::from(e)),
        };
        let count = match counted {
            Ok(count) => count,
            Err(e) => {
                error!(state = %RunState::Aborted, error = %e, "Counting failed");
                scan.cancel_and_drain().await;
                return Err(e);
            }
        };

        info!(state = %RunState::Deciding, count, minimum = ?config.minimum, "Counted contributions");
        if !mutation_needed(count, config.minimum) {
            scan.cancel_and_drain().await;
            let minimum = config.minimum.unwrap_or_default();
            info!(count, minimum, "Minimum already met, nothing to do");
            return Ok(RunReport::NotNeeded { count, minimum });
        }

        let required = required_changes(count, config.minimum, config.desired_changes);
        info!(state = %RunState::Mutating, required, "Contributions needed");

        let scanned = match scan.join().await {
            Ok(outcome) => outcome.into_files(),
            Err(e) => {
                error!(state = %RunState::Aborted, error = %e, "Tree scan failed");
                return Err(e);
            }
        };

        let files = match self.with_target(scanned).await {
            Ok(files) => files,
            Err(e) => {
                error!(state = %RunState::Aborted, error = %e, "Target file lookup failed");
                return Err(e);
            }
        };

        let mutator = FileMutator::new(self.platform.clone(), config.mutation_settings());
        let report = mutator.run(files, required).await;

        if report.is_complete() {
            info!(written = report.succeeded(), "Run complete");
        } else {
            warn!(
                written = report.succeeded(),
                failed = report.failures().len(),
                "Run complete with failed writes"
            );
        }

        Ok(RunReport::Mutated {
            count,
            required,
            report,
        })
    }

    /// Put the configured target file ahead of the scanned files.
    async fn with_target(&self, mut files: Vec<FileDescriptor>) -> Result<Vec<FileDescriptor>, Error> {
        let Some(path) = self.config.target_path.as_deref() else {
            return Ok(files);
        };

        let target = match self.platform.get_file(path).await? {
            Some(existing) => existing,
            None => {
                let name = path.rsplit('/').next().unwrap_or(path);
                FileDescriptor::new_file(name, path)
            }
        };

        files.retain(|f| f.path != target.path);
        files.insert(0, target);
        Ok(files)
    }
}
