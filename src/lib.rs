//! Streak keeper
//!
//! Counts today's contributions from a user's activity feed and, when the
//! count is below a configured minimum, commits small changes to a
//! designated repository to top it up.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use streak_keeper::{Config, Coordinator, GitHubClient};
//!
//! let config = Config::from_env()?;
//! let client = GitHubClient::from_config(&config)?;
//! let report = Coordinator::new(Arc::new(client), config).run().await?;
//! ```

pub mod client;
pub mod clients;
pub mod config;
pub mod contributions;
pub mod coordinator;
pub mod error;
pub mod mutator;
pub mod platform;
pub mod scanner;
pub mod testing;
pub mod transport;
pub mod types;

// Re-exports
pub use client::GitHubClient;
pub use clients::{ContentsClient, EventsClient, ReposClient};
pub use config::{Config, ConfigError};
pub use contributions::{ContributionCounter, ContributionResult, CountPolicy, RepositoryExistenceCache};
pub use coordinator::{Coordinator, RunReport, RunState};
pub use error::{Error, ProtocolError};
pub use mutator::{FileMutator, FileOutcome, MutationReport, MutationSettings};
pub use platform::Platform;
pub use scanner::{ScanHandle, ScanOutcome, TreeScanner};
pub use transport::HttpTransport;
pub use types::{ActivityEvent, EventKind, FileDescriptor, PutFileRequest};
