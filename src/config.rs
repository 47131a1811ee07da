use std::env;
use std::fmt;
use std::time::Duration;

use crate::contributions::CountPolicy;
use crate::mutator::MutationSettings;

/// Default base URL for the platform API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default per-call timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 7;

/// Extensions of files that accept a `//` line comment.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".js", ".java", ".go", ".c", ".cpp", ".txt"];

/// Commit message written by the mutator and excluded by the counter.
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update README.md";

/// Run configuration loaded once at startup.
#[derive(Clone)]
pub struct Config {
    /// User whose events are counted
    pub username: String,
    /// Bearer token for every request
    pub token: String,
    /// Owner of the target repository (defaults to `username`)
    pub repo_owner: String,
    /// Target repository name
    pub repo: String,
    /// File that is always mutated first, if any
    pub target_path: Option<String>,
    /// Directory the tree scan starts from
    pub scan_root: String,
    /// Directory synthesized files are created in
    pub generated_dir: String,
    /// Desired number of changes per run
    pub desired_changes: usize,
    /// Contribution threshold; `None` means always mutate
    pub minimum: Option<u32>,
    /// Branch whose creation counts as a contribution
    pub primary_branch: String,
    /// Count creation of any branch, not just the primary one
    pub count_all_branch_creates: bool,
    /// Commit message used for synthetic commits
    pub commit_message: String,
    /// Skip push commits carrying `commit_message` when counting
    pub exclude_own_commits: bool,
    /// Probe repository existence before counting its events
    pub check_repo_existence: bool,
    /// Allow-listed extensions of modifiable files
    pub extensions: Vec<String>,
    /// Extension given to synthesized files
    pub generated_extension: String,
    /// API base URL
    pub api_url: String,
    /// Fixed per-call timeout
    pub timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingEnvVar(key))
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let username = required("GITHUB_USERNAME")?;
        let token = required("GITHUB_API_TOKEN")?;
        let repo = required("CONTRIB_REPO")?;
        let repo_owner = optional("CONTRIB_REPO_OWNER").unwrap_or_else(|| username.clone());

        let desired_changes = optional("CONTRIB_COUNT")
            .unwrap_or_else(|| "5".to_string())
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue("CONTRIB_COUNT"))?;

        let minimum = optional("CONTRIB_MINIMUM")
            .map(|v| v.trim().parse())
            .transpose()
            .map_err(|_| ConfigError::InvalidValue("CONTRIB_MINIMUM"))?;

        let timeout_secs: u64 = optional("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|| DEFAULT_TIMEOUT_SECS.to_string())
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue("HTTP_TIMEOUT_SECS"))?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("HTTP_TIMEOUT_SECS"));
        }

        let extensions = match optional("CONTRIB_EXTENSIONS") {
            Some(list) => parse_extensions(&list),
            None => DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
        };
        if extensions.is_empty() {
            return Err(ConfigError::InvalidValue("CONTRIB_EXTENSIONS"));
        }

        let generated_extension = optional("CONTRIB_GENERATED_EXTENSION")
            .map(|e| normalize_extension(&e))
            .unwrap_or_else(|| ".go".to_string());

        Ok(Self {
            username,
            token,
            repo_owner,
            repo,
            target_path: optional("CONTRIB_TARGET_PATH").map(|p| trim_path(&p)),
            scan_root: optional("CONTRIB_SCAN_ROOT")
                .map(|p| trim_path(&p))
                .unwrap_or_default(),
            generated_dir: optional("CONTRIB_GENERATED_DIR")
                .map(|p| trim_path(&p))
                .unwrap_or_default(),
            desired_changes,
            minimum,
            primary_branch: optional("CONTRIB_PRIMARY_BRANCH").unwrap_or_else(|| "main".to_string()),
            count_all_branch_creates: parse_bool(
                optional("CONTRIB_COUNT_ALL_BRANCHES"),
                false,
                "CONTRIB_COUNT_ALL_BRANCHES",
            )?,
            commit_message: optional("CONTRIB_COMMIT_MESSAGE")
                .unwrap_or_else(|| DEFAULT_COMMIT_MESSAGE.to_string()),
            exclude_own_commits: parse_bool(
                optional("CONTRIB_EXCLUDE_OWN_COMMITS"),
                true,
                "CONTRIB_EXCLUDE_OWN_COMMITS",
            )?,
            check_repo_existence: parse_bool(
                optional("CONTRIB_CHECK_REPO_EXISTS"),
                true,
                "CONTRIB_CHECK_REPO_EXISTS",
            )?,
            extensions,
            generated_extension,
            api_url: optional("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Counting rules derived from this configuration.
    #[must_use]
    pub fn count_policy(&self) -> CountPolicy {
        CountPolicy {
            primary_branch: self.primary_branch.clone(),
            count_all_branch_creates: self.count_all_branch_creates,
            excluded_commit_message: self
                .exclude_own_commits
                .then(|| self.commit_message.clone()),
            check_repo_existence: self.check_repo_existence,
        }
    }

    /// Upload settings derived from this configuration.
    #[must_use]
    pub fn mutation_settings(&self) -> MutationSettings {
        MutationSettings {
            commit_message: self.commit_message.clone(),
            generated_dir: self.generated_dir.clone(),
            generated_extension: self.generated_extension.clone(),
        }
    }
}

// Hand-written so the token never reaches log output.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .field("repo_owner", &self.repo_owner)
            .field("repo", &self.repo)
            .field("target_path", &self.target_path)
            .field("scan_root", &self.scan_root)
            .field("generated_dir", &self.generated_dir)
            .field("desired_changes", &self.desired_changes)
            .field("minimum", &self.minimum)
            .field("primary_branch", &self.primary_branch)
            .field("count_all_branch_creates", &self.count_all_branch_creates)
            .field("commit_message", &self.commit_message)
            .field("exclude_own_commits", &self.exclude_own_commits)
            .field("check_repo_existence", &self.check_repo_existence)
            .field("extensions", &self.extensions)
            .field("generated_extension", &self.generated_extension)
            .field("api_url", &self.api_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn parse_bool(value: Option<String>, default: bool, key: &'static str) -> Result<bool, ConfigError> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidValue(key)),
        },
    }
}

fn parse_extensions(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(normalize_extension)
        .collect()
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim();
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}

fn trim_path(path: &str) -> String {
    path.trim().trim_matches('/').to_string()
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
