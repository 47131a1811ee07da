//! Error types for streak-keeper.
//!
//! Every failure the run can hit falls into one of four families: bad
//! configuration, transport failures, protocol failures (a status or body the
//! platform should not have sent), and failures surfaced while walking a
//! repository tree.

use thiserror::Error;

use crate::config::ConfigError;

/// Main error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid setting
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Request construction or transport failure (including timeouts)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success status or undecodable body
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A network or protocol failure surfaced during a tree walk
    #[error("Tree walk failed at {url}: {source}")]
    Walk {
        url: String,
        #[source]
        source: Box<Error>,
    },

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A background task panicked or was aborted
    #[error("Background task failed: {0}")]
    Task(String),
}

impl Error {
    /// Wrap an error raised while listing `url` during a tree walk.
    pub fn walk(url: impl Into<String>, source: Error) -> Self {
        Self::Walk {
            url: url.into(),
            source: Box::new(source),
        }
    }

    /// Check if the platform reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Protocol(e) => e.status() == Some(404),
            Self::Walk { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Network(format!("request timed out: {e}"))
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}

/// The platform answered, but not with what was asked for.
#[derive(Error, Debug, Clone)]
pub enum ProtocolError {
    /// Raised on any non-success HTTP status.
    #[error("{url} returned HTTP {status}: {message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },

    /// Raised when a body cannot be decoded into the expected shape.
    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl ProtocolError {
    /// Get the HTTP status, if this error carries one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Decode { .. } => None,
        }
    }

    /// Get the URL the failing request was sent to.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Status { url, .. } | Self::Decode { url, .. } => url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_accessors() {
        let error = ProtocolError::Status {
            status: 422,
            url: "https://api.github.com/repos/u/r/contents/a.go".to_string(),
            message: "sha wasn't supplied".to_string(),
        };

        assert_eq!(error.status(), Some(422));
        assert_eq!(error.url(), "https://api.github.com/repos/u/r/contents/a.go");
        assert!(error.to_string().contains("HTTP 422"));
    }

    #[test]
    fn test_decode_error_has_no_status() {
        let error = ProtocolError::Decode {
            url: "https://api.github.com/users/u/events".to_string(),
            message: "expected a sequence".to_string(),
        };

        assert_eq!(error.status(), None);
    }

    #[test]
    fn test_is_not_found_sees_through_walk() {
        let inner = Error::Protocol(ProtocolError::Status {
            status: 404,
            url: "mock://dir".to_string(),
            message: "Not Found".to_string(),
        });
        let error = Error::walk("mock://dir", inner);

        assert!(error.is_not_found());
        assert!(error.to_string().starts_with("Tree walk failed at mock://dir"));
    }

    #[test]
    fn test_network_error_is_not_not_found() {
        assert!(!Error::Network("connection refused".to_string()).is_not_found());
    }
}
