//! Repository-contents data models.

use serde::{Deserialize, Serialize};

/// Kind of a repository contents entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    /// Symlinks and submodules; never walked or modified
    #[serde(other)]
    Other,
}

/// Hypermedia links attached to a contents entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryLinks {
    /// API URL of the entry itself; listing it descends into a directory
    #[serde(rename = "self", default)]
    pub self_url: Option<String>,
}

/// A file or directory in the target repository.
///
/// An empty `sha` means the file does not exist yet and uploading it creates
/// it; a non-empty `sha` is the current content identifier and uploading
/// updates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub sha: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(rename = "_links", default)]
    pub links: EntryLinks,
}

impl FileDescriptor {
    /// An existing file.
    pub fn file(name: impl Into<String>, path: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            sha: sha.into(),
            kind: EntryKind::File,
            links: EntryLinks::default(),
        }
    }

    /// A file that does not exist yet.
    pub fn new_file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::file(name, path, String::new())
    }

    /// A directory whose listing lives at `self_url`.
    pub fn directory(
        name: impl Into<String>,
        path: impl Into<String>,
        self_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            sha: String::new(),
            kind: EntryKind::Dir,
            links: EntryLinks {
                self_url: Some(self_url.into()),
            },
        }
    }

    /// Uploading this descriptor creates the file.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.sha.is_empty()
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    /// URL to list for descending into this entry.
    #[must_use]
    pub fn self_url(&self) -> Option<&str> {
        self.links.self_url.as_deref()
    }
}

/// Body of a contents GET: a directory listing or a single entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ContentsResponse {
    Listing(Vec<FileDescriptor>),
    Single(Box<FileDescriptor>),
}

impl ContentsResponse {
    /// Flatten into a listing; a single entry becomes a one-entry listing.
    #[must_use]
    pub fn into_entries(self) -> Vec<FileDescriptor> {
        match self {
            Self::Listing(entries) => entries,
            Self::Single(entry) => vec![*entry],
        }
    }
}

/// Body of a create-or-update call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PutFileRequest {
    /// Commit message
    pub message: String,
    /// Base64-encoded file content
    pub content: String,
    /// Current content identifier; omitted when creating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// Content part of a create-or-update response.
#[derive(Debug, Clone, Deserialize)]
pub struct PutFileContent {
    pub sha: String,
    #[serde(default)]
    pub path: String,
}

/// Response from a create-or-update call.
#[derive(Debug, Clone, Deserialize)]
pub struct PutFileResponse {
    pub content: PutFileContent,
}
