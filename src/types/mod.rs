//! Data model types.

pub mod contents;
pub mod events;

// Re-exports
pub use contents::{
    ContentsResponse, EntryKind, EntryLinks, FileDescriptor, PutFileContent, PutFileRequest,
    PutFileResponse,
};
pub use events::{ActivityEvent, CommitRecord, EventKind, EventPayload, EventRepo};
