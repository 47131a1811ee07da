//! Resource clients.

pub mod contents;
pub mod events;
pub mod repos;

// Re-exports
pub use contents::ContentsClient;
pub use events::EventsClient;
pub use repos::ReposClient;
