//! Testing utilities.
//!
//! Provides an in-memory [`Platform`](crate::Platform) for exercising the
//! counter, scanner, mutator and coordinator without network access.

mod mock;

pub use mock::{event, mock_tree, MockCall, MockPlatform, MOCK_CONTENTS_URL};
