pub mod api;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod endpoints;
pub mod input;
pub mod query;
pub mod reporting;
pub mod selection;
pub mod stats;

pub use api::{Bound, CommitRef, GraphData, GraphDataError, GraphKind, GraphsSelector, Series};
pub use endpoints::{Endpoint, Endpoints};

// Test helpers module - made public for use in unit tests and integration tests
// This is conditionally compiled to avoid including test code in release builds
#[doc(hidden)]
#[cfg(any(test, doctest, feature = "test-helpers"))]
pub mod test_helpers;
