//! Crate error types

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the fallible utilities.
///
/// The redactor is deliberately absent: malformed patterns and structural
/// mismatches degrade to no-ops instead of failing.
#[derive(Error, Debug)]
pub enum KitbagError {
    #[error("invalid retry policy: {0}")]
    InvalidPolicy(String),

    #[error("worker '{name}' exceeded its {limit:?} deadline")]
    Timeout { name: String, limit: Duration },

    #[error("worker '{name}' failed: {details}")]
    Worker { name: String, details: String },
}
