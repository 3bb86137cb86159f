//! Validator error types

use thiserror::Error;

/// Errors that abort a whole validation run
///
/// Broken links are never errors; they are part of the result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidatorError {
    /// Store error that prevents the run from starting or continuing
    #[error("Store error: {0}")]
    Store(String),

    /// The run was cancelled through its progress monitor
    #[error("Validation interrupted")]
    Interrupted,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
