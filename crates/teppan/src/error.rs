//! # Errors
//!
//! Every validation failure is raised before the engine sees a request, so a
//! failed call leaves no identifiers consumed and nothing submitted. Engine
//! failures are carried through untouched.

use thiserror::Error;

/// Errors surfaced by the orchestrator.
#[derive(Error, Debug)]
pub enum TeppanError {
    /// A sequence-valued argument does not line up with the prompts
    #[error("The lengths of prompts and {argument} must be the same: expected {expected}, got {actual}")]
    ShapeMismatch {
        argument: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The operation is not available for the model as configured
    #[error("{0}")]
    Unsupported(String),

    /// Two mutually exclusive mechanisms were both supplied
    #[error("{0}")]
    ConflictingConfig(String),

    /// Malformed input that is not a length mismatch
    #[error("{0}")]
    InvalidInput(String),

    /// The engine handed back an output of the wrong kind for the call
    #[error("Expected {expected} output for request {request_id}, got {actual}")]
    UnexpectedOutput {
        request_id: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Failure reported by the stepping engine
    #[error(transparent)]
    Engine(#[from] anyhow::Error),
}

impl TeppanError {
    pub(crate) fn shape(argument: &'static str, expected: usize, actual: usize) -> Self {
        TeppanError::ShapeMismatch { argument, expected, actual }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        TeppanError::InvalidInput(message.into())
    }
}

pub type Result<T> = std::result::Result<T, TeppanError>;
