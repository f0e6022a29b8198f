//! Warden error types.

use thiserror::Error;

/// Errors raised by configuration and the run-loop state machine.
///
/// Check and hook failures never show up here. They flow through hooks.
#[derive(Debug, Error)]
pub enum WardenError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cannot {action} a warden that is {state}")]
    InvalidTransition { state: String, action: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WardenError>;
