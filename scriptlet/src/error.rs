//! Error handling for script execution

use std::io;

use scriptlet_compiler::{CompileError, Location};
use thiserror::Error;

/// Failure reported by a [`CodeExecutor`](crate::CodeExecutor)
#[derive(Debug, Error)]
pub enum ExecutorFailure {
    /// The embedded code raised an error at `at`
    #[error("{message} at {at}.")]
    Raised { message: String, at: Location },

    /// Writing to the output sink failed
    #[error(transparent)]
    Output(#[from] io::Error),
}

impl ExecutorFailure {
    pub fn raised(message: impl Into<String>, at: Location) -> Self {
        ExecutorFailure::Raised {
            message: message.into(),
            at,
        }
    }
}

/// Error type for template expansion
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The embedded code failed; `file` and `line` are the authored location
    #[error("{message} at {file} line {line}.")]
    Runtime {
        message: String,
        file: String,
        line: usize,
    },

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("unable to write output: {0}")]
    Output(#[from] io::Error),
}

impl From<ExecutorFailure> for ExecutionError {
    fn from(failure: ExecutorFailure) -> Self {
        match failure {
            ExecutorFailure::Raised { message, at } => ExecutionError::Runtime {
                message,
                file: at.file.to_string(),
                line: at.line,
            },
            ExecutorFailure::Output(err) => ExecutionError::Output(err),
        }
    }
}

/// Result type for template expansion
pub type Result<T> = std::result::Result<T, ExecutionError>;
