//! Error handling for template compilation
//!
//! Compilation has one fatal failure kind coming from the template itself, the
//! [`ScanError`], plus I/O failures reading the top-level source. Problems with
//! include directives never abort compilation; they are collected as
//! [`IncludeWarning`]s on the generated script instead.

use std::{fmt::Display, io};

use thiserror::Error;

/// The kind of token an unterminated opener belonged to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Code,
    Include,
    Interpolation,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TokenKind::Code => "code block",
            TokenKind::Include => "include directive",
            TokenKind::Interpolation => "interpolation",
        })
    }
}

/// Returns the first 32 characters of a string for error context
pub(crate) fn lcap(src: &str) -> &str {
    static CAP_AT: usize = 32;

    match src.char_indices().nth(CAP_AT) {
        Some((end, _)) => &src[..end],
        None => src,
    }
}

/// An opener with no matching closer before the end of input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unterminated {token} at {name} line {line} near \"{near}\"")]
pub struct ScanError {
    pub token: TokenKind,
    /// Display name of the file being scanned
    pub name: String,
    /// Line of the opener
    pub line: usize,
    pub(crate) near: String,
}

impl ScanError {
    pub(crate) fn unterminated(token: TokenKind, name: &str, line: usize, from_opener: &str) -> Self {
        Self {
            token,
            name: name.to_string(),
            line,
            near: lcap(from_opener).to_string(),
        }
    }
}

/// A non-fatal problem with an include directive
///
/// The directive is replaced by empty text and compilation carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IncludeWarning {
    #[error("{name} line {line}: include file {path} not found")]
    NotFound { path: String, name: String, line: usize },

    #[error("{name} line {line}: skipping recursive include of {path}")]
    Recursive { path: String, name: String, line: usize },

    #[error("{name} line {line}: unable to read include file {path}: {reason}")]
    Unreadable {
        path: String,
        name: String,
        line: usize,
        reason: String,
    },
}

impl IncludeWarning {
    /// Path as written in the directive
    pub fn path(&self) -> &str {
        match self {
            IncludeWarning::NotFound { path, .. }
            | IncludeWarning::Recursive { path, .. }
            | IncludeWarning::Unreadable { path, .. } => path,
        }
    }
}

/// Error type for template compilation failures
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("unable to read template {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("unable to walk template directory {dir}: {source}")]
    Walk {
        dir: String,
        #[source]
        source: walkdir::Error,
    },

    /// An include directive reached code generation without being resolved.
    /// Only reachable by handing an unresolved document to the generator.
    #[error("internal error: unresolved include of {path} at {name} line {line}")]
    UnresolvedInclude { path: String, name: String, line: usize },
}

/// Result type for template compilation
pub type Result<T> = std::result::Result<T, CompileError>;
