//! Execution configuration
//!
//! [`ExecutionConfig`] says where a run's output and errors go, how includes
//! are found when compiling, and what the run's namespace starts with.
//!
//! ```rust
//! use scriptlet::{ExecutionConfig, Value};
//!
//! let config = ExecutionConfig::new()
//!     .include_path(["templates/partials"])
//!     .reported_name("welcome.html")
//!     .bind("$name", Value::from("Tom & Jerry"));
//! ```

use std::{io::Write, path::PathBuf};

use crate::{
    error::ExecutionError,
    value::{NamespaceId, Value},
};

/// Where written output goes
#[derive(Default)]
pub enum OutputSink {
    /// Buffered and returned to the caller
    #[default]
    Captured,
    /// Written incrementally to a file, created or truncated
    File(PathBuf),
    /// Written incrementally to a caller-owned stream
    Stream(Box<dyn Write>),
}

/// Where a runtime failure of the embedded code goes
#[derive(Default)]
pub enum ErrorSink {
    /// Returned to the caller as an `Err`
    #[default]
    Propagate,
    /// Handed to a caller-supplied handler, then swallowed
    Callback(Box<dyn FnMut(ExecutionError)>),
    /// Written to a stream as one line, then swallowed
    Stream(Box<dyn Write>),
}

/// Everything a single run needs besides the script and the executor
#[derive(Default)]
pub struct ExecutionConfig {
    pub output: OutputSink,
    pub errors: ErrorSink,
    /// Directories searched for includes when compiling through `expand`
    pub include_path: Vec<PathBuf>,
    /// Name used in line markers instead of the source's own
    pub reported_name: Option<String>,
    /// Identity of the run's namespace; a fresh one is allocated when absent
    pub namespace_id: Option<NamespaceId>,
    /// Initial bindings seeded into the namespace
    pub bindings: Vec<(String, Value)>,
}

impl ExecutionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = OutputSink::File(path.into());
        self
    }

    pub fn output_stream(mut self, stream: impl Write + 'static) -> Self {
        self.output = OutputSink::Stream(Box::new(stream));
        self
    }

    pub fn errors_to_callback(mut self, handler: impl FnMut(ExecutionError) + 'static) -> Self {
        self.errors = ErrorSink::Callback(Box::new(handler));
        self
    }

    pub fn errors_to_stream(mut self, stream: impl Write + 'static) -> Self {
        self.errors = ErrorSink::Stream(Box::new(stream));
        self
    }

    pub fn include_path<P: Into<PathBuf>>(mut self, dirs: impl IntoIterator<Item = P>) -> Self {
        self.include_path = dirs.into_iter().map(Into::into).collect();
        self
    }

    pub fn reported_name(mut self, name: impl Into<String>) -> Self {
        self.reported_name = Some(name.into());
        self
    }

    pub fn namespace_id(mut self, id: NamespaceId) -> Self {
        self.namespace_id = Some(id);
        self
    }

    /// Binds a sigil-qualified name, e.g. `$title`, before the script runs
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bindings.push((name.into(), value.into()));
        self
    }
}
