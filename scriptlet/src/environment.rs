//! Script execution
//!
//! An [`Environment`] pairs a [`CodeExecutor`] with an [`EscapeRegistry`] and
//! runs scripts under an [`ExecutionConfig`]:
//!
//! 1. A fresh [`Namespace`] is allocated and seeded with the configured bindings
//! 2. Output is routed to a buffer, a file or a caller stream
//! 3. The script is handed to the executor
//! 4. A failure of the embedded code goes to the configured error sink
//!
//! Compile errors and output I/O errors are always returned to the caller.

use std::{
    fs::File,
    io::{BufWriter, Write},
};

use scriptlet_compiler::{Compiler, GeneratedScript, Options, Source};
use tracing::{debug, warn};

use crate::{
    config::{ErrorSink, ExecutionConfig, OutputSink},
    error::{ExecutionError, ExecutorFailure, Result},
    escape::EscapeRegistry,
    executor::{CodeExecutor, Context},
    value::{Namespace, NamespaceId},
};

pub struct Environment<E> {
    executor: E,
    escapes: EscapeRegistry,
}

impl<E: CodeExecutor> Environment<E> {
    /// An environment using the built-in escaping styles
    pub fn new(executor: E) -> Self {
        Self::with_escapes(executor, EscapeRegistry::new())
    }

    pub fn with_escapes(executor: E, escapes: EscapeRegistry) -> Self {
        Self { executor, escapes }
    }

    pub fn escapes(&self) -> &EscapeRegistry {
        &self.escapes
    }

    /// Runs a compiled script
    ///
    /// Returns the captured output for [`OutputSink::Captured`], and `None` for
    /// the other sinks or when a failure was handed to a callback or stream.
    pub fn run(&self, script: &GeneratedScript, config: ExecutionConfig) -> Result<Option<String>> {
        let ExecutionConfig {
            output,
            errors,
            namespace_id,
            bindings,
            ..
        } = config;
        let mut namespace = Namespace::new(namespace_id.unwrap_or_else(NamespaceId::fresh));
        for (name, value) in bindings {
            namespace.set(name, value);
        }
        debug!(script = script.name(), namespace = %namespace.id(), "running");

        let (outcome, flushed, captured) = match output {
            OutputSink::Captured => {
                let mut buffer = Vec::new();
                let outcome = self.execute(script, &mut namespace, &mut buffer);
                (outcome, Ok(()), Some(String::from_utf8_lossy(&buffer).into_owned()))
            }
            OutputSink::File(path) => {
                let mut writer = BufWriter::new(File::create(&path)?);
                let outcome = self.execute(script, &mut namespace, &mut writer);
                (outcome, writer.flush(), None)
            }
            OutputSink::Stream(mut stream) => {
                let outcome = self.execute(script, &mut namespace, &mut stream);
                (outcome, stream.flush(), None)
            }
        };

        // a failure of the embedded code is routed before any flush error surfaces
        match outcome {
            Ok(()) => {
                flushed?;
                Ok(captured)
            }
            Err(failure @ ExecutorFailure::Output(_)) => Err(failure.into()),
            Err(failure) => {
                let routed = report(failure.into(), errors)?;
                flushed?;
                Ok(routed)
            }
        }
    }

    /// Compiles `source` with the configured include path and reported name,
    /// then runs it
    pub fn expand(&self, config: ExecutionConfig, source: impl Into<Source>) -> Result<Option<String>> {
        let compiler = Compiler::new(Options {
            include_path: config.include_path.clone(),
            reported_name: config.reported_name.clone(),
        });
        let script = compiler.compile(source.into())?;
        self.run(&script, config)
    }

    fn execute(
        &self,
        script: &GeneratedScript,
        namespace: &mut Namespace,
        output: &mut dyn Write,
    ) -> std::result::Result<(), ExecutorFailure> {
        let mut context = Context::new(namespace, output, &self.escapes);
        self.executor.execute(script, &mut context)
    }
}

/// Routes a failure of the embedded code to its sink
fn report(error: ExecutionError, sink: ErrorSink) -> Result<Option<String>> {
    match sink {
        ErrorSink::Propagate => Err(error),
        ErrorSink::Callback(mut handler) => {
            debug!(%error, "template failed, calling error handler");
            handler(error);
            Ok(None)
        }
        ErrorSink::Stream(mut stream) => {
            warn!(%error, "template failed");
            writeln!(stream, "{}", error)?;
            stream.flush()?;
            Ok(None)
        }
    }
}

/// Compiles and runs `source` with the built-in escaping styles
pub fn expand<E: CodeExecutor>(
    executor: E,
    config: ExecutionConfig,
    source: impl Into<Source>,
) -> Result<Option<String>> {
    Environment::new(executor).expand(config, source)
}
