//! The code executor capability
//!
//! The environment doesn't know how to run author code. It hands the whole
//! [`GeneratedScript`] to a [`CodeExecutor`] along with a [`Context`] giving
//! access to the run's namespace, its output sink and the escaping registry.
//! An executor must honour the statement order of the script and report
//! failures with the [`Location`](scriptlet_compiler::Location) of the
//! statement that failed.

use std::{borrow::Cow, io::Write};

use scriptlet_compiler::GeneratedScript;

use crate::{error::ExecutorFailure, escape::EscapeRegistry, value::Namespace};

/// What an executor may touch while running one script
pub struct Context<'a> {
    namespace: &'a mut Namespace,
    output: &'a mut dyn Write,
    escapes: &'a EscapeRegistry,
}

impl<'a> Context<'a> {
    pub fn new(
        namespace: &'a mut Namespace,
        output: &'a mut dyn Write,
        escapes: &'a EscapeRegistry,
    ) -> Self {
        Self {
            namespace,
            output,
            escapes,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &*self.namespace
    }

    pub fn namespace_mut(&mut self) -> &mut Namespace {
        &mut *self.namespace
    }

    /// Writes text exactly as given
    pub fn write_literal(&mut self, text: &str) -> Result<(), ExecutorFailure> {
        Ok(self.output.write_all(text.as_bytes())?)
    }

    /// Escapes `value` with the named style, resolved now, and writes it
    pub fn write_escaped(&mut self, style: Option<&str>, value: &str) -> Result<(), ExecutorFailure> {
        let escaped = self.escapes.escape(style, value);
        self.write_literal(&escaped)
    }

    pub fn escape<'v>(&self, style: Option<&str>, value: &'v str) -> Cow<'v, str> {
        self.escapes.escape(style, value)
    }
}

/// Runs generated scripts
pub trait CodeExecutor {
    /// Runs every statement of `script` in order
    ///
    /// Execution stops at the first failure; there is no resumption.
    fn execute(&self, script: &GeneratedScript, context: &mut Context<'_>) -> Result<(), ExecutorFailure>;
}

impl<E: CodeExecutor + ?Sized> CodeExecutor for &E {
    fn execute(&self, script: &GeneratedScript, context: &mut Context<'_>) -> Result<(), ExecutorFailure> {
        (**self).execute(script, context)
    }
}
