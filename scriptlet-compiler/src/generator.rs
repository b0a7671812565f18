//! Script generation
//!
//! Turns a resolved [`Document`] into a [`GeneratedScript`]: one [`Statement`]
//! per segment, each tagged with the [`Location`] of the authored text it came
//! from.
//!
//! - Literal text becomes [`Op::Write`]
//! - Code blocks become [`Op::Code`], copied verbatim
//! - Interpolations become [`Op::Interpolate`]; the escaping style is kept as a
//!   name and looked up when the script runs
//!
//! The [`Display`] impl renders the script as text, each statement preceded by
//! a `#line N "file"` marker:
//!
//! ```text
//! #line 1 "hello"
//! __write("Hello ");
//! #line 1 "hello"
//! __write(__escape($name));
//! ```

use std::{
    borrow::Cow,
    fmt::Display,
    sync::{Arc, LazyLock},
};

use regex::{Captures, Regex};

use crate::{
    error::{CompileError, IncludeWarning, Result},
    segment::{Document, Location, Segment},
};

/// What a statement does when the script runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Write these exact bytes to the output sink
    Write(String),
    /// Author code, run as written
    Code(String),
    /// Evaluate `variable`, escape it with `style` (default `xml`) and write it
    Interpolate {
        variable: String,
        style: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Authored location of the statement
    pub marker: Location,
    pub op: Op,
}

/// A compiled template, ready to hand to an executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedScript {
    name: Arc<str>,
    statements: Vec<Statement>,
    warnings: Vec<IncludeWarning>,
}

impl GeneratedScript {
    /// Reassembles a script from its parts, as emitted by the build-time macros
    pub fn from_parts(
        name: impl Into<Arc<str>>,
        statements: Vec<Statement>,
        warnings: Vec<IncludeWarning>,
    ) -> Self {
        Self {
            name: name.into(),
            statements,
            warnings,
        }
    }

    /// Reported name of the top-level template
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Include problems found while compiling
    pub fn warnings(&self) -> &[IncludeWarning] {
        &self.warnings
    }

    pub(crate) fn with_warnings(mut self, warnings: Vec<IncludeWarning>) -> Self {
        self.warnings = warnings;
        self
    }
}

static CLEAN: LazyLock<Regex> = LazyLock::new(|| Regex::new("[\\\\\"\n\r\t]").unwrap());

/// Escapes text for a double quoted string in the rendered script
fn quote(content: &str) -> Cow<'_, str> {
    CLEAN.replace_all(content, |captures: &Captures| match &captures[0] {
        "\n" => "\\n".to_string(),
        "\r" => "\\r".to_string(),
        "\t" => "\\t".to_string(),
        other => format!("\\{}", other),
    })
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "#line {} \"{}\"", self.marker.line, quote(&self.marker.file))?;
        match &self.op {
            Op::Write(text) => write!(f, "__write(\"{}\");", quote(text)),
            Op::Code(code) => f.write_str(code),
            Op::Interpolate {
                variable,
                style: Some(style),
            } => write!(f, "__write(__escape(\"{}\", {}));", style, variable),
            Op::Interpolate {
                variable,
                style: None,
            } => write!(f, "__write(__escape({}));", variable),
        }
    }
}

impl Display for GeneratedScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{}", statement)?;
        }
        Ok(())
    }
}

/// Generates the script for a document whose includes are already resolved
pub fn generate(document: Document) -> Result<GeneratedScript> {
    let mut statements = Vec::with_capacity(document.segments.len());
    for segment in document.segments {
        let (op, marker) = match segment {
            Segment::Literal { text, .. } if text.is_empty() => continue,
            Segment::Literal { text, at } => (Op::Write(text), at),
            Segment::Code { text, at } => (Op::Code(text), at),
            Segment::Interpolation {
                variable,
                style,
                at,
            } => (Op::Interpolate { variable, style }, at),
            Segment::Include { path, at } => {
                return Err(CompileError::UnresolvedInclude {
                    path,
                    name: at.file.to_string(),
                    line: at.line,
                });
            }
        };
        statements.push(Statement { marker, op });
    }
    Ok(GeneratedScript {
        name: document.name,
        statements,
        warnings: Vec::new(),
    })
}
