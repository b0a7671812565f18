//! Scanned template model
//!
//! A [`Document`] is the ordered list of [`Segment`]s the scanner found in one
//! template. Every segment knows the file and line it came from, which survives
//! include splicing so diagnostics always point at authored text.

use std::{fmt::Display, sync::Arc};

/// A (file, line) pair in authored template text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: Arc<str>,
    /// 1-based line number
    pub line: usize,
}

impl Location {
    pub fn new(file: impl Into<Arc<str>>, line: usize) -> Self {
        Self { file: file.into(), line }
    }

    /// The location `lines` lines further down the same file
    pub fn offset(&self, lines: usize) -> Self {
        Self {
            file: self.file.clone(),
            line: self.line + lines,
        }
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} line {}", self.file, self.line)
    }
}

/// One classified unit of template text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text emitted as-is
    Literal { text: String, at: Location },
    /// Author code copied verbatim into the script
    Code { text: String, at: Location },
    /// `{$name}` or `{$name,style}`
    Interpolation {
        variable: String,
        style: Option<String>,
        at: Location,
    },
    /// `<?include path?>`, replaced during include resolution
    Include { path: String, at: Location },
}

impl Segment {
    pub fn location(&self) -> &Location {
        match self {
            Segment::Literal { at, .. }
            | Segment::Code { at, .. }
            | Segment::Interpolation { at, .. }
            | Segment::Include { at, .. } => at,
        }
    }

    pub(crate) fn empty(at: Location) -> Self {
        Segment::Literal {
            text: String::new(),
            at,
        }
    }
}

/// Segments of one template, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Display name used in diagnostics
    pub name: Arc<str>,
    pub segments: Vec<Segment>,
}
