//! Include resolution
//!
//! Replaces every [`Segment::Include`] in a document with the scanned segments
//! of the file it names, recursively. Missing, unreadable or recursive includes
//! are soft failures: the directive becomes an empty literal and an
//! [`IncludeWarning`] is recorded.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::{
    error::{IncludeWarning, Result},
    scanner::scan,
    segment::{Document, Location, Segment},
};

/// Resolves include directives against an ordered list of directories
pub struct Resolver<'a> {
    include_path: &'a [PathBuf],
    /// Canonical paths of the files on the current include chain
    in_progress: Vec<PathBuf>,
    /// Canonical paths of every file spliced in, in first-seen order
    included: Vec<PathBuf>,
    warnings: Vec<IncludeWarning>,
}

/// Canonical identity of a file, falling back to the path itself
fn identity(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

impl<'a> Resolver<'a> {
    pub fn new(include_path: &'a [PathBuf]) -> Self {
        Self {
            include_path,
            in_progress: Vec::new(),
            included: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Marks the file the top-level document was read from as in progress so
    /// that it can't include itself
    pub fn with_origin(mut self, origin: &Path) -> Self {
        self.in_progress.push(identity(origin));
        self
    }

    /// Warnings recorded so far, in the order they were found
    pub fn warnings(&self) -> &[IncludeWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<IncludeWarning> {
        self.warnings
    }

    /// Files read to satisfy include directives, each listed once
    pub fn included(&self) -> &[PathBuf] {
        &self.included
    }

    /// Splices every include directive in `document`
    pub fn resolve(&mut self, document: Document) -> Result<Document> {
        let mut segments = Vec::with_capacity(document.segments.len());
        for segment in document.segments {
            match segment {
                Segment::Include { path, at } => segments.extend(self.include(&path, at)?),
                other => segments.push(other),
            }
        }
        Ok(Document {
            name: document.name,
            segments,
        })
    }

    /// First existing file for `path`: absolute paths as-is, otherwise the
    /// current directory then each include directory in order
    fn locate(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        if relative.is_absolute() {
            return relative.is_file().then(|| relative.to_path_buf());
        }
        std::iter::once(relative.to_path_buf())
            .chain(self.include_path.iter().map(|dir| dir.join(relative)))
            .find(|candidate| candidate.is_file())
    }

    fn soft_fail(&mut self, warning: IncludeWarning, at: Location) -> Vec<Segment> {
        warn!("{}", warning);
        self.warnings.push(warning);
        vec![Segment::empty(at)]
    }

    fn include(&mut self, path: &str, at: Location) -> Result<Vec<Segment>> {
        let name = at.file.to_string();
        let line = at.line;
        let Some(found) = self.locate(path) else {
            let path = path.to_string();
            return Ok(self.soft_fail(IncludeWarning::NotFound { path, name, line }, at));
        };
        let id = identity(&found);
        if self.in_progress.contains(&id) {
            let path = path.to_string();
            return Ok(self.soft_fail(IncludeWarning::Recursive { path, name, line }, at));
        }
        let text = match fs::read_to_string(&found) {
            Ok(text) => text,
            Err(err) => {
                let warning = IncludeWarning::Unreadable {
                    path: path.to_string(),
                    name,
                    line,
                    reason: err.to_string(),
                };
                return Ok(self.soft_fail(warning, at));
            }
        };
        debug!(include = %found.display(), from = %at, "including");
        if !self.included.contains(&id) {
            self.included.push(id.clone());
        }
        let document = scan(&text, found.display().to_string())?;
        self.in_progress.push(id);
        let resolved = self.resolve(document);
        self.in_progress.pop();
        Ok(resolved?.segments)
    }
}
