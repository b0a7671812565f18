//! Template compilation
//!
//! Runs the whole pipeline for one template: scan, resolve includes, generate.
//!
//! # Examples
//!
//! ```rust
//! use scriptlet_compiler::{Compiler, Options, Source};
//!
//! let compiler = Compiler::new(Options::default());
//! let script = compiler.compile(Source::from("Hello {$name}!")).unwrap();
//! assert_eq!(script.name(), "template");
//! assert_eq!(script.statements().len(), 3);
//! ```

use std::{
    collections::BTreeMap,
    fmt::Debug,
    fs,
    io::Read,
    path::{Path, PathBuf},
};

use tracing::debug;
use walkdir::WalkDir;

use crate::{
    error::{CompileError, Result},
    generator::{GeneratedScript, generate},
    include::Resolver,
    scanner::scan,
};

/// Reported name for templates that didn't come from a file
pub static DEFAULT_NAME: &str = "template";

/// Where template text comes from
pub enum Source {
    Text(String),
    File(PathBuf),
    Reader(Box<dyn Read>),
}

impl Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Source::File(path) => f.debug_tuple("File").field(path).finish(),
            Source::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl From<&str> for Source {
    fn from(text: &str) -> Self {
        Source::Text(text.to_string())
    }
}

impl From<String> for Source {
    fn from(text: String) -> Self {
        Source::Text(text)
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Source::File(path.to_path_buf())
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Source::File(path)
    }
}

/// Compiler options
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Directories searched, in order, after the current directory
    pub include_path: Vec<PathBuf>,
    /// Name used in line markers and diagnostics instead of the default
    pub reported_name: Option<String>,
}

/// Main compiler implementation
pub struct Compiler {
    options: Options,
}

impl Compiler {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Compiles one template into a script
    pub fn compile(&self, source: Source) -> Result<GeneratedScript> {
        Ok(self.compile_with_includes(source)?.0)
    }

    /// Compiles one template, also returning the canonical paths of the files
    /// spliced in by its includes
    ///
    /// Build-time compilation uses the list to track partials for rebuilds.
    pub fn compile_with_includes(&self, source: Source) -> Result<(GeneratedScript, Vec<PathBuf>)> {
        let (text, default_name, origin) = match source {
            Source::Text(text) => (text, DEFAULT_NAME.to_string(), None),
            Source::File(path) => {
                let name = path.display().to_string();
                let text = fs::read_to_string(&path).map_err(|source| CompileError::Read {
                    name: name.clone(),
                    source,
                })?;
                (text, name, Some(path))
            }
            Source::Reader(mut reader) => {
                let mut text = String::new();
                reader
                    .read_to_string(&mut text)
                    .map_err(|source| CompileError::Read {
                        name: DEFAULT_NAME.to_string(),
                        source,
                    })?;
                (text, DEFAULT_NAME.to_string(), None)
            }
        };
        let name = self.options.reported_name.clone().unwrap_or(default_name);
        debug!(template = %name, "compiling");

        let document = scan(&text, name)?;
        let mut resolver = Resolver::new(&self.options.include_path);
        if let Some(origin) = &origin {
            resolver = resolver.with_origin(origin);
        }
        let document = resolver.resolve(document)?;
        let included = resolver.included().to_vec();
        let script = generate(document)?.with_warnings(resolver.into_warnings());
        Ok((script, included))
    }

    /// Compiles every file under `dir` with the given extension
    ///
    /// Scripts are keyed by their path relative to `dir`, without the
    /// extension and with `/` separators, so `a/index.tpl` and `b/index.tpl`
    /// stay distinct. Each script is reported under its own path;
    /// `reported_name` is ignored.
    pub fn compile_directory(
        &self,
        dir: impl AsRef<Path>,
        extension: &str,
    ) -> Result<BTreeMap<String, GeneratedScript>> {
        let dir = dir.as_ref();
        let per_file = Compiler::new(Options {
            include_path: self.options.include_path.clone(),
            reported_name: None,
        });
        let mut scripts = BTreeMap::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|source| CompileError::Walk {
                dir: dir.display().to_string(),
                source,
            })?;
            let path = entry.path();
            if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == extension) {
                let script = per_file.compile(Source::File(path.to_path_buf()))?;
                scripts.insert(directory_key(dir, path), script);
            }
        }
        Ok(scripts)
    }
}

fn directory_key(dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(dir).unwrap_or(path).with_extension("");
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Compiles `source` with the given include path and reported name
pub fn compile(
    source: impl Into<Source>,
    include_path: &[PathBuf],
    reported_name: Option<&str>,
) -> Result<GeneratedScript> {
    Compiler::new(Options {
        include_path: include_path.to_vec(),
        reported_name: reported_name.map(str::to_string),
    })
    .compile(source.into())
}
