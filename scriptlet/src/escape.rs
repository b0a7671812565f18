//! Escaping styles
//!
//! An [`EscapeRegistry`] maps style names to pure escaping functions. Scripts
//! only carry the style name; the lookup happens when the script runs, and an
//! unknown or missing name falls back to [`DEFAULT_STYLE`] rather than failing.
//!
//! Built-in styles:
//!
//! - `xml`: `& < > " '` become numeric character references
//! - `uri`: every byte outside `A-Z a-z 0-9 - _ . ~` is percent-encoded
//! - `raw`: the value unchanged

use std::{borrow::Cow, collections::HashMap, sync::LazyLock};

use regex::{Captures, Regex};

/// Style used when an interpolation names none, or names an unknown one
pub static DEFAULT_STYLE: &str = "xml";

/// A pure escaping function
pub type EscapeFn = fn(&str) -> Cow<'_, str>;

static XML_SPECIAL: LazyLock<Regex> = LazyLock::new(|| Regex::new("[&<>\"']").unwrap());

pub fn xml(value: &str) -> Cow<'_, str> {
    XML_SPECIAL.replace_all(value, |captures: &Captures| {
        let c = captures[0].chars().next().unwrap_or_default();
        format!("&#{};", c as u32)
    })
}

pub fn uri(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

pub fn raw(value: &str) -> Cow<'_, str> {
    Cow::Borrowed(value)
}

/// Style name to escaping function
///
/// Built once and shared read-only; cloning is cheap enough to give each
/// environment its own copy.
#[derive(Debug, Clone)]
pub struct EscapeRegistry {
    styles: HashMap<String, EscapeFn>,
}

impl EscapeRegistry {
    /// A registry holding the built-in styles
    pub fn new() -> Self {
        let mut registry = Self {
            styles: HashMap::new(),
        };
        registry
            .register(DEFAULT_STYLE, xml)
            .register("uri", uri)
            .register("raw", raw);
        registry
    }

    /// Adds or replaces a style
    pub fn register(&mut self, name: impl Into<String>, escape: EscapeFn) -> &mut Self {
        self.styles.insert(name.into(), escape);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.styles.contains_key(name)
    }

    /// The function for `style`, falling back to the default style
    pub fn lookup(&self, style: Option<&str>) -> EscapeFn {
        style
            .and_then(|name| self.styles.get(name))
            .or_else(|| self.styles.get(DEFAULT_STYLE))
            .copied()
            .unwrap_or(xml)
    }

    pub fn escape<'a>(&self, style: Option<&str>, value: &'a str) -> Cow<'a, str> {
        self.lookup(style)(value)
    }
}

impl Default for EscapeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
