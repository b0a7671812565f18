//! Template scanning
//!
//! Splits template text into [`Segment`]s in a single left-to-right pass. Three
//! constructs are recognised:
//!
//! - Code blocks: `<?code ... ?>`
//! - Includes: `<?include path/to/file ?>`
//! - Interpolations: `{$name}` or `{$name,style}`, with `@` and `%` sigils too
//!
//! Everything else is literal text. Interpolation syntax is deliberately
//! conservative: a `{` only opens an interpolation when followed by a sigil and
//! a word character, and the bracketed text must match the variable grammar
//! exactly. Anything else, CSS and JSON braces included, passes through as
//! literal text.
//!
//! # Examples
//!
//! ```rust
//! use scriptlet_compiler::{scan, Segment};
//!
//! let document = scan("Hello {$name}!", "hello").unwrap();
//! assert_eq!(document.segments.len(), 3);
//! assert!(matches!(&document.segments[1], Segment::Interpolation { variable, .. } if variable == "$name"));
//! ```

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::{
    error::{ScanError, TokenKind},
    segment::{Document, Location, Segment},
};

pub const CODE_OPEN: &str = "<?code";
pub const INCLUDE_OPEN: &str = "<?include";
pub const DIRECTIVE_CLOSE: &str = "?>";
pub const SIGILS: [char; 3] = ['$', '@', '%'];

static INTERPOLATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{([$@%]\w+)(?:,(\w+))?\}$").unwrap());

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether `src` starts with `{`, a sigil and a word character
fn opens_interpolation(src: &str) -> bool {
    let mut chars = src.chars();
    chars.next() == Some('{')
        && chars.next().is_some_and(|c| SIGILS.contains(&c))
        && chars.next().is_some_and(is_word)
}

/// Whether `src` starts with `opener` followed by whitespace, `?>` or the end
/// of input, so `<?codex` or `<?includes` stay literal
fn opens_directive(src: &str, opener: &str) -> bool {
    src.strip_prefix(opener).is_some_and(|after| {
        after.is_empty()
            || after.starts_with(DIRECTIVE_CLOSE)
            || after.starts_with(char::is_whitespace)
    })
}

struct Scanner<'a> {
    src: &'a str,
    name: Arc<str>,
    pos: usize,
    line: usize,
    literal: String,
    literal_line: usize,
    segments: Vec<Segment>,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str, name: Arc<str>) -> Self {
        Self {
            src,
            name,
            pos: 0,
            line: 1,
            literal: String::new(),
            literal_line: 1,
            segments: Vec::new(),
        }
    }

    fn here(&self) -> Location {
        Location::new(self.name.clone(), self.line)
    }

    /// Moves forward `len` bytes, counting the newlines passed over
    fn advance(&mut self, len: usize) {
        let end = self.pos + len;
        self.line += self.src[self.pos..end].matches('\n').count();
        self.pos = end;
    }

    /// Accumulates the next `len` bytes as literal text
    fn take_literal(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        if self.literal.is_empty() {
            self.literal_line = self.line;
        }
        self.literal.push_str(&self.src[self.pos..self.pos + len]);
        self.advance(len);
    }

    fn flush_literal(&mut self) {
        if self.literal.is_empty() {
            return;
        }
        self.segments.push(Segment::Literal {
            text: std::mem::take(&mut self.literal),
            at: Location::new(self.name.clone(), self.literal_line),
        });
    }

    /// Consumes `<?code ... ?>` or `<?include ... ?>` at the current position
    fn directive(&mut self, token: TokenKind, opener: &str) -> Result<(), ScanError> {
        let src = self.src;
        let rest = &src[self.pos..];
        let body = &rest[opener.len()..];
        let end = body
            .find(DIRECTIVE_CLOSE)
            .ok_or_else(|| ScanError::unterminated(token, &self.name, self.line, rest))?;
        let content = &body[..end];
        self.flush_literal();
        let at = self.here();
        self.segments.push(match token {
            TokenKind::Include => Segment::Include {
                path: content.trim().to_string(),
                at,
            },
            _ => Segment::Code {
                text: content.to_string(),
                at,
            },
        });
        self.advance(opener.len() + end + DIRECTIVE_CLOSE.len());
        Ok(())
    }

    /// Consumes an interpolation at the current position, or a lone `{` when
    /// the bracketed text doesn't match the variable grammar
    fn interpolation(&mut self) -> Result<(), ScanError> {
        let src = self.src;
        let rest = &src[self.pos..];
        let close = rest.find('}').ok_or_else(|| {
            ScanError::unterminated(TokenKind::Interpolation, &self.name, self.line, rest)
        })?;
        let candidate = &rest[..=close];
        match INTERPOLATION.captures(candidate) {
            Some(captures) => {
                self.flush_literal();
                self.segments.push(Segment::Interpolation {
                    variable: captures[1].to_string(),
                    style: captures.get(2).map(|style| style.as_str().to_string()),
                    at: self.here(),
                });
                self.advance(candidate.len());
            }
            None => self.take_literal(1),
        }
        Ok(())
    }

    fn run(mut self) -> Result<Document, ScanError> {
        let src = self.src;
        while self.pos < src.len() {
            let rest = &src[self.pos..];
            let Some(start) = rest.find(['<', '{']) else {
                self.take_literal(rest.len());
                break;
            };
            self.take_literal(start);
            let rest = &src[self.pos..];
            if opens_directive(rest, INCLUDE_OPEN) {
                self.directive(TokenKind::Include, INCLUDE_OPEN)?;
            } else if opens_directive(rest, CODE_OPEN) {
                self.directive(TokenKind::Code, CODE_OPEN)?;
            } else if opens_interpolation(rest) {
                self.interpolation()?;
            } else {
                self.take_literal(1);
            }
        }
        self.flush_literal();
        Ok(Document {
            name: self.name,
            segments: self.segments,
        })
    }
}

/// Scans template text into a [`Document`]
///
/// `name` is the display name carried into every segment's location.
pub fn scan(text: &str, name: impl Into<Arc<str>>) -> Result<Document, ScanError> {
    Scanner::new(text, name.into()).run()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn at(line: usize) -> Location {
        Location::new("t", line)
    }

    fn segments(src: &str) -> Vec<Segment> {
        scan(src, "t").unwrap().segments
    }

    #[test]
    fn plain_text_is_one_literal() {
        assert_eq!(
            segments("<p>Hello</p>\n"),
            vec![Segment::Literal {
                text: "<p>Hello</p>\n".to_string(),
                at: at(1)
            }]
        );
    }

    #[test]
    fn empty_template_has_no_segments() {
        assert_eq!(segments(""), Vec::<Segment>::new());
    }

    #[test]
    fn interpolation_with_and_without_style() {
        assert_eq!(
            segments("Hello {$name}, {@items,raw}"),
            vec![
                Segment::Literal {
                    text: "Hello ".to_string(),
                    at: at(1)
                },
                Segment::Interpolation {
                    variable: "$name".to_string(),
                    style: None,
                    at: at(1)
                },
                Segment::Literal {
                    text: ", ".to_string(),
                    at: at(1)
                },
                Segment::Interpolation {
                    variable: "@items".to_string(),
                    style: Some("raw".to_string()),
                    at: at(1)
                },
            ]
        );
    }

    #[test]
    fn code_and_include_track_lines() {
        assert_eq!(
            segments("a\n<?code $x = \"1\";\n$y = \"2\"; ?>\n<?include  header.tpl ?>b"),
            vec![
                Segment::Literal {
                    text: "a\n".to_string(),
                    at: at(1)
                },
                Segment::Code {
                    text: " $x = \"1\";\n$y = \"2\"; ".to_string(),
                    at: at(2)
                },
                Segment::Literal {
                    text: "\n".to_string(),
                    at: at(3)
                },
                Segment::Include {
                    path: "header.tpl".to_string(),
                    at: at(4)
                },
                Segment::Literal {
                    text: "b".to_string(),
                    at: at(4)
                },
            ]
        );
    }

    #[test]
    fn css_and_json_braces_are_literal() {
        let src = "body { color: red; } {\"a\": {$ not a var}} {$a + 1} {$x,} <p>";
        assert_eq!(
            segments(src),
            vec![Segment::Literal {
                text: src.to_string(),
                at: at(1)
            }]
        );
    }

    #[test]
    fn rejected_brace_does_not_hide_following_interpolation() {
        assert_eq!(
            segments("{$a {$b}"),
            vec![
                Segment::Literal {
                    text: "{$a ".to_string(),
                    at: at(1)
                },
                Segment::Interpolation {
                    variable: "$b".to_string(),
                    style: None,
                    at: at(1)
                },
            ]
        );
    }

    #[test]
    fn unterminated_code_block_names_opening_line() {
        let err = scan("line one\n\n<?code $x = 1;\nmore", "page.tpl").unwrap_err();
        assert_eq!(err.token, TokenKind::Code);
        assert_eq!(err.line, 3);
        assert_eq!(err.name, "page.tpl");
        assert!(err.to_string().starts_with("unterminated code block at page.tpl line 3"));
    }

    #[test]
    fn unterminated_include_and_interpolation() {
        assert_eq!(
            scan("<?include foo", "t").unwrap_err().token,
            TokenKind::Include
        );
        let err = scan("one\ntwo {$name", "t").unwrap_err();
        assert_eq!(err.token, TokenKind::Interpolation);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn angle_brackets_without_directive_are_literal() {
        assert_eq!(
            segments("<?xml version=\"1.0\"?><a/>"),
            vec![Segment::Literal {
                text: "<?xml version=\"1.0\"?><a/>".to_string(),
                at: at(1)
            }]
        );
    }

    #[test]
    fn directive_names_need_a_boundary() {
        let src = "<?codex not code ?><?code-style x?><?includes y ?>";
        assert_eq!(
            segments(src),
            vec![Segment::Literal {
                text: src.to_string(),
                at: at(1)
            }]
        );
        assert_eq!(
            segments("<?code?>a<?code\tb?>"),
            vec![
                Segment::Code {
                    text: String::new(),
                    at: at(1)
                },
                Segment::Literal {
                    text: "a".to_string(),
                    at: at(1)
                },
                Segment::Code {
                    text: "\tb".to_string(),
                    at: at(1)
                },
            ]
        );
    }

    #[test]
    fn line_numbers_never_decrease() {
        let document = scan("a\n{$b}\n<?code c ?>\n\n{$d,uri}\ne", "t").unwrap();
        let lines: Vec<usize> = document.segments.iter().map(|s| s.location().line).collect();
        assert!(lines.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(lines, vec![1, 2, 2, 3, 3, 5, 5]);
    }
}
