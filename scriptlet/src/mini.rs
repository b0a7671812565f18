//! A tiny reference executor
//!
//! [`MiniExecutor`] runs generated scripts whose code blocks use a minimal
//! command language, enough to bind variables, print and fail:
//!
//! ```text
//! $title = "Report";            # scalar assignment
//! @rows = ("a", "b", $title);   # list assignment
//! $copy = @rows;                # copies any value
//! print "text", $title;         # writes the values unescaped
//! die "message";                # fails the run at this line
//! ```
//!
//! Commands are separated by `;` and `#` starts a comment. Unbound variables
//! evaluate to the empty string. There is no control flow.

use scriptlet_compiler::{GeneratedScript, Location, Op};

use crate::{
    error::ExecutorFailure,
    executor::{CodeExecutor, Context},
    value::Value,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct MiniExecutor;

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    /// Lines passed since the start of the block
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0, line: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn bump(&mut self, c: char) {
        if c == '\n' {
            self.line += 1;
        }
        self.pos += c.len_utf8();
    }

    fn skip_space(&mut self) {
        while let Some(c) = self.rest().chars().next() {
            if c == '#' {
                let end = self.rest().find('\n').unwrap_or(self.rest().len());
                self.pos += end;
            } else if c.is_whitespace() {
                self.bump(c);
            } else {
                break;
            }
        }
    }

    fn at_end(&mut self) -> bool {
        self.skip_space();
        self.pos >= self.src.len()
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_space();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn word(&mut self) -> Option<&'a str> {
        self.skip_space();
        let rest = self.rest();
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if end == 0 {
            return None;
        }
        self.pos += end;
        Some(&rest[..end])
    }

    fn variable(&mut self) -> Option<String> {
        self.skip_space();
        let rest = self.rest();
        let sigil = rest.chars().next().filter(|c| matches!(c, '$' | '@' | '%'))?;
        let name = &rest[1..];
        let len = name
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(name.len());
        if len == 0 {
            return None;
        }
        self.pos += 1 + len;
        Some(format!("{}{}", sigil, &name[..len]))
    }

    fn string(&mut self) -> Result<Option<String>, String> {
        if !self.eat("\"") {
            return Ok(None);
        }
        let mut value = String::new();
        let mut escaped = false;
        while let Some(c) = self.rest().chars().next() {
            self.bump(c);
            match (escaped, c) {
                (true, 'n') => value.push('\n'),
                (true, 't') => value.push('\t'),
                (true, c) => value.push(c),
                (false, '\\') => {
                    escaped = true;
                    continue;
                }
                (false, '"') => return Ok(Some(value)),
                (false, c) => value.push(c),
            }
            escaped = false;
        }
        Err("unterminated string".to_string())
    }
}

fn near(cursor: &Cursor<'_>) -> String {
    let rest = cursor.rest().trim_start();
    let end = rest.find('\n').unwrap_or(rest.len()).min(20);
    let end = (0..=end).rev().find(|i| rest.is_char_boundary(*i)).unwrap_or(0);
    format!("syntax error near \"{}\"", &rest[..end])
}

fn expression(cursor: &mut Cursor<'_>, context: &Context<'_>) -> Result<Value, String> {
    if let Some(text) = cursor.string()? {
        return Ok(Value::Scalar(text));
    }
    if let Some(name) = cursor.variable() {
        return Ok(context
            .namespace()
            .get(&name)
            .cloned()
            .unwrap_or_else(|| Value::Scalar(String::new())));
    }
    if cursor.eat("(") {
        let mut items = Vec::new();
        if !cursor.eat(")") {
            loop {
                items.push(expression(cursor, context)?.to_string());
                if cursor.eat(")") {
                    break;
                }
                if !cursor.eat(",") {
                    return Err(near(cursor));
                }
            }
        }
        return Ok(Value::List(items));
    }
    Err(near(cursor))
}

/// Why a command stopped the block
enum Halt {
    /// `die` or a syntax error, reported at the command's line
    Raise(String),
    Failure(ExecutorFailure),
}

impl From<String> for Halt {
    fn from(message: String) -> Self {
        Halt::Raise(message)
    }
}

impl From<ExecutorFailure> for Halt {
    fn from(failure: ExecutorFailure) -> Self {
        Halt::Failure(failure)
    }
}

fn command(cursor: &mut Cursor<'_>, context: &mut Context<'_>) -> Result<(), Halt> {
    if let Some(name) = cursor.variable() {
        if !cursor.eat("=") {
            return Err(near(cursor).into());
        }
        let value = expression(cursor, context)?;
        context.namespace_mut().set(name, value);
        return Ok(());
    }
    let start = cursor.pos;
    match cursor.word() {
        Some("print") => loop {
            let value = expression(cursor, context)?;
            context.write_literal(&value.to_string())?;
            if !cursor.eat(",") {
                return Ok(());
            }
        },
        Some("die") => {
            let message = expression(cursor, context)?.to_string();
            Err(Halt::Raise(if message.is_empty() { "Died".to_string() } else { message }))
        }
        _ => {
            cursor.pos = start;
            Err(near(cursor).into())
        }
    }
}

/// Runs a code block starting at `at`
fn run_code(code: &str, at: &Location, context: &mut Context<'_>) -> Result<(), ExecutorFailure> {
    let mut cursor = Cursor::new(code);
    while !cursor.at_end() {
        let line = cursor.line;
        match command(&mut cursor, context) {
            Ok(()) => {}
            Err(Halt::Raise(message)) => return Err(ExecutorFailure::raised(message, at.offset(line))),
            Err(Halt::Failure(failure)) => return Err(failure),
        }
        if !cursor.eat(";") && !cursor.at_end() {
            return Err(ExecutorFailure::raised(near(&cursor), at.offset(cursor.line)));
        }
    }
    Ok(())
}

impl CodeExecutor for MiniExecutor {
    fn execute(&self, script: &GeneratedScript, context: &mut Context<'_>) -> Result<(), ExecutorFailure> {
        for statement in script.statements() {
            match &statement.op {
                Op::Write(text) => context.write_literal(text)?,
                Op::Interpolate { variable, style } => {
                    let value = context
                        .namespace()
                        .get(variable)
                        .map(Value::to_string)
                        .unwrap_or_default();
                    context.write_escaped(style.as_deref(), &value)?;
                }
                Op::Code(code) => run_code(code, &statement.marker, context)?,
            }
        }
        Ok(())
    }
}
