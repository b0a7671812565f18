//! Template compiler for `scriptlet`
//!
//! Turns templates into [`GeneratedScript`]s: an ordered list of "write this
//! text", "run this code" and "write this escaped value" statements, each
//! carrying the authored file and line it came from. Running the script is the
//! job of the `scriptlet` crate.
//!
//! # Module Structure
//!
//! - `scanner.rs`: Splits template text into segments
//! - `include.rs`: Splices included files into a document
//! - `generator.rs`: Generates the script from a resolved document
//! - `compiler.rs`: The whole pipeline behind one entry point
//! - `segment.rs`: The scanned document model
//! - `error.rs`: Error and warning types

pub mod compiler;
pub mod error;
pub mod generator;
pub mod include;
pub mod scanner;
pub mod segment;

pub use compiler::{Compiler, DEFAULT_NAME, Options, Source, compile};
pub use error::{CompileError, IncludeWarning, Result, ScanError, TokenKind};
pub use generator::{GeneratedScript, Op, Statement, generate};
pub use include::Resolver;
pub use scanner::scan;
pub use segment::{Document, Location, Segment};
