//! Templates with embedded code, compiled to scripts and run in isolation
//!
//! A template is opaque markup with three constructs mixed in:
//!
//! - `<?code ... ?>` runs code, verbatim, when the template is expanded
//! - `<?include file ?>` splices another template in at compile time
//! - `{$name}` or `{$name,style}` writes a variable, escaped (`xml` by default)
//!
//! Compilation produces a [`GeneratedScript`]. An [`Environment`] runs it in a
//! fresh [`Namespace`] through a [`CodeExecutor`], routing output and errors as
//! the [`ExecutionConfig`] says.
//!
//! # Example
//!
//! ```rust
//! use scriptlet::{ExecutionConfig, MiniExecutor, expand};
//!
//! let config = ExecutionConfig::new().bind("$name", "Tom & Jerry");
//! let output = expand(MiniExecutor, config, "Hello {$name}!").unwrap();
//! assert_eq!(output.as_deref(), Some("Hello Tom &#38; Jerry!"));
//! ```

extern crate self as scriptlet;

pub mod config;
pub mod environment;
pub mod error;
pub mod escape;
pub mod executor;
pub mod mini;
pub mod value;

pub use config::{ErrorSink, ExecutionConfig, OutputSink};
pub use environment::{Environment, expand};
pub use error::{ExecutionError, ExecutorFailure, Result};
pub use escape::{DEFAULT_STYLE, EscapeFn, EscapeRegistry};
pub use executor::{CodeExecutor, Context};
pub use mini::MiniExecutor;
pub use value::{Namespace, NamespaceId, Value};

pub use scriptlet_compiler as compiler;
pub use scriptlet_compiler::{
    CompileError, Compiler, GeneratedScript, IncludeWarning, Location, Op, Options, ScanError,
    Source, Statement, compile,
};

pub use scriptlet_macros::script_directory as directory;
pub use scriptlet_macros::script_file as file;
pub use scriptlet_macros::script_str as str;

#[cfg(test)]
mod tests {
    use std::{
        borrow::Cow,
        cell::{Cell, RefCell},
        collections::BTreeMap,
        fs,
        io::Write,
        rc::Rc,
    };

    use pretty_assertions::assert_eq;

    use crate::{
        CodeExecutor, CompileError, Context, EscapeRegistry, ExecutionConfig, ExecutionError,
        ExecutorFailure, Environment, GeneratedScript, MiniExecutor, NamespaceId, Result, Value,
        compile, expand,
    };

    /// A stream the test can read back after handing it to the config
    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<Vec<u8>>>);

    impl Shared {
        fn text(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Accepts writes but fails every flush
    struct FailingFlush;

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("disk full"))
        }
    }

    fn expand_str(config: ExecutionConfig, src: &str) -> Result<Option<String>> {
        expand(MiniExecutor, config, src)
    }

    #[test]
    fn basic_usage() {
        mod template {
            crate::str!("greeting", "<p>Hello {$name}!</p>");
        }
        let script = template::greeting();
        assert_eq!(script.name(), "greeting");
        let output = Environment::new(MiniExecutor)
            .run(&script, ExecutionConfig::new().bind("$name", "Tom & Jerry"))
            .unwrap();
        assert_eq!(output.as_deref(), Some("<p>Hello Tom &#38; Jerry!</p>"));
    }

    #[test]
    fn interpolation_styles() {
        let config = ExecutionConfig::new().bind("$q", "a b&<c>");
        assert_eq!(
            expand_str(config, "{$q}|{$q,raw}|{$q,uri}|{$q,bogus}").unwrap().unwrap(),
            "a b&#38;&#60;c&#62;|a b&<c>|a%20b%26%3Cc%3E|a b&#38;&#60;c&#62;"
        );
    }

    #[test]
    fn code_bindings_feed_interpolations() {
        let output = expand_str(
            ExecutionConfig::new(),
            "<?code $who = \"Tom & Jerry\"; ?>Hello {$who}!",
        )
        .unwrap();
        assert_eq!(output.as_deref(), Some("Hello Tom &#38; Jerry!"));
    }

    #[test]
    fn missing_include_produces_output_and_warning() {
        let script = compile("<?include missing.txt?>OK", &[], None).unwrap();
        assert_eq!(script.warnings().len(), 1);
        let output = Environment::new(MiniExecutor)
            .run(&script, ExecutionConfig::new())
            .unwrap();
        assert_eq!(output.as_deref(), Some("OK"));
    }

    #[test]
    fn output_follows_segment_order_across_includes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("middle.tpl"), "<?code print \"2\"; ?>{$three}").unwrap();

        let config = ExecutionConfig::new()
            .include_path([dir.path()])
            .bind("$three", "3");
        let output = expand_str(config, "1<?include middle.tpl?>4<?code print \"5\"; ?>").unwrap();
        assert_eq!(output.as_deref(), Some("12345"));
    }

    #[test]
    fn unterminated_code_never_executes() {
        struct Counting(Cell<usize>);

        impl CodeExecutor for Counting {
            fn execute(&self, _: &GeneratedScript, _: &mut Context<'_>) -> std::result::Result<(), ExecutorFailure> {
                self.0.set(self.0.get() + 1);
                Ok(())
            }
        }

        let executor = Counting(Cell::new(0));
        let err = expand(&executor, ExecutionConfig::new(), "ok\n<?code print \"x\";").unwrap_err();
        match err {
            ExecutionError::Compile(CompileError::Scan(err)) => assert_eq!(err.line, 2),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(executor.0.get(), 0);
    }

    #[test]
    fn namespaces_do_not_leak_between_runs() {
        let first = expand_str(ExecutionConfig::new(), "<?code $secret = \"s3cr3t\"; ?>[{$secret}]").unwrap();
        assert_eq!(first.as_deref(), Some("[s3cr3t]"));
        let second = expand_str(ExecutionConfig::new(), "[{$secret}]").unwrap();
        assert_eq!(second.as_deref(), Some("[]"));
    }

    #[test]
    fn reusing_one_script_gets_fresh_namespaces() {
        let script = compile("[{$n}]<?code $n = \"set\"; ?>", &[], None).unwrap();
        let environment = Environment::new(MiniExecutor);
        for _ in 0..2 {
            let output = environment.run(&script, ExecutionConfig::new()).unwrap();
            assert_eq!(output.as_deref(), Some("[]"));
        }
    }

    #[test]
    fn runtime_errors_propagate_with_authored_location() {
        let err = expand_str(
            ExecutionConfig::new().reported_name("page.html"),
            "line 1\n<?code\n\ndie \"no luck\"; ?>",
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "no luck at page.html line 4.");
    }

    #[test]
    fn runtime_errors_in_includes_name_the_included_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.tpl"), "\n<?code die \"inner\"; ?>").unwrap();

        let err = expand_str(
            ExecutionConfig::new().include_path([dir.path()]),
            "<?include broken.tpl?>",
        )
        .unwrap_err();
        match err {
            ExecutionError::Runtime { message, file, line } => {
                assert_eq!(message, "inner");
                assert!(file.ends_with("broken.tpl"));
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn errors_to_callback() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let config = ExecutionConfig::new()
            .errors_to_callback(move |error| sink.borrow_mut().push(error.to_string()));
        let output = expand_str(config, "a<?code die \"stop\"; ?>b").unwrap();
        assert_eq!(output, None);
        assert_eq!(*seen.borrow(), vec!["stop at template line 1.".to_string()]);
    }

    #[test]
    fn errors_to_stream() {
        let errors = Shared::default();
        let config = ExecutionConfig::new().errors_to_stream(errors.clone());
        assert_eq!(expand_str(config, "<?code die \"bad\"; ?>").unwrap(), None);
        assert_eq!(errors.text(), "bad at template line 1.\n");
    }

    #[test]
    fn output_to_stream_is_incremental() {
        let out = Shared::default();
        let errors = Shared::default();
        let config = ExecutionConfig::new()
            .output_stream(out.clone())
            .errors_to_stream(errors.clone());
        assert_eq!(expand_str(config, "partial<?code die \"x\"; ?>never").unwrap(), None);
        assert_eq!(out.text(), "partial");
    }

    #[test]
    fn runtime_error_reaches_its_sink_even_when_flush_fails() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let config = ExecutionConfig::new()
            .output_stream(FailingFlush)
            .errors_to_callback(move |error| sink.borrow_mut().push(error.to_string()));
        let err = expand_str(config, "x<?code die \"late\"; ?>").unwrap_err();
        assert!(matches!(err, ExecutionError::Output(_)), "{err:?}");
        assert_eq!(*seen.borrow(), vec!["late at template line 1.".to_string()]);
    }

    #[test]
    fn flush_failure_without_runtime_error_is_returned() {
        let config = ExecutionConfig::new().output_stream(FailingFlush);
        let err = expand_str(config, "fine").unwrap_err();
        assert!(matches!(err, ExecutionError::Output(_)), "{err:?}");
    }

    #[test]
    fn map_interpolation_renders_sorted_pairs() {
        let map = Value::Map(BTreeMap::from([
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1&".to_string()),
        ]));
        let config = ExecutionConfig::new().bind("%m", map);
        assert_eq!(
            expand_str(config, "[{%m}] [{%m,raw}]").unwrap().as_deref(),
            Some("[a=1&#38; b=2] [a=1& b=2]")
        );
    }

    #[test]
    fn output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.html");
        let config = ExecutionConfig::new().output_file(&path).bind("$x", "<1>");
        assert_eq!(expand_str(config, "x={$x}").unwrap(), None);
        assert_eq!(fs::read_to_string(&path).unwrap(), "x=&#60;1&#62;");
    }

    #[test]
    fn configured_namespace_id_is_used() {
        struct Probe(RefCell<Option<NamespaceId>>);

        impl CodeExecutor for Probe {
            fn execute(&self, _: &GeneratedScript, context: &mut Context<'_>) -> std::result::Result<(), ExecutorFailure> {
                *self.0.borrow_mut() = Some(context.namespace().id());
                Ok(())
            }
        }

        let id = NamespaceId::fresh();
        let probe = Probe(RefCell::new(None));
        expand(&probe, ExecutionConfig::new().namespace_id(id), "x").unwrap();
        assert_eq!(*probe.0.borrow(), Some(id));
    }

    #[test]
    fn escape_styles_resolve_at_run_time() {
        fn shout(value: &str) -> Cow<'_, str> {
            Cow::Owned(value.to_uppercase())
        }

        let script = compile("{$word,shout}", &[], None).unwrap();
        let config = || ExecutionConfig::new().bind("$word", "a&b");

        let plain = Environment::new(MiniExecutor).run(&script, config()).unwrap();
        assert_eq!(plain.as_deref(), Some("a&#38;b"));

        let mut escapes = EscapeRegistry::new();
        escapes.register("shout", shout);
        let loud = Environment::with_escapes(MiniExecutor, escapes)
            .run(&script, config())
            .unwrap();
        assert_eq!(loud.as_deref(), Some("A&B"));
    }

    #[test]
    fn plain_content_round_trips() {
        let text = "<style>p { margin: 0 }</style>\n<script>var o = {\"$a\": 1};</script>\n";
        assert_eq!(expand_str(ExecutionConfig::new(), text).unwrap().as_deref(), Some(text));
    }
}
