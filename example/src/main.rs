use scriptlet::{Environment, ExecutionConfig, MiniExecutor, Value};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod templates {
    scriptlet::directory!("templates/");
    scriptlet::file!("pages/about.tpl");
    //language=html
    scriptlet::str!("hello_first_last", r#"
        <p>Hello {$firstname} {$lastname,raw}</p>
    "#);
}


fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let environment = Environment::new(MiniExecutor);

    let rows = Value::List(vec!["alpha".to_string(), "beta".to_string(), "gamma".to_string()]);
    let config = ExecutionConfig::new()
        .bind("$title", "Weekly <report>")
        .bind("$owner", "Tom & Jerry")
        .bind("$query", "cats & dogs")
        .bind("@rows", rows);
    print_or_log("report", environment.run(&templates::report(), config));

    let config = ExecutionConfig::new().bind("$site", "scriptlet");
    print_or_log("about", environment.run(&templates::about(), config));

    let config = ExecutionConfig::new()
        .bind("$firstname", "King")
        .bind("$lastname", "<b>Tubby</b>");
    print_or_log(
        "hello_first_last",
        environment.run(&templates::hello_first_last(), config),
    );

    // the runtime error itself goes to stderr; only output failures come back here
    let config = ExecutionConfig::new().errors_to_stream(std::io::stderr());
    print_or_log("broken", environment.run(&templates::broken(), config));
}

fn print_or_log(template: &str, result: scriptlet::Result<Option<String>>) {
    match result {
        Ok(Some(html)) => println!("{}", html),
        Ok(None) => info!(template, "no captured output"),
        Err(err) => error!(template, %err, "template failed"),
    }
}
