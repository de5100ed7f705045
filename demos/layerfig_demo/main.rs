//! # layerfig demo application
//!
//! A sample CLI tool that wires three sources into one parser: a TOML file in
//! the working directory, `LAYERFIG_DEMO_*` environment variables and the
//! command line. It exists to demonstrate and manually verify layerfig's
//! accumulation rules.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example layerfig_demo -- --name demo
//! cargo run --example layerfig_demo -- --name demo --verbose --verbose --plugin metrics
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                 | How to exercise it                                                   |
//! |-------------------------|----------------------------------------------------------------------|
//! | Defaults                | `cargo run --example layerfig_demo -- --name demo`                   |
//! | Required item           | `cargo run --example layerfig_demo` fails: `name` is never mentioned |
//! | Config file (priority 0)| Create `layerfig-demo.toml` in cwd with `port = 3000`                |
//! | Strict file keys        | A typo in `layerfig-demo.toml` fails with an unknown key error       |
//! | Env vars (priority 10)  | `LAYERFIG_DEMO_PORT=4000 cargo run --example layerfig_demo`          |
//! | CLI (priority 20)       | `cargo run --example layerfig_demo -- --port 5000`                   |
//! | Append across sources   | `plugins = ["a"]` in the file, then `-- --plugin b`                  |
//! | Counting flags          | `-- --verbose --verbose`                                             |
//! | Shared dest             | `-- --no-color --color` ends up `color = true`: last flag wins      |
//! | Choices                 | `-- --log-level loud` fails with a choice error                      |

use std::process::ExitCode;

use clap::Command;
use serde::Deserialize;
use serde_json::{Value, json};

use layerfig::{
    Action, Arity, ClapSource, ConfigParser, ItemSpec, LayerfigError, MapSource, coerce,
};

const FILE_NAME: &str = "layerfig-demo.toml";
const ENV_PREFIX: &str = "LAYERFIG_DEMO_";

#[derive(Debug, Deserialize)]
struct DemoConfig {
    name: String,
    host: String,
    port: u16,
    log_level: String,
    plugins: Vec<String>,
    color: bool,
    verbose: Option<u8>,
}

fn items() -> Result<Vec<ItemSpec>, LayerfigError> {
    Ok(vec![
        ItemSpec::builder("name")
            .required(true)
            .help("Instance name")
            .build()?,
        ItemSpec::builder("host")
            .default("127.0.0.1")
            .help("Address to bind")
            .build()?,
        ItemSpec::builder("port")
            .coerce(coerce::integer())
            .default(8080)
            .help("Port to bind")
            .build()?,
        ItemSpec::builder("log_level")
            .choices(["quiet", "info", "debug"])
            .default("info")
            .help("Log level")
            .build()?,
        ItemSpec::builder("plugin")
            .dest("plugins")
            .action(Action::Append)
            .default(json!(["core"]))
            .help("Enable a plugin (repeatable)")
            .build()?,
        ItemSpec::builder("plugins")
            .action(Action::Extend)
            .arity(Arity::ZeroOrMore)
            .exclude_sources(["cli"])
            .build()?,
        ItemSpec::builder("color")
            .action(Action::StoreTrue)
            .help("Colored output")
            .build()?,
        ItemSpec::builder("no_color")
            .dest("color")
            .action(Action::StoreFalse)
            .help("Plain output")
            .build()?,
        ItemSpec::builder("verbose")
            .action(Action::Count)
            .help("More output (repeatable)")
            .build()?,
    ])
}

fn file_source() -> Result<Option<MapSource>, LayerfigError> {
    let Ok(content) = std::fs::read_to_string(FILE_NAME) else {
        return Ok(None);
    };
    let table: toml::Table = content.parse().map_err(|e: toml::de::Error| LayerfigError::Source {
        id: "file".into(),
        reason: e.to_string(),
    })?;
    Ok(Some(MapSource::from_toml(table).with_id("file").strict(true)))
}

fn env_source() -> MapSource {
    let vars = std::env::vars().filter_map(|(key, value)| {
        key.strip_prefix(ENV_PREFIX)
            .map(|name| (name.to_lowercase(), Value::String(value)))
    });
    MapSource::new(vars).with_id("env").with_priority(10)
}

fn run() -> Result<(), LayerfigError> {
    let mut parser = ConfigParser::new();
    for item in items()? {
        parser.add_item(item)?;
    }

    let command = ClapSource::augment(
        Command::new("layerfig-demo").about("Layered config demo"),
        parser.items(),
    )?;
    let matches = command.get_matches();

    if let Some(file) = file_source()? {
        parser.add_source(file);
    }
    parser.add_source(env_source());
    parser.add_source(ClapSource::new(matches));

    let ns = parser.parse()?;
    println!("{ns}");

    let config: DemoConfig = ns.deserialize()?;
    println!();
    println!(
        "{} on {}:{} [log: {}, color: {}, plugins: {}]",
        config.name,
        config.host,
        config.port,
        config.log_level,
        config.color,
        config.plugins.join(",")
    );
    if config.verbose.unwrap_or(0) > 1 {
        println!("{config:#?}");
    }
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
