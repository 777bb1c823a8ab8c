use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use skal_app::{
    App, AppBuilder, AppConfig, ArgValue, Application, CommandArgs, CommandError, CommandResult,
    FlagOptions, FlagTable, HandlerTable, LoaderChain, Member, Method, Module, ModuleRegistry,
    command,
};
use tracing::debug;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming an optional YAML config file.
const CONFIG_ENV: &str = "SKAL_CONFIG";
/// Environment variable holding the log filter.
const LOG_ENV: &str = "SKAL_LOG";
/// How long `wait` waits for Ctrl-C before giving up.
const WAIT_LIMIT: Duration = Duration::from_secs(30);

/// The demo application; its methods are listed in [`Application::methods`].
struct Demo;

impl Application for Demo {
    fn doc(&self) -> Option<String> {
        Some(
            "Demo of subcommand applications

            Commands come from the application's own methods, from the
            built-in greetings module, and from any manifests named in the
            configuration file."
                .to_string(),
        )
    }

    fn version(&self) -> Option<String> {
        Some(PACKAGE_VERSION.to_string())
    }

    fn flags(&self) -> Option<FlagTable> {
        Some(
            FlagTable::new()
                .flag("-b", FlagOptions::store_true().with_help("bool argument"))
                .flag(
                    ("-s", "--string"),
                    FlagOptions::new().with_help("string argument with long name"),
                ),
        )
    }

    fn methods(&self) -> Vec<Method<Self>> {
        vec![
            Method::new("first", Demo::first)
                .with_doc("first command")
                .command(command(None)),
            Method::new("second", Demo::second).with_doc("second command, not exposed"),
            Method::new("third", Demo::third)
                .with_doc(
                    "third command

                    Takes its own flags.",
                )
                .command(command(
                    FlagTable::new()
                        .flag("-i", FlagOptions::store_true().with_help("bool argument"))
                        .flag(
                            ("-t", "--test"),
                            FlagOptions::new().with_help("string argument"),
                        ),
                )),
            Method::new("show", Demo::show)
                .with_doc("print a file")
                .command(command(
                    FlagTable::new().flag("path", FlagOptions::new().with_help("file to print")),
                )),
            Method::new("ctrlc", Demo::ctrlc)
                .with_doc("behave as if interrupted")
                .command(command(None)),
            Method::new("wait", Demo::wait)
                .with_doc("wait until interrupted with Ctrl-C")
                .command(command(None)),
            Method::new("no_doc", Demo::no_doc).command(command(None)),
        ]
    }
}

impl Demo {
    fn first(&self, args: &CommandArgs) -> CommandResult {
        println!(
            "first b={} string={}",
            args.flag("b"),
            args.value("string").unwrap_or("-")
        );
        Ok(())
    }

    fn second(&self, _args: &CommandArgs) -> CommandResult {
        println!("second");
        Ok(())
    }

    fn third(&self, args: &CommandArgs) -> CommandResult {
        println!(
            "third i={} test={}",
            args.flag("i"),
            args.value("test").unwrap_or("-")
        );
        Ok(())
    }

    fn show(&self, args: &CommandArgs) -> CommandResult {
        let path = args
            .value("path")
            .ok_or_else(|| CommandError::failed("no path given"))?;
        print!("{}", fs::read_to_string(path)?);
        Ok(())
    }

    fn ctrlc(&self, _args: &CommandArgs) -> CommandResult {
        Err(CommandError::Interrupted)
    }

    fn wait(&self, args: &CommandArgs) -> CommandResult {
        println!("waiting");
        let deadline = Instant::now() + WAIT_LIMIT;
        while !args.interrupted() {
            if Instant::now() >= deadline {
                return Err(CommandError::failed("not interrupted in time"));
            }
            thread::sleep(Duration::from_millis(10));
        }
        debug!("wait interrupted");
        Ok(())
    }

    fn no_doc(&self, _args: &CommandArgs) -> CommandResult {
        println!("no_doc");
        Ok(())
    }
}

fn greetings() -> Module {
    Module::new("greetings")
        .with_doc("Greeting commands")
        .with_version("1.0")
        .with_flags(FlagTable::new().flag("--loud", FlagOptions::store_true().with_help("shout")))
        .member(
            Member::new("hello", |args| {
                let greeting = format!("Hello, {}!", args.value("name").unwrap_or("world"));
                if args.flag("loud") {
                    println!("{}", greeting.to_uppercase());
                } else {
                    println!("{greeting}");
                }
                Ok(())
            })
            .with_doc("say hello")
            .command(command(
                FlagTable::new().flag(
                    ("-n", "--name"),
                    FlagOptions::new().with_default("world").with_help("who to greet"),
                ),
            )),
        )
}

/// Prints the command path and every collected value.
fn echo(args: &CommandArgs) -> CommandResult {
    let values: Vec<String> = args
        .iter()
        .map(|(dest, value)| format!("{dest}={}", render_value(value)))
        .collect();
    println!("{}: {}", args.path().join(" "), values.join(" "));
    Ok(())
}

fn render_value(value: &ArgValue) -> String {
    match value {
        ArgValue::Switch(on) => on.to_string(),
        ArgValue::Count(n) => n.to_string(),
        ArgValue::Value(Some(v)) => v.clone(),
        ArgValue::Value(None) => "-".to_string(),
        ArgValue::Values(vs) => vs.join(","),
    }
}

fn handlers() -> HandlerTable {
    HandlerTable::new().with("echo", echo)
}

fn load_config() -> Result<Option<(AppConfig, PathBuf)>, String> {
    let Some(path) = std::env::var_os(CONFIG_ENV).map(PathBuf::from) else {
        return Ok(None);
    };
    let config = AppConfig::load(&path)
        .map_err(|e| format!("failed to load config '{}': {e}", path.display()))?;
    let base = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    Ok(Some((config, base)))
}

fn build_app(config: Option<&(AppConfig, PathBuf)>) -> App {
    let mut loader = LoaderChain::new()
        .with(ModuleRegistry::new().register("greetings", || Ok(greetings())));
    let mut builder = AppBuilder::for_application(Demo).subcommand_modules(["greetings"]);

    if let Some((config, base)) = config {
        if let Some(manifests) = config.manifest_loader(base, handlers()) {
            debug!(dir = %manifests.dir().display(), "using manifest directory");
            loader.push(manifests);
        }
        builder = builder.config(config);
    }

    builder.loader(loader).build()
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    build_app(config.as_ref()).run()
}
