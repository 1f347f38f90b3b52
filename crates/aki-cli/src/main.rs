//! Aki CLI - command-line interface and REPL for the Aki language

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

use aki_core::{JitEngine, Session, TypeInterner};

mod config;
mod driver;
mod repl;

use config::ReplConfig;

#[derive(Parser)]
#[command(name = "aki")]
#[command(version = aki_core::VERSION)]
#[command(about = "The Aki interactive language", long_about = None)]
struct Cli {
    /// Read settings from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter directives, e.g. "debug" or "aki_core=trace"
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive REPL
    Repl,

    /// Evaluate one fragment
    Eval {
        /// Source text to evaluate
        source: String,
    },

    /// Run a source file as a single fragment
    Run {
        /// Path to the source file
        file: PathBuf,
    },

    /// Lower a source file without running it and print the module IR
    Dump {
        /// Path to the source file
        file: PathBuf,
    },

    /// Run the built-in conformance suite
    Test,

    /// Run the demo commands
    Demo,

    /// Show the effective configuration
    Config {
        /// Write it to the default config file
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = ReplConfig::load(cli.config.as_deref());
    init_logging(&log_directives(
        cli.log.as_deref(),
        env_filter_var("AKI_LOG"),
        env_filter_var("RUST_LOG"),
        &config.log_filter,
    ));

    let succeeded = match cli.command.unwrap_or(Commands::Repl) {
        Commands::Repl => {
            let mut repl = repl::Repl::new(config, cli.config)?;
            repl.run()?;
            true
        }

        Commands::Eval { source } => eval_source(&source)?,

        Commands::Run { file } => eval_source(&read_source(&file)?)?,

        Commands::Dump { file } => dump_file(&file)?,

        Commands::Test => {
            let mut engine = JitEngine::new()?;
            driver::run_tests(&mut engine, &Rc::new(TypeInterner::new()))
        }

        Commands::Demo => {
            let mut engine = JitEngine::new()?;
            driver::run_demo(&mut engine, &Rc::new(TypeInterner::new()));
            true
        }

        Commands::Config { write } => {
            print!("{}", toml::to_string_pretty(&config)?);
            if write {
                let path = config.save().context("Failed to write config")?;
                println!("# written to {}", path.display());
            }
            true
        }
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file '{}'", path.display()))
}

/// Evaluate one fragment in a fresh session; returns whether it succeeded
fn eval_source(source: &str) -> Result<bool> {
    let mut engine = JitEngine::new()?;
    let mut session = Session::for_engine(Rc::new(TypeInterner::new()), &engine);
    let result = driver::evaluate(&mut session, &mut engine, source, false);
    Ok(driver::report(&result, source))
}

fn dump_file(path: &Path) -> Result<bool> {
    let source = read_source(path)?;
    let engine = JitEngine::new()?;
    let mut session = Session::for_engine(Rc::new(TypeInterner::new()), &engine);
    match session.compile(&source) {
        Ok(_) => {
            print!("{}", session.dump());
            Ok(true)
        }
        Err(err) => {
            eprintln!("{}", err.render(&source));
            Ok(false)
        }
    }
}

fn env_filter_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Pick the log filter: `--log`, then `AKI_LOG`, then `RUST_LOG`, then the config
fn log_directives(
    flag: Option<&str>,
    aki_log: Option<String>,
    rust_log: Option<String>,
    configured: &str,
) -> String {
    flag.map(str::to_string)
        .or(aki_log)
        .or(rust_log)
        .unwrap_or_else(|| configured.to_string())
}

fn init_logging(directives: &str) {
    let filter = EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_repl() {
        let cli = Cli::try_parse_from(["aki"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["aki", "eval", "2+2"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Eval { source }) if source == "2+2"));

        let cli = Cli::try_parse_from(["aki", "dump", "prog.aki", "--log", "debug"]).unwrap();
        assert_eq!(cli.log.as_deref(), Some("debug"));
        assert!(
            matches!(cli.command, Some(Commands::Dump { file }) if file == Path::new("prog.aki"))
        );

        let cli = Cli::try_parse_from(["aki", "--config", "/tmp/repl.toml", "test"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/repl.toml")));
        assert!(matches!(cli.command, Some(Commands::Test)));

        assert!(Cli::try_parse_from(["aki", "eval"]).is_err());
        assert!(Cli::try_parse_from(["aki", "frobnicate"]).is_err());
    }

    #[test]
    fn test_log_filter_precedence() {
        let env = || Some("info".to_string());
        assert_eq!(log_directives(Some("trace"), env(), env(), "warn"), "trace");
        assert_eq!(
            log_directives(None, Some("debug".into()), env(), "warn"),
            "debug"
        );
        assert_eq!(log_directives(None, None, env(), "warn"), "info");
        assert_eq!(log_directives(None, None, None, "error"), "error");
    }

    #[test]
    fn test_eval_and_dump() {
        assert!(eval_source("2 + 2").unwrap());
        assert!(!eval_source("2 == True").unwrap());

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("prog.aki");
        std::fs::write(&file, "def f() { 1 }\nf() + 1\n").unwrap();
        assert!(dump_file(&file).unwrap());
        assert!(dump_file(&dir.path().join("missing.aki")).is_err());
    }
}
