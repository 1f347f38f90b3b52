//! REPL (Read-Eval-Print Loop) for Aki
//!
//! Lines starting with `.` are directives; everything else is a fragment
//! lowered and run in the current session.

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use aki_core::{JitEngine, Session, TypeInterner};

use crate::config::ReplConfig;
use crate::driver;

/// Result of processing a REPL command
#[derive(Debug, PartialEq, Eq)]
enum CommandResult {
    /// Not a directive; evaluate the input
    Continue,
    /// Exit the REPL
    Exit,
    /// Input was handled as a directive
    Handled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Directive {
    Reset,
    Reload,
    Quit,
    Dump,
    Help,
    Test,
    Demo,
    Unknown(String),
}

impl Directive {
    /// `None` when `input` is not a directive
    fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if !trimmed.starts_with('.') {
            return None;
        }

        let directive = match trimmed {
            "." => Directive::Reset,
            ".." => Directive::Reload,
            ".q" | ".quit" | ".exit" => Directive::Quit,
            ".d" | ".dump" => Directive::Dump,
            ".h" | ".help" | ".?" => Directive::Help,
            ".t" | ".test" => Directive::Test,
            ".demo" => Directive::Demo,
            other => Directive::Unknown(other.to_string()),
        };
        Some(directive)
    }
}

/// The Aki REPL
pub struct Repl {
    config: ReplConfig,
    /// Explicit `--config` path, re-read on reload
    config_path: Option<PathBuf>,
    types: Rc<TypeInterner>,
    engine: JitEngine,
    session: Session,
    editor: DefaultEditor,
}

impl Repl {
    pub fn new(config: ReplConfig, config_path: Option<PathBuf>) -> Result<Self> {
        let types = Rc::new(TypeInterner::new());
        let engine = JitEngine::new()?;
        let session = Session::for_engine(Rc::clone(&types), &engine);
        let mut editor = DefaultEditor::new()?;

        if let Some(history) = &config.history_file {
            let _ = editor.load_history(history);
        }

        Ok(Self {
            config,
            config_path,
            types,
            engine,
            session,
            editor,
        })
    }

    /// Run the REPL loop
    pub fn run(&mut self) -> Result<()> {
        if self.config.banner {
            println!("Aki v{}", aki_core::VERSION);
            println!("Type .help for help, .quit to exit");
            println!();
        }

        loop {
            match self.read_input() {
                Ok(Some(input)) => match self.handle_command(&input) {
                    CommandResult::Exit => break,
                    CommandResult::Handled => {}
                    CommandResult::Continue => self.eval_and_print(&input),
                },
                Ok(None) => {}
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("Error reading input: {err}");
                    break;
                }
            }
        }

        if let Some(history) = &self.config.history_file {
            if let Err(err) = self.editor.save_history(history) {
                tracing::warn!(path = %history.display(), "could not save history: {err}");
            }
        }

        Ok(())
    }

    /// Read one fragment, continuing while brackets are open
    fn read_input(&mut self) -> Result<Option<String>, ReadlineError> {
        let mut input = String::new();
        let mut prompt = self.config.prompt.clone();

        loop {
            let line = self.editor.readline(&prompt)?;

            if input.is_empty() && line.trim().is_empty() {
                return Ok(None);
            }

            if !input.is_empty() {
                input.push('\n');
            }
            input.push_str(&line);

            if is_complete(&input) {
                let _ = self.editor.add_history_entry(&input);
                return Ok(Some(input));
            }

            prompt.clone_from(&self.config.continuation_prompt);
        }
    }

    fn handle_command(&mut self, input: &str) -> CommandResult {
        let Some(directive) = Directive::parse(input) else {
            return CommandResult::Continue;
        };

        match directive {
            Directive::Quit => return CommandResult::Exit,
            Directive::Reset => {
                self.session.reset();
                println!("Session reset");
            }
            Directive::Reload => match self.reload() {
                Ok(()) => println!("Reloaded"),
                Err(err) => eprintln!("Reload failed: {err}"),
            },
            Directive::Dump => print!("{}", self.session.dump()),
            Directive::Help => print_help(),
            Directive::Test => {
                driver::run_tests(&mut self.engine, &self.types);
            }
            Directive::Demo => driver::run_demo(&mut self.engine, &self.types),
            Directive::Unknown(name) => {
                println!("Unknown directive: {name}");
                println!("Type .help for available directives");
            }
        }
        CommandResult::Handled
    }

    /// Re-read the config and rebuild the engine and session
    fn reload(&mut self) -> Result<()> {
        let engine = JitEngine::new()?;
        self.config = ReplConfig::load(self.config_path.as_deref());
        self.session = Session::for_engine(Rc::clone(&self.types), &engine);
        self.engine = engine;
        tracing::debug!("engine and session rebuilt");
        Ok(())
    }

    fn eval_and_print(&mut self, input: &str) {
        let result = driver::evaluate(
            &mut self.session,
            &mut self.engine,
            input,
            self.config.show_ir,
        );
        driver::report(&result, input);
    }
}

/// Check if the input is complete (balanced parens and braces)
fn is_complete(input: &str) -> bool {
    let mut depth = 0i32;
    for c in input.chars() {
        match c {
            '(' | '{' => depth += 1,
            ')' | '}' => depth -= 1,
            _ => {}
        }
    }
    // Surplus closers are left for the parser to report
    depth <= 0
}

fn print_help() {
    println!(
        r"
Aki REPL Directives:
  .help, .h, .?    Show this help message
  .quit, .q        Exit the REPL
  .                Reset the session (forget all functions)
  ..               Reload config and rebuild the JIT engine
  .dump, .d        Print the IR of the current module
  .test, .t        Run the built-in conformance suite
  .demo            Run the demo commands

Tips:
  - Functions defined with def persist until the session is reset
  - Separate statements with ';' or newlines
  - Press Ctrl+C to cancel current input
  - Press Ctrl+D to exit

Examples:
  >>> def four() {{ 2 + 2 }}
  >>> four() * 2
  8
  >>> when 0 1 else 2
  2
"
    );
}
