use std::fs;
use std::io::{self, BufRead, IsTerminal};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use jsonsift_core::api::apply_filter_spec;
use jsonsift_core::document::{parse_document, read_document, write_document};
use jsonsift_core::error::Error as CoreError;
use jsonsift_core::store::RuleSetStore;
use jsonsift_core::types::FilterSpec;
use rustyline::DefaultEditor;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod executor;
mod parser;

use commands::Command;
use display::OutputMode;
use error::ConsoleError;
use executor::Session;

/// jsonsift: filter and reshape JSON documents, interactively or from scripts.
#[derive(Parser, Debug)]
#[command(name = "jsonsift", version)]
struct Cli {
    /// JSON document to load before running commands.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Apply this filter spec to the input (or stdin) once and print the result.
    #[arg(short, long)]
    spec: Option<PathBuf>,

    /// Execute a command non-interactively (can be repeated).
    #[arg(short, long = "exec")]
    exec: Vec<String>,

    /// Output results as machine-parseable JSON.
    #[arg(short, long)]
    json: bool,

    /// Rule-set file (default: <data dir>/filter-json-app/rule-sets.json).
    #[arg(long)]
    rules: Option<PathBuf>,

    /// With --spec, write the result to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn output_mode(json_mode: bool) -> OutputMode {
    if json_mode {
        OutputMode::Json
    } else {
        OutputMode::Pretty
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mode = output_mode(cli.json);

    if let Some(spec_path) = &cli.spec {
        let code = run_spec_mode(
            cli.input.as_deref(),
            spec_path,
            cli.output.as_deref(),
            &mode,
        );
        process::exit(code);
    }

    let store = match &cli.rules {
        Some(path) => RuleSetStore::open(path),
        None => match RuleSetStore::open_default() {
            Ok(store) => store,
            Err(e) => {
                display::render_error(&e, &mode);
                process::exit(1);
            }
        },
    };
    let mut session = Session::new(store);
    debug!(path = %session.store().path().display(), "using rule-set store");

    if let Some(input) = &cli.input {
        let load = Command::Load {
            path: input.display().to_string(),
        };
        if let Err(e) = executor::execute(&mut session, load) {
            display::render_error(&e, &mode);
            process::exit(1);
        }
    }

    if !cli.exec.is_empty() {
        let code = run_exec_mode(&mut session, &cli.exec, cli.json);
        process::exit(code);
    } else if !io::stdin().is_terminal() {
        let code = run_pipe_mode(&mut session, cli.json);
        process::exit(code);
    } else {
        run_repl(&mut session);
    }
}

/// Read and decode a filter spec file.
fn load_spec(path: &Path) -> Result<FilterSpec, ConsoleError> {
    let text = fs::read_to_string(path).map_err(CoreError::from)?;
    Ok(serde_json::from_str(&text).map_err(CoreError::from)?)
}

/// Apply a spec file to the input document once (--spec mode).
///
/// Returns exit code: 0 = result written (diagnostics are warnings only),
/// 1 = the spec or document could not be read.
fn run_spec_mode(
    input: Option<&Path>,
    spec_path: &Path,
    output: Option<&Path>,
    mode: &OutputMode,
) -> i32 {
    let spec = match load_spec(spec_path) {
        Ok(spec) => spec,
        Err(e) => {
            display::render_error(&e, mode);
            return 1;
        }
    };

    let parsed = match input {
        Some(path) => read_document(path),
        None => io::read_to_string(io::stdin())
            .map(|text| parse_document(&text))
            .map_err(CoreError::from),
    };
    let parsed = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            display::render_error(&e, mode);
            return 1;
        }
    };
    let document = match (parsed.value, parsed.error) {
        (_, Some(err)) => {
            display::render_error(&err, mode);
            return 1;
        }
        (Some(value), None) => value,
        (None, None) => {
            display::render_error(&ConsoleError::NoDocument, mode);
            return 1;
        }
    };

    let outcome = apply_filter_spec(&document, &spec);
    match output {
        Some(path) => {
            if let Err(e) = write_document(path, &outcome.value) {
                display::render_error(&e, mode);
                return 1;
            }
            display::print_diagnostics(&outcome.errors);
        }
        None => display::render_outcome(&outcome, mode),
    }
    0
}

/// What a non-interactive mode should do after one command line.
enum Step {
    Continue,
    Exit,
    Failed,
}

fn run_line(session: &mut Session, line: &str, mode: &OutputMode) -> Step {
    let cmd = match parser::parse(line, session.active_set()) {
        Ok(cmd) => cmd,
        Err(e) => {
            display::render_error(&e, mode);
            return Step::Failed;
        }
    };

    match executor::execute(session, cmd) {
        Ok(result) => {
            if display::render(&result, mode) {
                Step::Continue
            } else {
                Step::Exit
            }
        }
        Err(e) => {
            display::render_error(&e, mode);
            Step::Failed
        }
    }
}

/// Execute one or more commands non-interactively (--exec mode).
///
/// Returns exit code: 0 = all succeeded, 1 = first error stops execution.
fn run_exec_mode(session: &mut Session, commands: &[String], json_mode: bool) -> i32 {
    let mode = output_mode(json_mode);

    for cmd_str in commands {
        match run_line(session, cmd_str, &mode) {
            Step::Continue => {}
            Step::Exit => return 0,
            Step::Failed => return 1,
        }
    }

    0
}

/// Read commands from stdin (pipe mode).
///
/// Returns exit code: 0 = all succeeded, 1 = first error.
fn run_pipe_mode(session: &mut Session, json_mode: bool) -> i32 {
    let mode = output_mode(json_mode);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                display::render_error(&e, &mode);
                return 1;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        match run_line(session, trimmed, &mode) {
            Step::Continue => {}
            Step::Exit => return 0,
            Step::Failed => return 1,
        }
    }

    0
}

/// Interactive REPL mode.
fn run_repl(session: &mut Session) {
    println!("jsonsift console v{}", env!("CARGO_PKG_VERSION"));
    println!("Type HELP for available commands.\n");

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to initialize line editor: {e}");
            return;
        }
    };

    loop {
        let prompt = match session.active_set() {
            Some(set) => format!("jsonsift:{set}> "),
            None => "jsonsift> ".to_string(),
        };
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                let cmd = match parser::parse(trimmed, session.active_set()) {
                    Ok(cmd) => cmd,
                    Err(e) => {
                        display::print_error(&e);
                        continue;
                    }
                };

                match executor::execute(session, cmd) {
                    Ok(result) => {
                        if !display::render(&result, &OutputMode::Pretty) {
                            break; // EXIT command
                        }
                    }
                    Err(e) => display::print_error(&e),
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!();
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("Bye!");
                break;
            }
            Err(e) => {
                eprintln!("Readline error: {e}");
                break;
            }
        }
    }
}
