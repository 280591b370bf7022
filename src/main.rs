mod ast;
mod builtins;
mod combinators;
mod comments;
mod config;
mod env;
mod error;
mod eval;
mod lexer;
mod parser;
mod token;
mod value;

use std::path::PathBuf;
use std::process::ExitCode;

use builtins::BuiltinRegistry;
use clap::Parser;
use config::{FAREWELL_MESSAGE, HISTORY_FILE, WELCOME_MESSAGE, WELCOME_SUBTITLE};
use env::Environment;
use eval::{eval_program, Diagnostics, NullDiagnostics, StderrDiagnostics};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use value::Value;

/// A small imperative scripting language interpreter.
#[derive(Parser, Debug)]
#[command(name = "tiny")]
#[command(version = config::VERSION)]
#[command(about = "Tiny: a small imperative scripting language")]
struct CliArgs {
    /// Script file to execute; if omitted, starts the REPL.
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Print a diagnostic to stderr whenever an undefined variable read
    /// defaults to 0.
    #[arg(long = "warn-undefined")]
    warn_undefined: bool,
}

const EXIT_USAGE: u8 = 1;
const EXIT_PARSE_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let diagnostics: Box<dyn Diagnostics> = if args.warn_undefined {
        Box::new(StderrDiagnostics)
    } else {
        Box::new(NullDiagnostics)
    };

    match args.script {
        Some(path) => run_script(&path, diagnostics.as_ref()),
        None => {
            run_repl(diagnostics.as_ref());
            ExitCode::SUCCESS
        }
    }
}

fn run_script(path: &PathBuf, diagnostics: &dyn Diagnostics) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: could not read {}: {e}", path.display());
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let tokens = match lexer::tokenize(&source).and_then(comments::strip_comments) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(EXIT_PARSE_ERROR);
        }
    };
    let program = match parser::parse(&tokens) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(EXIT_PARSE_ERROR);
        }
    };

    let mut env = Environment::new();
    let builtins = BuiltinRegistry::new();
    match eval_program(&program, &mut env, &builtins, diagnostics) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(EXIT_RUNTIME_ERROR)
        }
    }
}

fn run_repl(diagnostics: &dyn Diagnostics) {
    println!("{WELCOME_MESSAGE} - {WELCOME_SUBTITLE}");

    let mut rl = DefaultEditor::new().expect("failed to initialize line editor");
    let _ = rl.load_history(HISTORY_FILE);

    let mut env = Environment::new();
    let builtins = BuiltinRegistry::new();
    let mut last_value = Value::Unit;

    loop {
        match rl.readline("tiny> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());

                if trimmed == "_" {
                    if !last_value.is_unit() {
                        println!("{last_value}");
                    }
                    continue;
                }

                match eval_line(&line, &mut env, &builtins, diagnostics) {
                    Ok(value) => {
                        if !value.is_unit() {
                            println!("{value}");
                        }
                        last_value = value;
                    }
                    Err(e) => eprintln!("{e}"),
                }
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                println!("{FAREWELL_MESSAGE}");
                break;
            }
            Err(e) => {
                eprintln!("readline error: {e}");
                break;
            }
        }
    }

    let _ = rl.save_history(HISTORY_FILE);
}

fn eval_line(
    source: &str,
    env: &mut Environment,
    builtins: &BuiltinRegistry,
    diagnostics: &dyn Diagnostics,
) -> Result<Value, error::TinyError> {
    let tokens = comments::strip_comments(lexer::tokenize(source)?)?;
    let program = parser::parse(&tokens)?;
    eval_program(&program, env, builtins, diagnostics)
}
