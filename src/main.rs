// ABOUTME: CLI entry point — REPL, file runner, and diagnostic rendering

mod ast;
mod builtins;
mod config;
mod env;
mod error;
mod eval;
mod parser;
mod scanner;
mod token;
mod value;

use clap::Parser as ClapParser;
use config::{
    lookup_repl_command, ReplCommand, HISTORY_FILE, USAGE_TEXT, VERSION, WELCOME_MESSAGE, WELCOME_SUBTITLE,
};
use env::Environment;
use eval::eval_program;
use parser::Parser;
use rustyline::error::ReadlineError;
use rustyline::highlight::MatchingBracketHighlighter;
use rustyline::validate::MatchingBracketValidator;
use rustyline::{Config, Editor};
use rustyline_derive::{Completer, Helper, Highlighter, Hinter, Validator};
use std::path::PathBuf;
use std::process::ExitCode;

/// A small expression-oriented scripting language
#[derive(ClapParser, Debug)]
#[command(name = "interp")]
#[command(version = VERSION)]
#[command(about = "A tree-walking interpreter")]
#[command(long_about = "Runs a script file, or starts an interactive REPL when none is given")]
struct CliArgs {
    /// Script file to execute (omit to start the REPL). Accepting any number
    /// of positional arguments here, rather than clap's default single
    /// `Option<PathBuf>`, lets `main` print usage and exit 0 on its own terms
    /// when more than one is given, instead of clap's own "unexpected
    /// argument" error and exit code.
    #[arg(value_name = "FILE", trailing_var_arg = true)]
    scripts: Vec<PathBuf>,
}

/// Wires up rustyline's built-in bracket validator (so the REPL waits for a
/// closing `}`/`)`/`]` before submitting) and its matching highlighter.
#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct ReplHelper {
    #[rustyline(Validator)]
    validator: MatchingBracketValidator,
    #[rustyline(Highlighter)]
    highlighter: MatchingBracketHighlighter,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    match args.scripts.as_slice() {
        [] => {
            run_repl();
            ExitCode::SUCCESS
        }
        [path] => run_script(path),
        _ => {
            println!("{}", USAGE_TEXT);
            ExitCode::SUCCESS
        }
    }
}

/// Reads a UTF-8 script file, evaluates it top to bottom, and exits per
/// spec: `0` ok, `1` file-read error, `2` non-UTF-8 content.
fn run_script(path: &PathBuf) -> ExitCode {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("error: cannot read {}: {}", path.display(), e);
            return ExitCode::from(1);
        }
    };
    let source = match String::from_utf8(bytes) {
        Ok(source) => source,
        Err(_) => {
            eprintln!("error: {} is not valid UTF-8", path.display());
            return ExitCode::from(2);
        }
    };

    let mut parser = Parser::new(&source);
    let program = parser.parse_program();
    if !parser.errors().is_empty() {
        for err in parser.errors() {
            eprintln!("{}", err);
        }
        return ExitCode::from(1);
    }

    let env = Environment::root();
    match eval_program(&program, &env) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.render(&source));
            ExitCode::from(1)
        }
    }
}

fn run_repl() {
    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<ReplHelper, rustyline::history::DefaultHistory> =
        match Editor::with_config(config) {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("failed to initialize REPL: {}", e);
                return;
            }
        };
    rl.set_helper(Some(ReplHelper {
        validator: MatchingBracketValidator::new(),
        highlighter: MatchingBracketHighlighter::new(),
    }));
    let _ = rl.load_history(HISTORY_FILE);

    println!("{}", WELCOME_MESSAGE);
    println!("{}", WELCOME_SUBTITLE);
    println!("type :quit to exit, :clear to clear the screen");

    let env = Environment::root();

    loop {
        let readline = rl.readline("» ");
        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match lookup_repl_command(trimmed) {
                    Some(ReplCommand::Quit) => break,
                    Some(ReplCommand::Clear) => {
                        print!("\x1B[2J\x1B[H");
                        continue;
                    }
                    None => {}
                }

                let mut parser = Parser::new(&line);
                let program = parser.parse_program();
                if !parser.errors().is_empty() {
                    for err in parser.errors() {
                        eprintln!("{}", err);
                    }
                    continue;
                }

                match eval_program(&program, &env) {
                    Ok(value) => println!("=> {}", value),
                    Err(err) => eprintln!("{}", err.render(&line)),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("error: {}", e);
                break;
            }
        }
    }

    let _ = rl.save_history(HISTORY_FILE);
}
