use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::{env, fs};

use lamina::repl::{self, MetaCommand};
use lamina::{compile, Interpreter, LaminaError, StdInput, StdPrint};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    match args.get(1) {
        None => run_repl(),
        Some(path) => run_file(path),
    }
}

/// One positional argument: read it as a source file and run it to
/// completion (spec §6). A read failure is exit code 1; a `ParseError` on
/// the top-level parse is exit code 2; anything else, including a caught
/// `RuntimeError`, is exit code 0.
fn run_file(path: &str) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error reading {path}: {err}");
            return ExitCode::from(1);
        }
    };

    let program = match compile(&source) {
        Ok(program) => program,
        Err(err) => {
            eprintln!("{}", repl::describe_compile_error(&err));
            return ExitCode::from(2);
        }
    };

    let mut interpreter = Interpreter::new(StdPrint, StdInput);
    interpreter.run(&program, |outcome| {
        if let Some(report) = repl::describe_outcome(outcome) {
            eprintln!("{report}");
        }
    });
    ExitCode::SUCCESS
}

/// No positional arguments: an interactive read-eval-print loop that keeps
/// one interpreter alive for the whole session, so function definitions and
/// variables from earlier lines stay live for later ones (spec §3).
fn run_repl() -> ExitCode {
    println!("{}", repl::WELCOME_BANNER);
    let mut interpreter = Interpreter::new(StdPrint, StdInput);
    let stdin = io::stdin();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            return ExitCode::SUCCESS;
        }

        let mut line = String::new();
        let bytes_read = match stdin.lock().read_line(&mut line) {
            Ok(n) => n,
            Err(err) => {
                eprintln!("error reading stdin: {err}");
                return ExitCode::from(1);
            }
        };
        if bytes_read == 0 {
            return ExitCode::SUCCESS;
        }

        match repl::parse_meta_command(&line) {
            Some(MetaCommand::Exit) => return ExitCode::SUCCESS,
            Some(MetaCommand::Help) => {
                println!("{}", repl::HELP_TEXT);
                continue;
            }
            Some(MetaCommand::Vars) => {
                println!("{}", repl::format_vars(interpreter.globals()));
                continue;
            }
            Some(MetaCommand::Clear) => {
                print!("{}", repl::CLEAR_SCREEN_SEQUENCE);
                let _ = io::stdout().flush();
                continue;
            }
            None => {}
        }

        if line.trim().is_empty() {
            continue;
        }

        match compile(&line) {
            Ok(program) => interpreter.run(&program, |outcome| {
                if let Some(report) = repl::describe_outcome(outcome) {
                    println!("{report}");
                }
            }),
            Err(err) => println!("{}", repl::describe_compile_error(&err)),
        }
    }
}
