//! Interactive-session support: meta-commands, banners, and error
//! reporting shared between the REPL and file-mode drivers (spec §6, §7).
//!
//! The byte-level "read a line, print a prompt" loop lives in the CLI
//! binary — this module owns everything about *what a line means* once
//! it's been read, so the two driver modes (and tests) can share it.

use std::rc::Rc;

use crate::environment::Environment;
use crate::error::{LaminaError, RuntimeError};
use crate::interpreter::RunOutcome;
use crate::value::Value;

pub const WELCOME_BANNER: &str = "Lamina REPL. Press Ctrl+C or :exit to exit.\nType :help for help.\n";

pub const HELP_TEXT: &str = "\
Meta-commands:
  :exit   leave the REPL
  :help   show this message
  :vars   list every binding in the top-level scope
  :clear  clear the terminal
";

/// A line recognized as a meta-command before lexing (spec §6: "REPL
/// meta-commands (consumed before lexing)").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaCommand {
    Exit,
    Help,
    Vars,
    Clear,
}

/// Matches a raw input line against the fixed meta-command set. Matching
/// happens on the untrimmed-of-content, trimmed-of-whitespace line, before
/// any lexing is attempted — an ordinary statement never starts with `:`.
pub fn parse_meta_command(line: &str) -> Option<MetaCommand> {
    match line.trim() {
        ":exit" => Some(MetaCommand::Exit),
        ":help" => Some(MetaCommand::Help),
        ":vars" => Some(MetaCommand::Vars),
        ":clear" => Some(MetaCommand::Clear),
        _ => None,
    }
}

/// Formats `:vars` output: one `name = value` line per top-level binding.
pub fn format_vars(env: &Environment) -> String {
    let mut bindings: Vec<(Rc<str>, Value)> = env.local_bindings();
    bindings.sort_by(|a, b| a.0.cmp(&b.0));
    bindings.into_iter().map(|(name, value)| format!("{name} = {value}")).collect::<Vec<_>>().join("\n")
}

/// The ANSI sequence that clears the terminal and homes the cursor. A
/// single portable sequence stands in for the source's per-OS branches
/// (ANSI escape vs. spawning `cls`/`clear`) — virtually every terminal a
/// Lamina REPL runs in today honors it.
pub const CLEAR_SCREEN_SEQUENCE: &str = "\x1b[2J\x1b[1;1H";

/// Renders one [`RunOutcome`] the way the file-mode and REPL drivers both
/// want it (spec §7: stack trace for a `RuntimeError`, a warning for a
/// stray `Return`/`Break`/`Continue`, nothing for a clean completion).
pub fn describe_outcome(outcome: &RunOutcome) -> Option<String> {
    match outcome {
        RunOutcome::Completed => None,
        RunOutcome::RuntimeError(err) => Some(format_stack_trace(err)),
        RunOutcome::StrayControlFlow(kind) => Some(format!("warning: stray '{kind}' outside its construct")),
    }
}

fn format_stack_trace(err: &RuntimeError) -> String {
    let mut lines = vec![format!("RuntimeError: {} (line {})", err.kind, err.at.line)];
    for frame in &err.frames {
        lines.push(format!("  at {} (line {})", frame.function_name, frame.call_line));
    }
    lines.join("\n")
}

/// Renders a lex/parse failure (spec §7: "ParseErrors abort the current
/// input unit only").
pub fn describe_compile_error(err: &LaminaError) -> String {
    match err {
        LaminaError::Lex(e) => format!("LexError: {e}"),
        LaminaError::Parse(e) => format!("ParseError: {e}"),
        LaminaError::Runtime(e) => format_stack_trace(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_all_four_meta_commands() {
        assert_eq!(parse_meta_command(":exit"), Some(MetaCommand::Exit));
        assert_eq!(parse_meta_command(":help"), Some(MetaCommand::Help));
        assert_eq!(parse_meta_command(":vars"), Some(MetaCommand::Vars));
        assert_eq!(parse_meta_command(":clear"), Some(MetaCommand::Clear));
        assert_eq!(parse_meta_command("var x = 1;"), None);
    }

    #[test]
    fn vars_format_is_sorted_name_equals_value() {
        let env = Environment::root();
        env.declare(Rc::from("b"), Value::Int(2));
        env.declare(Rc::from("a"), Value::Int(1));
        assert_eq!(format_vars(&env), "a = 1\nb = 2");
    }
}
