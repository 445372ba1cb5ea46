//! `print()` output sinks.
//!
//! Lamina has no `with`-style stream redirection, so this is a much
//! smaller surface than a general-purpose print writer: a trait with one
//! write method, and three implementations — stdout, a string collector
//! for tests, and a sink that drops everything.

use std::fmt;

/// Where a `print()` call's formatted output goes.
pub trait PrintWriter {
    /// Writes one already-formatted `print()` line, including its
    /// trailing newline.
    fn print_line(&mut self, line: &str);
}

/// Writes directly to the process's standard output.
#[derive(Debug, Default)]
pub struct StdPrint;

impl PrintWriter for StdPrint {
    fn print_line(&mut self, line: &str) {
        println!("{line}");
    }
}

/// Collects every printed line into an owned buffer, for tests that assert
/// on interpreter output without touching process stdout.
#[derive(Debug, Default)]
pub struct CollectStringPrint {
    buffer: String,
}

impl CollectStringPrint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> &str {
        &self.buffer
    }

    pub fn into_output(self) -> String {
        self.buffer
    }
}

impl PrintWriter for CollectStringPrint {
    fn print_line(&mut self, line: &str) {
        self.buffer.push_str(line);
        self.buffer.push('\n');
    }
}

impl fmt::Display for CollectStringPrint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.buffer)
    }
}

/// Discards everything printed. Useful when only side effects other than
/// stdout (return value, raised error) matter to a caller.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn print_line(&mut self, _line: &str) {}
}

/// Backs the `input` keyword expression. Mirrors [`PrintWriter`]'s
/// split between a real stdout and a test double: reading stdin directly
/// in a unit test would hang, so tests supply a canned line sequence
/// instead.
pub trait InputReader {
    /// Reads one line, without its trailing newline. Returns an empty
    /// string at end of input.
    fn read_line(&mut self) -> String;
}

/// Reads one line from the process's standard input.
#[derive(Debug, Default)]
pub struct StdInput;

impl InputReader for StdInput {
    fn read_line(&mut self) -> String {
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).is_ok() {
            line.truncate(line.trim_end_matches(['\n', '\r']).len());
        }
        line
    }
}

/// Replays a fixed sequence of lines, for tests that exercise `input`.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    lines: std::collections::VecDeque<String>,
}

impl ScriptedInput {
    pub fn new(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { lines: lines.into_iter().map(Into::into).collect() }
    }
}

impl InputReader for ScriptedInput {
    fn read_line(&mut self) -> String {
        self.lines.pop_front().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_string_print_joins_with_newlines() {
        let mut writer = CollectStringPrint::new();
        writer.print_line("a");
        writer.print_line("b");
        assert_eq!(writer.output(), "a\nb\n");
    }

    #[test]
    fn no_print_drops_everything() {
        let mut writer = NoPrint;
        writer.print_line("ignored");
    }
}
