//! Stage-separated error types for the lex/parse/run pipeline.
//!
//! Mirrors the shape of a REPL error type that keeps parse, compile, and
//! runtime failures distinct so callers don't have to string-match to tell
//! them apart: one small enum per stage, composed into [`LaminaError`] via
//! `From` impls.

use std::fmt;


/// Where in the source a diagnostic applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A lexical error: an unterminated string literal or an unclassifiable byte.
///
/// Per spec, the lexer recovers at the next whitespace rather than aborting,
/// so this is informational — it gets collected, not necessarily fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub at: Location,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lex error at {}: {}", self.at, self.message)
    }
}

impl std::error::Error for LexError {}

/// A parse error: an unexpected token or a missing terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub at: Location,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at {}: {}", self.at, self.message)
    }
}

impl std::error::Error for ParseError {}

/// The closed runtime error taxonomy from the spec's error handling design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    UndefinedName(String),
    TypeError(String),
    DivisionByZero,
    ArityError { expected: usize, got: usize },
    RecursionLimit { limit: usize },
    IndexOutOfRange { index: i64, len: usize },
    ModuleError(ModuleErrorKind),
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedName(name) => write!(f, "UndefinedName: {name}"),
            Self::TypeError(msg) => write!(f, "TypeError: {msg}"),
            Self::DivisionByZero => write!(f, "DivisionByZero"),
            Self::ArityError { expected, got } => {
                write!(f, "ArityError: expected {expected} argument(s), got {got}")
            }
            Self::RecursionLimit { limit } => {
                write!(f, "RecursionLimit: exceeded depth {limit}")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "IndexOutOfRange: index {index} out of range for length {len}")
            }
            Self::ModuleError(kind) => write!(f, "ModuleError: {kind}"),
        }
    }
}

/// Subtypes of `ModuleError` from the spec's Module Loader contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleErrorKind {
    NamespaceMismatch { expected: String, got: String },
    UnknownFunction { namespace: String, function: String },
    NullFunction { namespace: String, function: String },
    SignatureInvalid { path: String },
}

impl fmt::Display for ModuleErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NamespaceMismatch { expected, got } => {
                write!(f, "NamespaceMismatch: expected '{expected}', got '{got}'")
            }
            Self::UnknownFunction { namespace, function } => {
                write!(f, "UnknownFunction: {namespace}.{function}")
            }
            Self::NullFunction { namespace, function } => {
                write!(f, "NullFunction: {namespace}.{function}")
            }
            Self::SignatureInvalid { path } => write!(f, "SignatureInvalid: {path}"),
        }
    }
}

/// A single recorded call-stack frame, used to assemble the trace printed on
/// an uncaught `RuntimeError` (spec §4.3/§7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub function_name: String,
    pub call_line: u32,
}

/// A runtime error together with the call stack active when it was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub at: Location,
    pub frames: Vec<StackFrame>,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, at: Location) -> Self {
        Self { kind, at, frames: Vec::new() }
    }

    pub fn with_frames(mut self, frames: Vec<StackFrame>) -> Self {
        self.frames = frames;
        self
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (line {})", self.kind, self.at.line)
    }
}

impl std::error::Error for RuntimeError {}

/// Top-level error composing every pipeline stage, mirroring the way a REPL
/// driver wants to match on "where did this fail" without string matching.
#[derive(Debug, Clone)]
pub enum LaminaError {
    Lex(LexError),
    Parse(ParseError),
    Runtime(RuntimeError),
}

impl fmt::Display for LaminaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(e) => write!(f, "{e}"),
            Self::Parse(e) => write!(f, "{e}"),
            Self::Runtime(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for LaminaError {}

impl From<LexError> for LaminaError {
    fn from(e: LexError) -> Self {
        Self::Lex(e)
    }
}

impl From<ParseError> for LaminaError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<RuntimeError> for LaminaError {
    fn from(e: RuntimeError) -> Self {
        Self::Runtime(e)
    }
}
