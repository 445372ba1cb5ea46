//! Lamina: a small dynamically-typed scripting language with a
//! tree-walking interpreter and a native-module C ABI.
//!
//! The pipeline is the textbook shape: [`lexer`] turns source text into a
//! [`token`] stream, [`parser`] turns that into an [`ast`], and
//! [`interpreter`] walks the tree directly rather than compiling to
//! bytecode first.

pub mod ast;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod io;
pub mod lexer;
pub mod module_loader;
pub mod parser;
pub mod repl;
pub mod resource;
pub mod token;
pub mod value;

pub use ast::{Expr, Stmt};
pub use environment::Environment;
pub use error::{LaminaError, LexError, ModuleErrorKind, ParseError, RuntimeError, RuntimeErrorKind};
pub use interpreter::{Interpreter, RunOutcome, Unwind};
pub use io::{CollectStringPrint, InputReader, NoPrint, PrintWriter, ScriptedInput, StdInput, StdPrint};
pub use lexer::tokenize;
pub use parser::parse;
pub use resource::{DEFAULT_RECURSION_LIMIT, RecursionGuard};
pub use token::{Token, TokenKind};
pub use value::Value;

/// Lexes and parses `source` in one step, the shape every caller that
/// doesn't care about intermediate tokens wants.
pub fn compile(source: &str) -> Result<Stmt, LaminaError> {
    let (tokens, lex_errors) = tokenize(source);
    if let Some(err) = lex_errors.into_iter().next() {
        return Err(err.into());
    }
    parse(&tokens).map_err(Into::into)
}
