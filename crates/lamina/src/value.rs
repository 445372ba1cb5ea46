//! Runtime values (spec §3 "Value").
//!
//! Arrays and functions use shared ownership via `Rc` so that assigning or
//! passing them around copies a handle, not the contents, matching
//! "arrays and functions use shared ownership" — everything else is copied
//! by value.

use std::fmt;
use std::rc::Rc;

use num_bigint::BigInt;

use crate::ast::Stmt;
use crate::environment::Environment;

/// A user-defined function: its parameter names, its body, and the scope
/// it closed over at definition time (spec §9 "Shared function captures").
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Rc<str>,
    pub params: Vec<Rc<str>>,
    pub body: Rc<Stmt>,
    pub captured_env: Environment,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    BigInt(Rc<BigInt>),
    Float(f64),
    String(Rc<str>),
    Array(Rc<std::cell::RefCell<Vec<Value>>>),
    Function(Rc<Function>),
}

impl Value {
    /// The truthiness rule from the glossary: `null`, `false`, numeric
    /// zero, and the empty string are false; everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::BigInt(b) => !b.as_ref().eq(&BigInt::from(0)),
            Self::Float(f) => *f != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::Array(_) | Self::Function(_) => true,
        }
    }

    /// The name used in `TypeError` messages and diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::BigInt(_) => "bigint",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Function(_) => "function",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::BigInt(b) => write!(f, "{b}"),
            Self::Float(d) => write!(f, "{d}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "]")
            }
            Self::Function(func) => write!(f, "<function {}>", func.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_glossary() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::String(Rc::from("")).is_truthy());
        assert!(Value::Int(1).is_truthy());
        assert!(Value::String(Rc::from("x")).is_truthy());
    }

    #[test]
    fn display_formats_array() {
        let arr = Value::Array(Rc::new(std::cell::RefCell::new(vec![Value::Int(1), Value::Int(2)])));
        assert_eq!(arr.to_string(), "[1, 2]");
    }
}
