//! The tree-walking evaluator (spec §4.3, §4.4, §5).
//!
//! Control flow that would be C++ exceptions in the source under study is
//! modeled as [`Unwind`], a value every statement execution can return
//! instead of throwing (spec §9 "Control flow via exceptions"). The
//! environment stack itself needs no explicit push/pop bookkeeping: each
//! nested scope is just a fresh [`Environment`] passed down the call chain,
//! so Rust's own call stack enforces "pop on every exit path" for free.

use std::path::Path;
use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use crate::ast::{BinaryOp, Expr, LiteralText, Stmt, UnaryOp};
use crate::environment::Environment;
use crate::error::{Location, RuntimeError, RuntimeErrorKind, StackFrame};
use crate::io::{InputReader, PrintWriter, StdInput, StdPrint};
use crate::module_loader::ModuleRegistry;
use crate::resource::RecursionGuard;
use crate::value::{Function, Value};

/// The four non-local exits the interpreter can produce (spec §4.3
/// "Control-flow unwinding").
#[derive(Debug)]
pub enum Unwind {
    Return(Value),
    Break,
    Continue,
    Error(RuntimeError),
}

impl From<RuntimeError> for Unwind {
    fn from(e: RuntimeError) -> Self {
        Self::Error(e)
    }
}

type EvalResult<T> = Result<T, Unwind>;

/// Owns everything one program run needs: the global scope, loaded native
/// modules, the recursion guard, the active call stack (for stack traces),
/// and the two IO sinks that let callers capture output instead of
/// touching the real process streams.
pub struct Interpreter<W: PrintWriter = StdPrint, I: InputReader = StdInput> {
    globals: Environment,
    modules: ModuleRegistry,
    recursion: RecursionGuard,
    call_stack: Vec<StackFrame>,
    writer: W,
    input: I,
}

impl Default for Interpreter<StdPrint, StdInput> {
    fn default() -> Self {
        Self::new(StdPrint, StdInput)
    }
}

impl<W: PrintWriter, I: InputReader> Interpreter<W, I> {
    pub fn new(writer: W, input: I) -> Self {
        Self {
            globals: Environment::root(),
            modules: ModuleRegistry::new(),
            recursion: RecursionGuard::new(),
            call_stack: Vec::new(),
            writer,
            input,
        }
    }

    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Runs a parsed program's top-level statements one at a time. A
    /// `RuntimeError` aborts only the statement that raised it; execution
    /// resumes with the next one (spec §7 "Propagation policy"). Each
    /// outcome is reported through `report`, which the REPL and file-mode
    /// drivers implement differently (stack trace vs. warning vs. nothing).
    pub fn run(&mut self, program: &Stmt, mut report: impl FnMut(&RunOutcome)) {
        let Stmt::Block(top_level) = program else {
            return;
        };
        let globals = self.globals.clone();
        for stmt in top_level {
            match self.exec_stmt(stmt, &globals) {
                Ok(()) => report(&RunOutcome::Completed),
                Err(Unwind::Error(err)) => report(&RunOutcome::RuntimeError(err)),
                Err(Unwind::Return(_)) => report(&RunOutcome::StrayControlFlow("return")),
                Err(Unwind::Break) => report(&RunOutcome::StrayControlFlow("break")),
                Err(Unwind::Continue) => report(&RunOutcome::StrayControlFlow("continue")),
            }
        }
    }

    pub fn load_module(&mut self, path: &Path) -> Result<(), RuntimeErrorKind> {
        self.modules.load(path)
    }

    fn runtime_error(&self, kind: RuntimeErrorKind, at: Location) -> RuntimeError {
        let frames = self.call_stack.iter().rev().cloned().collect();
        RuntimeError::new(kind, at).with_frames(frames)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Environment) -> EvalResult<()> {
        match stmt {
            Stmt::VarDecl { name, init } => {
                let value = self.eval_expr(init, env)?;
                env.declare(name.clone(), value);
                Ok(())
            }
            Stmt::BigIntDecl { name, init } => {
                let value = match init {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::Null,
                };
                let value = match value {
                    Value::Int(i) => Value::BigInt(Rc::new(BigInt::from(i))),
                    other => other,
                };
                env.declare(name.clone(), value);
                Ok(())
            }
            Stmt::Assign { name, expr, line } => {
                let value = self.eval_expr(expr, env)?;
                if !env.assign(name, value) {
                    return Err(self
                        .runtime_error(RuntimeErrorKind::UndefinedName(name.to_string()), Location { line: *line, column: 1 })
                        .into());
                }
                Ok(())
            }
            Stmt::Block(statements) => {
                let scope = env.child();
                for stmt in statements {
                    self.exec_stmt(stmt, &scope)?;
                }
                Ok(())
            }
            Stmt::If { cond, then_block, else_block } => {
                if self.eval_expr(cond, env)?.is_truthy() {
                    self.exec_stmt(then_block, env)
                } else if let Some(else_block) = else_block {
                    self.exec_stmt(else_block, env)
                } else {
                    Ok(())
                }
            }
            Stmt::While { cond, body } => {
                while self.eval_expr(cond, env)?.is_truthy() {
                    match self.exec_stmt(body, env) {
                        Ok(()) => {}
                        Err(Unwind::Break) => break,
                        Err(Unwind::Continue) => continue,
                        Err(other) => return Err(other),
                    }
                }
                Ok(())
            }
            Stmt::FuncDef { name, params, body } => {
                let function = Function {
                    name: name.clone(),
                    params: params.clone(),
                    body: body.clone(),
                    captured_env: env.clone(),
                };
                env.declare(name.clone(), Value::Function(Rc::new(function)));
                Ok(())
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::Null,
                };
                Err(Unwind::Return(value))
            }
            Stmt::ExprStmt(expr) => {
                self.eval_expr(expr, env)?;
                Ok(())
            }
            Stmt::Include { module, line } | Stmt::Use { module, line } => {
                self.modules
                    .load(Path::new(module.as_ref()))
                    .map_err(|kind| self.runtime_error(kind, Location { line: *line, column: 1 }))?;
                Ok(())
            }
            Stmt::Break { .. } => Err(Unwind::Break),
            Stmt::Continue { .. } => Err(Unwind::Continue),
            Stmt::Define { name, value } => {
                let evaluated = self.eval_expr(value, env)?;
                if name.as_ref() == "recursion_limit" {
                    if let Value::Int(limit) = evaluated {
                        self.recursion.set_limit(limit.max(0) as usize);
                    }
                } else {
                    env.declare(name.clone(), evaluated);
                }
                Ok(())
            }
        }
    }

    fn eval_expr(&mut self, expr: &Expr, env: &Environment) -> EvalResult<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(self.eval_literal(value)),
            Expr::Identifier { name, span } => env
                .get(name)
                .ok_or_else(|| self.runtime_error(RuntimeErrorKind::UndefinedName(name.to_string()), location_of(span)).into()),
            Expr::Binary { op, left, right, span } => {
                let left_val = self.eval_expr(left, env)?;
                let right_val = self.eval_expr(right, env)?;
                eval_binary(*op, left_val, right_val).map_err(|kind| self.runtime_error(kind, location_of(span)).into())
            }
            Expr::Unary { op, operand, span } => {
                let value = self.eval_expr(operand, env)?;
                eval_unary(*op, value).map_err(|kind| self.runtime_error(kind, location_of(span)).into())
            }
            Expr::Array { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expr(element, env)?);
                }
                Ok(Value::Array(Rc::new(std::cell::RefCell::new(values))))
            }
            Expr::Index { array, index, span } => {
                let array_val = self.eval_expr(array, env)?;
                let index_val = self.eval_expr(index, env)?;
                self.eval_index(array_val, index_val, span).map_err(Into::into)
            }
            Expr::Input { .. } => Ok(Value::String(Rc::from(self.input.read_line().as_str()))),
            Expr::Call { callee, args, span } => self.eval_call(callee, args, span, env),
            Expr::NamespaceCall { namespace, function, args, span } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, env)?);
                }
                self.modules
                    .call(namespace, function, &values)
                    .map_err(|kind| self.runtime_error(kind, location_of(span)).into())
            }
        }
    }

    fn eval_literal(&self, literal: &LiteralText) -> Value {
        match literal {
            LiteralText::Number(text) => {
                if text.contains('.') {
                    Value::Float(text.parse().unwrap_or(0.0))
                } else {
                    match text.parse::<i64>() {
                        Ok(i) => Value::Int(i),
                        Err(_) => Value::Float(text.parse().unwrap_or(0.0)),
                    }
                }
            }
            LiteralText::String(text) => Value::String(text.clone()),
            LiteralText::Bool(b) => Value::Bool(*b),
            LiteralText::Null => Value::Null,
        }
    }

    fn eval_index(&self, array: Value, index: Value, span: &crate::ast::Span) -> Result<Value, RuntimeError> {
        let Value::Array(elements) = array else {
            return Err(self.runtime_error(RuntimeErrorKind::TypeError(format!("cannot index a {}", array.type_name())), location_of(span)));
        };
        let Value::Int(index) = index else {
            return Err(self.runtime_error(RuntimeErrorKind::TypeError("array index must be an int".to_owned()), location_of(span)));
        };
        let elements = elements.borrow();
        if index < 0 || index as usize >= elements.len() {
            return Err(self.runtime_error(
                RuntimeErrorKind::IndexOutOfRange { index, len: elements.len() },
                location_of(span),
            ));
        }
        Ok(elements[index as usize].clone())
    }

    fn eval_call(&mut self, callee: &Rc<str>, args: &[Expr], span: &crate::ast::Span, env: &Environment) -> EvalResult<Value> {
        if callee.as_ref() == "print" {
            let mut parts = Vec::with_capacity(args.len());
            for arg in args {
                parts.push(self.eval_expr(arg, env)?.to_string());
            }
            self.writer.print_line(&parts.join(" "));
            return Ok(Value::Null);
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg, env)?);
        }

        let callee_value = env
            .get(callee)
            .ok_or_else(|| self.runtime_error(RuntimeErrorKind::UndefinedName(callee.to_string()), location_of(span)))?;

        let Value::Function(function) = callee_value else {
            return Err(self
                .runtime_error(RuntimeErrorKind::TypeError(format!("{} is not callable", callee_value.type_name())), location_of(span))
                .into());
        };

        if function.params.len() != values.len() {
            return Err(self
                .runtime_error(
                    RuntimeErrorKind::ArityError { expected: function.params.len(), got: values.len() },
                    location_of(span),
                )
                .into());
        }

        self.call_function(&function, values, span)
    }

    fn call_function(&mut self, function: &Rc<Function>, args: Vec<Value>, span: &crate::ast::Span) -> EvalResult<Value> {
        if !self.recursion.enter() {
            return Err(self
                .runtime_error(RuntimeErrorKind::RecursionLimit { limit: self.recursion.limit() }, location_of(span))
                .into());
        }

        let call_scope = function.captured_env.child();
        for (param, value) in function.params.iter().zip(args) {
            call_scope.declare(param.clone(), value);
        }

        self.call_stack.push(StackFrame { function_name: function.name.to_string(), call_line: span.line });
        let result = self.exec_stmt(&function.body, &call_scope);
        self.call_stack.pop();
        self.recursion.leave();

        match result {
            Ok(()) => Ok(Value::Null),
            Err(Unwind::Return(value)) => Ok(value),
            // Stray break/continue inside a function body with no enclosing
            // loop: non-fatal at the top level (spec §7), so here they just
            // complete the call with no value rather than escaping to the
            // caller's own loop.
            Err(Unwind::Break | Unwind::Continue) => Ok(Value::Null),
            Err(err @ Unwind::Error(_)) => Err(err),
        }
    }
}

fn location_of(span: &crate::ast::Span) -> Location {
    Location { line: span.line, column: span.column }
}

/// What happened when running one top-level statement, handed to the
/// driver's reporting callback (spec §7 "Propagation policy").
pub enum RunOutcome {
    Completed,
    RuntimeError(RuntimeError),
    /// `Return`/`Break`/`Continue` reaching the top level: "downgraded to a
    /// warning" per spec, never a hard failure.
    StrayControlFlow(&'static str),
}

fn eval_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, RuntimeErrorKind> {
    use BinaryOp::{Add, Div, Eq, Gt, GtEq, Lt, LtEq, Mod, Mul, NotEq, Pow, Sub};

    if matches!(op, Eq | NotEq) {
        let equal = values_equal(&left, &right);
        return Ok(Value::Bool(if op == Eq { equal } else { !equal }));
    }

    if matches!(op, Lt | LtEq | Gt | GtEq) {
        return compare(op, &left, &right);
    }

    if op == Add && (matches!(left, Value::String(_)) || matches!(right, Value::String(_))) {
        return Ok(Value::String(Rc::from(format!("{left}{right}").as_str())));
    }

    match (left, right) {
        (Value::BigInt(_), Value::Float(_)) | (Value::Float(_), Value::BigInt(_)) => {
            Err(RuntimeErrorKind::TypeError("bigint and float cannot be mixed".to_owned()))
        }
        (Value::BigInt(a), Value::BigInt(b)) => bigint_arith(op, a.as_ref().clone(), b.as_ref().clone()),
        (Value::BigInt(a), Value::Int(b)) => bigint_arith(op, a.as_ref().clone(), BigInt::from(b)),
        (Value::Int(a), Value::BigInt(b)) => bigint_arith(op, BigInt::from(a), b.as_ref().clone()),
        (Value::Float(a), b) => float_arith(op, a, value_to_f64(&b)?),
        (a, Value::Float(b)) => float_arith(op, value_to_f64(&a)?, b),
        (Value::Int(a), Value::Int(b)) => int_arith(op, a, b),
        (a, b) => Err(RuntimeErrorKind::TypeError(format!("unsupported operands {} and {}", a.type_name(), b.type_name()))),
    }
}

fn value_to_f64(value: &Value) -> Result<f64, RuntimeErrorKind> {
    match value {
        Value::Int(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        other => Err(RuntimeErrorKind::TypeError(format!("expected a number, found {}", other.type_name()))),
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => (*a as f64) == *b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::BigInt(a), Value::BigInt(b)) => a == b,
        (Value::BigInt(a), Value::Int(b)) | (Value::Int(b), Value::BigInt(a)) => a.as_ref() == &BigInt::from(*b),
        (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    use BinaryOp::{Gt, GtEq, Lt, LtEq};

    let ordering = match (left, right) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::BigInt(a), Value::BigInt(b)) => a.cmp(b),
        (Value::BigInt(a), Value::Int(b)) => a.as_ref().cmp(&BigInt::from(*b)),
        (Value::Int(a), Value::BigInt(b)) => BigInt::from(*a).cmp(b),
        _ => {
            let a = value_to_f64(left)?;
            let b = value_to_f64(right)?;
            a.partial_cmp(&b).ok_or_else(|| RuntimeErrorKind::TypeError("cannot compare NaN".to_owned()))?
        }
    };
    let result = match op {
        Lt => ordering.is_lt(),
        LtEq => ordering.is_le(),
        Gt => ordering.is_gt(),
        GtEq => ordering.is_ge(),
        _ => unreachable!(),
    };
    Ok(Value::Bool(result))
}

fn int_arith(op: BinaryOp, a: i64, b: i64) -> Result<Value, RuntimeErrorKind> {
    use BinaryOp::{Add, Div, Mod, Mul, Pow, Sub};
    match op {
        Add => Ok(a.checked_add(b).map(Value::Int).unwrap_or_else(|| Value::Float(a as f64 + b as f64))),
        Sub => Ok(a.checked_sub(b).map(Value::Int).unwrap_or_else(|| Value::Float(a as f64 - b as f64))),
        Mul => Ok(a.checked_mul(b).map(Value::Int).unwrap_or_else(|| Value::Float(a as f64 * b as f64))),
        Div => {
            if b == 0 {
                return Err(RuntimeErrorKind::DivisionByZero);
            }
            Ok(Value::Int(a / b))
        }
        Mod => {
            if b == 0 {
                return Err(RuntimeErrorKind::DivisionByZero);
            }
            Ok(Value::Int(a % b))
        }
        Pow => {
            if b >= 0 && b <= u32::MAX as i64 {
                match a.checked_pow(b as u32) {
                    Some(result) => Ok(Value::Int(result)),
                    None => Ok(Value::Float((a as f64).powf(b as f64))),
                }
            } else {
                Ok(Value::Float((a as f64).powf(b as f64)))
            }
        }
        _ => unreachable!(),
    }
}

fn float_arith(op: BinaryOp, a: f64, b: f64) -> Result<Value, RuntimeErrorKind> {
    use BinaryOp::{Add, Div, Mod, Mul, Pow, Sub};
    match op {
        Add => Ok(Value::Float(a + b)),
        Sub => Ok(Value::Float(a - b)),
        Mul => Ok(Value::Float(a * b)),
        Div => {
            if b == 0.0 {
                return Err(RuntimeErrorKind::DivisionByZero);
            }
            Ok(Value::Float(a / b))
        }
        Mod => {
            if b == 0.0 {
                return Err(RuntimeErrorKind::DivisionByZero);
            }
            Ok(Value::Float(a % b))
        }
        Pow => Ok(Value::Float(a.powf(b))),
        _ => unreachable!(),
    }
}

fn bigint_arith(op: BinaryOp, a: BigInt, b: BigInt) -> Result<Value, RuntimeErrorKind> {
    use BinaryOp::{Add, Div, Mod, Mul, Pow, Sub};
    let result = match op {
        Add => a + b,
        Sub => a - b,
        Mul => a * b,
        Div => {
            if b.is_zero() {
                return Err(RuntimeErrorKind::DivisionByZero);
            }
            a / b
        }
        Mod => {
            if b.is_zero() {
                return Err(RuntimeErrorKind::DivisionByZero);
            }
            a % b
        }
        Pow => {
            let exponent = b
                .to_u32()
                .ok_or_else(|| RuntimeErrorKind::TypeError("bigint exponent must be a non-negative 32-bit value".to_owned()))?;
            num_traits::pow::Pow::pow(a, exponent)
        }
        _ => unreachable!(),
    };
    Ok(Value::BigInt(Rc::new(result)))
}

fn eval_unary(op: UnaryOp, value: Value) -> Result<Value, RuntimeErrorKind> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        UnaryOp::Neg => match value {
            Value::Int(i) => Ok(i.checked_neg().map(Value::Int).unwrap_or(Value::Float(-(i as f64)))),
            Value::Float(f) => Ok(Value::Float(-f)),
            Value::BigInt(b) => Ok(Value::BigInt(Rc::new(-b.as_ref().clone()))),
            other => Err(RuntimeErrorKind::TypeError(format!("cannot negate a {}", other.type_name()))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::CollectStringPrint;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    fn run_code(src: &str) -> String {
        let (tokens, errors) = tokenize(src);
        assert!(errors.is_empty(), "{errors:?}");
        let program = parse(&tokens).expect("parse error");
        let mut interpreter = Interpreter::new(CollectStringPrint::new(), crate::io::ScriptedInput::new(Vec::<String>::new()));
        interpreter.run(&program, |outcome| {
            if let RunOutcome::RuntimeError(err) = outcome {
                interpreter_panic(err);
            }
        });
        interpreter.writer().output().to_owned()
    }

    fn interpreter_panic(err: &RuntimeError) {
        panic!("unexpected runtime error: {err}");
    }

    #[test]
    fn scenario_arithmetic_precedence() {
        assert_eq!(run_code("var x = 2 + 3 * 4; print(x);"), "14\n");
    }

    #[test]
    fn scenario_recursive_fibonacci() {
        assert_eq!(
            run_code("func f(n) { if (n < 2) { return n; } return f(n-1) + f(n-2); } print(f(10));"),
            "55\n"
        );
    }

    #[test]
    fn scenario_while_loop() {
        assert_eq!(run_code("var i = 0; while (i < 3) { print(i); i = i + 1; }"), "0\n1\n2\n");
    }

    #[test]
    fn scenario_array_indexing() {
        assert_eq!(run_code("var a = [1, 2, 3]; print(a[1]);"), "2\n");
    }

    #[test]
    fn recursion_limit_raises_after_configured_depth() {
        let (tokens, _) = tokenize("define recursion_limit = 5; func g(n) { return g(n+1); } g(0);");
        let program = parse(&tokens).unwrap();
        let mut interpreter = Interpreter::new(CollectStringPrint::new(), crate::io::ScriptedInput::new(Vec::<String>::new()));
        let mut saw_limit = false;
        interpreter.run(&program, |outcome| {
            if let RunOutcome::RuntimeError(err) = outcome {
                if matches!(err.kind, RuntimeErrorKind::RecursionLimit { limit: 5 }) {
                    saw_limit = true;
                }
            }
        });
        assert!(saw_limit);
    }

    #[test]
    fn undefined_name_is_a_runtime_error_not_a_panic() {
        let (tokens, _) = tokenize("print(y);");
        let program = parse(&tokens).unwrap();
        let mut interpreter = Interpreter::new(CollectStringPrint::new(), crate::io::ScriptedInput::new(Vec::<String>::new()));
        let mut saw_error = false;
        interpreter.run(&program, |outcome| {
            if let RunOutcome::RuntimeError(err) = outcome {
                assert_eq!(err.at.line, 1);
                assert!(matches!(err.kind, RuntimeErrorKind::UndefinedName(ref name) if name == "y"));
                saw_error = true;
            }
        });
        assert!(saw_error);
    }

    #[test]
    fn bigint_plus_float_is_a_type_error() {
        let result = eval_binary(BinaryOp::Add, Value::BigInt(Rc::new(BigInt::from(1))), Value::Float(1.0));
        assert!(matches!(result, Err(RuntimeErrorKind::TypeError(_))));
    }

    #[test]
    fn bigint_plus_int_widens_int() {
        let result = eval_binary(BinaryOp::Add, Value::BigInt(Rc::new(BigInt::from(1))), Value::Int(2));
        assert!(matches!(result, Ok(Value::BigInt(_))));
    }

    #[test]
    fn integer_overflow_widens_to_float() {
        let result = int_arith(BinaryOp::Mul, i64::MAX, 2).unwrap();
        assert!(matches!(result, Value::Float(_)));
    }

    #[test]
    fn division_by_zero_raises() {
        assert!(matches!(int_arith(BinaryOp::Div, 1, 0), Err(RuntimeErrorKind::DivisionByZero)));
    }
}
