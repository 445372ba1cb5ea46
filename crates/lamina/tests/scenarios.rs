//! End-to-end checks against the concrete scenario table, driven through
//! the public `lamina` API the way a CLI driver would use it.

use lamina::{compile, CollectStringPrint, Interpreter, RunOutcome, ScriptedInput};
use pretty_assertions::assert_eq;

fn run(src: &str) -> String {
    let program = compile(src).expect("compile error");
    let mut interpreter = Interpreter::new(CollectStringPrint::new(), ScriptedInput::new(Vec::<String>::new()));
    let mut errors = Vec::new();
    interpreter.run(&program, |outcome| {
        if let RunOutcome::RuntimeError(err) = outcome {
            errors.push(err.to_string());
        }
    });
    assert!(errors.is_empty(), "unexpected runtime errors: {errors:?}");
    interpreter.writer().output().to_owned()
}

#[test]
fn arithmetic_respects_operator_precedence() {
    assert_eq!(run("var x = 2 + 3 * 4; print(x);"), "14\n");
}

#[test]
fn recursive_function_calls_compute_fibonacci() {
    let src = "func fib(n) { if (n < 2) { return n; } return fib(n-1) + fib(n-2); } print(fib(10));";
    assert_eq!(run(src), "55\n");
}

#[test]
fn while_loop_prints_each_iteration() {
    assert_eq!(run("var i = 0; while (i < 3) { print(i); i = i + 1; }"), "0\n1\n2\n");
}

#[test]
fn array_literal_supports_indexing() {
    assert_eq!(run("var a = [1, 2, 3]; print(a[1]);"), "2\n");
}

#[test]
fn string_concatenation_with_plus() {
    assert_eq!(run(r#"print("a" + "b");"#), "ab\n");
}

#[test]
fn bigint_declaration_supports_arbitrary_precision_arithmetic() {
    let src = "bigint x = 9223372036854775807; bigint y = x + 1; print(y);";
    assert_eq!(run(src), "9223372036854775808\n");
}

#[test]
fn break_and_continue_control_loop_flow() {
    let src = "var i = 0; while (i < 5) { i = i + 1; if (i == 2) { continue; } if (i == 4) { break; } print(i); }";
    assert_eq!(run(src), "1\n3\n");
}

#[test]
fn closures_capture_their_defining_scope() {
    let src = "func make_adder(n) { func add(x) { return x + n; } return add; } var add5 = make_adder(5); print(add5(3));";
    assert_eq!(run(src), "8\n");
}

#[test]
fn input_expression_reads_a_scripted_line() {
    let program = compile("var name = input; print(name);").unwrap();
    let mut interpreter = Interpreter::new(CollectStringPrint::new(), ScriptedInput::new(["Ada"]));
    interpreter.run(&program, |outcome| {
        assert!(matches!(outcome, RunOutcome::Completed));
    });
    assert_eq!(interpreter.writer().output(), "Ada\n");
}

#[test]
fn undefined_name_raises_a_runtime_error_without_aborting_the_process() {
    let program = compile("print(undeclared_name);").unwrap();
    let mut interpreter = Interpreter::new(CollectStringPrint::new(), ScriptedInput::new(Vec::<String>::new()));
    let mut saw_error = false;
    interpreter.run(&program, |outcome| {
        saw_error |= matches!(outcome, RunOutcome::RuntimeError(_));
    });
    assert!(saw_error);
}

#[test]
fn index_out_of_range_is_a_runtime_error() {
    let program = compile("var a = [1]; print(a[5]);").unwrap();
    let mut interpreter = Interpreter::new(CollectStringPrint::new(), ScriptedInput::new(Vec::<String>::new()));
    let mut saw_error = false;
    interpreter.run(&program, |outcome| {
        saw_error |= matches!(outcome, RunOutcome::RuntimeError(_));
    });
    assert!(saw_error);
}
