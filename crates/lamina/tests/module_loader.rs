//! Native module loading failure modes (spec §4.5). Building and loading a
//! real C-ABI shared library is out of reach for a test that can't invoke a
//! compiler, so these exercise the two failure paths that don't require
//! one: the file-size gate (`SignatureInvalid`), and dispatch against an
//! empty registry (`NamespaceMismatch`).

use std::fs;
use std::path::PathBuf;

use lamina::{ModuleErrorKind, RuntimeErrorKind};

fn undersized_module_path() -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("lamina_test_module_{}.so", std::process::id()));
    fs::write(&path, b"too small to be a real module").unwrap();
    path
}

#[test]
fn file_under_minimum_size_is_signature_invalid() {
    let path = undersized_module_path();
    let source = format!("include \"{}\";", path.display());
    let program = lamina::compile(&source).unwrap();

    let mut interpreter = lamina::Interpreter::new(lamina::NoPrint, lamina::ScriptedInput::new(Vec::<String>::new()));
    let mut error = None;
    interpreter.run(&program, |outcome| {
        if let lamina::RunOutcome::RuntimeError(err) = outcome {
            error = Some(err.clone());
        }
    });

    let _ = fs::remove_file(&path);
    let err = error.expect("expected a runtime error for an undersized module file");
    assert!(matches!(err.kind, RuntimeErrorKind::ModuleError(ModuleErrorKind::SignatureInvalid { .. })));
}

#[test]
fn calling_an_unloaded_namespace_is_a_namespace_mismatch() {
    let program = lamina::compile("mathx.square(3);").unwrap();
    let mut interpreter = lamina::Interpreter::new(lamina::NoPrint, lamina::ScriptedInput::new(Vec::<String>::new()));
    let mut error = None;
    interpreter.run(&program, |outcome| {
        if let lamina::RunOutcome::RuntimeError(err) = outcome {
            error = Some(err.clone());
        }
    });
    let err = error.expect("expected a runtime error for an unloaded namespace");
    assert!(matches!(err.kind, RuntimeErrorKind::ModuleError(ModuleErrorKind::NamespaceMismatch { .. })));
}
