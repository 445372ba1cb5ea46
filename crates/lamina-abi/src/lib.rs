//! C-ABI wire types for Lamina's native module loader (spec §4.5, §6).
//!
//! This crate is intentionally `no_std`-shaped in spirit (plain `#[repr(C)]`
//! structs over raw pointers, no host-side safe wrapper) — it is the
//! contract a native module author links against directly, in whatever
//! language they write their module in. The interpreter's own
//! `module_loader` module is the only place that should construct or read
//! these types out of their raw form; everywhere else in the interpreter
//! sees a safe [`crate::value::Value`](../lamina/value/enum.Value.html).

use std::os::raw::{c_char, c_int};

/// Discriminant for [`LaminaValue`]'s payload union.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaminaValueTag {
    Null = 0,
    Bool = 1,
    Int = 2,
    Double = 3,
    String = 4,
}

/// The scalar union backing [`LaminaValue`] (spec §6: "tagged union over
/// {null, bool (int-sized), int, double, string (NUL-terminated)}").
#[repr(C)]
#[derive(Clone, Copy)]
pub union LaminaValueData {
    pub bool_val: c_int,
    pub int_val: i64,
    pub double_val: f64,
    /// NUL-terminated, owned by the module that produced it. The loader
    /// never frees this; it is only valid for the duration of the call
    /// that returned it.
    pub string_val: *const c_char,
}

/// An external value crossing the Lamina/native-module boundary.
///
/// Non-scalar host values (arrays, functions) are never represented here —
/// v2 of the ABI passes them across as `Null` (spec §4.5).
#[repr(C)]
pub struct LaminaValue {
    pub tag: LaminaValueTag,
    pub data: LaminaValueData,
}

impl LaminaValue {
    pub fn null() -> Self {
        Self { tag: LaminaValueTag::Null, data: LaminaValueData { int_val: 0 } }
    }
}

/// Opaque handle to the interpreter, passed to a module's `_entry`
/// functions so they can register callbacks. The interpreter never exposes
/// its internals through this pointer type itself; a module only ever
/// passes it back into host-provided callback function pointers.
#[repr(C)]
pub struct InterpreterHandle {
    _private: [u8; 0],
}

/// One callable export from a module's function table (spec §6).
#[repr(C)]
pub struct LaminaFunctionEntry {
    pub name: *const c_char,
    pub func: Option<extern "C" fn(*const LaminaValue, c_int) -> LaminaValue>,
    pub arity_hint: c_int,
}

/// Module identity metadata (spec §6).
#[repr(C)]
pub struct LaminaModuleInfo {
    pub namespace_name: *const c_char,
    pub version: *const c_char,
    pub description: *const c_char,
}

/// The table a module's `lamina_module_init` returns (spec §4.5).
#[repr(C)]
pub struct LaminaModuleExports {
    pub info: LaminaModuleInfo,
    pub function_count: c_int,
    pub functions: *const LaminaFunctionEntry,
}

/// The exact bytes a conforming module's `lamina_module_signature` must
/// return (spec §4.5).
pub const MODULE_SIGNATURE: &[u8] = b"LAMINA_MODULE_V2";

/// Below this size a file cannot plausibly be a valid shared library
/// (spec §4.5 validation step 1).
pub const MIN_MODULE_FILE_BYTES: u64 = 1024;

pub type ModuleSignatureFn = unsafe extern "C" fn() -> *const c_char;
pub type ModuleInitFn = unsafe extern "C" fn() -> *const LaminaModuleExports;
pub type ModuleEntryFn = unsafe extern "C" fn(*const InterpreterHandle);
