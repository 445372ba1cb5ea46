//! Native module loading and `ns.fn(args)` dispatch (spec §4.5, §6).
//!
//! Validation is a strict three-step protocol (file size, signature,
//! init), then zero or more `*_entry` callbacks are discovered by scanning
//! the shared library's own symbol table — the one place this module
//! reaches for a crate ([`object`]) the rest of the interpreter has no use
//! for, since nothing else here needs to parse an object file.

use std::ffi::{CStr, CString};
use std::fs;
use std::os::raw::c_int;
use std::path::Path;

use lamina_abi::{
    InterpreterHandle, LaminaModuleExports, LaminaValue, LaminaValueData, LaminaValueTag, MIN_MODULE_FILE_BYTES,
    MODULE_SIGNATURE, ModuleEntryFn, ModuleInitFn, ModuleSignatureFn,
};
use libloading::{Library, Symbol};

use crate::error::{ModuleErrorKind, RuntimeErrorKind};
use crate::value::Value;

/// A single loaded native module: its library handle (kept alive for the
/// lifetime of its function pointers) and its parsed export table.
pub struct LoadedModule {
    _library: Library,
    namespace: String,
    exports: Vec<(String, lamina_abi::LaminaFunctionEntry)>,
}

// SAFETY: `LaminaFunctionEntry` holds raw pointers owned by the loaded
// library, which this struct keeps alive for as long as the entry is
// reachable; the interpreter is single-threaded (spec §5), so no access
// to these pointers is ever concurrent.
unsafe impl Send for LoadedModule {}

/// Owns every module loaded during a program run (spec §5: "a process-wide
/// registry that is populated at program start and torn down at process
/// exit").
#[derive(Default)]
pub struct ModuleRegistry {
    modules: Vec<LoadedModule>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads, validates, and registers a native module from `path`
    /// (spec §4.5 steps 1-4).
    pub fn load(&mut self, path: &Path) -> Result<(), RuntimeErrorKind> {
        let metadata = fs::metadata(path)
            .map_err(|_| ModuleErrorKind::SignatureInvalid { path: path.display().to_string() })
            .map_err(RuntimeErrorKind::ModuleError)?;
        if metadata.len() < MIN_MODULE_FILE_BYTES {
            return Err(RuntimeErrorKind::ModuleError(ModuleErrorKind::SignatureInvalid {
                path: path.display().to_string(),
            }));
        }

        // SAFETY: the module file is a user-provided shared library; loading
        // it executes arbitrary code, same as `dlopen` in the source this
        // loader is based on. The caller is trusted to only load modules it
        // intends to run.
        let library = unsafe { Library::new(path) }
            .map_err(|_| RuntimeErrorKind::ModuleError(ModuleErrorKind::SignatureInvalid { path: path.display().to_string() }))?;

        let signature_valid = unsafe {
            let signature_fn: Symbol<'_, ModuleSignatureFn> = library
                .get(b"lamina_module_signature\0")
                .map_err(|_| RuntimeErrorKind::ModuleError(ModuleErrorKind::SignatureInvalid { path: path.display().to_string() }))?;
            let raw = signature_fn();
            !raw.is_null() && CStr::from_ptr(raw).to_bytes() == MODULE_SIGNATURE
        };
        if !signature_valid {
            return Err(RuntimeErrorKind::ModuleError(ModuleErrorKind::SignatureInvalid {
                path: path.display().to_string(),
            }));
        }

        let exports_ptr = unsafe {
            let init_fn: Symbol<'_, ModuleInitFn> = library
                .get(b"lamina_module_init\0")
                .map_err(|_| RuntimeErrorKind::ModuleError(ModuleErrorKind::SignatureInvalid { path: path.display().to_string() }))?;
            init_fn()
        };
        if exports_ptr.is_null() {
            return Err(RuntimeErrorKind::ModuleError(ModuleErrorKind::SignatureInvalid {
                path: path.display().to_string(),
            }));
        }

        let (namespace, exports) = unsafe { read_exports(exports_ptr) };

        for symbol_name in entry_symbol_names(path) {
            unsafe {
                if let Ok(entry_fn) = library.get::<ModuleEntryFn>(format!("{symbol_name}\0").as_bytes()) {
                    let handle: *const InterpreterHandle = std::ptr::null();
                    entry_fn(handle);
                }
            }
        }

        self.modules.push(LoadedModule { _library: library, namespace, exports });
        Ok(())
    }

    /// Dispatches `namespace.function(args)` (spec §4.5 "Dispatch").
    pub fn call(&self, namespace: &str, function: &str, args: &[Value]) -> Result<Value, RuntimeErrorKind> {
        let module = self.modules.iter().find(|m| m.namespace == namespace).ok_or_else(|| {
            let got = self.modules.first().map(|m| m.namespace.clone()).unwrap_or_default();
            RuntimeErrorKind::ModuleError(ModuleErrorKind::NamespaceMismatch { expected: namespace.to_owned(), got })
        })?;

        let entry = module.exports.iter().find(|(name, _)| name == function).ok_or_else(|| {
            RuntimeErrorKind::ModuleError(ModuleErrorKind::UnknownFunction {
                namespace: namespace.to_owned(),
                function: function.to_owned(),
            })
        })?;

        let func = entry.1.func.ok_or_else(|| {
            RuntimeErrorKind::ModuleError(ModuleErrorKind::NullFunction {
                namespace: namespace.to_owned(),
                function: function.to_owned(),
            })
        })?;

        let external_args: Vec<LaminaValue> = args.iter().map(to_external).collect();
        let result = func(external_args.as_ptr(), external_args.len() as c_int);
        Ok(from_external(&result))
    }
}

unsafe fn read_exports(exports_ptr: *const LaminaModuleExports) -> (String, Vec<(String, lamina_abi::LaminaFunctionEntry)>) {
    let exports = &*exports_ptr;
    let namespace = c_str_to_string(exports.info.namespace_name);
    let mut functions = Vec::with_capacity(exports.function_count.max(0) as usize);
    if !exports.functions.is_null() {
        let entries = std::slice::from_raw_parts(exports.functions, exports.function_count.max(0) as usize);
        for entry in entries {
            let name = c_str_to_string(entry.name);
            functions.push((
                name,
                lamina_abi::LaminaFunctionEntry { name: entry.name, func: entry.func, arity_hint: entry.arity_hint },
            ));
        }
    }
    (namespace, functions)
}

unsafe fn c_str_to_string(ptr: *const std::os::raw::c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

/// Scans the module's own symbol table for exported names containing the
/// substring `_entry` (spec §4.5 step 4, §6). `object` gives a portable
/// read of the symbol table across ELF/Mach-O/PE, replacing the raw
/// per-platform walks the source under study used.
fn entry_symbol_names(path: &Path) -> Vec<String> {
    use object::{Object, ObjectSymbol};

    let Ok(bytes) = fs::read(path) else { return Vec::new() };
    let Ok(file) = object::File::parse(&*bytes) else { return Vec::new() };
    file.symbols()
        .filter_map(|symbol| symbol.name().ok())
        .filter(|name| name.contains("_entry"))
        .map(str::to_owned)
        .collect()
}

fn to_external(value: &Value) -> LaminaValue {
    match value {
        Value::Null => LaminaValue::null(),
        Value::Bool(b) => LaminaValue { tag: LaminaValueTag::Bool, data: LaminaValueData { bool_val: c_int::from(*b) } },
        Value::Int(i) => LaminaValue { tag: LaminaValueTag::Int, data: LaminaValueData { int_val: *i } },
        Value::Float(d) => LaminaValue { tag: LaminaValueTag::Double, data: LaminaValueData { double_val: *d } },
        Value::String(s) => {
            // Leaked intentionally: the callee only needs the pointer for
            // the duration of this call, and the process that owns this
            // allocation is the same one tearing down at exit (spec §4.5
            // "string payloads owned by the module" — on the way in, the
            // host is the owner instead, for exactly one call).
            let c_string = CString::new(s.as_bytes()).unwrap_or_default();
            LaminaValue { tag: LaminaValueTag::String, data: LaminaValueData { string_val: c_string.into_raw() } }
        }
        // Non-scalar values are not marshalled in v2 (spec §4.5).
        Value::BigInt(_) | Value::Array(_) | Value::Function(_) => LaminaValue::null(),
    }
}

fn from_external(value: &LaminaValue) -> Value {
    unsafe {
        match value.tag {
            LaminaValueTag::Null => Value::Null,
            LaminaValueTag::Bool => Value::Bool(value.data.bool_val != 0),
            LaminaValueTag::Int => Value::Int(value.data.int_val),
            LaminaValueTag::Double => Value::Float(value.data.double_val),
            LaminaValueTag::String => {
                if value.data.string_val.is_null() {
                    Value::Null
                } else {
                    Value::String(std::rc::Rc::from(CStr::from_ptr(value.data.string_val).to_string_lossy().as_ref()))
                }
            }
        }
    }
}
