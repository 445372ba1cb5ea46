//! The environment stack: parent-chained lexical scopes (spec §3
//! "Environment", §9 "Shared function captures").
//!
//! Scopes never form cycles — a child only ever points at the scope it was
//! opened in, never the reverse — so a plain `Rc` chain is enough; there is
//! no need for a cycle-collecting GC or `Weak` back-links.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::value::Value;

/// Insertion-ordered so `:vars` prints bindings in declaration order;
/// hashed with `ahash` since the key set is just program identifiers and
/// never needs to resist adversarial input.
type Bindings = IndexMap<Rc<str>, Value, ahash::RandomState>;

#[derive(Debug, PartialEq)]
struct Scope {
    bindings: Bindings,
    parent: Option<Environment>,
}

/// A reference-counted handle to a scope. Cloning an `Environment` shares
/// the same scope rather than copying its bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment(Rc<RefCell<Scope>>);

impl Environment {
    /// A fresh top-level scope with no parent.
    pub fn root() -> Self {
        Self(Rc::new(RefCell::new(Scope { bindings: Bindings::default(), parent: None })))
    }

    /// A child scope whose lookups fall through to `self` on miss.
    pub fn child(&self) -> Self {
        Self(Rc::new(RefCell::new(Scope { bindings: Bindings::default(), parent: Some(self.clone()) })))
    }

    /// Declares `name` in *this* scope, shadowing any outer binding of the
    /// same name (spec: "declarations always create in the current scope,
    /// shadowing permitted").
    pub fn declare(&self, name: Rc<str>, value: Value) {
        self.0.borrow_mut().bindings.insert(name, value);
    }

    /// Resolves `name`, walking outward through parent scopes.
    pub fn get(&self, name: &str) -> Option<Value> {
        let scope = self.0.borrow();
        if let Some(value) = scope.bindings.get(name) {
            return Some(value.clone());
        }
        scope.parent.as_ref().and_then(|parent| parent.get(name))
    }

    /// Mutates `name` in the innermost scope that already contains it.
    /// Returns `false` if no scope in the chain has the name bound.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        let mut scope = self.0.borrow_mut();
        if let Some(slot) = scope.bindings.get_mut(name) {
            *slot = value;
            return true;
        }
        let parent = scope.parent.clone();
        drop(scope);
        match parent {
            Some(parent) => parent.assign(name, value),
            None => false,
        }
    }

    /// Every binding visible in this exact scope (not parents), for the
    /// REPL's `:vars` meta-command.
    pub fn local_bindings(&self) -> Vec<(Rc<str>, Value)> {
        self.0.borrow().bindings.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_outward() {
        let root = Environment::root();
        root.declare(Rc::from("x"), Value::Int(1));
        let child = root.child();
        assert_eq!(child.get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn declare_shadows_in_current_scope_only() {
        let root = Environment::root();
        root.declare(Rc::from("x"), Value::Int(1));
        let child = root.child();
        child.declare(Rc::from("x"), Value::Int(2));
        assert_eq!(child.get("x"), Some(Value::Int(2)));
        assert_eq!(root.get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn assign_mutates_innermost_defining_scope() {
        let root = Environment::root();
        root.declare(Rc::from("x"), Value::Int(1));
        let child = root.child();
        assert!(child.assign("x", Value::Int(9)));
        assert_eq!(root.get("x"), Some(Value::Int(9)));
    }

    #[test]
    fn assign_to_undeclared_name_fails() {
        let root = Environment::root();
        assert!(!root.assign("missing", Value::Null));
    }
}
