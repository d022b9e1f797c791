// ABOUTME: Environment module for managing variable bindings and lexical scope chains

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A name→value map plus an optional link to an outer scope. Closures hold a
/// shared reference to the chain they were constructed in; child frames for
/// function calls are transient and dropped on return.
#[derive(Debug)]
pub struct Environment {
    store: RefCell<HashMap<String, Value>>,
    outer: Option<Rc<Environment>>,
}

impl Environment {
    /// The session root: created once per interpreter run, sole home of
    /// native functions.
    pub fn root() -> Rc<Self> {
        Rc::new(Environment {
            store: RefCell::new(HashMap::new()),
            outer: None,
        })
    }

    /// A fresh child frame, e.g. a function call frame rooted at the
    /// function's *captured* scope rather than the call site.
    pub fn with_outer(outer: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            store: RefCell::new(HashMap::new()),
            outer: Some(outer),
        })
    }

    /// Searches local, then outward.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.store.borrow().get(name) {
            return Some(value.clone());
        }
        self.outer.as_ref().and_then(|outer| outer.get(name))
    }

    /// Writes locally unconditionally, returning the value. Used for `var`
    /// declarations and for binding call-frame parameters.
    pub fn declare(&self, name: impl Into<String>, value: Value) -> Value {
        self.store.borrow_mut().insert(name.into(), value.clone());
        value
    }

    /// Writes locally, reporting whether the name already existed in this
    /// frame. Used by batch `assign`, which writes to the local frame
    /// regardless of where (or whether) the name exists further out.
    pub fn set_local(&self, name: &str, value: Value) -> bool {
        let existed = self.does_exist(name);
        self.store.borrow_mut().insert(name.to_string(), value);
        existed
    }

    /// Local-only membership test, used to detect illegal redeclaration.
    pub fn does_exist(&self, name: &str) -> bool {
        self.store.borrow().contains_key(name)
    }

    /// Walks the chain looking for the frame that already binds `name` and
    /// overwrites it there. Returns `false` if `name` resolves nowhere.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        if self.does_exist(name) {
            self.store.borrow_mut().insert(name.to_string(), value);
            return true;
        }
        match &self.outer {
            Some(outer) => outer.assign(name, value),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_finds_local_binding() {
        let env = Environment::root();
        env.declare("x", Value::Number(42.0));
        assert_eq!(env.get("x"), Some(Value::Number(42.0)));
    }

    #[test]
    fn get_is_none_for_undefined_name() {
        let env = Environment::root();
        assert_eq!(env.get("missing"), None);
    }

    #[test]
    fn child_shadows_parent_locally() {
        let parent = Environment::root();
        parent.declare("x", Value::Number(1.0));
        let child = Environment::with_outer(parent.clone());
        child.declare("x", Value::Number(2.0));
        assert_eq!(child.get("x"), Some(Value::Number(2.0)));
        assert_eq!(parent.get("x"), Some(Value::Number(1.0)));
    }

    #[test]
    fn get_walks_outward_through_multiple_levels() {
        let grandparent = Environment::root();
        grandparent.declare("a", Value::Number(1.0));
        let parent = Environment::with_outer(grandparent);
        parent.declare("b", Value::Number(2.0));
        let child = Environment::with_outer(parent);
        child.declare("c", Value::Number(3.0));

        assert_eq!(child.get("a"), Some(Value::Number(1.0)));
        assert_eq!(child.get("b"), Some(Value::Number(2.0)));
        assert_eq!(child.get("c"), Some(Value::Number(3.0)));
    }

    #[test]
    fn set_local_never_writes_through_to_outer() {
        let parent = Environment::root();
        parent.declare("x", Value::Number(1.0));
        let child = Environment::with_outer(parent.clone());

        assert!(!child.set_local("x", Value::Number(99.0)));
        assert_eq!(child.get("x"), Some(Value::Number(99.0)));
        assert_eq!(parent.get("x"), Some(Value::Number(1.0)));
    }

    #[test]
    fn assign_overwrites_wherever_the_name_was_found() {
        let parent = Environment::root();
        parent.declare("x", Value::Number(1.0));
        let child = Environment::with_outer(parent.clone());

        assert!(child.assign("x", Value::Number(5.0)));
        assert_eq!(parent.get("x"), Some(Value::Number(5.0)));
        assert!(!child.does_exist("x"));
    }

    #[test]
    fn assign_fails_for_unresolved_name() {
        let env = Environment::root();
        assert!(!env.assign("nope", Value::Nil));
    }

    #[test]
    fn does_exist_is_local_only() {
        let parent = Environment::root();
        parent.declare("x", Value::Number(1.0));
        let child = Environment::with_outer(parent);
        assert!(!child.does_exist("x"));
    }
}
