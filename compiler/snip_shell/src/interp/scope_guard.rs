//! RAII guard for block scopes.
//!
//! [`Interpreter::scoped`] pushes a fresh local scope and returns a guard
//! that derefs to the interpreter. Dropping the guard pops the scope, so a
//! `?` out of a block body still leaves the scope stack balanced.

use std::ops::{Deref, DerefMut};

use rustc_hash::FxHashMap;

use super::Interpreter;

pub(crate) struct ScopedInterpreter<'guard, 's> {
    interpreter: &'guard mut Interpreter<'s>,
}

impl Drop for ScopedInterpreter<'_, '_> {
    fn drop(&mut self) {
        self.interpreter.scopes.pop();
    }
}

impl<'s> Deref for ScopedInterpreter<'_, 's> {
    type Target = Interpreter<'s>;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for ScopedInterpreter<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

impl<'s> Interpreter<'s> {
    /// Enter a block scope that lasts as long as the returned guard.
    pub(crate) fn scoped(&mut self) -> ScopedInterpreter<'_, 's> {
        self.scopes.push(FxHashMap::default());
        ScopedInterpreter { interpreter: self }
    }

    #[cfg(test)]
    pub(crate) fn scope_depth(&self) -> usize {
        self.scopes.len()
    }
}

#[cfg(test)]
mod tests {
    use rustc_hash::FxHashMap;
    use snip_bridge::ValueChannel;

    use crate::output::silent_output;
    use crate::parser::parse_snippet;
    use crate::registry::{Imports, TypeRegistry};

    use super::Interpreter;

    #[test]
    fn scopes_are_popped_on_every_exit() {
        let registry = TypeRegistry::new();
        let output = silent_output();
        let channel = ValueChannel::new();
        let imports = Imports::default();
        let mut globals = FxHashMap::default();
        let mut interpreter = Interpreter::new(&registry, &output, &channel, &imports, &mut globals);

        {
            let mut outer = interpreter.scoped();
            let inner = outer.scoped();
            assert_eq!(inner.scope_depth(), 2);
        }
        assert_eq!(interpreter.scope_depth(), 0);

        let Ok(failing) = parse_snippet("{ int a = 1; { int b = a / 0; } }") else {
            panic!("snippet should parse");
        };
        assert!(interpreter.exec(&failing).is_err());
        assert_eq!(interpreter.scope_depth(), 0);
    }
}
