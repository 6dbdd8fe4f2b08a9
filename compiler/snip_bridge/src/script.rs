//! Host-facing engine and compiled scripts.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::{Backend, Session};
use crate::bindings::ScriptContext;
use crate::driver::{self, OpenSession};
use crate::error::ScriptResult;
use crate::splitter;

struct EngineInner<B: Backend> {
    backend: B,
    context: Mutex<ScriptContext<B::Value>>,
}

/// Scripting engine over one backend.
///
/// Cheap to clone; clones share the backend and the default context.
pub struct ScriptEngine<B: Backend> {
    inner: Arc<EngineInner<B>>,
}

impl<B: Backend> ScriptEngine<B> {
    pub fn new(backend: B) -> Self {
        ScriptEngine {
            inner: Arc::new(EngineInner {
                backend,
                context: Mutex::new(ScriptContext::new()),
            }),
        }
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// Split `source` into executable units.
    ///
    /// Uses a throwaway session for completeness analysis; nothing is
    /// executed.
    #[tracing::instrument(level = "debug", skip_all, fields(len = source.len()))]
    pub fn compile(&self, source: &str) -> ScriptResult<CompiledScript<B>> {
        let open = OpenSession::open(&self.inner.backend)?;
        let units = splitter::split(source, |text| open.session().analyze_completion(text))?;
        tracing::debug!(units = units.len(), "compiled script");
        Ok(CompiledScript {
            engine: self.clone(),
            units,
            running: Mutex::new(()),
        })
    }

    /// Compile and evaluate `source` against the default context.
    pub fn eval(&self, source: &str) -> ScriptResult<Option<B::Value>> {
        let script = self.compile(source)?;
        let mut context = self.inner.context.lock();
        script.eval(&mut context)
    }

    /// Compile and evaluate `source` against `ctx`.
    pub fn eval_with(
        &self,
        source: &str,
        ctx: &mut ScriptContext<B::Value>,
    ) -> ScriptResult<Option<B::Value>> {
        self.compile(source)?.eval(ctx)
    }

    /// Set a variable in the default engine scope.
    pub fn put(&self, name: impl Into<String>, value: B::Value) {
        self.inner.context.lock().engine.put(name, value);
    }

    /// Set a variable in the default global scope.
    pub fn put_global(&self, name: impl Into<String>, value: B::Value) {
        self.inner.context.lock().global.put(name, value);
    }

    /// Variable from the default engine scope.
    pub fn get(&self, name: &str) -> Option<B::Value> {
        self.inner.context.lock().engine.get(name).cloned()
    }

    /// Run `f` with exclusive access to the default context.
    pub fn with_context<R>(&self, f: impl FnOnce(&mut ScriptContext<B::Value>) -> R) -> R {
        f(&mut self.inner.context.lock())
    }
}

impl<B: Backend> Clone for ScriptEngine<B> {
    fn clone(&self) -> Self {
        ScriptEngine {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Backend> fmt::Debug for ScriptEngine<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptEngine").finish_non_exhaustive()
    }
}

/// Source text compiled into an immutable sequence of units.
///
/// May be evaluated any number of times. Evaluations of the same compiled
/// script never overlap; each one runs in a fresh session.
pub struct CompiledScript<B: Backend> {
    engine: ScriptEngine<B>,
    units: Vec<String>,
    running: Mutex<()>,
}

impl<B: Backend> CompiledScript<B> {
    pub fn units(&self) -> &[String] {
        &self.units
    }

    pub fn engine(&self) -> &ScriptEngine<B> {
        &self.engine
    }

    /// Evaluate against `ctx`, returning the last unit's value.
    ///
    /// Host scopes in `ctx` change only if every unit succeeds.
    pub fn eval(&self, ctx: &mut ScriptContext<B::Value>) -> ScriptResult<Option<B::Value>> {
        let _running = self.running.lock();
        driver::evaluate(&self.engine.inner.backend, &self.units, ctx)
    }
}

impl<B: Backend> fmt::Debug for CompiledScript<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledScript")
            .field("units", &self.units)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScriptError;
    use crate::test_helpers::ScriptedBackend;
    use pretty_assertions::assert_eq;

    #[test]
    fn compile_splits_without_executing() {
        let backend = ScriptedBackend::default();
        let engine = ScriptEngine::new(backend.clone());
        let script = engine.compile("1; diag;\n").unwrap_or_else(|err| panic!("{err}"));
        assert_eq!(script.units(), ["1;".to_string(), "diag;".to_string()]);
        let journal = backend.journal.lock();
        assert!(journal.executed.is_empty());
        assert_eq!(journal.closed, 1);
    }

    #[test]
    fn compile_rejects_trailing_partial_unit() {
        let engine = ScriptEngine::new(ScriptedBackend::default());
        assert_eq!(
            engine.compile("1; 2").map(|script| script.units().len()),
            Err(ScriptError::Incomplete {
                remaining: " 2".to_string()
            })
        );
    }

    #[test]
    fn default_context_round_trip() {
        let engine = ScriptEngine::new(ScriptedBackend::default());
        engine.put("a", 7);
        assert_eq!(engine.eval("a;"), Ok(Some(7)));
        assert_eq!(engine.eval("b = 3;"), Ok(Some(3)));
        assert_eq!(engine.get("b"), Some(3));
        assert_eq!(engine.get("a"), Some(7));
    }

    #[test]
    fn compiled_script_is_reusable() {
        let engine = ScriptEngine::new(ScriptedBackend::default());
        let script = engine.compile("a;").unwrap_or_else(|err| panic!("{err}"));

        let mut first = ScriptContext::new();
        first.engine.put("a", 1);
        let mut second = ScriptContext::new();
        second.engine.put("a", 2);

        assert_eq!(script.eval(&mut first), Ok(Some(1)));
        assert_eq!(script.eval(&mut second), Ok(Some(2)));
    }
}
