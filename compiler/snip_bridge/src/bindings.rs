//! Host binding store and the projector that maps it onto a session.
//!
//! The host keeps variables in two layered scopes: a wide `global` scope
//! and a narrower `engine` scope. Reads merge them with engine entries
//! winning; writes of retrieved variables go back to the scope the
//! variable came from, defaulting to the engine scope.

use rustc_hash::FxHashMap;

/// One host scope: variable name to value.
#[derive(Clone, Debug, PartialEq)]
pub struct Bindings<V> {
    entries: FxHashMap<String, V>,
}

impl<V> Bindings<V> {
    pub fn new() -> Self {
        Bindings {
            entries: FxHashMap::default(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.entries.get(name)
    }

    /// Insert `value`, returning the previous value under `name`.
    pub fn put(&mut self, name: impl Into<String>, value: V) -> Option<V> {
        self.entries.insert(name.into(), value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<V> {
        self.entries.remove(name)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Variable names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<V> Default for Bindings<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, K: Into<String>> FromIterator<(K, V)> for Bindings<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Bindings {
            entries: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }
}

/// Which host scope a variable lives in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    Global,
    Engine,
}

/// Both host scopes as seen by one evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptContext<V> {
    pub global: Bindings<V>,
    pub engine: Bindings<V>,
}

impl<V> ScriptContext<V> {
    pub fn new() -> Self {
        ScriptContext {
            global: Bindings::new(),
            engine: Bindings::new(),
        }
    }

    pub fn with_scopes(global: Bindings<V>, engine: Bindings<V>) -> Self {
        ScriptContext { global, engine }
    }

    pub fn bindings(&self, scope: Scope) -> &Bindings<V> {
        match scope {
            Scope::Global => &self.global,
            Scope::Engine => &self.engine,
        }
    }

    pub fn bindings_mut(&mut self, scope: Scope) -> &mut Bindings<V> {
        match scope {
            Scope::Global => &mut self.global,
            Scope::Engine => &mut self.engine,
        }
    }

    /// Look a name up the way a script sees it: engine first, then global.
    pub fn lookup(&self, name: &str) -> Option<&V> {
        self.engine.get(name).or_else(|| self.global.get(name))
    }

    /// Scope holding `name`, engine first.
    pub fn scope_of(&self, name: &str) -> Option<Scope> {
        if self.engine.contains(name) {
            Some(Scope::Engine)
        } else if self.global.contains(name) {
            Some(Scope::Global)
        } else {
            None
        }
    }
}

impl<V> Default for ScriptContext<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Flat read view over both scopes; engine entries override global ones.
pub fn merge_for_read<V: Clone>(global: &Bindings<V>, engine: &Bindings<V>) -> Bindings<V> {
    let mut merged = global.clone();
    for (name, value) in engine.iter() {
        merged.put(name, value.clone());
    }
    merged
}

/// Scope that receives a variable retrieved after execution.
///
/// A name that lives only in the global scope goes back there; anything
/// else, including names the script declared itself, goes to the engine
/// scope.
pub fn choose_write_scope<V>(name: &str, global: &Bindings<V>, engine: &Bindings<V>) -> Scope {
    if !engine.contains(name) && global.contains(name) {
        Scope::Global
    } else {
        Scope::Engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scope(entries: &[(&str, i32)]) -> Bindings<i32> {
        entries.iter().map(|&(name, value)| (name, value)).collect()
    }

    #[test]
    fn merge_prefers_engine_entries() {
        let global = scope(&[("a", 1), ("shared", 10)]);
        let engine = scope(&[("b", 2), ("shared", 20)]);
        let merged = merge_for_read(&global, &engine);
        assert_eq!(merged.names(), vec!["a", "b", "shared"]);
        assert_eq!(merged.get("shared"), Some(&20));
        assert_eq!(merged.get("a"), Some(&1));
    }

    #[test]
    fn global_only_name_is_written_back_to_global() {
        let global = scope(&[("x", 1)]);
        let engine = scope(&[]);
        assert_eq!(choose_write_scope("x", &global, &engine), Scope::Global);
    }

    #[test]
    fn engine_and_new_names_go_to_engine() {
        let global = scope(&[("x", 1)]);
        let engine = scope(&[("x", 2), ("y", 3)]);
        assert_eq!(choose_write_scope("x", &global, &engine), Scope::Engine);
        assert_eq!(choose_write_scope("y", &global, &engine), Scope::Engine);
        assert_eq!(choose_write_scope("fresh", &global, &engine), Scope::Engine);
    }

    #[test]
    fn context_lookup_is_layered() {
        let ctx = ScriptContext::with_scopes(scope(&[("a", 1), ("b", 1)]), scope(&[("b", 2)]));
        assert_eq!(ctx.lookup("a"), Some(&1));
        assert_eq!(ctx.lookup("b"), Some(&2));
        assert_eq!(ctx.scope_of("a"), Some(Scope::Global));
        assert_eq!(ctx.scope_of("b"), Some(Scope::Engine));
        assert_eq!(ctx.scope_of("c"), None);
    }
}
