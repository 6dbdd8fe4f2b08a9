//! Per-evaluation value relay between the host and synthesized fragments.
//!
//! A [`ValueChannel`] is created by the evaluation driver, handed to the
//! session it opens, and cleared when that evaluation ends. Clones share
//! the same table, so the driver and the session see each other's writes,
//! but two evaluations never share a channel.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Name to value relay scoped to one evaluation session.
pub struct ValueChannel<V> {
    slots: Arc<Mutex<FxHashMap<String, V>>>,
}

impl<V> ValueChannel<V> {
    pub fn new() -> Self {
        ValueChannel {
            slots: Arc::new(Mutex::new(FxHashMap::default())),
        }
    }

    /// Store `value` under `name`, replacing any previous value.
    pub fn set(&self, name: impl Into<String>, value: V) {
        self.slots.lock().insert(name.into(), value);
    }

    /// Remove and return the value stored under `name`.
    pub fn take(&self, name: &str) -> Option<V> {
        self.slots.lock().remove(name)
    }

    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Whether `other` is a handle to the same table.
    pub fn same_channel(&self, other: &ValueChannel<V>) -> bool {
        Arc::ptr_eq(&self.slots, &other.slots)
    }
}

impl<V: Clone> ValueChannel<V> {
    /// Value stored under `name`, if any.
    pub fn get(&self, name: &str) -> Option<V> {
        self.slots.lock().get(name).cloned()
    }
}

impl<V> Clone for ValueChannel<V> {
    fn clone(&self) -> Self {
        ValueChannel {
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<V> Default for ValueChannel<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for ValueChannel<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueChannel({} slots)", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get() {
        let channel = ValueChannel::new();
        channel.set("a", 1);
        assert_eq!(channel.get("a"), Some(1));
        assert_eq!(channel.get("b"), None);
    }

    #[test]
    fn clones_share_slots() {
        let channel = ValueChannel::new();
        let session_side = channel.clone();
        session_side.set("out", 5);
        assert_eq!(channel.get("out"), Some(5));
        assert!(channel.same_channel(&session_side));
    }

    #[test]
    fn separate_channels_are_isolated() {
        let first = ValueChannel::new();
        let second = ValueChannel::new();
        first.set("x", 1);
        assert_eq!(second.get("x"), None);
        assert!(!first.same_channel(&second));
    }

    #[test]
    fn clear_empties_every_handle() {
        let channel = ValueChannel::new();
        let other = channel.clone();
        channel.set("x", 1);
        channel.set("y", 2);
        other.clear();
        assert!(channel.is_empty());
        assert_eq!(channel.take("x"), None);
    }
}
