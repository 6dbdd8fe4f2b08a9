//! Runtime values of the shell language.
//!
//! Primitives and strings are immutable; lists and objects are shared
//! references, so a host value projected into a session and mutated there
//! is the same object the host holds.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::registry::ClassId;

#[derive(Clone, Debug)]
pub enum Value {
    Null,
    /// `int` and `long`, and their boxed forms.
    Int(i64),
    Double(f64),
    Bool(bool),
    Str(Arc<str>),
    List(Arc<Mutex<Vec<Value>>>),
    Object(Arc<Object>),
}

impl Value {
    pub fn string(text: impl Into<Arc<str>>) -> Self {
        Value::Str(text.into())
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(Mutex::new(items)))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Java-style rendering, as `String.valueOf` would produce.
    pub fn display(&self) -> String {
        self.to_string()
    }

    /// Shell-style rendering: like [`Value::display`] but strings are quoted.
    pub fn rendered(&self) -> String {
        match self {
            Value::Str(text) => format!("{text:?}"),
            other => other.display(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Value::Int(value) => Some(*value as f64),
            Value::Double(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(text) => Some(text),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    /// Primitives and strings compare by value, lists and objects by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_value(self, f, &mut Vec::new())
    }
}

type ListPtr = *const Mutex<Vec<Value>>;

/// `open` holds the lists currently being printed; a list reached again
/// from inside itself prints as `(this Collection)`.
fn fmt_value(value: &Value, f: &mut fmt::Formatter<'_>, open: &mut Vec<ListPtr>) -> fmt::Result {
    match value {
        Value::Null => f.write_str("null"),
        Value::Int(value) => write!(f, "{value}"),
        Value::Double(value) => fmt_double(*value, f),
        Value::Bool(value) => write!(f, "{value}"),
        Value::Str(text) => f.write_str(text),
        Value::List(items) => {
            let ptr = Arc::as_ptr(items);
            if open.contains(&ptr) {
                return f.write_str("(this Collection)");
            }
            // Snapshot so no lock is held while elements render.
            let snapshot = items.lock().clone();
            open.push(ptr);
            f.write_str("[")?;
            for (index, item) in snapshot.iter().enumerate() {
                if index > 0 {
                    f.write_str(", ")?;
                }
                fmt_value(item, f, open)?;
            }
            open.pop();
            f.write_str("]")
        }
        Value::Object(object) => write!(f, "{object}"),
    }
}

/// Doubles always show a fractional part: `5.0`, not `5`.
fn fmt_double(value: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if value.is_nan() {
        f.write_str("NaN")
    } else if value.is_infinite() {
        f.write_str(if value > 0.0 { "Infinity" } else { "-Infinity" })
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        write!(f, "{value:.1}")
    } else {
        write!(f, "{value}")
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::string(value)
    }
}

/// Instance of a registered class.
#[derive(Debug)]
pub struct Object {
    class: ClassId,
    /// Name shown by `toString`; the canonical name when there is one.
    class_name: Arc<str>,
    throwable: bool,
    fields: Mutex<Vec<(String, Value)>>,
}

impl Object {
    pub fn new(
        class: ClassId,
        class_name: impl Into<Arc<str>>,
        throwable: bool,
        fields: Vec<(String, Value)>,
    ) -> Self {
        Object {
            class,
            class_name: class_name.into(),
            throwable,
            fields: Mutex::new(fields),
        }
    }

    pub fn class(&self) -> ClassId {
        self.class
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn is_throwable(&self) -> bool {
        self.throwable
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        self.fields
            .lock()
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.clone())
    }

    /// Overwrite an existing field; false if the object has no such field.
    pub fn set(&self, field: &str, value: Value) -> bool {
        let mut fields = self.fields.lock();
        match fields.iter_mut().find(|(name, _)| name == field) {
            Some(slot) => {
                slot.1 = value;
                true
            }
            None => false,
        }
    }

    /// Message of a throwable, if set.
    pub fn message(&self) -> Option<String> {
        match self.get("message") {
            Some(Value::Str(text)) => Some(text.to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.throwable {
            return match self.message() {
                Some(message) => write!(f, "{}: {message}", self.class_name),
                None => f.write_str(&self.class_name),
            };
        }
        let identity = std::ptr::from_ref(self) as usize;
        write!(f, "{}@{:x}", self.class_name, identity & 0xffff_ffff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn doubles_keep_fraction() {
        assert_eq!(Value::Double(5.0).display(), "5.0");
        assert_eq!(Value::Double(2.5).display(), "2.5");
        assert_eq!(Value::Double(f64::INFINITY).display(), "Infinity");
    }

    #[test]
    fn strings_are_quoted_only_when_rendered() {
        let value = Value::from("hi");
        assert_eq!(value.display(), "hi");
        assert_eq!(value.rendered(), "\"hi\"");
    }

    #[test]
    fn lists_render_like_java() {
        let list = Value::list(vec![Value::Int(1), Value::from("a"), Value::Null]);
        assert_eq!(list.display(), "[1, a, null]");
    }

    #[test]
    fn self_containing_list_renders_once() {
        let list = Value::list(vec![Value::Int(1)]);
        let Value::List(items) = &list else { unreachable!() };
        items.lock().push(list.clone());
        assert_eq!(list.display(), "[1, (this Collection)]");

        let outer = Value::list(vec![list.clone(), list.clone()]);
        assert_eq!(
            outer.display(),
            "[[1, (this Collection)], [1, (this Collection)]]"
        );
    }

    #[test]
    fn references_compare_by_identity() {
        let first = Value::list(Vec::new());
        let second = Value::list(Vec::new());
        assert_eq!(first, first.clone());
        assert_ne!(first, second);
    }

    #[test]
    fn object_fields() {
        let class = crate::registry::TypeRegistry::new().well_known().object;
        let object = Object::new(class, "demo.Point", false, vec![("x".to_string(), Value::Int(0))]);
        assert!(object.set("x", Value::Int(3)));
        assert!(!object.set("y", Value::Int(1)));
        assert_eq!(object.get("x"), Some(Value::Int(3)));
        assert!(object.to_string().starts_with("demo.Point@"));
    }
}
