//! Method calls: static members of library classes, the value channel,
//! and instance methods on strings, numbers, lists and objects.

use snip_bridge::CHANNEL_HANDLE;

use super::errors::{cannot_find_method, cannot_find_variable, incompatible_types, Abort, Flow};
use super::operators::{equals, type_label};
use super::Interpreter;
use crate::ast::{Expr, ExprKind};
use crate::lexer::Span;
use crate::registry::{ClassId, Imports, TypeRef, TypeRegistry};
use crate::value::Value;

/// Receiver of a call or field access that names a class, not a value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum StaticReceiver {
    Channel,
    System,
    SystemOut,
    Math,
    Class(ClassId),
}

/// Dotted name spelled by an identifier chain, e.g. `java.lang.Math`.
fn qualified_path(expr: &Expr) -> Option<String> {
    match &expr.kind {
        ExprKind::Ident(name) => Some(name.clone()),
        ExprKind::Field { receiver, name } => {
            let mut path = qualified_path(receiver)?;
            path.push('.');
            path.push_str(name);
            Some(path)
        }
        _ => None,
    }
}

/// Classify `expr` as a static receiver. Variables shadow class names.
pub(crate) fn static_receiver(
    expr: &Expr,
    is_variable: impl Fn(&str) -> bool,
    registry: &TypeRegistry,
    imports: &Imports,
) -> Option<StaticReceiver> {
    let path = qualified_path(expr)?;
    let head = path.split('.').next().unwrap_or(&path);
    if is_variable(head) {
        return None;
    }
    match path.as_str() {
        CHANNEL_HANDLE => Some(StaticReceiver::Channel),
        "System" | "java.lang.System" => Some(StaticReceiver::System),
        "System.out" | "java.lang.System.out" => Some(StaticReceiver::SystemOut),
        "Math" | "java.lang.Math" => Some(StaticReceiver::Math),
        _ => match registry.resolve(&path, imports) {
            Ok(TypeRef::Class(class)) => Some(StaticReceiver::Class(class)),
            _ => None,
        },
    }
}

impl Interpreter<'_> {
    /// `receiver.method(args)`; `None` for void methods.
    pub(super) fn eval_call(
        &mut self,
        receiver: &Expr,
        method: &str,
        args: &[Expr],
        span: &Span,
    ) -> Flow<Option<Value>> {
        let target = static_receiver(receiver, |name| self.is_bound(name), self.registry, self.imports);
        let receiver = match target {
            Some(_) => None,
            None => Some(self.eval(receiver)?),
        };
        let args = args
            .iter()
            .map(|arg| self.eval(arg))
            .collect::<Flow<Vec<_>>>()?;
        match (target, receiver) {
            (Some(target), _) => self.call_static(target, method, &args, span),
            (None, Some(receiver)) => self.call_method(receiver, method, &args, span),
            (None, None) => Err(cannot_find_method(method, args.len(), span)),
        }
    }

    pub(super) fn static_field(
        &self,
        target: StaticReceiver,
        name: &str,
        span: &Span,
    ) -> Flow<Value> {
        let known = self.well_known();
        match (target, name) {
            (StaticReceiver::Class(class), "MAX_VALUE") if class == known.integer => {
                Ok(Value::Int(i64::from(i32::MAX)))
            }
            (StaticReceiver::Class(class), "MIN_VALUE") if class == known.integer => {
                Ok(Value::Int(i64::from(i32::MIN)))
            }
            (StaticReceiver::Math, "PI") => Ok(Value::Double(std::f64::consts::PI)),
            (StaticReceiver::Math, "E") => Ok(Value::Double(std::f64::consts::E)),
            _ => Err(cannot_find_variable(name, span)),
        }
    }

    fn call_static(
        &mut self,
        target: StaticReceiver,
        method: &str,
        args: &[Value],
        span: &Span,
    ) -> Flow<Option<Value>> {
        let known = *self.well_known();
        match (target, method, args) {
            (StaticReceiver::SystemOut, "println", []) => {
                self.output.println("");
                Ok(None)
            }
            (StaticReceiver::SystemOut, "println", [value]) => {
                self.output.println(&value.display());
                Ok(None)
            }
            (StaticReceiver::SystemOut, "print", [value]) => {
                self.output.print(&value.display());
                Ok(None)
            }

            (StaticReceiver::Channel, "get", [Value::Str(name)]) => {
                Ok(Some(self.channel.get(name).unwrap_or(Value::Null)))
            }
            (StaticReceiver::Channel, "set", [Value::Str(name), value]) => {
                self.channel.set(name.to_string(), value.clone());
                Ok(None)
            }

            (StaticReceiver::Math, "max" | "min", [Value::Int(a), Value::Int(b)]) => {
                Ok(Some(Value::Int(if method == "max" { *a.max(b) } else { *a.min(b) })))
            }
            (StaticReceiver::Math, "max" | "min", [a, b]) => {
                let (a, b) = self.doubles(a, b, span)?;
                Ok(Some(Value::Double(if method == "max" { a.max(b) } else { a.min(b) })))
            }
            (StaticReceiver::Math, "abs", [Value::Int(value)]) => {
                Ok(Some(Value::Int(value.wrapping_abs())))
            }
            (StaticReceiver::Math, "abs", [Value::Double(value)]) => {
                Ok(Some(Value::Double(value.abs())))
            }
            (StaticReceiver::Math, "pow", [a, b]) => {
                let (a, b) = self.doubles(a, b, span)?;
                Ok(Some(Value::Double(a.powf(b))))
            }
            (StaticReceiver::Math, "sqrt", [value]) => {
                let (value, _) = self.doubles(value, &Value::Int(0), span)?;
                Ok(Some(Value::Double(value.sqrt())))
            }

            (StaticReceiver::Class(class), "parseInt", [Value::Str(text)])
            | (StaticReceiver::Class(class), "valueOf", [Value::Str(text)])
                if class == known.integer =>
            {
                self.parse_int(text).map(Some)
            }
            (StaticReceiver::Class(class), "valueOf", [value @ Value::Int(_)])
                if class == known.integer =>
            {
                Ok(Some(value.clone()))
            }
            (StaticReceiver::Class(class), "parseDouble" | "valueOf", [Value::Str(text)])
                if class == known.double =>
            {
                text.trim()
                    .parse::<f64>()
                    .map(|value| Some(Value::Double(value)))
                    .map_err(|_| {
                        self.exception(
                            |k| k.number_format,
                            Some(&format!("For input string: \"{text}\"")),
                        )
                    })
            }
            (StaticReceiver::Class(class), "valueOf" | "toString", [value])
                if class == known.string || class == known.integer || class == known.double =>
            {
                Ok(Some(Value::string(value.display())))
            }
            _ => Err(cannot_find_method(method, args.len(), span)),
        }
    }

    fn parse_int(&self, text: &str) -> Flow<Value> {
        text.parse::<i32>()
            .map(|value| Value::Int(i64::from(value)))
            .map_err(|_| {
                self.exception(
                    |k| k.number_format,
                    Some(&format!("For input string: \"{text}\"")),
                )
            })
    }

    fn doubles(&self, a: &Value, b: &Value, span: &Span) -> Flow<(f64, f64)> {
        match (a.as_double(), b.as_double()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ if a.is_null() || b.is_null() => Err(self.null_pointer("Cannot unbox null value")),
            (None, _) => Err(incompatible_types(&type_label(a), "double", span)),
            (_, None) => Err(incompatible_types(&type_label(b), "double", span)),
        }
    }

    fn call_method(
        &mut self,
        receiver: Value,
        method: &str,
        args: &[Value],
        span: &Span,
    ) -> Flow<Option<Value>> {
        match (method, args) {
            ("toString", []) if !receiver.is_null() => {
                return Ok(Some(Value::string(receiver.display())));
            }
            ("equals", [other]) if !receiver.is_null() => {
                return Ok(Some(Value::Bool(equals(&receiver, other))));
            }
            _ => {}
        }
        match &receiver {
            Value::Null => Err(self.null_pointer(&format!(
                "Cannot invoke \"{method}()\" because value is null"
            ))),
            Value::Str(text) => self.string_method(text, method, args, span).map(Some),
            Value::Int(_) | Value::Double(_) => self.number_method(&receiver, method, args, span),
            Value::List(_) => self.list_method(&receiver, method, args, span),
            Value::Object(object) => match (method, args) {
                ("getMessage", []) if object.is_throwable() => {
                    Ok(Some(object.message().map_or(Value::Null, Value::string)))
                }
                _ => Err(cannot_find_method(method, args.len(), span)),
            },
            Value::Bool(_) => Err(cannot_find_method(method, args.len(), span)),
        }
    }

    fn string_method(&self, text: &str, method: &str, args: &[Value], span: &Span) -> Flow<Value> {
        let length = text.chars().count();
        let value = match (method, args) {
            ("length", []) => Value::Int(to_int(length)),
            ("isEmpty", []) => Value::Bool(text.is_empty()),
            ("toUpperCase", []) => Value::string(text.to_uppercase()),
            ("toLowerCase", []) => Value::string(text.to_lowercase()),
            ("trim", []) => Value::string(text.trim()),
            ("contains", [Value::Str(other)]) => Value::Bool(text.contains(&**other)),
            ("startsWith", [Value::Str(other)]) => Value::Bool(text.starts_with(&**other)),
            ("endsWith", [Value::Str(other)]) => Value::Bool(text.ends_with(&**other)),
            ("indexOf", [Value::Str(other)]) => Value::Int(
                text.find(&**other)
                    .map_or(-1, |byte| to_int(text[..byte].chars().count())),
            ),
            ("concat", [Value::Str(other)]) => Value::string(format!("{text}{other}")),
            ("replace", [Value::Str(from), Value::Str(to)]) => {
                Value::string(text.replace(&**from, to))
            }
            ("equalsIgnoreCase", [Value::Str(other)]) => {
                Value::Bool(text.to_lowercase() == other.to_lowercase())
            }
            ("compareTo", [Value::Str(other)]) => {
                Value::Int(match Ord::cmp(text, &**other) {
                    std::cmp::Ordering::Less => -1,
                    std::cmp::Ordering::Equal => 0,
                    std::cmp::Ordering::Greater => 1,
                })
            }
            ("charAt", [Value::Int(index)]) => match self.index(*index, length) {
                Some(index) => Value::string(text.chars().skip(index).take(1).collect::<String>()),
                None => return Err(self.out_of_bounds(*index, length)),
            },
            ("substring", [Value::Int(begin)]) => self.substring(text, *begin, to_int(length))?,
            ("substring", [Value::Int(begin), Value::Int(end)]) => {
                self.substring(text, *begin, *end)?
            }
            _ => return Err(cannot_find_method(method, args.len(), span)),
        };
        Ok(value)
    }

    fn substring(&self, text: &str, begin: i64, end: i64) -> Flow<Value> {
        let length = text.chars().count();
        if begin < 0 || end < begin || end > to_int(length) {
            return Err(self.exception(
                |k| k.index_out_of_bounds,
                Some(&format!("begin {begin}, end {end}, length {length}")),
            ));
        }
        let (begin, end) = (
            usize::try_from(begin).unwrap_or(0),
            usize::try_from(end).unwrap_or(0),
        );
        Ok(Value::string(
            text.chars().skip(begin).take(end - begin).collect::<String>(),
        ))
    }

    fn number_method(
        &self,
        receiver: &Value,
        method: &str,
        args: &[Value],
        span: &Span,
    ) -> Flow<Option<Value>> {
        #[allow(clippy::cast_possible_truncation)]
        let value = match (method, receiver, args) {
            ("intValue", Value::Int(value), []) => Value::Int(i64::from(*value as i32)),
            ("intValue", Value::Double(value), []) => Value::Int(i64::from(*value as i32)),
            ("longValue", Value::Double(value), []) => Value::Int(*value as i64),
            ("longValue", Value::Int(value), []) => Value::Int(*value),
            ("doubleValue", _, []) => Value::Double(receiver.as_double().unwrap_or_default()),
            ("compareTo", _, [other]) => {
                let (a, b) = self.doubles(receiver, other, span)?;
                Value::Int(match a.partial_cmp(&b) {
                    Some(std::cmp::Ordering::Less) => -1,
                    Some(std::cmp::Ordering::Greater) => 1,
                    _ => 0,
                })
            }
            _ => return Err(cannot_find_method(method, args.len(), span)),
        };
        Ok(Some(value))
    }

    fn list_method(
        &self,
        receiver: &Value,
        method: &str,
        args: &[Value],
        span: &Span,
    ) -> Flow<Option<Value>> {
        let Value::List(items) = receiver else {
            return Err(cannot_find_method(method, args.len(), span));
        };
        let mut items = items.lock();
        let length = items.len();
        let value = match (method, args) {
            ("size", []) => Value::Int(to_int(length)),
            ("isEmpty", []) => Value::Bool(items.is_empty()),
            ("add", [value]) => {
                items.push(value.clone());
                Value::Bool(true)
            }
            ("add", [Value::Int(index), value]) => {
                // Inserting at the end is allowed.
                match self.index(*index, length + 1) {
                    Some(index) => items.insert(index, value.clone()),
                    None => return Err(self.out_of_bounds(*index, length)),
                }
                return Ok(None);
            }
            ("get", [Value::Int(index)]) => match self.index(*index, length) {
                Some(index) => items[index].clone(),
                None => return Err(self.out_of_bounds(*index, length)),
            },
            ("set", [Value::Int(index), value]) => match self.index(*index, length) {
                Some(index) => std::mem::replace(&mut items[index], value.clone()),
                None => return Err(self.out_of_bounds(*index, length)),
            },
            ("remove", [Value::Int(index)]) => match self.index(*index, length) {
                Some(index) => items.remove(index),
                None => return Err(self.out_of_bounds(*index, length)),
            },
            ("contains", [value]) => Value::Bool(items.iter().any(|item| equals(item, value))),
            ("indexOf", [value]) => Value::Int(
                items
                    .iter()
                    .position(|item| equals(item, value))
                    .map_or(-1, to_int),
            ),
            ("clear", []) => {
                items.clear();
                return Ok(None);
            }
            _ => return Err(cannot_find_method(method, args.len(), span)),
        };
        Ok(Some(value))
    }

    /// `index` as a position below `length`, if in range.
    fn index(&self, index: i64, length: usize) -> Option<usize> {
        usize::try_from(index).ok().filter(|&index| index < length)
    }

    #[cold]
    fn out_of_bounds(&self, index: i64, length: usize) -> Abort {
        self.exception(
            |k| k.index_out_of_bounds,
            Some(&format!("Index {index} out of bounds for length {length}")),
        )
    }
}

fn to_int(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
