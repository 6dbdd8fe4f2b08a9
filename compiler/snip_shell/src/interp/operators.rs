//! Arithmetic, comparison and string concatenation.
//!
//! `int` and `long` share one 64-bit representation; integer arithmetic
//! wraps at 64 bits. Mixing an integer with a double widens to double.

use crate::ast::{BinaryOp, UnaryOp};
use crate::value::Value;

/// Why an operator could not be applied.
#[derive(Debug, PartialEq)]
pub(crate) enum OpFailure {
    DivisionByZero,
    /// A null operand where a number or boolean was needed.
    NullOperand,
    BadOperands { left: String, right: String },
    BadOperand { operand: String },
}

/// Java-ish static type name of a value, for diagnostics.
pub(crate) fn type_label(value: &Value) -> String {
    match value {
        Value::Null => "<null>".to_string(),
        Value::Int(_) => "int".to_string(),
        Value::Double(_) => "double".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Str(_) => "java.lang.String".to_string(),
        Value::List(_) => "java.util.ArrayList".to_string(),
        Value::Object(object) => object.class_name().to_string(),
    }
}

enum Numbers {
    Ints(i64, i64),
    Doubles(f64, f64),
}

fn numbers(left: &Value, right: &Value) -> Result<Numbers, OpFailure> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(Numbers::Ints(*a, *b)),
        (Value::Null, _) | (_, Value::Null) => Err(OpFailure::NullOperand),
        _ => match (left.as_double(), right.as_double()) {
            (Some(a), Some(b)) => Ok(Numbers::Doubles(a, b)),
            _ => Err(OpFailure::BadOperands {
                left: type_label(left),
                right: type_label(right),
            }),
        },
    }
}

/// Apply a non-short-circuit binary operator.
pub(crate) fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, OpFailure> {
    match op {
        BinaryOp::Add if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) => {
            Ok(Value::string(format!("{left}{right}")))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            arithmetic(op, numbers(left, right)?)
        }
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            let ordering = match numbers(left, right)? {
                Numbers::Ints(a, b) => Some(a.cmp(&b)),
                // NaN compares false against everything.
                Numbers::Doubles(a, b) => a.partial_cmp(&b),
            };
            Ok(Value::Bool(ordering.is_some_and(|ordering| match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::LtEq => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            })))
        }
        BinaryOp::Eq => Ok(Value::Bool(equals(left, right))),
        BinaryOp::NotEq => Ok(Value::Bool(!equals(left, right))),
        BinaryOp::And | BinaryOp::Or => match (left, right) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(if op == BinaryOp::And {
                *a && *b
            } else {
                *a || *b
            })),
            (Value::Null, _) | (_, Value::Null) => Err(OpFailure::NullOperand),
            _ => Err(OpFailure::BadOperands {
                left: type_label(left),
                right: type_label(right),
            }),
        },
    }
}

fn arithmetic(op: BinaryOp, numbers: Numbers) -> Result<Value, OpFailure> {
    match numbers {
        Numbers::Ints(a, b) => {
            let value = match op {
                BinaryOp::Add => a.wrapping_add(b),
                BinaryOp::Sub => a.wrapping_sub(b),
                BinaryOp::Mul => a.wrapping_mul(b),
                BinaryOp::Div if b == 0 => return Err(OpFailure::DivisionByZero),
                BinaryOp::Div => a.wrapping_div(b),
                BinaryOp::Rem if b == 0 => return Err(OpFailure::DivisionByZero),
                _ => a.wrapping_rem(b),
            };
            Ok(Value::Int(value))
        }
        Numbers::Doubles(a, b) => Ok(Value::Double(match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            _ => a % b,
        })),
    }
}

/// `==`: numbers by numeric value, references by identity.
pub(crate) fn equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(_), Value::Double(_)) | (Value::Double(_), Value::Int(_)) => {
            left.as_double() == right.as_double()
        }
        _ => left == right,
    }
}

pub(crate) fn unary(op: UnaryOp, operand: &Value) -> Result<Value, OpFailure> {
    match (op, operand) {
        (UnaryOp::Neg, Value::Int(value)) => Ok(Value::Int(value.wrapping_neg())),
        (UnaryOp::Neg, Value::Double(value)) => Ok(Value::Double(-value)),
        (UnaryOp::Not, Value::Bool(value)) => Ok(Value::Bool(!value)),
        (_, Value::Null) => Err(OpFailure::NullOperand),
        _ => Err(OpFailure::BadOperand {
            operand: type_label(operand),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn integer_arithmetic_stays_integral() {
        assert_eq!(
            binary(BinaryOp::Div, &Value::Int(7), &Value::Int(2)),
            Ok(Value::Int(3))
        );
        assert_eq!(
            binary(BinaryOp::Rem, &Value::Int(-7), &Value::Int(2)),
            Ok(Value::Int(-1))
        );
    }

    #[test]
    fn mixed_arithmetic_widens() {
        assert_eq!(
            binary(BinaryOp::Mul, &Value::Int(2), &Value::Double(1.5)),
            Ok(Value::Double(3.0))
        );
    }

    #[test]
    fn integer_division_by_zero_fails() {
        assert_eq!(
            binary(BinaryOp::Div, &Value::Int(1), &Value::Int(0)),
            Err(OpFailure::DivisionByZero)
        );
        assert_eq!(
            binary(BinaryOp::Div, &Value::Double(1.0), &Value::Int(0)),
            Ok(Value::Double(f64::INFINITY))
        );
    }

    #[test]
    fn string_concatenation_uses_java_rendering() {
        assert_eq!(
            binary(BinaryOp::Add, &Value::from("n="), &Value::Double(2.0)),
            Ok(Value::from("n=2.0"))
        );
        assert_eq!(
            binary(BinaryOp::Add, &Value::Null, &Value::from("!")),
            Ok(Value::from("null!"))
        );
    }

    #[test]
    fn comparisons_and_equality() {
        assert_eq!(
            binary(BinaryOp::LtEq, &Value::Int(2), &Value::Int(2)),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            binary(BinaryOp::Eq, &Value::Int(2), &Value::Double(2.0)),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            binary(BinaryOp::NotEq, &Value::from("a"), &Value::from("a")),
            Ok(Value::Bool(false))
        );
    }

    #[test]
    fn operand_failures() {
        assert_eq!(
            binary(BinaryOp::Sub, &Value::Null, &Value::Int(1)),
            Err(OpFailure::NullOperand)
        );
        assert_eq!(
            binary(BinaryOp::Sub, &Value::Bool(true), &Value::Int(1)),
            Err(OpFailure::BadOperands {
                left: "boolean".to_string(),
                right: "int".to_string()
            })
        );
        assert_eq!(
            unary(UnaryOp::Not, &Value::Int(1)),
            Err(OpFailure::BadOperand {
                operand: "int".to_string()
            })
        );
    }
}
