//! Ways a snippet can stop running.
//!
//! Compile-style problems the static pass cannot see (unknown methods,
//! type mismatches, void in an expression) surface at run time as
//! [`Abort::Reject`]; Java exceptions as [`Abort::Throw`].

use std::sync::Arc;

use snip_bridge::Diag;

use crate::lexer::Span;
use crate::value::Object;

#[derive(Debug)]
pub(crate) enum Abort {
    /// A thrown exception object.
    Throw(Arc<Object>),
    /// A diagnostic a compiler would have reported.
    Reject(Diag),
}

pub(crate) type Flow<T> = Result<T, Abort>;

#[cold]
pub(crate) fn reject(message: impl Into<String>, span: &Span) -> Abort {
    Abort::Reject(Diag::new(message, span.start, span.end))
}

#[cold]
pub(crate) fn cannot_find_variable(name: &str, span: &Span) -> Abort {
    reject(format!("cannot find symbol\n  symbol:   variable {name}"), span)
}

#[cold]
pub(crate) fn cannot_find_method(method: &str, arity: usize, span: &Span) -> Abort {
    let params = vec!["?"; arity].join(",");
    reject(
        format!("cannot find symbol\n  symbol:   method {method}({params})"),
        span,
    )
}

#[cold]
pub(crate) fn void_not_allowed(span: &Span) -> Abort {
    reject("'void' type not allowed here", span)
}

#[cold]
pub(crate) fn incompatible_types(found: &str, required: &str, span: &Span) -> Abort {
    reject(
        format!("incompatible types: {found} cannot be converted to {required}"),
        span,
    )
}

#[cold]
pub(crate) fn bad_operands(symbol: &str, left: &str, right: &str, span: &Span) -> Abort {
    reject(
        format!("bad operand types for binary operator '{symbol}'\n  first type:  {left}\n  second type: {right}"),
        span,
    )
}

#[cold]
pub(crate) fn bad_operand(symbol: &str, operand: &str, span: &Span) -> Abort {
    reject(
        format!("bad operand type {operand} for unary operator '{symbol}'"),
        span,
    )
}
