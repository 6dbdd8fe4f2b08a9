//! Outcome translator: backend fragment reports to the uniform taxonomy.

use crate::backend::FragmentOutcome;
use crate::error::ScriptError;

/// Tagged result of running one fragment.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<V> {
    /// Ran successfully; `None` when the fragment produced no value.
    Value(Option<V>),
    CompileError {
        diagnostic: String,
        source: String,
    },
    RuntimeError {
        type_name: String,
        message: String,
        source: String,
    },
    UnresolvedReference {
        names: Vec<String>,
        source: String,
    },
    Unknown {
        source: String,
    },
}

impl<V> Outcome<V> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Value(_))
    }

    pub fn into_result(self) -> Result<Option<V>, ScriptError> {
        match self {
            Outcome::Value(value) => Ok(value),
            Outcome::CompileError { diagnostic, source } => Err(ScriptError::Diagnostic {
                message: diagnostic,
                snippet: source,
            }),
            Outcome::RuntimeError {
                type_name,
                message,
                source,
            } => Err(ScriptError::Runtime {
                exception: type_name,
                message,
                snippet: source,
            }),
            Outcome::UnresolvedReference { names, source } => {
                Err(ScriptError::UnresolvedReference {
                    names,
                    snippet: source,
                })
            }
            Outcome::Unknown { source } => Err(ScriptError::Unknown { snippet: source }),
        }
    }
}

/// Classify one fragment report.
///
/// An exception always wins, then the first diagnostic, then unresolved
/// dependencies of a declaration. A non-valid status with none of those
/// is `Unknown`, never a success. The success value is the backend's
/// produced value; the rendered text is ignored.
pub fn translate<V>(outcome: FragmentOutcome<V>) -> Outcome<V> {
    let FragmentOutcome {
        source,
        kind,
        status,
        value,
        exception,
        diagnostics,
        unresolved,
        ..
    } = outcome;

    if let Some(exception) = exception {
        return Outcome::RuntimeError {
            type_name: exception.type_name,
            message: exception.message.unwrap_or_default(),
            source,
        };
    }
    if status.is_valid() {
        return Outcome::Value(value);
    }
    if let Some(diag) = diagnostics.into_iter().next() {
        return Outcome::CompileError {
            diagnostic: diag.message,
            source,
        };
    }
    if kind.is_declaration() && !unresolved.is_empty() {
        return Outcome::UnresolvedReference {
            names: unresolved,
            source,
        };
    }
    Outcome::Unknown { source }
}
