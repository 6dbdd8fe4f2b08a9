//! Uniform error type for compiling and evaluating scripts.
//!
//! Every backend-specific failure signal (incomplete source, compile
//! diagnostics, runtime exceptions, unresolved dependencies, unidentified
//! rejections) is folded into [`ScriptError`]. Each variant that stems from
//! a fragment carries that fragment's source text, and the `Display` output
//! always ends with it so callers can log the error as-is.

/// Result alias used throughout the bridge.
pub type ScriptResult<T> = Result<T, ScriptError>;

/// Error raised by [`crate::ScriptEngine::compile`] or by an evaluation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    /// The source does not reduce to a sequence of complete fragments.
    ///
    /// Raised at compile time only; `remaining` is the unconsumed tail
    /// starting at the first incomplete fragment.
    #[error("incomplete script\n{remaining}")]
    Incomplete { remaining: String },

    /// A fragment failed compilation with a backend diagnostic.
    #[error("{message}\n{snippet}")]
    Diagnostic { message: String, snippet: String },

    /// An executed fragment raised a runtime exception.
    ///
    /// `message` is empty when the exception carried none.
    #[error("{exception}{}\n{snippet}", message_suffix(.message))]
    Runtime {
        exception: String,
        message: String,
        snippet: String,
    },

    /// A declaration fragment depends on names the session cannot resolve.
    #[error("unresolved dependencies: [{}]\n{snippet}", .names.join(", "))]
    UnresolvedReference { names: Vec<String>, snippet: String },

    /// A fragment was not accepted and the backend gave no reason.
    #[error("unknown error\n{snippet}")]
    Unknown { snippet: String },

    /// The backend could not open an execution session.
    #[error("failed to open execution session: {message}")]
    Session { message: String },

    /// A host variable name that cannot be declared in the session.
    #[error("invalid variable name: {name:?}")]
    InvalidName { name: String },
}

impl ScriptError {
    /// Source text of the fragment that failed, if the error came from one.
    ///
    /// For [`ScriptError::Incomplete`] this is the unconsumed remainder.
    pub fn snippet(&self) -> Option<&str> {
        match self {
            ScriptError::Incomplete { remaining } => Some(remaining),
            ScriptError::Diagnostic { snippet, .. }
            | ScriptError::Runtime { snippet, .. }
            | ScriptError::UnresolvedReference { snippet, .. }
            | ScriptError::Unknown { snippet } => Some(snippet),
            ScriptError::Session { .. } | ScriptError::InvalidName { .. } => None,
        }
    }

    /// Returns `true` for failures detected before any fragment ran.
    pub fn is_compile_time(&self) -> bool {
        matches!(
            self,
            ScriptError::Incomplete { .. } | ScriptError::Diagnostic { .. }
        )
    }
}

fn message_suffix(message: &str) -> String {
    if message.is_empty() {
        String::new()
    } else {
        format!(": {message}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn runtime_error_with_message() {
        let err = ScriptError::Runtime {
            exception: "java.lang.ArithmeticException".to_string(),
            message: "/ by zero".to_string(),
            snippet: "1 / 0;".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "java.lang.ArithmeticException: / by zero\n1 / 0;"
        );
    }

    #[test]
    fn runtime_error_without_message() {
        let err = ScriptError::Runtime {
            exception: "java.lang.NullPointerException".to_string(),
            message: String::new(),
            snippet: "s.length();".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "java.lang.NullPointerException\ns.length();"
        );
    }

    #[test]
    fn unresolved_lists_names() {
        let err = ScriptError::UnresolvedReference {
            names: vec!["a".to_string(), "b".to_string()],
            snippet: "int x = a + b;".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unresolved dependencies: [a, b]\nint x = a + b;"
        );
        assert_eq!(err.snippet(), Some("int x = a + b;"));
    }

    #[test]
    fn compile_time_classification() {
        let incomplete = ScriptError::Incomplete {
            remaining: "1 +".to_string(),
        };
        assert!(incomplete.is_compile_time());
        assert!(!ScriptError::Unknown {
            snippet: "x;".to_string()
        }
        .is_compile_time());
        assert_eq!(
            ScriptError::Session {
                message: "boom".to_string()
            }
            .snippet(),
            None
        );
    }
}
