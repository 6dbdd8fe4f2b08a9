//! Source text of the fragments the driver injects around a script.
//!
//! Names are spliced into the source as-is, so callers must only pass
//! names for which [`is_identifier`] holds.

use crate::backend::CHANNEL_HANDLE;

/// Whether `name` has the shape of a variable name: a letter, `_` or `$`,
/// followed by letters, digits, `_` or `$`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Declaration that pulls host variable `name` out of the channel.
pub fn declaration(type_name: &str, name: &str) -> String {
    format!("{type_name} {name} = ({type_name}) {CHANNEL_HANDLE}.get(\"{name}\");")
}

/// Statement that pushes session variable `name` into the channel.
pub fn retrieval(name: &str) -> String {
    format!("{CHANNEL_HANDLE}.set(\"{name}\", {name});")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_shape() {
        assert_eq!(
            declaration("java.lang.Integer", "inputA"),
            "java.lang.Integer inputA = (java.lang.Integer) __channel.get(\"inputA\");"
        );
    }

    #[test]
    fn identifiers() {
        for name in ["a", "inputA", "_tmp", "$x", "n2", "größe"] {
            assert!(is_identifier(name), "{name}");
        }
        for name in ["", "2n", "a b", "a\")", "x;y", "a.b", "a-b"] {
            assert!(!is_identifier(name), "{name}");
        }
    }

    #[test]
    fn retrieval_shape() {
        assert_eq!(retrieval("output"), "__channel.set(\"output\", output);");
    }
}
