//! Snippet splitter: cuts raw source into complete top-level units.
//!
//! Runs once at compile time. The splitter is purely structural; all
//! syntax knowledge lives in the `analyze` callback supplied by the
//! backend session.

use crate::backend::{Completeness, Completion};
use crate::error::{ScriptError, ScriptResult};

/// Split `source` into complete units using `analyze`.
///
/// Fails with [`ScriptError::Incomplete`] if some remainder is incomplete.
/// A remainder holding only whitespace or comments ends the split without
/// producing a unit.
pub fn split<F>(source: &str, mut analyze: F) -> ScriptResult<Vec<String>>
where
    F: FnMut(&str) -> Completion,
{
    let mut units = Vec::new();
    let mut remaining = source.to_string();

    while !remaining.is_empty() {
        let completion = analyze(&remaining);
        if completion.completeness == Completeness::Empty {
            break;
        }
        // A "complete" answer that consumes nothing would loop forever.
        if !completion.completeness.is_complete() || completion.remaining == remaining {
            return Err(ScriptError::Incomplete { remaining });
        }
        tracing::trace!(unit = %completion.source, "split unit");
        units.push(completion.source);
        remaining = completion.remaining;
    }

    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Units end at `;`; a tail without `;` is incomplete.
    fn semicolons(text: &str) -> Completion {
        if text.trim().is_empty() {
            return Completion::empty();
        }
        match text.find(';') {
            Some(end) => Completion::new(
                Completeness::Complete,
                text[..=end].trim_start(),
                &text[end + 1..],
            ),
            None => Completion::new(Completeness::DefinitelyIncomplete, text, ""),
        }
    }

    #[test]
    fn splits_in_order() {
        let units = split("1; 2+3;", semicolons);
        assert_eq!(units, Ok(vec!["1;".to_string(), "2+3;".to_string()]));
    }

    #[test]
    fn empty_source_has_no_units() {
        assert_eq!(split("", semicolons), Ok(Vec::new()));
    }

    #[test]
    fn trailing_whitespace_is_not_a_unit() {
        assert_eq!(split("a;\n  ", semicolons), Ok(vec!["a;".to_string()]));
    }

    #[test]
    fn trailing_partial_unit_fails() {
        let err = split("a; b +", semicolons);
        assert_eq!(
            err,
            Err(ScriptError::Incomplete {
                remaining: " b +".to_string()
            })
        );
    }

    #[test]
    fn non_consuming_analysis_fails_instead_of_looping() {
        let err = split("x", |text| Completion::new(Completeness::Unknown, "", text));
        assert!(matches!(err, Err(ScriptError::Incomplete { .. })));
    }
}
