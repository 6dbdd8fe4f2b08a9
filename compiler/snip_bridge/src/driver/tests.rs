use super::*;
use crate::bindings::Bindings;
use crate::error::ScriptError;
use crate::test_helpers::ScriptedBackend;
use pretty_assertions::assert_eq;

fn units(sources: &[&str]) -> Vec<String> {
    sources.iter().map(ToString::to_string).collect()
}

fn engine_scope(entries: &[(&str, i64)]) -> ScriptContext<i64> {
    ScriptContext::with_scopes(
        Bindings::new(),
        entries.iter().map(|&(name, value)| (name, value)).collect(),
    )
}

#[test]
fn projects_runs_and_reflects() {
    let backend = ScriptedBackend::default();
    let mut ctx = engine_scope(&[("b", 3), ("a", 2)]);

    let result = evaluate(&backend, &units(&["c = 5;"]), &mut ctx);

    assert_eq!(result, Ok(Some(5)));
    assert_eq!(ctx.engine.get("c"), Some(&5));
    assert_eq!(ctx.engine.get("a"), Some(&2));
    let journal = backend.journal.lock();
    assert_eq!(
        journal.executed[..3],
        [
            "Long a = (Long) __channel.get(\"a\");".to_string(),
            "Long b = (Long) __channel.get(\"b\");".to_string(),
            "c = 5;".to_string(),
        ]
    );
    assert_eq!(journal.executed.len(), 6);
}

#[test]
fn last_unit_decides_result() {
    let backend = ScriptedBackend::default();
    let mut ctx = ScriptContext::new();
    assert_eq!(
        evaluate(&backend, &units(&["1;", "2;"]), &mut ctx),
        Ok(Some(2))
    );
    assert_eq!(
        evaluate(&backend, &units(&["1;", "void;"]), &mut ctx),
        Ok(None)
    );
    assert_eq!(evaluate(&backend, &[], &mut ctx), Ok(None));
}

#[test]
fn failure_skips_remaining_units_and_bindings() {
    let backend = ScriptedBackend::default();
    let mut ctx = engine_scope(&[("a", 1)]);
    let before = ctx.clone();

    let result = evaluate(&backend, &units(&["x = 1;", "diag;", "y = 2;"]), &mut ctx);

    assert_eq!(
        result,
        Err(ScriptError::Diagnostic {
            message: "illegal start of expression".to_string(),
            snippet: "diag;".to_string(),
        })
    );
    assert_eq!(ctx, before);
    let journal = backend.journal.lock();
    assert!(!journal.executed.iter().any(|fragment| fragment == "y = 2;"));
    assert_eq!(journal.opened, 1);
    assert_eq!(journal.closed, 1);
}

#[test]
fn global_variable_stays_global() {
    let backend = ScriptedBackend::default();
    let mut ctx = ScriptContext::with_scopes(
        [("x", 10_i64)].into_iter().collect(),
        Bindings::new(),
    );

    let result = evaluate(&backend, &units(&["x;"]), &mut ctx);

    assert_eq!(result, Ok(Some(10)));
    assert_eq!(ctx.global.get("x"), Some(&10));
    assert!(!ctx.engine.contains("x"));
}

#[test]
fn failure_kinds_are_translated() {
    let backend = ScriptedBackend::default();
    let mut ctx = ScriptContext::new();

    assert_eq!(
        evaluate(&backend, &units(&["throw;"]), &mut ctx),
        Err(ScriptError::Runtime {
            exception: "IllegalStateException".to_string(),
            message: "boom".to_string(),
            snippet: "throw;".to_string(),
        })
    );
    assert_eq!(
        evaluate(&backend, &units(&["unresolved;"]), &mut ctx),
        Err(ScriptError::UnresolvedReference {
            names: vec!["missing".to_string()],
            snippet: "unresolved;".to_string(),
        })
    );
    assert_eq!(
        evaluate(&backend, &units(&["reject;"]), &mut ctx),
        Err(ScriptError::Unknown {
            snippet: "reject;".to_string(),
        })
    );
    assert!(ctx.engine.is_empty());
}

#[test]
fn every_evaluation_gets_its_own_session() {
    let backend = ScriptedBackend::default();
    let mut ctx = engine_scope(&[("a", 1)]);
    let script = units(&["b = 2;"]);

    assert_eq!(evaluate(&backend, &script, &mut ctx), Ok(Some(2)));
    ctx.engine.clear();
    assert_eq!(
        evaluate(&backend, &units(&["b;"]), &mut ctx),
        Err(ScriptError::Diagnostic {
            message: "cannot find symbol".to_string(),
            snippet: "b;".to_string(),
        })
    );

    let journal = backend.journal.lock();
    assert_eq!(journal.opened, 2);
    assert_eq!(journal.closed, 2);
}

#[test]
fn failed_projection_runs_nothing() {
    let backend = ScriptedBackend {
        refuse: Some("__channel.get(\"b\")"),
        ..ScriptedBackend::default()
    };
    let mut ctx = engine_scope(&[("a", 1), ("b", 2)]);
    let before = ctx.clone();

    let result = evaluate(&backend, &units(&["c = 3;"]), &mut ctx);

    assert_eq!(
        result,
        Err(ScriptError::Diagnostic {
            message: "refused".to_string(),
            snippet: "Long b = (Long) __channel.get(\"b\");".to_string(),
        })
    );
    assert_eq!(ctx, before);
    let journal = backend.journal.lock();
    assert!(!journal.executed.iter().any(|fragment| fragment == "c = 3;"));
    assert_eq!(journal.opened, 1);
    assert_eq!(journal.closed, 1);
}

#[test]
fn failed_retrieval_discards_every_write() {
    let backend = ScriptedBackend {
        refuse: Some("__channel.set(\"c\""),
        ..ScriptedBackend::default()
    };
    let mut ctx = engine_scope(&[("a", 1)]);
    let before = ctx.clone();

    let result = evaluate(&backend, &units(&["a = 7;", "c = 3;"]), &mut ctx);

    assert_eq!(
        result,
        Err(ScriptError::Diagnostic {
            message: "refused".to_string(),
            snippet: "__channel.set(\"c\", c);".to_string(),
        })
    );
    assert_eq!(ctx, before);
    let journal = backend.journal.lock();
    assert_eq!(journal.opened, 1);
    assert_eq!(journal.closed, 1);
}

#[test]
fn unstored_variable_is_unbound() {
    let backend = ScriptedBackend {
        unstored: Some("a"),
        ..ScriptedBackend::default()
    };
    let mut ctx = engine_scope(&[("a", 1)]);

    let result = evaluate(&backend, &units(&["b = 2;"]), &mut ctx);

    assert_eq!(result, Ok(Some(2)));
    assert!(!ctx.engine.contains("a"));
    assert_eq!(ctx.engine.get("b"), Some(&2));
}

#[test]
fn non_identifier_names_are_rejected() {
    let backend = ScriptedBackend::default();
    let mut ctx = engine_scope(&[("a", 1), ("x\") + 1; y = (\"", 2)]);
    let before = ctx.clone();

    let result = evaluate(&backend, &units(&["c = 3;"]), &mut ctx);

    assert_eq!(
        result,
        Err(ScriptError::InvalidName {
            name: "x\") + 1; y = (\"".to_string(),
        })
    );
    assert_eq!(ctx, before);
    let journal = backend.journal.lock();
    assert!(journal.executed.is_empty());
    assert_eq!(journal.opened, journal.closed);
}
