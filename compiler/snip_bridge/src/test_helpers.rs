//! Scripted backend for exercising the bridge without a real language.
//!
//! Fragments understood by [`ScriptedSession::execute`]:
//! - `T name = (T) __channel.get("name");` declares `name` from the channel
//! - `__channel.set("name", name);` copies `name` into the channel
//! - `name = 42;` declares `name` with a literal value
//! - `42;` yields a value, `void;` yields nothing
//! - `diag;`, `throw;`, `unresolved;`, `reject;` produce the matching failure
//!
//! [`ScriptedBackend::refuse`] rejects any fragment containing the given
//! text, and [`ScriptedBackend::unstored`] names a variable whose retrieval
//! succeeds without putting anything in the channel.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::{
    Backend, Completeness, Completion, Diag, FragmentOutcome, Session, SnippetKind,
    SnippetStatus, ThrownException,
};
use crate::channel::ValueChannel;
use crate::error::ScriptResult;
use crate::types::{TypeIntrospect, Visibility};

/// Everything the scripted sessions did, shared with the test.
#[derive(Debug, Default)]
pub(crate) struct Journal {
    pub executed: Vec<String>,
    pub opened: usize,
    pub closed: usize,
}

pub(crate) struct LongTypes;

impl TypeIntrospect for LongTypes {
    type Value = i64;
    type Type = ();

    fn runtime_type(&self, _value: &i64) -> Option<()> {
        Some(())
    }

    fn canonical_name(&self, (): ()) -> Option<&str> {
        Some("Long")
    }

    fn visibility(&self, (): ()) -> Visibility {
        Visibility::Public
    }

    fn interfaces(&self, (): ()) -> &[()] {
        &[]
    }

    fn parent(&self, (): ()) -> Option<()> {
        None
    }

    fn top_type_name(&self) -> &str {
        "Object"
    }
}

#[derive(Clone, Default)]
pub(crate) struct ScriptedBackend {
    pub journal: Arc<Mutex<Journal>>,
    pub refuse: Option<&'static str>,
    pub unstored: Option<&'static str>,
}

impl Backend for ScriptedBackend {
    type Value = i64;
    type Types = LongTypes;
    type Session = ScriptedSession;

    fn open_session(&self, channel: ValueChannel<i64>) -> ScriptResult<ScriptedSession> {
        self.journal.lock().opened += 1;
        Ok(ScriptedSession {
            channel,
            variables: Vec::new(),
            journal: Arc::clone(&self.journal),
            refuse: self.refuse,
            unstored: self.unstored,
        })
    }

    fn types(&self) -> &LongTypes {
        &LongTypes
    }
}

pub(crate) struct ScriptedSession {
    channel: ValueChannel<i64>,
    variables: Vec<(String, i64)>,
    journal: Arc<Mutex<Journal>>,
    refuse: Option<&'static str>,
    unstored: Option<&'static str>,
}

impl ScriptedSession {
    fn declare(&mut self, name: &str, value: i64) {
        self.variables.retain(|(existing, _)| existing != name);
        self.variables.push((name.to_string(), value));
    }

    fn lookup(&self, name: &str) -> Option<i64> {
        self.variables
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|&(_, value)| value)
    }

    fn run(&mut self, fragment: &str) -> FragmentOutcome<i64> {
        let body = fragment.trim().trim_end_matches(';');
        let variable = |name: &str| SnippetKind::Variable {
            name: name.to_string(),
        };

        if self.refuse.is_some_and(|text| fragment.contains(text)) {
            return FragmentOutcome::rejected(fragment, SnippetKind::Statement)
                .with_diagnostic(Diag::new("refused", 0, 0));
        }

        if let Some(rest) = body.strip_prefix("__channel.set(\"") {
            let name = rest.split('"').next().unwrap_or_default();
            return match self.lookup(name) {
                Some(_) if self.unstored == Some(name) => {
                    FragmentOutcome::valid(fragment, SnippetKind::Statement)
                }
                Some(value) => {
                    self.channel.set(name, value);
                    FragmentOutcome::valid(fragment, SnippetKind::Statement)
                }
                None => FragmentOutcome::rejected(fragment, SnippetKind::Statement)
                    .with_diagnostic(Diag::new("cannot find symbol", 0, 0)),
            };
        }
        if let Some((_, rest)) = body.split_once("__channel.get(\"") {
            let name = rest.split('"').next().unwrap_or_default();
            let value = self.channel.get(name).unwrap_or_default();
            self.declare(name, value);
            return FragmentOutcome::valid(fragment, variable(name)).with_value(value, value.to_string());
        }
        if let Some((name, literal)) = body.split_once(" = ") {
            return match literal.parse() {
                Ok(value) => {
                    self.declare(name, value);
                    FragmentOutcome::valid(fragment, variable(name)).with_value(value, literal)
                }
                Err(_) => FragmentOutcome::rejected(fragment, variable(name))
                    .with_diagnostic(Diag::new("incompatible types", 0, 0)),
            };
        }
        match body {
            "void" => FragmentOutcome::valid(fragment, SnippetKind::Statement),
            "diag" => FragmentOutcome::rejected(fragment, SnippetKind::Expression)
                .with_diagnostic(Diag::new("illegal start of expression", 0, 4)),
            "throw" => FragmentOutcome::valid(fragment, SnippetKind::Statement).with_exception(
                ThrownException {
                    type_name: "IllegalStateException".to_string(),
                    message: Some("boom".to_string()),
                },
            ),
            "unresolved" => FragmentOutcome::valid(fragment, variable("unresolved"))
                .with_status(SnippetStatus::RecoverableNotDefined)
                .with_unresolved(vec!["missing".to_string()]),
            "reject" => FragmentOutcome::rejected(fragment, SnippetKind::Erroneous),
            literal => match literal.parse::<i64>() {
                Ok(value) => FragmentOutcome::valid(fragment, SnippetKind::Expression)
                    .with_value(value, literal),
                Err(_) => match self.lookup(literal) {
                    Some(value) => FragmentOutcome::valid(fragment, SnippetKind::Expression)
                        .with_value(value, literal),
                    None => FragmentOutcome::rejected(fragment, SnippetKind::Expression)
                        .with_diagnostic(Diag::new("cannot find symbol", 0, 0)),
                },
            },
        }
    }
}

impl Session for ScriptedSession {
    type Value = i64;

    fn analyze_completion(&self, text: &str) -> Completion {
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

    fn execute(&mut self, fragment: &str) -> Vec<FragmentOutcome<i64>> {
        self.journal.lock().executed.push(fragment.to_string());
        vec![self.run(fragment)]
    }

    fn declared_variables(&self) -> Vec<String> {
        self.variables.iter().map(|(name, _)| name.clone()).collect()
    }

    fn close(&mut self) {
        self.journal.lock().closed += 1;
        self.variables.clear();
    }
}
