//! Contract between the bridge and an incremental execution backend.
//!
//! A backend accepts source fragments one at a time, keeps declarations
//! alive across fragments, and reports one [`FragmentOutcome`] per executed
//! snippet. The bridge never inspects backend internals beyond what is
//! described here.
//!
//! # Channel handle
//!
//! Sessions are opened with a [`ValueChannel`]. The backend must make that
//! channel reachable from fragment text under [`CHANNEL_HANDLE`], with
//! `get("name")` returning the stored value (or null) and
//! `set("name", value)` storing one. The bridge relies on this to move host
//! values in and script values out, since fragment text cannot embed host
//! object references.

use std::fmt;

use crate::channel::ValueChannel;
use crate::error::ScriptResult;
use crate::types::TypeIntrospect;

/// Identifier under which a session exposes its value channel.
pub const CHANNEL_HANDLE: &str = "__channel";

/// Backend factory shared by an engine and its compiled scripts.
pub trait Backend {
    /// Runtime value type of the embedded language.
    type Value: Clone + fmt::Debug;
    /// Type-description facility used to name values in declarations.
    type Types: TypeIntrospect<Value = Self::Value>;
    /// One live execution session.
    type Session: Session<Value = Self::Value>;

    /// Open a fresh session bound to `channel`.
    fn open_session(&self, channel: ValueChannel<Self::Value>) -> ScriptResult<Self::Session>;

    /// Type introspection for values of this backend.
    fn types(&self) -> &Self::Types;
}

/// A live incremental execution session.
pub trait Session {
    type Value;

    /// Find the first syntactically complete top-level unit of `text`.
    fn analyze_completion(&self, text: &str) -> Completion;

    /// Execute one fragment, returning an outcome for each affected snippet.
    fn execute(&mut self, fragment: &str) -> Vec<FragmentOutcome<Self::Value>>;

    /// Names of all currently declared variables, in declaration order.
    fn declared_variables(&self) -> Vec<String>;

    /// Release the session. Called exactly once by the bridge.
    fn close(&mut self);
}

/// Completeness of the leading unit of some source text.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Completeness {
    /// Ends with its own terminator.
    Complete,
    /// Complete once an implied `;` is added (already part of `source`).
    CompleteWithSemi,
    /// Cannot become complete without more text.
    DefinitelyIncomplete,
    /// Could be complete, but the backend treats it as incomplete.
    ConsideredIncomplete,
    /// Nothing but whitespace and comments remain.
    Empty,
    /// Not analyzable; treated as complete so execution reports the problem.
    Unknown,
}

impl Completeness {
    /// Whether the unit may be split off and executed on its own.
    pub fn is_complete(self) -> bool {
        matches!(
            self,
            Completeness::Complete | Completeness::CompleteWithSemi | Completeness::Unknown
        )
    }
}

/// Result of analyzing the head of some source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    pub completeness: Completeness,
    /// Text of the leading unit.
    pub source: String,
    /// Text after the leading unit.
    pub remaining: String,
}

impl Completion {
    pub fn new(
        completeness: Completeness,
        source: impl Into<String>,
        remaining: impl Into<String>,
    ) -> Self {
        Completion {
            completeness,
            source: source.into(),
            remaining: remaining.into(),
        }
    }

    /// Nothing left to analyze.
    pub fn empty() -> Self {
        Completion::new(Completeness::Empty, "", "")
    }
}

/// What a snippet declares or does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SnippetKind {
    /// Declares the named variable.
    Variable { name: String },
    /// Bare expression evaluated for its value.
    Expression,
    /// Statement executed for effect.
    Statement,
    /// Import of one type or a package.
    Import,
    /// Could not be classified.
    Erroneous,
}

impl SnippetKind {
    pub fn is_declaration(&self) -> bool {
        matches!(self, SnippetKind::Variable { .. } | SnippetKind::Import)
    }
}

/// Backend-reported status of a snippet after execution.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SnippetStatus {
    Valid,
    /// Declared, but usable only once its dependencies are defined.
    RecoverableDefined,
    /// Not declared until its dependencies are defined.
    RecoverableNotDefined,
    Rejected,
    /// Removed from the session.
    Dropped,
}

impl SnippetStatus {
    pub fn is_valid(self) -> bool {
        self == SnippetStatus::Valid
    }
}

/// Exception raised while running a snippet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThrownException {
    /// Name of the exception type as the backend reports it.
    pub type_name: String,
    pub message: Option<String>,
}

/// Compiler diagnostic attached to a snippet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diag {
    pub message: String,
    /// Byte range within the snippet source.
    pub start: usize,
    pub end: usize,
}

impl Diag {
    pub fn new(message: impl Into<String>, start: usize, end: usize) -> Self {
        Diag {
            message: message.into(),
            start,
            end,
        }
    }
}

/// Per-snippet report returned by [`Session::execute`].
#[derive(Clone, Debug)]
pub struct FragmentOutcome<V> {
    pub source: String,
    pub kind: SnippetKind,
    pub status: SnippetStatus,
    /// Value produced by the snippet's implicit result, if any.
    pub value: Option<V>,
    /// Display rendering of `value`; informational only.
    pub rendered: Option<String>,
    pub exception: Option<ThrownException>,
    pub diagnostics: Vec<Diag>,
    /// Names the snippet depends on that are not yet defined.
    pub unresolved: Vec<String>,
}

impl<V> FragmentOutcome<V> {
    /// A valid snippet with no value, no exception and no diagnostics.
    pub fn valid(source: impl Into<String>, kind: SnippetKind) -> Self {
        FragmentOutcome {
            source: source.into(),
            kind,
            status: SnippetStatus::Valid,
            value: None,
            rendered: None,
            exception: None,
            diagnostics: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    /// A rejected snippet with no further detail.
    pub fn rejected(source: impl Into<String>, kind: SnippetKind) -> Self {
        FragmentOutcome {
            status: SnippetStatus::Rejected,
            ..FragmentOutcome::valid(source, kind)
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: V, rendered: impl Into<String>) -> Self {
        self.value = Some(value);
        self.rendered = Some(rendered.into());
        self
    }

    #[must_use]
    pub fn with_exception(mut self, exception: ThrownException) -> Self {
        self.exception = Some(exception);
        self
    }

    #[must_use]
    pub fn with_diagnostic(mut self, diag: Diag) -> Self {
        self.diagnostics.push(diag);
        self
    }

    #[must_use]
    pub fn with_unresolved(mut self, names: Vec<String>) -> Self {
        self.unresolved = names;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: SnippetStatus) -> Self {
        self.status = status;
        self
    }
}
