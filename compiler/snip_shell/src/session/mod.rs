//! A live shell session: persistent declarations plus per-snippet outcomes.

mod resolve;

use std::sync::Arc;

use rustc_hash::FxHashMap;
use snip_bridge::{
    Completeness, Completion, Diag, FragmentOutcome, Session, SnippetKind, SnippetStatus,
    ThrownException, ValueChannel,
};
use tracing::{debug, trace};

use crate::ast::Stmt;
use crate::completion;
use crate::interp::{Abort, Declared, Flow, Interpreter};
use crate::lexer::Span;
use crate::output::SharedOutput;
use crate::parser::parse_snippet;
use crate::registry::{Imports, TypeRef, TypeRegistry};
use crate::value::Value;

use resolve::{Resolution, Resolver};

/// One incremental execution session.
///
/// Top-level declarations persist across [`Session::execute`] calls until
/// the session is closed. A redeclared name replaces the earlier variable
/// and moves to the end of the declaration order.
pub struct ShellSession {
    registry: Arc<TypeRegistry>,
    output: SharedOutput,
    channel: ValueChannel<Value>,
    variables: FxHashMap<String, Declared>,
    imports: Imports,
    next_order: u64,
    open: bool,
}

impl ShellSession {
    pub(crate) fn new(
        registry: Arc<TypeRegistry>,
        output: SharedOutput,
        channel: ValueChannel<Value>,
    ) -> Self {
        ShellSession {
            registry,
            output,
            channel,
            variables: FxHashMap::default(),
            imports: Imports::default(),
            next_order: 0,
            open: true,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Current value of a top-level variable.
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name).map(|declared| &declared.var.value)
    }

    /// Run one complete snippet.
    #[tracing::instrument(level = "trace", skip(self))]
    fn run_snippet(&mut self, source: &str) -> FragmentOutcome<Value> {
        let stmt = match parse_snippet(source) {
            Ok(stmt) => stmt,
            Err(err) => {
                return FragmentOutcome::rejected(source, SnippetKind::Erroneous)
                    .with_diagnostic(Diag::new(err.message, err.span.start, err.span.end));
            }
        };
        let kind = snippet_kind(&stmt);

        match Resolver::new(&self.registry, &self.imports, &self.variables).resolve(&stmt) {
            Resolution::Resolved => {}
            Resolution::Rejected(diag) => {
                return FragmentOutcome::rejected(source, kind).with_diagnostic(diag);
            }
            Resolution::Unresolved(names) => {
                debug!(?names, "declaration waits on undefined names");
                return FragmentOutcome::rejected(source, kind)
                    .with_status(SnippetStatus::RecoverableNotDefined)
                    .with_unresolved(names);
            }
        }

        match self.run(&stmt) {
            Ok(Some(value)) => {
                let rendered = value.rendered();
                FragmentOutcome::valid(source, kind).with_value(value, rendered)
            }
            Ok(None) => FragmentOutcome::valid(source, kind),
            Err(Abort::Throw(exception)) => {
                FragmentOutcome::valid(source, kind).with_exception(ThrownException {
                    type_name: exception.class_name().to_string(),
                    message: exception.message(),
                })
            }
            Err(Abort::Reject(diag)) => FragmentOutcome::rejected(source, kind).with_diagnostic(diag),
        }
    }

    fn run(&mut self, stmt: &Stmt) -> Flow<Option<Value>> {
        match stmt {
            Stmt::Import {
                path,
                wildcard,
                span,
            } => {
                self.import(path, *wildcard, span)?;
                Ok(None)
            }
            Stmt::VarDecl {
                ty,
                name,
                init,
                span,
            } => {
                let var = self
                    .interpreter()
                    .declare(ty.as_ref(), init.as_ref(), span)?;
                let value = var.value.clone();
                let order = self.next_order;
                self.next_order += 1;
                self.variables.insert(name.clone(), Declared { order, var });
                Ok(Some(value))
            }
            Stmt::Expr(expr) => self.interpreter().eval_statement_expr(expr),
            other => {
                self.interpreter().exec(other)?;
                Ok(None)
            }
        }
    }

    fn interpreter(&mut self) -> Interpreter<'_> {
        Interpreter::new(
            &self.registry,
            &self.output,
            &self.channel,
            &self.imports,
            &mut self.variables,
        )
    }

    fn import(&mut self, path: &str, wildcard: bool, span: &Span) -> Flow<()> {
        let missing = |message: String| Abort::Reject(Diag::new(message, span.start, span.end));
        if wildcard {
            if !self.registry.has_package(path) {
                return Err(missing(format!("package {path} does not exist")));
            }
            self.imports.add_package(path);
            return Ok(());
        }
        match self.registry.resolve(path, &Imports::default()) {
            Ok(TypeRef::Class(class)) => {
                let simple = self.registry.class(class).simple_name.clone();
                self.imports.add_single(simple, class);
                Ok(())
            }
            Ok(TypeRef::Primitive(_)) | Err(_) => {
                let (package, simple) = path.rsplit_once('.').unwrap_or(("", path));
                Err(missing(format!(
                    "cannot find symbol\n  symbol:   class {simple}\n  location: package {package}"
                )))
            }
        }
    }
}

impl Session for ShellSession {
    type Value = Value;

    fn analyze_completion(&self, text: &str) -> Completion {
        completion::analyze(text)
    }

    /// Execute every snippet in `fragment`, stopping after the first that
    /// fails.
    fn execute(&mut self, fragment: &str) -> Vec<FragmentOutcome<Value>> {
        if !self.open {
            return vec![FragmentOutcome::rejected(fragment, SnippetKind::Erroneous)
                .with_diagnostic(Diag::new("session is closed", 0, fragment.len()))];
        }

        let mut outcomes = Vec::new();
        let mut rest = fragment.to_string();
        loop {
            let next = completion::analyze(&rest);
            if next.completeness == Completeness::Empty {
                break;
            }
            if !next.completeness.is_complete() || next.remaining == rest {
                let source = rest.trim();
                outcomes.push(
                    FragmentOutcome::rejected(source, SnippetKind::Erroneous)
                        .with_diagnostic(Diag::new("reached end of file while parsing", 0, source.len())),
                );
                break;
            }

            let outcome = self.run_snippet(&next.source);
            trace!(source = %outcome.source, status = ?outcome.status, "snippet executed");
            let stop = !outcome.status.is_valid() || outcome.exception.is_some();
            outcomes.push(outcome);
            if stop {
                break;
            }
            rest = next.remaining;
        }
        outcomes
    }

    fn declared_variables(&self) -> Vec<String> {
        let mut declared: Vec<_> = self.variables.iter().collect();
        declared.sort_by_key(|(_, declared)| declared.order);
        declared.into_iter().map(|(name, _)| name.clone()).collect()
    }

    fn close(&mut self) {
        debug!(variables = self.variables.len(), "closing session");
        self.open = false;
        self.variables.clear();
        self.imports = Imports::default();
    }
}

impl std::fmt::Debug for ShellSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellSession")
            .field("variables", &self.declared_variables())
            .field("open", &self.open)
            .finish_non_exhaustive()
    }
}

fn snippet_kind(stmt: &Stmt) -> SnippetKind {
    match stmt {
        Stmt::VarDecl { name, .. } => SnippetKind::Variable { name: name.clone() },
        Stmt::Expr(_) => SnippetKind::Expression,
        Stmt::Import { .. } => SnippetKind::Import,
        Stmt::If { .. } | Stmt::While { .. } | Stmt::Block(_) | Stmt::Throw(_) => {
            SnippetKind::Statement
        }
    }
}
