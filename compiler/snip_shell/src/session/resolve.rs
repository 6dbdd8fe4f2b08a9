//! Static name resolution, run on every snippet before it executes.
//!
//! Catches what a compiler would catch without running anything: unknown
//! variables, unknown or inaccessible types, and `var` declarations whose
//! type cannot be inferred. A typed top-level declaration whose initializer
//! mentions unknown variables is not an error but a declaration waiting on
//! those names.

use rustc_hash::{FxHashMap, FxHashSet};
use snip_bridge::Diag;

use crate::ast::{Expr, ExprKind, Literal, Stmt, TypeName};
use crate::interp::{static_receiver, Declared};
use crate::lexer::Span;
use crate::registry::{Imports, TypeRegistry};
use crate::stack::ensure_sufficient_stack;

/// Verdict on one snippet.
#[derive(Debug, PartialEq)]
pub(crate) enum Resolution {
    Resolved,
    /// Declaration that depends on names not yet declared.
    Unresolved(Vec<String>),
    Rejected(Diag),
}

pub(crate) struct Resolver<'a> {
    registry: &'a TypeRegistry,
    imports: &'a Imports,
    session: &'a FxHashMap<String, Declared>,
    scopes: Vec<FxHashSet<String>>,
    unresolved: Vec<(String, Span)>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(
        registry: &'a TypeRegistry,
        imports: &'a Imports,
        session: &'a FxHashMap<String, Declared>,
    ) -> Self {
        Resolver {
            registry,
            imports,
            session,
            scopes: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    pub(crate) fn resolve(mut self, stmt: &Stmt) -> Resolution {
        if let Err(diag) = self.stmt(stmt) {
            return Resolution::Rejected(diag);
        }
        let Some((first, span)) = self.unresolved.first().cloned() else {
            return Resolution::Resolved;
        };
        if matches!(stmt, Stmt::VarDecl { ty: Some(_), .. }) {
            let mut names: Vec<String> = Vec::new();
            for (name, _) in self.unresolved {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            return Resolution::Unresolved(names);
        }
        Resolution::Rejected(Diag::new(
            format!("cannot find symbol\n  symbol:   variable {first}"),
            span.start,
            span.end,
        ))
    }

    fn is_variable(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains(name)) || self.session.contains_key(name)
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<(), Diag> {
        ensure_sufficient_stack(|| self.stmt_inner(stmt))
    }

    fn stmt_inner(&mut self, stmt: &Stmt) -> Result<(), Diag> {
        match stmt {
            Stmt::VarDecl {
                ty,
                name,
                init,
                span,
            } => {
                if let Some(ty) = ty {
                    self.type_name(ty)?;
                } else if matches!(
                    init,
                    Some(Expr {
                        kind: ExprKind::Literal(Literal::Null),
                        ..
                    })
                ) {
                    return Err(Diag::new(
                        format!(
                            "cannot infer type for local variable {name}\n  (variable initializer is 'null')"
                        ),
                        span.start,
                        span.end,
                    ));
                }
                if let Some(init) = init {
                    self.expr(init)?;
                }
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert(name.clone());
                }
                Ok(())
            }
            Stmt::Expr(expr) | Stmt::Throw(expr) => self.expr(expr),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.expr(cond)?;
                self.nested(then_branch)?;
                match else_branch {
                    Some(else_branch) => self.nested(else_branch),
                    None => Ok(()),
                }
            }
            Stmt::While { cond, body } => {
                self.expr(cond)?;
                self.nested(body)
            }
            Stmt::Block(body) => {
                self.scopes.push(FxHashSet::default());
                let result = body.iter().try_for_each(|stmt| self.stmt(stmt));
                self.scopes.pop();
                result
            }
            // Imports are checked when executed.
            Stmt::Import { .. } => Ok(()),
        }
    }

    fn nested(&mut self, stmt: &Stmt) -> Result<(), Diag> {
        self.scopes.push(FxHashSet::default());
        let result = self.stmt(stmt);
        self.scopes.pop();
        result
    }

    fn type_name(&self, ty: &TypeName) -> Result<(), Diag> {
        self.registry
            .resolve(&ty.name, self.imports)
            .map(|_| ())
            .map_err(|err| Diag::new(err.to_string(), ty.span.start, ty.span.end))
    }

    fn expr(&mut self, expr: &Expr) -> Result<(), Diag> {
        ensure_sufficient_stack(|| self.expr_inner(expr))
    }

    fn expr_inner(&mut self, expr: &Expr) -> Result<(), Diag> {
        match &expr.kind {
            ExprKind::Literal(_) => Ok(()),
            ExprKind::Ident(name) => {
                self.variable(name, &expr.span);
                Ok(())
            }
            ExprKind::Unary { operand, .. } => self.expr(operand),
            ExprKind::Binary { lhs, rhs, .. } => {
                self.expr(lhs)?;
                self.expr(rhs)
            }
            ExprKind::Assign { target, value, .. } => {
                self.variable(target, &expr.span);
                self.expr(value)
            }
            ExprKind::FieldAssign {
                receiver, value, ..
            } => {
                self.receiver(receiver)?;
                self.expr(value)
            }
            ExprKind::Cast { ty, operand } => {
                self.type_name(ty)?;
                self.expr(operand)
            }
            ExprKind::Field { receiver, .. } => self.receiver(receiver),
            ExprKind::Call { receiver, args, .. } => {
                self.receiver(receiver)?;
                args.iter().try_for_each(|arg| self.expr(arg))
            }
            ExprKind::New { ty, args } => {
                self.type_name(ty)?;
                args.iter().try_for_each(|arg| self.expr(arg))
            }
        }
    }

    /// Receivers may also name a class, as in `Math.max` or `System.out`.
    fn receiver(&mut self, receiver: &Expr) -> Result<(), Diag> {
        let is_static = static_receiver(
            receiver,
            |name| self.is_variable(name),
            self.registry,
            self.imports,
        )
        .is_some();
        if is_static {
            return Ok(());
        }
        self.expr(receiver)
    }

    fn variable(&mut self, name: &str, span: &Span) {
        if !self.is_variable(name) {
            self.unresolved.push((name.to_string(), span.clone()));
        }
    }
}
