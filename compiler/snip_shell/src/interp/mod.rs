//! Tree-walking interpreter for one snippet.
//!
//! An [`Interpreter`] borrows the session's declarations for the duration
//! of a snippet. Block-local variables live in a stack of scopes that is
//! empty between snippets; top-level declarations are recorded by the
//! session itself.

mod builtins;
mod errors;
mod operators;
mod scope_guard;

use std::sync::Arc;

use rustc_hash::FxHashMap;
use snip_bridge::{TypeIntrospect, ValueChannel};

use crate::ast::{BinaryOp, Expr, ExprKind, Literal, Stmt, TypeName, UnaryOp};
use crate::lexer::Span;
use crate::output::OutputSink;
use crate::registry::{ClassId, ClassKind, Imports, Primitive, TypeRef, TypeRegistry, WellKnown};
use crate::stack::ensure_sufficient_stack;
use crate::value::{Object, Value};

pub(crate) use builtins::static_receiver;
pub(crate) use errors::{Abort, Flow};

use errors::{
    bad_operand, bad_operands, cannot_find_variable, incompatible_types, reject, void_not_allowed,
};
use operators::{type_label, OpFailure};

/// A variable and the type it was declared with.
#[derive(Clone, Debug)]
pub(crate) struct Variable {
    pub ty: TypeRef,
    pub value: Value,
}

/// Top-level session variable; `order` gives declaration order.
#[derive(Clone, Debug)]
pub(crate) struct Declared {
    pub order: u64,
    pub var: Variable,
}

pub(crate) struct Interpreter<'s> {
    registry: &'s TypeRegistry,
    output: &'s OutputSink,
    channel: &'s ValueChannel<Value>,
    imports: &'s Imports,
    globals: &'s mut FxHashMap<String, Declared>,
    scopes: Vec<FxHashMap<String, Variable>>,
}

impl<'s> Interpreter<'s> {
    pub(crate) fn new(
        registry: &'s TypeRegistry,
        output: &'s OutputSink,
        channel: &'s ValueChannel<Value>,
        imports: &'s Imports,
        globals: &'s mut FxHashMap<String, Declared>,
    ) -> Self {
        Interpreter {
            registry,
            output,
            channel,
            imports,
            globals,
            scopes: Vec::new(),
        }
    }

    fn well_known(&self) -> &WellKnown {
        self.registry.well_known()
    }

    pub(crate) fn is_bound(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains_key(name)) || self.globals.contains_key(name)
    }

    fn lookup(&self, name: &str) -> Option<&Variable> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .or_else(|| self.globals.get(name).map(|declared| &declared.var))
    }

    fn lookup_mut(&mut self, name: &str) -> Option<&mut Variable> {
        if let Some(scope) = self
            .scopes
            .iter_mut()
            .rev()
            .find(|scope| scope.contains_key(name))
        {
            return scope.get_mut(name);
        }
        self.globals.get_mut(name).map(|declared| &mut declared.var)
    }

    // Statements

    pub(crate) fn exec(&mut self, stmt: &Stmt) -> Flow<()> {
        ensure_sufficient_stack(|| self.exec_inner(stmt))
    }

    fn exec_inner(&mut self, stmt: &Stmt) -> Flow<()> {
        match stmt {
            Stmt::VarDecl {
                ty,
                name,
                init,
                span,
            } => {
                let var = self.declare(ty.as_ref(), init.as_ref(), span)?;
                match self.scopes.last_mut() {
                    Some(scope) => {
                        scope.insert(name.clone(), var);
                    }
                    None => return Err(reject("variable declaration not allowed here", span)),
                }
            }
            Stmt::Expr(expr) => {
                self.eval_statement_expr(expr)?;
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.condition(cond)? {
                    self.scoped().exec(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.scoped().exec(else_branch)?;
                }
            }
            Stmt::While { cond, body } => {
                while self.condition(cond)? {
                    self.scoped().exec(body)?;
                }
            }
            Stmt::Block(body) => {
                let mut scoped = self.scoped();
                for stmt in body {
                    scoped.exec(stmt)?;
                }
            }
            Stmt::Throw(expr) => return Err(self.throw_value(expr)?),
            Stmt::Import { span, .. } => return Err(reject("illegal start of expression", span)),
        }
        Ok(())
    }

    /// Build the variable for `T x = init;` or `var x = init;`.
    pub(crate) fn declare(
        &mut self,
        ty: Option<&TypeName>,
        init: Option<&Expr>,
        span: &Span,
    ) -> Flow<Variable> {
        let declared = ty.map(|ty| self.resolve_type(ty)).transpose()?;
        let value = match (init, declared) {
            (Some(init), _) => self.eval(init)?,
            (None, Some(ty)) => default_value(ty),
            (None, None) => Value::Null,
        };
        match declared {
            Some(ty) => Ok(Variable {
                ty,
                value: self.convert(value, ty, span)?,
            }),
            None => Ok(Variable {
                ty: self.infer(&value),
                value,
            }),
        }
    }

    fn condition(&mut self, cond: &Expr) -> Flow<bool> {
        match self.eval(cond)? {
            Value::Bool(value) => Ok(value),
            Value::Null => Err(self.null_pointer("Cannot unbox null value")),
            other => Err(incompatible_types(&type_label(&other), "boolean", &cond.span)),
        }
    }

    fn throw_value(&mut self, expr: &Expr) -> Flow<Abort> {
        match self.eval(expr)? {
            Value::Object(object) if object.is_throwable() => Ok(Abort::Throw(object)),
            Value::Null => Ok(self.null_pointer("Cannot throw null")),
            other => Err(incompatible_types(
                &type_label(&other),
                "java.lang.Throwable",
                &expr.span,
            )),
        }
    }

    // Expressions

    /// Evaluate an expression statement; void calls yield `None`.
    pub(crate) fn eval_statement_expr(&mut self, expr: &Expr) -> Flow<Option<Value>> {
        match &expr.kind {
            ExprKind::Call {
                receiver,
                method,
                args,
            } => self.eval_call(receiver, method, args, &expr.span),
            _ => self.eval(expr).map(Some),
        }
    }

    pub(crate) fn eval(&mut self, expr: &Expr) -> Flow<Value> {
        ensure_sufficient_stack(|| self.eval_inner(expr))
    }

    fn eval_inner(&mut self, expr: &Expr) -> Flow<Value> {
        let span = &expr.span;
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(literal_value(literal)),
            ExprKind::Ident(name) => self
                .lookup(name)
                .map(|var| var.value.clone())
                .ok_or_else(|| cannot_find_variable(name, span)),
            ExprKind::Unary { op, operand } => {
                let value = self.eval(operand)?;
                let symbol = match op {
                    UnaryOp::Neg => "-",
                    UnaryOp::Not => "!",
                };
                operators::unary(*op, &value).map_err(|failure| self.op_failure(failure, symbol, span))
            }
            ExprKind::Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs, span),
            ExprKind::Assign { target, op, value } => self.assign(target, *op, value, span),
            ExprKind::FieldAssign {
                receiver,
                field,
                value,
            } => self.assign_field(receiver, field, value, span),
            ExprKind::Cast { ty, operand } => {
                let ty = self.resolve_type(ty)?;
                let value = self.eval(operand)?;
                self.cast(value, ty, span)
            }
            ExprKind::Field { receiver, name } => self.field(receiver, name, span),
            ExprKind::Call {
                receiver,
                method,
                args,
            } => self
                .eval_call(receiver, method, args, span)?
                .ok_or_else(|| void_not_allowed(span)),
            ExprKind::New { ty, args } => self.instantiate(ty, args, span),
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr, span: &Span) -> Flow<Value> {
        let left = self.eval(lhs)?;
        // Short-circuit forms skip the right operand.
        match (op, &left) {
            (BinaryOp::And, Value::Bool(false)) => return Ok(Value::Bool(false)),
            (BinaryOp::Or, Value::Bool(true)) => return Ok(Value::Bool(true)),
            _ => {}
        }
        let right = self.eval(rhs)?;
        operators::binary(op, &left, &right)
            .map_err(|failure| self.op_failure(failure, op.symbol(), span))
    }

    fn op_failure(&self, failure: OpFailure, symbol: &str, span: &Span) -> Abort {
        match failure {
            OpFailure::DivisionByZero => self.exception(|k| k.arithmetic, Some("/ by zero")),
            OpFailure::NullOperand => self.null_pointer("Cannot unbox null value"),
            OpFailure::BadOperands { left, right } => bad_operands(symbol, &left, &right, span),
            OpFailure::BadOperand { operand } => bad_operand(symbol, &operand, span),
        }
    }

    fn assign(
        &mut self,
        target: &str,
        op: Option<BinaryOp>,
        value: &Expr,
        span: &Span,
    ) -> Flow<Value> {
        let Some(current) = self.lookup(target) else {
            return Err(cannot_find_variable(target, span));
        };
        let (ty, current) = (current.ty, current.value.clone());
        let mut value = self.eval(value)?;
        if let Some(op) = op {
            value = operators::binary(op, &current, &value)
                .map_err(|failure| self.op_failure(failure, op.symbol(), span))?;
            // Compound assignment narrows back implicitly.
            if ty == TypeRef::Primitive(Primitive::Int) || ty == TypeRef::Primitive(Primitive::Long) {
                value = self.cast(value, ty, span)?;
            }
        }
        let value = self.convert(value, ty, span)?;
        if let Some(var) = self.lookup_mut(target) {
            var.value = value.clone();
        }
        Ok(value)
    }

    fn assign_field(
        &mut self,
        receiver: &Expr,
        field: &str,
        value: &Expr,
        span: &Span,
    ) -> Flow<Value> {
        let object = match self.eval(receiver)? {
            Value::Object(object) => object,
            Value::Null => {
                return Err(self.null_pointer(&format!(
                    "Cannot assign field \"{field}\" because value is null"
                )))
            }
            _ => return Err(cannot_find_variable(field, span)),
        };
        let Some(field_ty) = self
            .registry
            .all_fields(object.class())
            .into_iter()
            .find(|def| def.name == field)
            .map(|def| def.ty)
        else {
            return Err(cannot_find_variable(field, span));
        };
        let value = self.eval(value)?;
        let value = self.convert(value, field_ty, span)?;
        object.set(field, value.clone());
        Ok(value)
    }

    fn field(&mut self, receiver: &Expr, name: &str, span: &Span) -> Flow<Value> {
        if let Some(target) = static_receiver(receiver, |n| self.is_bound(n), self.registry, self.imports)
        {
            return self.static_field(target, name, span);
        }
        match self.eval(receiver)? {
            Value::Object(object) => object
                .get(name)
                .ok_or_else(|| cannot_find_variable(name, span)),
            Value::Null => Err(self.null_pointer(&format!(
                "Cannot read field \"{name}\" because value is null"
            ))),
            _ => Err(cannot_find_variable(name, span)),
        }
    }

    fn instantiate(&mut self, ty: &TypeName, args: &[Expr], span: &Span) -> Flow<Value> {
        let registry = self.registry;
        let TypeRef::Class(class) = self.resolve_type(ty)? else {
            return Err(reject("'(' or '[' expected", span));
        };
        let def = registry.class(class);
        if def.kind == ClassKind::Interface || !def.constructible {
            return Err(reject(
                format!("{} is abstract; cannot be instantiated", def.simple_name),
                span,
            ));
        }
        let args = args
            .iter()
            .map(|arg| self.eval(arg))
            .collect::<Flow<Vec<_>>>()?;

        let constructor_mismatch = || {
            reject(
                format!(
                    "constructor {name} in class {name} cannot be applied to given types;",
                    name = def.simple_name
                ),
                span,
            )
        };
        if registry.is_subclass(class, registry.well_known().array_list) {
            return match args.as_slice() {
                [] | [Value::Int(_)] => Ok(Value::list(Vec::new())),
                _ => Err(constructor_mismatch()),
            };
        }
        if registry.is_throwable(class) {
            let message = match args.as_slice() {
                [] => None,
                [Value::Null] => None,
                [Value::Str(text)] => Some(text.to_string()),
                _ => return Err(constructor_mismatch()),
            };
            return Ok(Value::Object(self.new_exception(class, message)));
        }
        if !args.is_empty() {
            return Err(constructor_mismatch());
        }
        Ok(Value::Object(Arc::new(self.new_object(class))))
    }

    // Types

    fn resolve_type(&self, ty: &TypeName) -> Flow<TypeRef> {
        self.registry
            .resolve(&ty.name, self.imports)
            .map_err(|err| reject(err.to_string(), &ty.span))
    }

    /// Type a `var` declaration takes from its initializer.
    fn infer(&self, value: &Value) -> TypeRef {
        match value {
            Value::Int(_) => TypeRef::Primitive(Primitive::Int),
            Value::Double(_) => TypeRef::Primitive(Primitive::Double),
            Value::Bool(_) => TypeRef::Primitive(Primitive::Boolean),
            other => TypeRef::Class(
                self.registry
                    .runtime_type(other)
                    .unwrap_or(self.well_known().object),
            ),
        }
    }

    fn instance_of(&self, value: &Value, class: ClassId) -> bool {
        if value.is_null() {
            return false;
        }
        class == self.well_known().object
            || self
                .registry
                .runtime_type(value)
                .is_some_and(|runtime| self.registry.is_subclass(runtime, class))
    }

    /// Assignment conversion: widening and reference compatibility only.
    #[allow(clippy::cast_precision_loss)]
    fn convert(&self, value: Value, ty: TypeRef, span: &Span) -> Flow<Value> {
        match (ty, value) {
            (TypeRef::Primitive(Primitive::Int | Primitive::Long), value @ Value::Int(_))
            | (TypeRef::Primitive(Primitive::Double), value @ Value::Double(_))
            | (TypeRef::Primitive(Primitive::Boolean), value @ Value::Bool(_))
            | (TypeRef::Class(_), value @ Value::Null) => Ok(value),
            (TypeRef::Primitive(Primitive::Double), Value::Int(value)) => {
                Ok(Value::Double(value as f64))
            }
            (TypeRef::Primitive(_), Value::Null) => {
                Err(self.null_pointer("Cannot unbox null value"))
            }
            (TypeRef::Class(class), value) if self.instance_of(&value, class) => Ok(value),
            (ty, value) => Err(incompatible_types(
                &type_label(&value),
                self.registry.type_name(ty),
                span,
            )),
        }
    }

    /// `(T) value`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn cast(&self, value: Value, ty: TypeRef, span: &Span) -> Flow<Value> {
        match (ty, value) {
            (TypeRef::Primitive(Primitive::Int), Value::Int(value)) => {
                Ok(Value::Int(i64::from(value as i32)))
            }
            (TypeRef::Primitive(Primitive::Int), Value::Double(value)) => {
                Ok(Value::Int(i64::from(value as i32)))
            }
            (TypeRef::Primitive(Primitive::Long), Value::Double(value)) => {
                Ok(Value::Int(value as i64))
            }
            (TypeRef::Primitive(Primitive::Double), Value::Int(value)) => {
                Ok(Value::Double(value as f64))
            }
            (TypeRef::Class(class), value) if !value.is_null() && !self.instance_of(&value, class) => {
                let runtime = self
                    .registry
                    .runtime_type(&value)
                    .map_or("java.lang.Object", |runtime| {
                        self.registry.class(runtime).display_name()
                    });
                Err(self.exception(
                    |k| k.class_cast,
                    Some(&format!(
                        "class {runtime} cannot be cast to class {}",
                        self.registry.class(class).display_name()
                    )),
                ))
            }
            (ty, value) => self.convert(value, ty, span),
        }
    }

    // Objects

    fn new_object(&self, class: ClassId) -> Object {
        let fields = self
            .registry
            .all_fields(class)
            .into_iter()
            .map(|field| (field.name, default_value(field.ty)))
            .collect();
        Object::new(
            class,
            self.registry.class(class).display_name(),
            self.registry.is_throwable(class),
            fields,
        )
    }

    fn new_exception(&self, class: ClassId, message: Option<String>) -> Arc<Object> {
        let object = self.new_object(class);
        if let Some(message) = message {
            object.set("message", Value::string(message));
        }
        Arc::new(object)
    }

    /// Abort with a new exception of a builtin class.
    #[cold]
    fn exception(&self, class: impl FnOnce(&WellKnown) -> ClassId, message: Option<&str>) -> Abort {
        let class = class(self.well_known());
        tracing::trace!(class = self.registry.class(class).display_name(), ?message, "raising exception");
        Abort::Throw(self.new_exception(class, message.map(str::to_string)))
    }

    #[cold]
    fn null_pointer(&self, message: &str) -> Abort {
        self.exception(|k| k.null_pointer, Some(message))
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Int(value) => Value::Int(*value),
        Literal::Double(value) => Value::Double(*value),
        Literal::Str(text) => Value::string(text.as_str()),
        Literal::Bool(value) => Value::Bool(*value),
        Literal::Null => Value::Null,
    }
}

/// Value of a declared but uninitialized variable or field.
pub(crate) fn default_value(ty: TypeRef) -> Value {
    match ty {
        TypeRef::Primitive(Primitive::Int | Primitive::Long) => Value::Int(0),
        TypeRef::Primitive(Primitive::Double) => Value::Double(0.0),
        TypeRef::Primitive(Primitive::Boolean) => Value::Bool(false),
        TypeRef::Class(_) => Value::Null,
    }
}
