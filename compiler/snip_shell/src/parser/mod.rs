//! Recursive-descent parser for one snippet.
//!
//! A snippet is exactly one top-level statement. The trailing `;` of the
//! final statement may be omitted.

use std::fmt;

use tracing::trace;

use crate::ast::{BinaryOp, Expr, ExprKind, Literal, Stmt, TypeName, UnaryOp};
use crate::lexer::{lex, Span, Token};
use crate::stack::ensure_sufficient_stack;

/// Syntax error with the offending byte range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    fn new(message: impl Into<String>, span: Span) -> Self {
        ParseError {
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ParseError {}

type ParseResult<T> = Result<T, ParseError>;

/// Names of the primitive types.
pub const PRIMITIVES: [&str; 4] = ["int", "long", "double", "boolean"];

/// Parse `source` as a single statement.
pub fn parse_snippet(source: &str) -> ParseResult<Stmt> {
    let mut tokens = Vec::new();
    for lexeme in lex(source) {
        match lexeme.token {
            Some(token) => tokens.push((token, lexeme.span)),
            None if lexeme.is_unterminated_string(source) => {
                return Err(ParseError::new("unclosed string literal", lexeme.span));
            }
            None => {
                let text = &source[lexeme.span.clone()];
                return Err(ParseError::new(
                    format!("illegal character: '{text}'"),
                    lexeme.span,
                ));
            }
        }
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
    };
    if parser.at_end() {
        return Err(ParseError::new("empty snippet", 0..0));
    }
    let stmt = parser.statement()?;
    if let Some((token, span)) = parser.peek_spanned() {
        return Err(ParseError::new(
            format!("';' expected, found {}", token.describe()),
            span.clone(),
        ));
    }
    trace!(?stmt, "parsed snippet");
    Ok(stmt)
}

struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|(token, _)| token)
    }

    fn peek_spanned(&self) -> Option<&(Token, Span)> {
        self.tokens.get(self.pos)
    }

    fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, span)) => span.clone(),
            None => self.end..self.end,
        }
    }

    fn previous_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|index| self.tokens.get(index))
            .map_or(0, |(_, span)| span.end)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(token, _)| token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, what: &str) -> ParseResult<()> {
        if self.eat(expected) {
            return Ok(());
        }
        Err(self.error_here(format!("'{what}' expected")))
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        let mut message = message.into();
        if let Some(token) = self.peek() {
            message = format!("{message}, found {}", token.describe());
        }
        ParseError::new(message, self.current_span())
    }

    fn ident(&mut self) -> ParseResult<String> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error_here("<identifier> expected")),
        }
    }

    /// `;`, or nothing at the very end of the snippet.
    fn terminator(&mut self) -> ParseResult<()> {
        if self.eat(&Token::Semi) || self.at_end() {
            return Ok(());
        }
        Err(self.error_here("';' expected"))
    }

    // Statements

    fn statement(&mut self) -> ParseResult<Stmt> {
        ensure_sufficient_stack(|| self.statement_inner())
    }

    fn statement_inner(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span().start;
        match self.peek() {
            Some(Token::LBrace) => {
                self.pos += 1;
                let mut body = Vec::new();
                while !self.eat(&Token::RBrace) {
                    if self.at_end() {
                        return Err(self.error_here("reached end of snippet while parsing"));
                    }
                    body.push(self.statement()?);
                }
                Ok(Stmt::Block(body))
            }
            Some(Token::If) => {
                self.pos += 1;
                let cond = self.condition()?;
                let then_branch = Box::new(self.statement()?);
                let else_branch = if self.eat(&Token::Else) {
                    Some(Box::new(self.statement()?))
                } else {
                    None
                };
                Ok(Stmt::If {
                    cond,
                    then_branch,
                    else_branch,
                })
            }
            Some(Token::While) => {
                self.pos += 1;
                let cond = self.condition()?;
                let body = Box::new(self.statement()?);
                Ok(Stmt::While { cond, body })
            }
            Some(Token::Throw) => {
                self.pos += 1;
                let thrown = self.expression()?;
                self.terminator()?;
                Ok(Stmt::Throw(thrown))
            }
            Some(Token::Import) => {
                self.pos += 1;
                let mut path = self.ident()?;
                let mut wildcard = false;
                while self.eat(&Token::Dot) {
                    if self.eat(&Token::Star) {
                        wildcard = true;
                        break;
                    }
                    path.push('.');
                    path.push_str(&self.ident()?);
                }
                let span = start..self.previous_end();
                self.terminator()?;
                Ok(Stmt::Import {
                    path,
                    wildcard,
                    span,
                })
            }
            Some(Token::Var) => {
                self.pos += 1;
                let name = self.ident()?;
                if !self.eat(&Token::Assign) {
                    return Err(self.error_here(
                        "cannot infer type for local variable (cannot use 'var' without initializer)",
                    ));
                }
                let init = self.expression()?;
                let span = start..self.previous_end();
                self.terminator()?;
                Ok(Stmt::VarDecl {
                    ty: None,
                    name,
                    init: Some(init),
                    span,
                })
            }
            _ if self.looks_like_declaration() => {
                let ty = self.type_name()?;
                let name = self.ident()?;
                let init = if self.eat(&Token::Assign) {
                    Some(self.expression()?)
                } else {
                    None
                };
                let span = start..self.previous_end();
                self.terminator()?;
                Ok(Stmt::VarDecl {
                    ty: Some(ty),
                    name,
                    init,
                    span,
                })
            }
            _ => {
                let expr = self.expression()?;
                self.terminator()?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn condition(&mut self) -> ParseResult<Expr> {
        self.expect(&Token::LParen, "(")?;
        let cond = self.expression()?;
        self.expect(&Token::RParen, ")")?;
        Ok(cond)
    }

    /// `Ident (. Ident)* Ident` followed by `=`, `;` or the end.
    fn looks_like_declaration(&self) -> bool {
        let mut offset = 0;
        if !matches!(self.peek_at(offset), Some(Token::Ident(_))) {
            return false;
        }
        offset += 1;
        while self.peek_at(offset) == Some(&Token::Dot) {
            if !matches!(self.peek_at(offset + 1), Some(Token::Ident(_))) {
                return false;
            }
            offset += 2;
        }
        matches!(self.peek_at(offset), Some(Token::Ident(_)))
            && matches!(
                self.peek_at(offset + 1),
                Some(Token::Assign | Token::Semi) | None
            )
    }

    fn type_name(&mut self) -> ParseResult<TypeName> {
        let start = self.current_span().start;
        let mut name = self.ident()?;
        while self.peek() == Some(&Token::Dot) && matches!(self.peek_at(1), Some(Token::Ident(_))) {
            self.pos += 1;
            name.push('.');
            name.push_str(&self.ident()?);
        }
        Ok(TypeName {
            name,
            span: start..self.previous_end(),
        })
    }

    // Expressions

    fn expression(&mut self) -> ParseResult<Expr> {
        ensure_sufficient_stack(|| self.assignment())
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let target = self.binary(0)?;
        let op = match self.peek() {
            Some(Token::Assign) => None,
            Some(Token::PlusAssign) => Some(BinaryOp::Add),
            Some(Token::MinusAssign) => Some(BinaryOp::Sub),
            Some(Token::StarAssign) => Some(BinaryOp::Mul),
            Some(Token::SlashAssign) => Some(BinaryOp::Div),
            _ => return Ok(target),
        };
        let op_span = self.current_span();
        self.pos += 1;
        let value = Box::new(self.expression()?);
        let span = target.span.start..value.span.end;
        match target.kind {
            ExprKind::Ident(name) => Ok(Expr::new(
                ExprKind::Assign {
                    target: name,
                    op,
                    value,
                },
                span,
            )),
            ExprKind::Field { receiver, name } if op.is_none() => Ok(Expr::new(
                ExprKind::FieldAssign {
                    receiver,
                    field: name,
                    value,
                },
                span,
            )),
            _ => Err(ParseError::new(
                "unexpected type\n  required: variable\n  found:    value",
                op_span,
            )),
        }
    }

    fn binary(&mut self, min_precedence: u8) -> ParseResult<Expr> {
        let mut lhs = self.unary()?;
        while let Some((op, precedence)) = self.peek().and_then(binary_op) {
            if precedence < min_precedence {
                break;
            }
            self.pos += 1;
            let rhs = ensure_sufficient_stack(|| self.binary(precedence + 1))?;
            let span = lhs.span.start..rhs.span.end;
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        let start = self.current_span().start;
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::LParen) if self.looks_like_cast() => {
                self.pos += 1;
                let ty = self.type_name()?;
                self.expect(&Token::RParen, ")")?;
                let operand = Box::new(ensure_sufficient_stack(|| self.unary())?);
                let span = start..operand.span.end;
                return Ok(Expr::new(ExprKind::Cast { ty, operand }, span));
            }
            _ => return self.postfix(),
        };
        self.pos += 1;
        let operand = Box::new(ensure_sufficient_stack(|| self.unary())?);
        let span = start..operand.span.end;
        Ok(Expr::new(ExprKind::Unary { op, operand }, span))
    }

    /// At `(`: a parenthesized type followed by something a cast can apply to.
    fn looks_like_cast(&self) -> bool {
        let mut offset = 1;
        let Some(Token::Ident(first)) = self.peek_at(offset) else {
            return false;
        };
        let primitive = PRIMITIVES.contains(&first.as_str());
        offset += 1;
        while self.peek_at(offset) == Some(&Token::Dot) {
            if !matches!(self.peek_at(offset + 1), Some(Token::Ident(_))) {
                return false;
            }
            offset += 2;
        }
        if self.peek_at(offset) != Some(&Token::RParen) {
            return false;
        }
        primitive
            || matches!(
                self.peek_at(offset + 1),
                Some(
                    Token::Ident(_)
                        | Token::Int(_)
                        | Token::Double(_)
                        | Token::Str(_)
                        | Token::True
                        | Token::False
                        | Token::Null
                        | Token::New
                        | Token::LParen
                        | Token::Bang
                )
            )
    }

    fn postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;
        while self.eat(&Token::Dot) {
            let name = self.ident()?;
            if self.peek() == Some(&Token::LParen) {
                let args = self.arguments()?;
                let span = expr.span.start..self.previous_end();
                expr = Expr::new(
                    ExprKind::Call {
                        receiver: Box::new(expr),
                        method: name,
                        args,
                    },
                    span,
                );
            } else {
                let span = expr.span.start..self.previous_end();
                expr = Expr::new(
                    ExprKind::Field {
                        receiver: Box::new(expr),
                        name,
                    },
                    span,
                );
            }
        }
        Ok(expr)
    }

    fn arguments(&mut self) -> ParseResult<Vec<Expr>> {
        self.expect(&Token::LParen, "(")?;
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if self.eat(&Token::RParen) {
                return Ok(args);
            }
            self.expect(&Token::Comma, ",")?;
        }
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let span = self.current_span();
        let literal = |lit| Ok(Expr::new(ExprKind::Literal(lit), span.clone()));
        match self.bump() {
            Some(Token::Int(value)) => literal(Literal::Int(value)),
            Some(Token::Double(value)) => literal(Literal::Double(value)),
            Some(Token::Str(value)) => literal(Literal::Str(value)),
            Some(Token::True) => literal(Literal::Bool(true)),
            Some(Token::False) => literal(Literal::Bool(false)),
            Some(Token::Null) => literal(Literal::Null),
            Some(Token::Ident(name)) => Ok(Expr::new(ExprKind::Ident(name), span)),
            Some(Token::LParen) => {
                let inner = self.expression()?;
                self.expect(&Token::RParen, ")")?;
                Ok(Expr::new(inner.kind, span.start..self.previous_end()))
            }
            Some(Token::New) => {
                let ty = self.type_name()?;
                let args = self.arguments()?;
                Ok(Expr::new(
                    ExprKind::New { ty, args },
                    span.start..self.previous_end(),
                ))
            }
            Some(_) => {
                self.pos -= 1;
                Err(self.error_here("illegal start of expression"))
            }
            None => Err(ParseError::new("illegal start of expression", span)),
        }
    }
}

/// Operator and precedence level of a binary operator token.
fn binary_op(token: &Token) -> Option<(BinaryOp, u8)> {
    let entry = match token {
        Token::OrOr => (BinaryOp::Or, 1),
        Token::AndAnd => (BinaryOp::And, 2),
        Token::EqEq => (BinaryOp::Eq, 3),
        Token::NotEq => (BinaryOp::NotEq, 3),
        Token::Lt => (BinaryOp::Lt, 4),
        Token::LtEq => (BinaryOp::LtEq, 4),
        Token::Gt => (BinaryOp::Gt, 4),
        Token::GtEq => (BinaryOp::GtEq, 4),
        Token::Plus => (BinaryOp::Add, 5),
        Token::Minus => (BinaryOp::Sub, 5),
        Token::Star => (BinaryOp::Mul, 6),
        Token::Slash => (BinaryOp::Div, 6),
        Token::Percent => (BinaryOp::Rem, 6),
        _ => return None,
    };
    Some(entry)
}

#[cfg(test)]
mod tests;
