//! Completeness analysis: finds the first complete top-level unit.
//!
//! Works on tokens only. A unit ends at a `;` at nesting depth zero, or at
//! the `}` closing the body of an `if`, `while` or block, unless `else`
//! follows.

use snip_bridge::{Completeness, Completion};

use crate::lexer::{lex, Lexeme, Token};

/// Analyze the head of `text`.
pub fn analyze(text: &str) -> Completion {
    let lexemes = lex(text);
    let Some(first) = lexemes.first() else {
        return Completion::empty();
    };
    let start = first.span.start;

    let mut scan = Scan::new(matches!(
        first.token,
        Some(Token::If | Token::While | Token::LBrace)
    ));

    for (index, lexeme) in lexemes.iter().enumerate() {
        let Some(token) = &lexeme.token else {
            if lexeme.is_unterminated_string(text) {
                return Completion::new(Completeness::DefinitelyIncomplete, &text[start..], "");
            }
            scan.invalid = true;
            continue;
        };

        if scan.step(token) && !followed_by_else(&lexemes[index + 1..]) {
            let end = lexeme.span.end;
            let completeness = if scan.invalid {
                Completeness::Unknown
            } else {
                Completeness::Complete
            };
            return Completion::new(completeness, &text[start..end], &text[end..]);
        }
    }

    let last = &lexemes[lexemes.len() - 1];
    let Some(last_token) = last.token.as_ref().filter(|_| !scan.invalid) else {
        return Completion::new(Completeness::Unknown, text[start..].trim_end(), "");
    };
    if scan.depth > 0 || scan.awaiting_body || last_token.expects_continuation() {
        return Completion::new(Completeness::DefinitelyIncomplete, &text[start..], "");
    }
    Completion::new(
        Completeness::CompleteWithSemi,
        format!("{};", &text[start..last.span.end]),
        "",
    )
}

fn followed_by_else(rest: &[Lexeme]) -> bool {
    matches!(rest.first(), Some(Lexeme { token: Some(Token::Else), .. }))
}

/// Token-level state of the unit being scanned.
struct Scan {
    depth: usize,
    /// The unit is an `if`, `while` or block, so a closing `}` may end it.
    block_like: bool,
    /// An `if`/`while` keyword was seen; its condition is not closed yet.
    condition_pending: bool,
    /// A condition or `else` was closed and its body has not started.
    awaiting_body: bool,
    invalid: bool,
}

impl Scan {
    fn new(block_like: bool) -> Self {
        Scan {
            depth: 0,
            block_like,
            condition_pending: false,
            awaiting_body: false,
            invalid: false,
        }
    }

    /// Feed one token; true when it ends the unit.
    fn step(&mut self, token: &Token) -> bool {
        let top_level = self.depth == 0;
        if top_level {
            self.awaiting_body = false;
        }
        match token {
            Token::LParen | Token::LBrace | Token::LBracket => {
                self.depth += 1;
                false
            }
            Token::RParen | Token::RBracket => {
                self.depth = self.depth.saturating_sub(1);
                if self.depth == 0 && *token == Token::RParen && self.condition_pending {
                    self.condition_pending = false;
                    self.awaiting_body = true;
                }
                false
            }
            Token::RBrace => {
                self.depth = self.depth.saturating_sub(1);
                self.depth == 0 && self.block_like
            }
            Token::If | Token::While if top_level => {
                self.condition_pending = true;
                false
            }
            Token::Else if top_level => {
                self.awaiting_body = true;
                false
            }
            Token::Semi => top_level,
            _ => false,
        }
    }
}
