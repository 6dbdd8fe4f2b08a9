//! Tokenizer for shell snippets.
//!
//! The `Token` enum is logos-derived. Invalid input does not stop
//! lexing: it becomes a [`Lexeme`] without a token so completeness analysis
//! can keep scanning for a terminator.

use std::ops::Range;

use logos::Logos;

pub type Span = Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    #[regex(r"//[^\n]*", logos::skip)]
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", logos::skip)]
    Comment,

    #[token("var")]
    Var,
    #[token("new")]
    New,
    #[token("null")]
    Null,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("throw")]
    Throw,
    #[token("import")]
    Import,

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Double(f64),
    #[regex(r"[0-9]+[lL]?", parse_int)]
    Int(i64),
    #[regex(r#""([^"\\\n]|\\.)*""#, unescape)]
    Str(String),
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("=")]
    Assign,
    #[token("+=")]
    PlusAssign,
    #[token("-=")]
    MinusAssign,
    #[token("*=")]
    StarAssign,
    #[token("/=")]
    SlashAssign,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
}

impl Token {
    /// Whether a snippet may not end right after this token.
    pub fn expects_continuation(&self) -> bool {
        matches!(
            self,
            Token::Dot
                | Token::Comma
                | Token::Assign
                | Token::PlusAssign
                | Token::MinusAssign
                | Token::StarAssign
                | Token::SlashAssign
                | Token::EqEq
                | Token::NotEq
                | Token::Lt
                | Token::LtEq
                | Token::Gt
                | Token::GtEq
                | Token::Plus
                | Token::Minus
                | Token::Star
                | Token::Slash
                | Token::Percent
                | Token::Bang
                | Token::AndAnd
                | Token::OrOr
                | Token::New
                | Token::Var
                | Token::Throw
                | Token::Import
                | Token::If
                | Token::Else
                | Token::While
        )
    }

    /// Short description used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Token::Int(value) => value.to_string(),
            Token::Double(value) => value.to_string(),
            Token::Str(_) => "string literal".to_string(),
            Token::Ident(name) => name.clone(),
            other => format!("{other:?}").to_lowercase(),
        }
    }
}

fn parse_int(lex: &mut logos::Lexer<'_, Token>) -> Option<i64> {
    lex.slice().trim_end_matches(['l', 'L']).parse().ok()
}

fn unescape(lex: &mut logos::Lexer<'_, Token>) -> Option<String> {
    let slice = lex.slice();
    let body = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            _ => return None,
        }
    }
    Some(out)
}

/// One lexed item; `token` is `None` for input logos could not match.
#[derive(Clone, Debug, PartialEq)]
pub struct Lexeme {
    pub token: Option<Token>,
    pub span: Span,
}

impl Lexeme {
    /// Invalid input that opens a string literal never closed on its line.
    pub fn is_unterminated_string(&self, source: &str) -> bool {
        self.token.is_none() && source[self.span.clone()].starts_with('"')
    }
}

/// Lex all of `source`, keeping invalid stretches as token-less lexemes.
pub fn lex(source: &str) -> Vec<Lexeme> {
    let mut lexer = Token::lexer(source);
    let mut lexemes = Vec::new();
    while let Some(result) = lexer.next() {
        lexemes.push(Lexeme {
            token: result.ok(),
            span: lexer.span(),
        });
    }
    lexemes
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokens(source: &str) -> Vec<Option<Token>> {
        lex(source).into_iter().map(|lexeme| lexeme.token).collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            tokens("var output = inputA;"),
            vec![
                Some(Token::Var),
                Some(Token::Ident("output".to_string())),
                Some(Token::Assign),
                Some(Token::Ident("inputA".to_string())),
                Some(Token::Semi),
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            tokens("12 3.5 7L"),
            vec![
                Some(Token::Int(12)),
                Some(Token::Double(3.5)),
                Some(Token::Int(7)),
            ]
        );
    }

    #[test]
    fn strings_are_unescaped() {
        assert_eq!(
            tokens(r#""a\"b\n""#),
            vec![Some(Token::Str("a\"b\n".to_string()))]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            tokens("1 // one\n/* two */ 2"),
            vec![Some(Token::Int(1)), Some(Token::Int(2))]
        );
    }

    #[test]
    fn unterminated_string_is_flagged() {
        let source = "\"abc";
        let lexemes = lex(source);
        assert!(lexemes[0].is_unterminated_string(source));
    }

    #[test]
    fn compound_operators() {
        assert_eq!(
            tokens("a += 1 <= 2"),
            vec![
                Some(Token::Ident("a".to_string())),
                Some(Token::PlusAssign),
                Some(Token::Int(1)),
                Some(Token::LtEq),
                Some(Token::Int(2)),
            ]
        );
    }
}
