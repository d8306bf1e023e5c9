//! Logos-based lexer for SOL25.
//!
//! Tokenization is mostly declarative `logos` regexes, same as the rest of
//! this crate's lexers. Two token kinds need more than a regex can express:
//! `STRING` and `COMMENT` must each distinguish "never closed" from "closed,
//! but with content that letter-for-letter isn't allowed" (an unsupported
//! escape inside a string). Both get a small hand-written scanning callback
//! instead of a bare pattern.

use std::fmt;

use logos::{Lexer as LogosLexer, Logos};

use super::syntax_kind::SyntaxKind;

/// What went wrong while scanning a single token. Distinct from
/// [`crate::error::Sol25Error`]: this is the lexer-internal detail that the
/// parser turns into a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LexError {
    #[default]
    UnrecognizedCharacter,
    UnterminatedString,
    UnterminatedComment,
    InvalidEscape(char),
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnrecognizedCharacter => write!(f, "unrecognized character"),
            LexError::UnterminatedString => write!(f, "unterminated string literal"),
            LexError::UnterminatedComment => write!(f, "unterminated comment"),
            LexError::InvalidEscape(c) => write!(f, "invalid escape sequence '\\{c}'"),
        }
    }
}

/// Scans the body of a `'...'` string literal after the opening quote has
/// already been consumed by the triggering token pattern. Accepts exactly
/// the escapes the grammar allows (`\n`, `\'`, `\\`); anything else, or
/// running off the end of input first, is a [`LexError`].
fn lex_string(lex: &mut LogosLexer<LogosToken>) -> Result<(), LexError> {
    let rest = lex.remainder();
    let bytes = rest.as_bytes();
    let mut i = 0usize;
    loop {
        match bytes.get(i) {
            None => return Err(LexError::UnterminatedString),
            Some(b'\'') => {
                lex.bump(i + 1);
                return Ok(());
            }
            Some(b'\\') => match bytes.get(i + 1) {
                Some(b'n') | Some(b'\'') | Some(b'\\') => i += 2,
                Some(&c) => return Err(LexError::InvalidEscape(c as char)),
                None => return Err(LexError::UnterminatedString),
            },
            Some(_) => i += 1,
        }
    }
}

/// Scans the body of a `"..."` comment after the opening quote has already
/// been consumed. Comments do not nest and do not support escapes; the
/// first `"` closes them.
fn lex_comment(lex: &mut LogosLexer<LogosToken>) -> Result<(), LexError> {
    let rest = lex.remainder();
    match rest.find('"') {
        Some(len) => {
            lex.bump(len + 1);
            Ok(())
        }
        None => Err(LexError::UnterminatedComment),
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexError)]
pub enum LogosToken {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[token("'", lex_string)]
    String,

    #[token("\"", lex_comment)]
    Comment,

    #[token("class")]
    ClassKw,
    #[token("self")]
    SelfKw,
    #[token("super")]
    SuperKw,
    #[token("nil")]
    NilKw,
    #[token("true")]
    TrueKw,
    #[token("false")]
    FalseKw,

    #[regex(r"[+-]?[0-9]+")]
    Int,

    #[regex(r"[a-z_][A-Za-z0-9_]*:")]
    IdSelector,

    #[regex(r":[a-zA-Z_][A-Za-z0-9_]*")]
    SelectorId,

    #[regex(r"[a-z_][A-Za-z0-9_]*")]
    Id,

    #[regex(r"[A-Z][A-Za-z0-9]*")]
    Cid,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBrack,
    #[token("]")]
    RBrack,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("|")]
    Pipe,
    #[token(".")]
    Dot,
    #[token(":=")]
    AssignOp,
    #[token(":")]
    Colon,
}

impl From<LogosToken> for SyntaxKind {
    fn from(tok: LogosToken) -> Self {
        match tok {
            LogosToken::Whitespace => SyntaxKind::WHITESPACE,
            LogosToken::String => SyntaxKind::STRING_LIT,
            LogosToken::Comment => SyntaxKind::COMMENT,
            LogosToken::ClassKw => SyntaxKind::CLASS_KW,
            LogosToken::SelfKw => SyntaxKind::SELF_KW,
            LogosToken::SuperKw => SyntaxKind::SUPER_KW,
            LogosToken::NilKw => SyntaxKind::NIL_KW,
            LogosToken::TrueKw => SyntaxKind::TRUE_KW,
            LogosToken::FalseKw => SyntaxKind::FALSE_KW,
            LogosToken::Int => SyntaxKind::INT_LIT,
            LogosToken::IdSelector => SyntaxKind::ID_SELECTOR,
            LogosToken::SelectorId => SyntaxKind::SELECTOR_ID,
            LogosToken::Id => SyntaxKind::ID,
            LogosToken::Cid => SyntaxKind::CID,
            LogosToken::LBrace => SyntaxKind::L_BRACE,
            LogosToken::RBrace => SyntaxKind::R_BRACE,
            LogosToken::LBrack => SyntaxKind::L_BRACK,
            LogosToken::RBrack => SyntaxKind::R_BRACK,
            LogosToken::LParen => SyntaxKind::L_PAREN,
            LogosToken::RParen => SyntaxKind::R_PAREN,
            LogosToken::Pipe => SyntaxKind::PIPE,
            LogosToken::Dot => SyntaxKind::DOT,
            LogosToken::AssignOp => SyntaxKind::ASSIGN_OP,
            LogosToken::Colon => SyntaxKind::COLON,
        }
    }
}

/// A single lexed token with its source text and byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
    pub offset: u32,
}

/// Iterates the tokens of `source`, tagging lexical failures with
/// [`LexError`] rather than silently coercing them to [`SyntaxKind::ERROR`].
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
    offset: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: LogosToken::lexer(source),
            offset: 0,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, (LexError, Token<'a>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.inner.next()?;
        let text = self.inner.slice();
        let start = self.offset;
        self.offset += text.len() as u32;
        match result {
            Ok(tok) => Some(Ok(Token {
                kind: tok.into(),
                text,
                offset: start,
            })),
            Err(err) => Some(Err((
                err,
                Token {
                    kind: SyntaxKind::ERROR,
                    text,
                    offset: start,
                },
            ))),
        }
    }
}

/// Tokenizes `source` in full, stopping at (and returning) the first
/// lexical error. Also returns the raw content of the first `COMMENT`
/// token, if any, with outer quotes stripped — the program description
/// (spec §4.1/§4.5) is read off this without a second scan over the text.
pub fn tokenize(source: &str) -> Result<(Vec<Token<'_>>, Option<String>), LexError> {
    let mut tokens = Vec::new();
    let mut description = None;
    for item in Lexer::new(source) {
        match item {
            Ok(tok) => {
                if tok.kind == SyntaxKind::COMMENT && description.is_none() {
                    let inner = tok.text.trim_start_matches('"').trim_end_matches('"');
                    description = Some(inner.to_string());
                }
                if !tok.kind.is_trivia() {
                    tokens.push(tok);
                }
            }
            Err((err, _)) => return Err(err),
        }
    }
    Ok((tokens, description))
}
