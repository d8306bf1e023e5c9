//! Recursive-descent parser for SOL25.
//!
//! Builds a single `rowan::GreenNode` tree from the token stream produced by
//! [`super::lexer`]. SOL25 has one grammar, so there is a single `Parser`
//! with ordinary methods rather than a family of dialect-dispatch traits.

use rowan::{GreenNode, GreenNodeBuilder, TextRange, TextSize};

use super::lexer::{LexError, Token, tokenize};
use super::syntax_kind::SyntaxKind;

/// A parse failure tied to a source range, collected during parsing rather
/// than raised immediately — the first one found is what the driver reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

/// The result of parsing: a lossless green tree, the description lifted
/// from the first comment (if any), and any errors encountered. `errors` is
/// never more than one entry long in practice — parsing stops at the first
/// syntax error — but stays a `Vec` in case that ever changes.
pub struct Parse {
    pub green: GreenNode,
    pub description: Option<String>,
    pub errors: Vec<SyntaxError>,
}

impl Parse {
    pub fn syntax(&self) -> super::syntax_kind::SyntaxNode {
        super::syntax_kind::SyntaxNode::new_root(self.green.clone())
    }

    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parses `source`, returning a [`Parse`] result. A lexical error aborts
/// before any parsing begins and is reported through `errors` with message
/// text identifying it as lexical — the driver distinguishes lexical from
/// syntactic failure by inspecting which phase produced the `SyntaxError`,
/// via [`parse_with_lex_error`].
pub fn parse(source: &str) -> Parse {
    match parse_with_lex_error(source) {
        Ok(parse) => parse,
        Err((err, offset)) => {
            let range = TextRange::empty(TextSize::from(offset));
            let mut builder = GreenNodeBuilder::new();
            builder.start_node(SyntaxKind::PROGRAM.into());
            builder.finish_node();
            Parse {
                green: builder.finish(),
                description: None,
                errors: vec![SyntaxError::new(format!("lexical error: {err}"), range)],
            }
        }
    }
}

/// Like [`parse`], but surfaces a lexical error as `Err` instead of folding
/// it into `Parse::errors`, so callers can distinguish exit code 21 from 22
/// without string-matching a message.
pub fn parse_with_lex_error(source: &str) -> Result<Parse, (LexError, u32)> {
    let (tokens, description) = match tokenize(source) {
        Ok(result) => result,
        Err(err) => {
            // tokenize() stops at the first bad token; we don't have its
            // offset here, so re-scan far enough to report it precisely.
            let offset = first_lex_error_offset(source);
            return Err((err, offset));
        }
    };
    let mut parser = Parser::new(&tokens, source);
    super::grammar::program(&mut parser);
    let (green, errors) = parser.finish();
    Ok(Parse {
        green,
        description,
        errors,
    })
}

fn first_lex_error_offset(source: &str) -> u32 {
    use super::lexer::Lexer;
    for item in Lexer::new(source) {
        if let Err((_, tok)) = item {
            return tok.offset;
        }
    }
    0
}

pub(super) struct Parser<'a> {
    tokens: &'a [Token<'a>],
    pos: usize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<SyntaxError>,
    source: &'a str,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token<'a>], source: &'a str) -> Self {
        Self {
            tokens,
            pos: 0,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
            source,
        }
    }

    fn finish(self) -> (GreenNode, Vec<SyntaxError>) {
        (self.builder.finish(), self.errors)
    }

    pub(super) fn current(&self) -> Option<SyntaxKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    pub(super) fn nth(&self, n: usize) -> Option<SyntaxKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    pub(super) fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == Some(kind)
    }

    pub(super) fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Current token index, for callers that need to detect a production
    /// which consumed nothing (e.g. a `*`-repeated production guarding
    /// against an infinite loop on malformed input).
    pub(super) fn pos(&self) -> usize {
        self.pos
    }

    pub(super) fn text(&self) -> &'a str {
        self.tokens.get(self.pos).map(|t| t.text).unwrap_or("")
    }

    pub(super) fn bump(&mut self) {
        if let Some(tok) = self.tokens.get(self.pos) {
            self.builder.token(tok.kind.into(), tok.text);
            self.pos += 1;
        }
    }

    /// Consumes the current token if it matches `kind`; returns whether it did.
    pub(super) fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consumes the current token, which must be `kind`, recording a syntax
    /// error and leaving the token stream untouched if it isn't.
    pub(super) fn expect(&mut self, kind: SyntaxKind) {
        if !self.eat(kind) {
            let found = self
                .current()
                .map(|k| format!("{k:?}"))
                .unwrap_or_else(|| "end of input".to_string());
            self.error(format!("expected {kind:?}, found {found}"));
        }
    }

    pub(super) fn error(&mut self, message: impl Into<String>) {
        let offset = self
            .tokens
            .get(self.pos)
            .map(|t| t.offset)
            .unwrap_or(self.source.len() as u32);
        let range = TextRange::empty(TextSize::from(offset));
        self.errors.push(SyntaxError::new(message, range));
    }

    pub(super) fn start_node(&mut self, kind: SyntaxKind) {
        self.builder.start_node(kind.into());
    }

    pub(super) fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    pub(super) fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_program() {
        let result = parse("class Main : Object { run [ | ] }");
        assert!(result.ok(), "unexpected errors: {:?}", result.errors);
        assert_eq!(result.syntax().kind(), SyntaxKind::PROGRAM);
    }

    #[test]
    fn reports_lexical_errors_before_parsing() {
        let result = parse("class Main : Object { run ['abc] }");
        assert!(!result.ok());
    }

    #[test]
    fn reports_a_syntax_error_for_a_missing_brace() {
        let result = parse("class Main : Object { run [ | ]");
        assert!(!result.ok());
    }

    #[test]
    fn captures_the_first_comment_as_description() {
        let result = parse("\"hi\" class Main : Object { run [ | ] }");
        assert_eq!(result.description.as_deref(), Some("hi"));
    }
}
