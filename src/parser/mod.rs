//! Lexing and parsing for SOL25.
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos) → Tokens with SyntaxKind
//!     ↓
//! Parser → GreenNode tree (immutable, cheap to clone)
//!     ↓
//! SyntaxNode (rowan) → lossless CST
//!     ↓
//! crate::ast → owned AST, built by one consuming walk
//! ```

pub mod grammar;
pub mod lexer;
#[allow(clippy::module_inception)]
mod parser;
pub mod syntax_kind;

pub use lexer::{LexError, Lexer, LogosToken, Token, tokenize};
pub use parser::{Parse, SyntaxError, parse, parse_with_lex_error};
pub use syntax_kind::{Sol25Language, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};

pub use rowan::{GreenNode, TextRange, TextSize};
