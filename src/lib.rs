//! # sol25
//!
//! Static analyzer front-end for SOL25: lexer, parser, AST builder, semantic
//! analyzer, and XML emitter. No interpreter — analysis stops once a
//! validated AST has been serialized.
//!
//! ## Module structure (pipeline order)
//!
//! ```text
//! driver      → stdin/stdout, argv, exit-code reporting
//!   ↓
//! parser      → Logos lexer, recursive-descent parser, rowan CST
//!   ↓
//! ast         → owned AST, built by one consuming walk of the CST
//!   ↓
//! semantic    → ClassManager/ScopeManager symbol table, analyzer walk
//!   ↓
//! xml_emitter → canonical XML serialization of the validated AST
//! ```

// ============================================================================
// MODULES (pipeline order: parser → ast → semantic → xml_emitter → driver)
// ============================================================================

/// Owned abstract syntax tree materialized from the parser's CST.
pub mod ast;

/// Driver: stdin/stdout handling, CLI argument contract, phase orchestration.
pub mod driver;

/// Closed error taxonomy shared by every pipeline phase.
pub mod error;

/// Logos lexer, recursive-descent parser, rowan concrete syntax tree.
pub mod parser;

/// Class/scope symbol table and the static semantic analyzer.
pub mod semantic;

/// Canonical XML serialization of an analyzed program.
pub mod xml_emitter;

pub use error::Sol25Error;
