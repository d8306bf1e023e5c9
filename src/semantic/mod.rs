//! Semantic analysis for SOL25 (§4.3/§4.4): the class/scope symbol table and
//! the analyzer that walks the AST against it.

pub mod analyzer;
pub mod symbol_table;

pub use analyzer::analyze;
pub use symbol_table::{Binding, ClassManager, ClassSymbol, MethodSymbol, ScopeManager};
