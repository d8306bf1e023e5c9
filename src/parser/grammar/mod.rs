//! Grammar productions for SOL25 (spec §4.1), one file per production
//! family, following this crate's existing convention of splitting a
//! grammar across several files rather than one monolith.

mod block;
mod class_def;
mod expr;
mod selector;

use super::parser::Parser;
use super::syntax_kind::SyntaxKind;

/// `program := class_def*`
pub(super) fn program(p: &mut Parser) {
    p.start_node(SyntaxKind::PROGRAM);
    while !p.at_eof() {
        if p.at(SyntaxKind::CLASS_KW) {
            class_def::class_def(p);
        } else {
            p.error(format!("expected 'class', found {:?}", p.current()));
            p.bump();
        }
    }
    p.finish_node();
}

pub(super) use block::block;
pub(super) use expr::expression;
pub(super) use selector::selector;
