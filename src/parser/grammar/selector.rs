//! `selector := ID | ID_SELECTOR selector_tail`
//! `selector_tail := ID_SELECTOR*`
//!
//! A bare `ID` is a unary (arity-0) selector; one or more `ID_SELECTOR`
//! tokens (each already including its trailing colon, e.g. `plus:`) form a
//! keyword selector whose arity is the count of parts.

use super::super::parser::Parser;
use super::super::syntax_kind::SyntaxKind;

pub(super) fn selector(p: &mut Parser) {
    p.start_node(SyntaxKind::SELECTOR);
    if p.at(SyntaxKind::ID) {
        p.bump();
    } else if p.at(SyntaxKind::ID_SELECTOR) {
        p.bump();
        while p.at(SyntaxKind::ID_SELECTOR) {
            p.bump();
        }
    } else {
        p.error(format!(
            "expected a method selector, found {:?}",
            p.current()
        ));
    }
    p.finish_node();
}
