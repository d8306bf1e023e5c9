//! `expression := expression_base expression_tail`
//! `expression_tail := ID | expression_selector`
//! `expression_selector := (ID_SELECTOR expression_base)*`
//! `expression_base := Integer | String | "nil" | "true" | "false"`
//!                   `| "self" | "super" | CID | block`
//!                   `| "(" expression ")" | ID`
//!
//! The CST records the receiver as whatever single token or sub-node
//! `expression_base` produced, followed by either a bare `ID` token (a
//! unary send) or a run of `(ID_SELECTOR, ARG)` pairs (a keyword send). The
//! AST builder reconstructs the `Send`/bare-base distinction from that flat
//! shape; no separate node is needed to delimit the receiver, since every
//! `expression_base` alternative is already self-delimiting.

use super::super::parser::Parser;
use super::super::syntax_kind::SyntaxKind;
use super::block;

pub(super) fn expression(p: &mut Parser) {
    p.start_node(SyntaxKind::EXPR);
    expression_base(p);
    if p.at(SyntaxKind::ID) {
        p.bump();
    } else {
        while p.at(SyntaxKind::ID_SELECTOR) {
            p.bump();
            p.start_node(SyntaxKind::ARG);
            expression_base(p);
            p.finish_node();
        }
    }
    p.finish_node();
}

fn expression_base(p: &mut Parser) {
    match p.current() {
        Some(
            SyntaxKind::INT_LIT
            | SyntaxKind::STRING_LIT
            | SyntaxKind::NIL_KW
            | SyntaxKind::TRUE_KW
            | SyntaxKind::FALSE_KW
            | SyntaxKind::SELF_KW
            | SyntaxKind::SUPER_KW
            | SyntaxKind::CID
            | SyntaxKind::ID,
        ) => p.bump(),
        Some(SyntaxKind::L_BRACK) => block(p),
        Some(SyntaxKind::L_PAREN) => {
            p.start_node(SyntaxKind::PAREN_EXPR);
            p.bump();
            expression(p);
            p.expect(SyntaxKind::R_PAREN);
            p.finish_node();
        }
        _ => {
            p.error(format!("expected an expression, found {:?}", p.current()));
        }
    }
}
