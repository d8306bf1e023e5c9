//! `block := "[" block_param "|" block_stat "]"`
//! `block_param := SELECTOR_ID*`
//! `block_stat := (ID ":=" expression ".")*`

use super::super::parser::Parser;
use super::super::syntax_kind::SyntaxKind;
use super::expression;

pub(super) fn block(p: &mut Parser) {
    p.start_node(SyntaxKind::BLOCK);
    p.expect(SyntaxKind::L_BRACK);

    p.start_node(SyntaxKind::BLOCK_PARAM_LIST);
    while p.at(SyntaxKind::SELECTOR_ID) {
        p.bump();
    }
    p.finish_node();

    p.expect(SyntaxKind::PIPE);

    p.start_node(SyntaxKind::BLOCK_STAT_LIST);
    while p.at(SyntaxKind::ID) {
        assign_stat(p);
    }
    p.finish_node();

    p.expect(SyntaxKind::R_BRACK);
    p.finish_node();
}

fn assign_stat(p: &mut Parser) {
    p.start_node(SyntaxKind::ASSIGN_STAT);
    p.expect(SyntaxKind::ID);
    p.expect(SyntaxKind::ASSIGN_OP);
    expression(p);
    p.expect(SyntaxKind::DOT);
    p.finish_node();
}
