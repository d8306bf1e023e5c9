//! `class_def := "class" CID ":" CID "{" method_def* "}"`
//! `method_def := selector block`

use super::super::parser::Parser;
use super::super::syntax_kind::SyntaxKind;
use super::{block, selector};

pub(super) fn class_def(p: &mut Parser) {
    p.start_node(SyntaxKind::CLASS_DEF);
    p.expect(SyntaxKind::CLASS_KW);
    p.expect(SyntaxKind::CID);
    p.expect(SyntaxKind::COLON);
    p.expect(SyntaxKind::CID);
    p.expect(SyntaxKind::L_BRACE);
    while !p.at(SyntaxKind::R_BRACE) && !p.at_eof() {
        let before = p.pos();
        method_def(p);
        // A selector/block mismatch records an error without consuming a
        // token; without this, a stray token here (e.g. an `INT_LIT` where
        // a selector was expected) would spin forever. Force progress.
        if p.pos() == before {
            p.bump();
        }
    }
    p.expect(SyntaxKind::R_BRACE);
    p.finish_node();
}

fn method_def(p: &mut Parser) {
    p.start_node(SyntaxKind::METHOD_DEF);
    selector(p);
    block(p);
    p.finish_node();
}
