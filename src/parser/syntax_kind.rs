//! The `SyntaxKind` enumeration and the [`rowan::Language`] glue that lets
//! `rowan` build a concrete syntax tree out of it.

use rowan::Language;

/// Every terminal and non-terminal that can appear in a SOL25 concrete
/// syntax tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // Trivia
    WHITESPACE,
    COMMENT,
    ERROR,

    // Punctuation
    L_BRACE,   // {
    R_BRACE,   // }
    L_BRACK,   // [
    R_BRACK,   // ]
    L_PAREN,   // (
    R_PAREN,   // )
    PIPE,      // |
    DOT,       // .
    COLON,     // :
    ASSIGN_OP, // :=

    // Keywords
    CLASS_KW,
    SELF_KW,
    SUPER_KW,
    NIL_KW,
    TRUE_KW,
    FALSE_KW,

    // Literals and identifiers
    INT_LIT,
    STRING_LIT,
    ID,
    ID_SELECTOR, // keyword-selector part, e.g. `plus:`
    SELECTOR_ID, // block formal parameter marker, e.g. `:x`
    CID,         // class identifier, e.g. `Integer`

    EOF,

    // Non-terminals
    PROGRAM,
    CLASS_DEF,
    METHOD_DEF,
    SELECTOR,
    BLOCK,
    BLOCK_PARAM_LIST,
    BLOCK_STAT_LIST,
    ASSIGN_STAT,
    EXPR,
    SEND_EXPR,
    PAREN_EXPR,
    ARG,

    #[doc(hidden)]
    __LAST,
}

impl SyntaxKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, SyntaxKind::WHITESPACE | SyntaxKind::COMMENT)
    }

    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            SyntaxKind::CLASS_KW
                | SyntaxKind::SELF_KW
                | SyntaxKind::SUPER_KW
                | SyntaxKind::NIL_KW
                | SyntaxKind::TRUE_KW
                | SyntaxKind::FALSE_KW
        )
    }

    pub fn is_punct(self) -> bool {
        matches!(
            self,
            SyntaxKind::L_BRACE
                | SyntaxKind::R_BRACE
                | SyntaxKind::L_BRACK
                | SyntaxKind::R_BRACK
                | SyntaxKind::L_PAREN
                | SyntaxKind::R_PAREN
                | SyntaxKind::PIPE
                | SyntaxKind::DOT
                | SyntaxKind::COLON
                | SyntaxKind::ASSIGN_OP
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            SyntaxKind::INT_LIT
                | SyntaxKind::STRING_LIT
                | SyntaxKind::NIL_KW
                | SyntaxKind::TRUE_KW
                | SyntaxKind::FALSE_KW
        )
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        rowan::SyntaxKind(kind as u16)
    }
}

impl From<rowan::SyntaxKind> for SyntaxKind {
    fn from(kind: rowan::SyntaxKind) -> Self {
        assert!(kind.0 < SyntaxKind::__LAST as u16);
        unsafe { std::mem::transmute::<u16, SyntaxKind>(kind.0) }
    }
}

/// Marker type tying [`SyntaxKind`] to `rowan`'s generic tree types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sol25Language {}

impl Language for Sol25Language {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        raw.into()
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type SyntaxNode = rowan::SyntaxNode<Sol25Language>;
pub type SyntaxToken = rowan::SyntaxToken<Sol25Language>;
pub type SyntaxElement = rowan::NodeOrToken<SyntaxNode, SyntaxToken>;
pub type SyntaxNodeChildren = rowan::SyntaxNodeChildren<Sol25Language>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_rowan_kind() {
        for kind in [
            SyntaxKind::PROGRAM,
            SyntaxKind::CLASS_DEF,
            SyntaxKind::STRING_LIT,
            SyntaxKind::ID_SELECTOR,
        ] {
            let raw: rowan::SyntaxKind = kind.into();
            assert_eq!(SyntaxKind::from(raw), kind);
        }
    }

    #[test]
    fn trivia_and_punct_classifications() {
        assert!(SyntaxKind::WHITESPACE.is_trivia());
        assert!(!SyntaxKind::ID.is_trivia());
        assert!(SyntaxKind::ASSIGN_OP.is_punct());
        assert!(SyntaxKind::SELF_KW.is_keyword());
    }
}
