//! Owned abstract syntax tree for SOL25, materialized from the `rowan`
//! concrete syntax tree built by [`crate::parser`].
//!
//! These types are plain owned structs and enums rather than wrappers
//! borrowing from a shared `SyntaxNode`: a `Program` must exclusively own
//! everything beneath it and release the whole tree once the XML emitter is
//! done with it, so [`build`] walks the CST exactly once and drops the
//! `GreenNode` when it returns.

use crate::error::Sol25Error;
use crate::parser::{SyntaxKind, SyntaxNode, SyntaxToken};

/// A name that is lowercase-leading: a variable, block parameter, or
/// pseudo-variable (`self`/`super`).
pub type VarId = String;

/// A name that is uppercase-leading: a class.
pub type ClassId = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub classes: Vec<ClassDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    pub name: ClassId,
    pub parent: ClassId,
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub selector: String,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub parameters: Vec<VarId>,
    pub statements: Vec<Assign>,
}

impl Block {
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assign {
    pub target: VarId,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    IntLiteral(i64),
    /// Already escaped for XML output (`&amp;`, `&lt;`, `&gt;`, `&apos;`,
    /// `&quot;`); supported source escapes (`\n`, `\'`, `\\`) are preserved
    /// verbatim.
    StringLiteral(String),
    NilLiteral,
    TrueLiteral,
    FalseLiteral,
    IdentifierRef(VarId),
    BlockLiteral(Block),
    Send {
        receiver: Box<Expr>,
        selector: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Number of colons in a selector, i.e. the arity of the `Send` it came
    /// from — used only for internal consistency checks, real arity
    /// bookkeeping happens against `args.len()`.
    pub fn selector_arity(selector: &str) -> usize {
        selector.matches(':').count()
    }
}

/// Names the ASTBuilder rejects outright: reserved keywords can never be
/// used as an `ID`/`CID`, regardless of position.
fn is_keyword(text: &str) -> bool {
    matches!(
        text,
        "class" | "self" | "super" | "nil" | "true" | "false"
    )
}

/// `Main` and `run` are reserved only as an assignment target or a
/// block-parameter name. They remain valid class and method-selector names
/// elsewhere.
fn is_reserved_binding_name(text: &str) -> bool {
    text == "Main" || text == "run"
}

/// Consumes a `rowan::GreenNode` CST produced by [`crate::parser::parse`]
/// and materializes the owned AST described in §3, applying the
/// normalizations and identifier checks of §4.2. The tree passed in is not
/// retained by the result.
pub fn build(root: &SyntaxNode) -> Result<Program, Sol25Error> {
    debug_assert_eq!(root.kind(), SyntaxKind::PROGRAM);
    let mut classes = Vec::new();
    for child in root.children() {
        if child.kind() == SyntaxKind::CLASS_DEF {
            classes.push(build_class(&child)?);
        }
    }
    Ok(Program { classes })
}

fn build_class(node: &SyntaxNode) -> Result<ClassDecl, Sol25Error> {
    let mut cids = node
        .children_with_tokens()
        .filter_map(|e| e.into_token())
        .filter(|t| t.kind() == SyntaxKind::CID);
    let name_tok = cids.next().ok_or_else(|| {
        Sol25Error::internal("class_def missing its own class name token")
    })?;
    let parent_tok = cids.next().ok_or_else(|| {
        Sol25Error::internal("class_def missing its parent class name token")
    })?;
    check_cid(&name_tok)?;
    check_cid(&parent_tok)?;

    let mut methods = Vec::new();
    for child in node.children() {
        if child.kind() == SyntaxKind::METHOD_DEF {
            methods.push(build_method(&child)?);
        }
    }
    Ok(ClassDecl {
        name: name_tok.text().to_string(),
        parent: parent_tok.text().to_string(),
        methods,
    })
}

fn build_method(node: &SyntaxNode) -> Result<MethodDecl, Sol25Error> {
    let selector_node = node
        .children()
        .find(|c| c.kind() == SyntaxKind::SELECTOR)
        .ok_or_else(|| Sol25Error::internal("method_def missing its selector node"))?;
    let selector = build_selector(&selector_node)?;

    let block_node = node
        .children()
        .find(|c| c.kind() == SyntaxKind::BLOCK)
        .ok_or_else(|| Sol25Error::internal("method_def missing its block node"))?;
    let body = build_block(&block_node)?;
    Ok(MethodDecl { selector, body })
}

fn build_selector(node: &SyntaxNode) -> Result<String, Sol25Error> {
    let mut selector = String::new();
    for tok in node
        .children_with_tokens()
        .filter_map(|e| e.into_token())
    {
        match tok.kind() {
            SyntaxKind::ID => {
                check_id(&tok)?;
                selector.push_str(tok.text());
            }
            SyntaxKind::ID_SELECTOR => {
                check_id_selector(&tok)?;
                selector.push_str(tok.text());
            }
            _ => {}
        }
    }
    Ok(selector)
}

fn build_block(node: &SyntaxNode) -> Result<Block, Sol25Error> {
    let mut parameters = Vec::new();
    if let Some(param_list) = node
        .children()
        .find(|c| c.kind() == SyntaxKind::BLOCK_PARAM_LIST)
    {
        for tok in param_list
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == SyntaxKind::SELECTOR_ID)
        {
            check_selector_id(&tok)?;
            // `:x` -> `x`
            let name = tok.text().trim_start_matches(':').to_string();
            if is_reserved_binding_name(&name) {
                return Err(Sol25Error::syntax(format!(
                    "'{name}' may not be used as a block parameter name"
                )));
            }
            parameters.push(name);
        }
    }

    let mut statements = Vec::new();
    if let Some(stat_list) = node
        .children()
        .find(|c| c.kind() == SyntaxKind::BLOCK_STAT_LIST)
    {
        for assign_node in stat_list
            .children()
            .filter(|c| c.kind() == SyntaxKind::ASSIGN_STAT)
        {
            statements.push(build_assign(&assign_node)?);
        }
    }

    Ok(Block {
        parameters,
        statements,
    })
}

fn build_assign(node: &SyntaxNode) -> Result<Assign, Sol25Error> {
    let target_tok = node
        .children_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| t.kind() == SyntaxKind::ID)
        .ok_or_else(|| Sol25Error::internal("assign_stat missing its target token"))?;
    check_id(&target_tok)?;
    let target = target_tok.text().to_string();
    if is_reserved_binding_name(&target) {
        return Err(Sol25Error::syntax(format!(
            "'{target}' may not be used as an assignment target"
        )));
    }

    let expr_node = node
        .children()
        .find(|c| c.kind() == SyntaxKind::EXPR)
        .ok_or_else(|| Sol25Error::internal("assign_stat missing its expression node"))?;
    let expr = build_expr(&expr_node)?;
    Ok(Assign { target, expr })
}

/// `expression := expression_base expression_tail`. The CST leaves the
/// receiver as a flat run of children under `EXPR`: first whatever
/// `expression_base` produced (a token or a `BLOCK`/`PAREN_EXPR` node), then
/// either a bare `ID` token (unary send) or a run of `(ID_SELECTOR, ARG)`
/// pairs (keyword send, collapsed into one composite selector per §4.2).
fn build_expr(node: &SyntaxNode) -> Result<Expr, Sol25Error> {
    let mut children = node.children_with_tokens();
    let first = children
        .next()
        .ok_or_else(|| Sol25Error::internal("expr node has no children"))?;
    let receiver = build_expr_base_element(&first)?;

    let rest: Vec<_> = children.collect();
    if rest.is_empty() {
        return Ok(receiver);
    }

    // Unary send: a single bare `ID` token tail.
    if rest.len() == 1 {
        if let Some(tok) = rest[0].as_token() {
            if tok.kind() == SyntaxKind::ID {
                check_id(tok)?;
                return Ok(Expr::Send {
                    receiver: Box::new(receiver),
                    selector: tok.text().to_string(),
                    args: Vec::new(),
                });
            }
        }
    }

    // Keyword send: zero or more `(ID_SELECTOR, ARG)` pairs forming one
    // composite selector.
    let mut selector = String::new();
    let mut args = Vec::new();
    let mut iter = rest.into_iter();
    while let Some(elem) = iter.next() {
        let selector_tok = elem
            .into_token()
            .filter(|t| t.kind() == SyntaxKind::ID_SELECTOR)
            .ok_or_else(|| Sol25Error::internal("expected a keyword-selector token in expr tail"))?;
        check_id_selector(&selector_tok)?;
        selector.push_str(selector_tok.text());

        let arg_elem = iter
            .next()
            .ok_or_else(|| Sol25Error::internal("keyword selector missing its argument"))?;
        let arg_node = arg_elem
            .into_node()
            .filter(|n| n.kind() == SyntaxKind::ARG)
            .ok_or_else(|| Sol25Error::internal("expected an ARG node after a keyword selector"))?;
        let inner = arg_node
            .children_with_tokens()
            .next()
            .ok_or_else(|| Sol25Error::internal("ARG node has no child"))?;
        args.push(build_expr_base_element(&inner)?);
    }

    Ok(Expr::Send {
        receiver: Box::new(receiver),
        selector,
        args,
    })
}

/// Builds the `Expr` for a single `expression_base` alternative, which the
/// CST represents as either a bare token (literal/identifier/pseudo-var) or
/// a `BLOCK`/`PAREN_EXPR` sub-node.
fn build_expr_base_element(
    elem: &rowan::NodeOrToken<SyntaxNode, SyntaxToken>,
) -> Result<Expr, Sol25Error> {
    match elem {
        rowan::NodeOrToken::Token(tok) => build_expr_base_token(tok),
        rowan::NodeOrToken::Node(node) => match node.kind() {
            SyntaxKind::BLOCK => Ok(Expr::BlockLiteral(build_block(node)?)),
            SyntaxKind::PAREN_EXPR => {
                let inner = node
                    .children()
                    .find(|c| c.kind() == SyntaxKind::EXPR)
                    .ok_or_else(|| Sol25Error::internal("paren_expr missing its inner expr"))?;
                build_expr(&inner)
            }
            other => Err(Sol25Error::internal(format!(
                "unexpected expression_base node: {other:?}"
            ))),
        },
    }
}

fn build_expr_base_token(tok: &SyntaxToken) -> Result<Expr, Sol25Error> {
    match tok.kind() {
        SyntaxKind::INT_LIT => {
            let value: i64 = tok.text().parse().map_err(|_| {
                Sol25Error::internal(format!("integer literal out of range: {}", tok.text()))
            })?;
            Ok(Expr::IntLiteral(value))
        }
        SyntaxKind::STRING_LIT => Ok(Expr::StringLiteral(decode_string_literal(tok.text()))),
        SyntaxKind::NIL_KW => Ok(Expr::NilLiteral),
        SyntaxKind::TRUE_KW => Ok(Expr::TrueLiteral),
        SyntaxKind::FALSE_KW => Ok(Expr::FalseLiteral),
        SyntaxKind::SELF_KW => Ok(Expr::IdentifierRef("self".to_string())),
        SyntaxKind::SUPER_KW => Ok(Expr::IdentifierRef("super".to_string())),
        SyntaxKind::CID => {
            check_cid(tok)?;
            Ok(Expr::IdentifierRef(tok.text().to_string()))
        }
        SyntaxKind::ID => {
            check_id(tok)?;
            Ok(Expr::IdentifierRef(tok.text().to_string()))
        }
        other => Err(Sol25Error::internal(format!(
            "unexpected expression_base token: {other:?}"
        ))),
    }
}

/// Strips the outer `'...'` delimiters, resolves the three supported
/// escapes (`\n`, `\'`, `\\`) to their literal characters, and escapes
/// XML-hostile characters for the value this string will eventually be
/// written out as (§4.2). The lexer has already rejected any other escape
/// or an unterminated literal, so this never needs to fail.
fn decode_string_literal(raw: &str) -> String {
    let inner = &raw[1..raw.len() - 1];
    let mut decoded = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => decoded.push('\n'),
                Some('\'') => decoded.push('\''),
                Some('\\') => decoded.push('\\'),
                Some(other) => decoded.push(other),
                None => {}
            }
        } else {
            decoded.push(c);
        }
    }
    escape_xml_text(&decoded)
}

fn escape_xml_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

fn check_id(tok: &SyntaxToken) -> Result<(), Sol25Error> {
    if is_keyword(tok.text()) {
        Err(Sol25Error::syntax(format!(
            "'{}' is a reserved keyword and cannot be used as an identifier",
            tok.text()
        )))
    } else {
        Ok(())
    }
}

fn check_cid(tok: &SyntaxToken) -> Result<(), Sol25Error> {
    if is_keyword(tok.text()) {
        Err(Sol25Error::syntax(format!(
            "'{}' is a reserved keyword and cannot be used as a class name",
            tok.text()
        )))
    } else {
        Ok(())
    }
}

fn check_id_selector(tok: &SyntaxToken) -> Result<(), Sol25Error> {
    let head = tok.text().trim_end_matches(':');
    if is_keyword(head) {
        Err(Sol25Error::syntax(format!(
            "'{head}' is a reserved keyword and cannot be used as a selector keyword"
        )))
    } else {
        Ok(())
    }
}

fn check_selector_id(tok: &SyntaxToken) -> Result<(), Sol25Error> {
    let name = tok.text().trim_start_matches(':');
    if is_keyword(name) {
        Err(Sol25Error::syntax(format!(
            "'{name}' is a reserved keyword and cannot be used as a block parameter"
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn build_source(src: &str) -> Program {
        let parsed = parse(src);
        assert!(parsed.ok(), "unexpected parse errors: {:?}", parsed.errors);
        build(&parsed.syntax()).expect("AST build should succeed")
    }

    #[test]
    fn builds_a_minimal_class() {
        let program = build_source("class Main : Object { run [ | ] }");
        assert_eq!(program.classes.len(), 1);
        let class = &program.classes[0];
        assert_eq!(class.name, "Main");
        assert_eq!(class.parent, "Object");
        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.methods[0].selector, "run");
        assert_eq!(class.methods[0].body.arity(), 0);
    }

    #[test]
    fn builds_an_integer_assignment() {
        let program = build_source("class Main : Object { run [ | x := 10 . ] }");
        let stmt = &program.classes[0].methods[0].body.statements[0];
        assert_eq!(stmt.target, "x");
        assert_eq!(stmt.expr, Expr::IntLiteral(10));
    }

    #[test]
    fn collapses_a_composite_keyword_send() {
        let program = build_source(
            "class Main : Object { run [ | x := Integer from: 2 . ] }",
        );
        let stmt = &program.classes[0].methods[0].body.statements[0];
        match &stmt.expr {
            Expr::Send {
                receiver,
                selector,
                args,
            } => {
                assert_eq!(selector, "from:");
                assert_eq!(**receiver, Expr::IdentifierRef("Integer".to_string()));
                assert_eq!(args.len(), 1);
                assert_eq!(args[0], Expr::IntLiteral(2));
            }
            other => panic!("expected a Send, got {other:?}"),
        }
    }

    #[test]
    fn builds_a_unary_send() {
        let program = build_source("class Main : Object { run [ | x := 1 asString . ] }");
        let stmt = &program.classes[0].methods[0].body.statements[0];
        match &stmt.expr {
            Expr::Send {
                selector, args, ..
            } => {
                assert_eq!(selector, "asString");
                assert!(args.is_empty());
            }
            other => panic!("expected a Send, got {other:?}"),
        }
    }

    #[test]
    fn string_literal_is_decoded_and_xml_escaped() {
        let program = build_source("class Main : Object { run [ | x := 'a & b' . ] }");
        let stmt = &program.classes[0].methods[0].body.statements[0];
        assert_eq!(stmt.expr, Expr::StringLiteral("a &amp; b".to_string()));
    }

    #[test]
    fn rejects_main_as_an_assignment_target() {
        let err = build(&parse("class Main : Object { run [ | Main := 1 . ] }").syntax())
            .expect_err("Main must be rejected as an assignment target");
        assert_eq!(err.exit_code(), 22);
    }

    #[test]
    fn rejects_run_as_a_block_parameter() {
        let err = build(&parse("class Main : Object { run [ :run | ] }").syntax())
            .expect_err("run must be rejected as a block parameter name");
        assert_eq!(err.exit_code(), 22);
    }

    #[test]
    fn allows_main_and_run_as_class_and_method_names() {
        // Not reserved lexically, only in binding position (§9 open question #1).
        let program = build_source("class Main : Object { run [ | ] }");
        assert_eq!(program.classes[0].name, "Main");
        assert_eq!(program.classes[0].methods[0].selector, "run");
    }

    #[test]
    fn self_and_super_become_identifier_refs() {
        let program = build_source(
            "class Main : Object { run [ | x := self . y := super . ] }",
        );
        let stmts = &program.classes[0].methods[0].body.statements;
        assert_eq!(stmts[0].expr, Expr::IdentifierRef("self".to_string()));
        assert_eq!(stmts[1].expr, Expr::IdentifierRef("super".to_string()));
    }

    #[test]
    fn block_literal_with_parameters() {
        let program = build_source(
            "class Main : Object { run [ | b := [ :x :y | z := x . ] . ] }",
        );
        let stmt = &program.classes[0].methods[0].body.statements[0];
        match &stmt.expr {
            Expr::BlockLiteral(block) => {
                assert_eq!(block.parameters, vec!["x".to_string(), "y".to_string()]);
                assert_eq!(block.statements.len(), 1);
            }
            other => panic!("expected a BlockLiteral, got {other:?}"),
        }
    }
}
