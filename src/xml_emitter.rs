//! Canonical XML serialization of an analyzed [`Program`] (§4.5).
//!
//! Built on `quick_xml::Writer::new_with_indent` plus the `BytesStart`/
//! `BytesDecl`/`Event` event API, stripped down to the flat element set
//! SOL25's data model needs — there is no element registry or owner graph to
//! walk here, just one `Program` tree.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesStart, BytesEnd, Event};

use crate::ast::{Assign, Block, ClassDecl, Expr, MethodDecl, Program};
use crate::error::Sol25Error;

/// Serializes `program` to a UTF-8 XML document. `description` is the raw
/// (unescaped) text of the source's first comment, if any, with newlines
/// already collapsed to the literal `&nbsp;` marker by the caller — this
/// function escapes it exactly once before writing the attribute.
pub fn emit(program: &Program, description: Option<&str>) -> Result<String, Sol25Error> {
    let mut buffer = Cursor::new(Vec::new());
    let mut writer = Writer::new_with_indent(&mut buffer, b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| Sol25Error::output_file(format!("failed to write XML declaration: {e}")))?;

    let mut root = BytesStart::new("program");
    root.push_attribute(("language", "SOL25"));
    let normalized_description = description.map(normalize_description);
    if let Some(ref desc) = normalized_description {
        // Pre-escaped, and the `&nbsp;` marker must survive verbatim; pushed
        // as raw bytes so quick-xml does not escape it a second time (same
        // bypass `write_string_literal` uses for String-literal values).
        root.push_attribute((b"description" as &[u8], desc.as_bytes()));
    }

    if program.classes.is_empty() {
        writer
            .write_event(Event::Empty(root))
            .map_err(|e| Sol25Error::output_file(format!("failed to write root element: {e}")))?;
    } else {
        writer
            .write_event(Event::Start(root))
            .map_err(|e| Sol25Error::output_file(format!("failed to write root element: {e}")))?;
        for class in &program.classes {
            write_class(&mut writer, class)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("program")))
            .map_err(|e| Sol25Error::output_file(format!("failed to close root element: {e}")))?;
    }

    let bytes = buffer.into_inner();
    String::from_utf8(bytes)
        .map_err(|e| Sol25Error::internal(format!("emitted XML was not valid UTF-8: {e}")))
}

fn write_class<W: std::io::Write>(
    writer: &mut Writer<W>,
    class: &ClassDecl,
) -> Result<(), Sol25Error> {
    let mut start = BytesStart::new("class");
    start.push_attribute(("name", escape_xml_attr(&class.name).as_ref()));
    start.push_attribute(("parent", escape_xml_attr(&class.parent).as_ref()));

    if class.methods.is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(|e| Sol25Error::output_file(format!("failed to write class element: {e}")))?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| Sol25Error::output_file(format!("failed to write class element: {e}")))?;
    for method in &class.methods {
        write_method(writer, method)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("class")))
        .map_err(|e| Sol25Error::output_file(format!("failed to close class element: {e}")))?;
    Ok(())
}

fn write_method<W: std::io::Write>(
    writer: &mut Writer<W>,
    method: &MethodDecl,
) -> Result<(), Sol25Error> {
    let mut start = BytesStart::new("method");
    start.push_attribute(("selector", escape_xml_attr(&method.selector).as_ref()));
    writer
        .write_event(Event::Start(start))
        .map_err(|e| Sol25Error::output_file(format!("failed to write method element: {e}")))?;
    write_block(writer, &method.body)?;
    writer
        .write_event(Event::End(BytesEnd::new("method")))
        .map_err(|e| Sol25Error::output_file(format!("failed to close method element: {e}")))?;
    Ok(())
}

fn write_block<W: std::io::Write>(
    writer: &mut Writer<W>,
    block: &Block,
) -> Result<(), Sol25Error> {
    let mut start = BytesStart::new("block");
    start.push_attribute(("arity", block.arity().to_string().as_str()));

    if block.parameters.is_empty() && block.statements.is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(|e| Sol25Error::output_file(format!("failed to write block element: {e}")))?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| Sol25Error::output_file(format!("failed to write block element: {e}")))?;

    for (i, param) in block.parameters.iter().enumerate() {
        let mut p = BytesStart::new("parameter");
        p.push_attribute(("order", (i + 1).to_string().as_str()));
        p.push_attribute(("name", escape_xml_attr(param).as_ref()));
        writer
            .write_event(Event::Empty(p))
            .map_err(|e| Sol25Error::output_file(format!("failed to write parameter element: {e}")))?;
    }

    for (i, stmt) in block.statements.iter().enumerate() {
        write_assign(writer, stmt, i + 1)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("block")))
        .map_err(|e| Sol25Error::output_file(format!("failed to close block element: {e}")))?;
    Ok(())
}

fn write_assign<W: std::io::Write>(
    writer: &mut Writer<W>,
    assign: &Assign,
    order: usize,
) -> Result<(), Sol25Error> {
    let mut start = BytesStart::new("assign");
    start.push_attribute(("order", order.to_string().as_str()));
    writer
        .write_event(Event::Start(start))
        .map_err(|e| Sol25Error::output_file(format!("failed to write assign element: {e}")))?;

    let mut var = BytesStart::new("var");
    var.push_attribute(("name", escape_xml_attr(&assign.target).as_ref()));
    writer
        .write_event(Event::Empty(var))
        .map_err(|e| Sol25Error::output_file(format!("failed to write var element: {e}")))?;

    write_expr(writer, &assign.expr)?;

    writer
        .write_event(Event::End(BytesEnd::new("assign")))
        .map_err(|e| Sol25Error::output_file(format!("failed to close assign element: {e}")))?;
    Ok(())
}

fn write_expr<W: std::io::Write>(
    writer: &mut Writer<W>,
    expr: &Expr,
) -> Result<(), Sol25Error> {
    writer
        .write_event(Event::Start(BytesStart::new("expr")))
        .map_err(|e| Sol25Error::output_file(format!("failed to write expr element: {e}")))?;
    write_expr_inner(writer, expr)?;
    writer
        .write_event(Event::End(BytesEnd::new("expr")))
        .map_err(|e| Sol25Error::output_file(format!("failed to close expr element: {e}")))?;
    Ok(())
}

fn write_expr_inner<W: std::io::Write>(
    writer: &mut Writer<W>,
    expr: &Expr,
) -> Result<(), Sol25Error> {
    match expr {
        Expr::IntLiteral(value) => write_literal(writer, "Integer", &value.to_string()),
        Expr::StringLiteral(value) => write_string_literal(writer, value),
        Expr::NilLiteral => write_literal(writer, "Nil", "nil"),
        Expr::TrueLiteral => write_literal(writer, "True", "true"),
        Expr::FalseLiteral => write_literal(writer, "False", "false"),
        Expr::IdentifierRef(name) => {
            if name.chars().next().is_some_and(|c| c.is_uppercase()) {
                write_literal(writer, "class", name)
            } else {
                let mut var = BytesStart::new("var");
                var.push_attribute(("name", escape_xml_attr(name).as_ref()));
                writer
                    .write_event(Event::Empty(var))
                    .map_err(|e| Sol25Error::output_file(format!("failed to write var element: {e}")))
            }
        }
        Expr::BlockLiteral(block) => write_block(writer, block),
        Expr::Send {
            receiver,
            selector,
            args,
        } => write_send(writer, receiver, selector, args),
    }
}

/// Writes a `<literal class=TYPE value=V>` element. `value` is written
/// through [`escape_xml_attr`] unconditionally except when it is already an
/// ASTBuilder-escaped string, which callers route through
/// [`write_string_literal`] instead so it is never escaped twice.
fn write_literal<W: std::io::Write>(
    writer: &mut Writer<W>,
    class: &str,
    value: &str,
) -> Result<(), Sol25Error> {
    let mut elem = BytesStart::new("literal");
    elem.push_attribute(("class", class));
    elem.push_attribute(("value", escape_xml_attr(value).as_ref()));
    writer
        .write_event(Event::Empty(elem))
        .map_err(|e| Sol25Error::output_file(format!("failed to write literal element: {e}")))
}

/// String literals carry a value the ASTBuilder has already XML-escaped
/// (§4.2); it is written through untouched to avoid double-escaping.
fn write_string_literal<W: std::io::Write>(
    writer: &mut Writer<W>,
    already_escaped_value: &str,
) -> Result<(), Sol25Error> {
    let mut elem = BytesStart::new("literal");
    elem.push_attribute(("class", "String"));
    elem.push_attribute((b"value" as &[u8], already_escaped_value.as_bytes()));
    writer
        .write_event(Event::Empty(elem))
        .map_err(|e| Sol25Error::output_file(format!("failed to write literal element: {e}")))
}

fn write_send<W: std::io::Write>(
    writer: &mut Writer<W>,
    receiver: &Expr,
    selector: &str,
    args: &[Expr],
) -> Result<(), Sol25Error> {
    let mut start = BytesStart::new("send");
    start.push_attribute(("selector", escape_xml_attr(selector).as_ref()));
    writer
        .write_event(Event::Start(start))
        .map_err(|e| Sol25Error::output_file(format!("failed to write send element: {e}")))?;

    write_expr(writer, receiver)?;

    for (i, arg) in args.iter().enumerate() {
        let mut arg_start = BytesStart::new("arg");
        arg_start.push_attribute(("order", (i + 1).to_string().as_str()));
        writer
            .write_event(Event::Start(arg_start))
            .map_err(|e| Sol25Error::output_file(format!("failed to write arg element: {e}")))?;
        write_expr(writer, arg)?;
        writer
            .write_event(Event::End(BytesEnd::new("arg")))
            .map_err(|e| Sol25Error::output_file(format!("failed to close arg element: {e}")))?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("send")))
        .map_err(|e| Sol25Error::output_file(format!("failed to close send element: {e}")))?;
    Ok(())
}

/// Escapes `description`'s content, then replaces every newline with the
/// literal seven-character sequence `&nbsp;` (§4.5) — done in that order so
/// the ampersand it introduces is never itself escaped.
fn normalize_description(raw: &str) -> String {
    escape_xml_attr(raw).replace('\n', "&nbsp;")
}

/// Escapes `&`, `<`, `>`, `'`, `"` for use as an XML attribute value. The one
/// helper every attribute is written through, except the `value` attribute
/// of a `String`-class literal (already escaped by the ASTBuilder) and the
/// root element's `description` attribute (already escaped by
/// [`normalize_description`]) — both of those are pushed as raw bytes so
/// quick-xml's automatic escaping of `(&str, &str)`-tuple attributes does
/// not run a second time over already-final text.
fn escape_xml_attr(s: &str) -> std::borrow::Cow<'_, str> {
    if !s.contains(['&', '<', '>', '\'', '"']) {
        return std::borrow::Cow::Borrowed(s);
    }
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
    std::borrow::Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::build;
    use crate::parser::parse;

    fn emit_source(src: &str) -> String {
        let parsed = parse(src);
        assert!(parsed.ok(), "unexpected parse errors: {:?}", parsed.errors);
        let program = build(&parsed.syntax()).expect("AST build should succeed");
        emit(&program, parsed.description.as_deref()).expect("emission should succeed")
    }

    #[test]
    fn emits_a_minimal_program() {
        let xml = emit_source("class Main : Object { run [ | ] }");
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains(r#"<program language="SOL25">"#));
        assert!(xml.contains(r#"<class name="Main" parent="Object">"#));
        assert!(xml.contains(r#"<method selector="run">"#));
        assert!(xml.contains(r#"<block arity="0"/>"#));
    }

    #[test]
    fn emits_the_description_attribute() {
        let xml = emit_source("\"hello\" class Main : Object { run [ | ] }");
        assert!(xml.contains(r#"description="hello""#));
    }

    #[test]
    fn description_newlines_become_the_literal_nbsp_marker() {
        let xml = emit_source("\"hello\nworld\" class Main : Object { run [ | ] }");
        assert!(xml.contains(r#"description="hello&nbsp;world""#));
        assert!(!xml.contains("&amp;nbsp;"));
    }

    #[test]
    fn emits_an_integer_literal_assignment() {
        let xml = emit_source("class Main : Object { run [ | x := 10 . ] }");
        assert!(xml.contains(r#"<var name="x"/>"#));
        assert!(xml.contains(r#"<literal class="Integer" value="10"/>"#));
    }

    #[test]
    fn emits_a_class_method_send() {
        let xml = emit_source("class Main : Object { run [ | x := Integer from: 2 . ] }");
        assert!(xml.contains(r#"<send selector="from:">"#));
        assert!(xml.contains(r#"<literal class="class" value="Integer"/>"#));
        assert!(xml.contains(r#"<arg order="1">"#));
    }

    #[test]
    fn does_not_double_escape_a_string_literal() {
        let xml = emit_source("class Main : Object { run [ | x := 'a & b' . ] }");
        assert!(xml.contains(r#"<literal class="String" value="a &amp; b"/>"#));
        assert!(!xml.contains("&amp;amp;"));
    }

    #[test]
    fn emits_block_parameters_in_order() {
        let xml = emit_source(
            "class Main : Object { run [ | b := [ :x :y | z := x . ] . ] }",
        );
        assert!(xml.contains(r#"<parameter order="1" name="x"/>"#));
        assert!(xml.contains(r#"<parameter order="2" name="y"/>"#));
    }
}
