//! Parameterized exit-code coverage across the closed error taxonomy
//! (spec §7/§8), following this crate's `#[rstest]`/`#[case]` convention for
//! grouping many small inputs under one assertion shape.

use rstest::rstest;

use sol25::ast;
use sol25::parser;
use sol25::semantic;
use sol25::xml_emitter;
use sol25::Sol25Error;

fn run(source: &str) -> Result<String, Sol25Error> {
    let parsed = parser::parse_with_lex_error(source)
        .map_err(|(err, _offset)| Sol25Error::lexical(err.to_string()))?;
    if let Some(first) = parsed.errors.first() {
        return Err(Sol25Error::syntax(first.message.clone()));
    }
    let program = ast::build(&parsed.syntax())?;
    semantic::analyze(&program)?;
    xml_emitter::emit(&program, parsed.description.as_deref())
}

#[rstest]
#[case("class Main : Object { run [ | ] }")]
#[case("class Main : Object { run [ | x := 1 . ] }")]
#[case("class Main : Object { run [ | x := 'hi' . ] }")]
#[case("class A : Object { greet [ | ] } class Main : Object { run [ | x := A new . ] }")]
fn accepts_well_formed_programs(#[case] source: &str) {
    assert!(run(source).is_ok(), "expected {source:?} to analyze cleanly");
}

#[rstest]
#[case("'unterminated", 21)]
#[case("'bad\\qescape'", 21)]
#[case("\"unterminated comment class Main : Object { run [ | ] }", 21)]
fn lexical_failures_exit_21(#[case] source: &str, #[case] code: i32) {
    let err = run(source).expect_err("expected a lexical failure");
    assert_eq!(err.exit_code(), code);
}

#[rstest]
#[case("class Main : Object { run [ | ]")]
#[case("class Main Object { run [ | ] }")]
#[case("class Main : Object { run [ | x := . ] }")]
#[case("class Main:Object{1}")]
fn syntax_failures_exit_22(#[case] source: &str) {
    let err = run(source).expect_err("expected a syntax failure");
    assert_eq!(err.exit_code(), 22);
}

#[rstest]
#[case("class Other : Object { run [ | ] }", "missing Main class")]
#[case("class Main : Object { greet [ | ] }", "Main without run")]
#[case("class Main : Object { run [ :x | ] }", "run with a parameter, arity still wrong")]
fn missing_or_malformed_main_run(#[case] source: &str, #[case] _why: &str) {
    let err = run(source).expect_err("expected a Main/run failure");
    assert!(matches!(err.exit_code(), 31 | 33));
}

#[rstest]
#[case("class Main : Object { run [ | x := z . ] }")]
#[case("class Main : Object { run [ | x := Zorp new . ] }")]
#[case("class Main : Object { run [ | x := True ifTrue: [ | ] . ] }")]
fn undefined_symbol_exits_32(#[case] source: &str) {
    let err = run(source).expect_err("expected an undefined-symbol failure");
    assert_eq!(err.exit_code(), 32);
}

#[rstest]
#[case(
    "class A : Object { foo [ | ] } class B : A { foo [ :x | ] } \
     class Main : Object { run [ | ] }"
)]
#[case("class Main : Object { run [ | x := Integer foo: 1 bar: 2 . ] }")]
#[case(
    "class Main : Object { run [ | x := self greet . ] greet [ :x | ] }"
)]
fn arity_mismatches_exit_33(#[case] source: &str) {
    let err = run(source).expect_err("expected an arity failure");
    assert_eq!(err.exit_code(), 33);
}

#[rstest]
#[case("class Main : Object { run [ | b := [ :x | x := 1 . ] . ] }")]
#[case("class Main : Object { run [ | c := [ :n | n := n plus: 1 . ] . ] }")]
fn variable_collisions_exit_34(#[case] source: &str) {
    let err = run(source).expect_err("expected a variable-collision failure");
    assert_eq!(err.exit_code(), 34);
}

#[rstest]
#[case("class A : Object { } class A : Object { } class Main : Object { run [ | ] }")]
#[case("class Nil : Object { } class Main : Object { run [ | ] }")]
#[case("class Main : Object { run [ | ] run [ | ] }")]
#[case("class A : B { } class B : A { } class Main : Object { run [ | ] }")]
#[case("class Main : Object { run [ | ] greet [ :x :x | ] }")]
fn other_semantic_failures_exit_35(#[case] source: &str) {
    let err = run(source).expect_err("expected an other-semantic failure");
    assert_eq!(err.exit_code(), 35);
}
