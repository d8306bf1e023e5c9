//! Process-level orchestration: argv handling, stdin/stdout, and the
//! phase pipeline (parse → build AST → analyze → emit).
//!
//! Argument handling is a hand-rolled `std::env::args()` scan rather than
//! `clap` — the entire surface is one optional `-h`/`--help` flag.

use std::io::{Read, Write};

use crate::ast;
use crate::error::Sol25Error;
use crate::parser;
use crate::semantic;
use crate::xml_emitter;

const USAGE: &str = "usage: sol25-parse [-h | --help]";

const HELP: &str = "\
usage: sol25-parse [-h | --help]

This filter-type script reads SOL25 source code from standard input,
checks its lexical, syntactic, and static semantic correctness, and
prints the XML representation of the program's abstract syntax tree
to standard output.

options:
  -h, --help    print this help text and exit 0
                (cannot be combined with any other argument)

exit codes:
  0   success
  10  missing script parameter or forbidden parameter combination
  11  error reading standard input (non-UTF-8 or empty)
  12  error writing standard output
  21  lexical error in SOL25 source code
  22  syntactic error in SOL25 source code
  31  missing class Main or its instance method run
  32  use of an undefined variable, parameter, class, or selector
  33  incorrect arity
  34  variable collision with a formal parameter
  35  other semantic error (duplicate class, cyclic inheritance, \
built-in redefinition)
  99  internal error
";

/// Runs the full analyzer over `std::env::args()`/stdin/stdout, returning
/// the process exit code. Never panics on a malformed program: every
/// failure path is a [`Sol25Error`] reported on stderr per §6.
pub fn run() -> i32 {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match parse_args(&args) {
        ArgAction::Help => {
            print!("{HELP}");
            0
        }
        ArgAction::Analyze => match analyze_stdin() {
            Ok(()) => 0,
            Err(err) => {
                report(&err);
                err.exit_code()
            }
        },
        ArgAction::Error(err) => {
            report(&err);
            err.exit_code()
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

enum ArgAction {
    Analyze,
    Help,
    Error(Sol25Error),
}

/// Zero arguments is the normal analysis path; exactly one argument equal
/// to `-h`/`--help` prints help; anything else is `ArgumentError` (§6).
fn parse_args(args: &[String]) -> ArgAction {
    match args {
        [] => ArgAction::Analyze,
        [single] if single == "-h" || single == "--help" => ArgAction::Help,
        [single] => ArgAction::Error(Sol25Error::argument(format!(
            "unrecognized argument '{single}'\n{USAGE}"
        ))),
        _ => ArgAction::Error(Sol25Error::argument(format!(
            "too many arguments\n{USAGE}"
        ))),
    }
}

fn analyze_stdin() -> Result<(), Sol25Error> {
    let source = read_source()?;

    tracing::debug!("parsing {} bytes of source", source.len());
    let parsed = parser::parse_with_lex_error(&source).map_err(|(err, _offset)| {
        tracing::debug!("lexical phase failed: {err}");
        Sol25Error::lexical(err.to_string())
    })?;
    if let Some(first) = parsed.errors.first() {
        tracing::debug!("syntax phase failed: {}", first.message);
        return Err(Sol25Error::syntax(first.message.clone()));
    }

    tracing::debug!("building AST");
    let program = ast::build(&parsed.syntax()).inspect_err(|err| {
        tracing::debug!("AST construction failed: {err}");
    })?;

    tracing::debug!("running semantic analysis");
    semantic::analyze(&program).inspect_err(|err| {
        tracing::debug!("semantic analysis failed: {err}");
    })?;

    tracing::debug!("emitting XML");
    let xml = xml_emitter::emit(&program, parsed.description.as_deref()).inspect_err(|err| {
        tracing::debug!("XML emission failed: {err}");
    })?;

    write_stdout(&xml)
}

fn read_source() -> Result<String, Sol25Error> {
    tracing::debug!("reading standard input");
    let stdin = std::io::stdin();
    let mut handle = stdin.lock();
    let mut source = String::new();
    handle.read_to_string(&mut source).map_err(|e| {
        tracing::debug!("failed to read standard input: {e}");
        Sol25Error::input_file(format!("cannot read standard input: {e}"))
    })?;
    if source.is_empty() {
        tracing::debug!("standard input was empty");
        return Err(Sol25Error::input_file("standard input is empty"));
    }
    Ok(source)
}

fn write_stdout(xml: &str) -> Result<(), Sol25Error> {
    tracing::debug!("writing standard output");
    let stdout = std::io::stdout();
    let mut handle = std::io::BufWriter::new(stdout.lock());
    write_output(&mut handle, xml).inspect_err(|err| {
        tracing::debug!("failed to write standard output: {err}");
    })
}

/// The write half of [`write_stdout`], taking any [`Write`] so a test can
/// substitute a sink that reliably fails (e.g. a read-only file) without
/// touching the real standard output.
fn write_output<W: Write>(writer: &mut W, xml: &str) -> Result<(), Sol25Error> {
    writer
        .write_all(xml.as_bytes())
        .map_err(|e| Sol25Error::output_file(format!("cannot write standard output: {e}")))?;
    writer
        .write_all(b"\n")
        .map_err(|e| Sol25Error::output_file(format!("cannot write standard output: {e}")))?;
    writer
        .flush()
        .map_err(|e| Sol25Error::output_file(format!("cannot write standard output: {e}")))
}

fn report(err: &Sol25Error) {
    eprintln!("Error {}: {err}", err.exit_code());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_means_analyze() {
        assert!(matches!(parse_args(&[]), ArgAction::Analyze));
    }

    #[test]
    fn help_flag_is_recognized() {
        assert!(matches!(parse_args(&["-h".to_string()]), ArgAction::Help));
        assert!(matches!(
            parse_args(&["--help".to_string()]),
            ArgAction::Help
        ));
    }

    #[test]
    fn unknown_single_argument_is_an_argument_error() {
        let result = parse_args(&["--bogus".to_string()]);
        assert!(matches!(result, ArgAction::Error(_)));
    }

    #[test]
    fn two_arguments_is_an_argument_error() {
        let result = parse_args(&["-h".to_string(), "extra".to_string()]);
        match result {
            ArgAction::Error(err) => assert_eq!(err.exit_code(), 10),
            _ => panic!("expected an ArgumentError"),
        }
    }

    #[test]
    fn analyzes_a_minimal_program_end_to_end() {
        let source = "class Main : Object { run [ | ] }";
        let parsed = parser::parse(source);
        assert!(parsed.ok());
        let program = ast::build(&parsed.syntax()).unwrap();
        assert!(semantic::analyze(&program).is_ok());
        let xml = xml_emitter::emit(&program, None).unwrap();
        assert!(xml.contains("Main"));
    }

    /// A write failure on the output side must surface as `OutputFile`
    /// (exit 12), not bubble up as a panic or a different error kind.
    /// `tempfile` gives us a real file we can reopen read-only so the
    /// write genuinely fails at the OS level rather than being faked.
    #[test]
    fn write_failure_is_reported_as_exit_code_12() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("readonly-output.xml");
        std::fs::File::create(&path).expect("failed to create temp file");

        let mut readonly_file =
            std::fs::File::open(&path).expect("failed to reopen temp file read-only");

        let err = write_output(&mut readonly_file, "<program/>")
            .expect_err("writing to a file opened read-only must fail");
        assert_eq!(err.exit_code(), 12);
    }
}
