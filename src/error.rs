//! Closed error taxonomy for the SOL25 analysis pipeline.
//!
//! Every phase (lexer, parser, AST builder, semantic analyzer, XML emitter,
//! driver) signals failure through exactly one [`Sol25Error`] variant. There
//! is no recovery: the first error produced aborts the run, and
//! [`Sol25Error::exit_code`] is the single source of truth for the process
//! exit status.

use thiserror::Error;

/// The categorized failures this analyzer can report, one variant per exit
/// code in the closed set `{10,11,12,21,22,31,32,33,34,35,99}`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Sol25Error {
    /// Unrecognized or malformed command-line arguments.
    #[error("invalid arguments: {0}")]
    Argument(String),

    /// Standard input could not be read as UTF-8, or was empty.
    #[error("cannot read input: {0}")]
    InputFile(String),

    /// Standard output could not be written to.
    #[error("cannot write output: {0}")]
    OutputFile(String),

    /// A token could not be formed from the source text.
    #[error("lexical error: {0}")]
    Lexical(String),

    /// The token stream does not match the grammar.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// No `Main` class with a zero-arity `run` method was found.
    #[error("missing Main.run: {0}")]
    MainRun(String),

    /// A name was used without a corresponding declaration in scope.
    #[error("undefined symbol: {0}")]
    UndefinedSymbol(String),

    /// A method was invoked, overridden, or composed with the wrong arity.
    #[error("arity error: {0}")]
    Arity(String),

    /// A name collided with an existing binding it may not shadow.
    #[error("variable collision: {0}")]
    VariableCollision(String),

    /// Any other static-semantic violation: duplicate class, cyclic
    /// inheritance, redefinition of a built-in, etc.
    #[error("semantic error: {0}")]
    OtherSemantic(String),

    /// An invariant the analyzer itself is supposed to maintain was broken.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Sol25Error {
    /// The exit code this crate's CLI reports for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Sol25Error::Argument(_) => 10,
            Sol25Error::InputFile(_) => 11,
            Sol25Error::OutputFile(_) => 12,
            Sol25Error::Lexical(_) => 21,
            Sol25Error::Syntax(_) => 22,
            Sol25Error::MainRun(_) => 31,
            Sol25Error::UndefinedSymbol(_) => 32,
            Sol25Error::Arity(_) => 33,
            Sol25Error::VariableCollision(_) => 34,
            Sol25Error::OtherSemantic(_) => 35,
            Sol25Error::Internal(_) => 99,
        }
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }

    pub fn input_file(message: impl Into<String>) -> Self {
        Self::InputFile(message.into())
    }

    pub fn output_file(message: impl Into<String>) -> Self {
        Self::OutputFile(message.into())
    }

    pub fn lexical(message: impl Into<String>) -> Self {
        Self::Lexical(message.into())
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax(message.into())
    }

    pub fn main_run(message: impl Into<String>) -> Self {
        Self::MainRun(message.into())
    }

    pub fn undefined_symbol(message: impl Into<String>) -> Self {
        Self::UndefinedSymbol(message.into())
    }

    pub fn arity(message: impl Into<String>) -> Self {
        Self::Arity(message.into())
    }

    pub fn variable_collision(message: impl Into<String>) -> Self {
        Self::VariableCollision(message.into())
    }

    pub fn other_semantic(message: impl Into<String>) -> Self {
        Self::OtherSemantic(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_the_closed_set() {
        assert_eq!(Sol25Error::argument("x").exit_code(), 10);
        assert_eq!(Sol25Error::input_file("x").exit_code(), 11);
        assert_eq!(Sol25Error::output_file("x").exit_code(), 12);
        assert_eq!(Sol25Error::lexical("x").exit_code(), 21);
        assert_eq!(Sol25Error::syntax("x").exit_code(), 22);
        assert_eq!(Sol25Error::main_run("x").exit_code(), 31);
        assert_eq!(Sol25Error::undefined_symbol("x").exit_code(), 32);
        assert_eq!(Sol25Error::arity("x").exit_code(), 33);
        assert_eq!(Sol25Error::variable_collision("x").exit_code(), 34);
        assert_eq!(Sol25Error::other_semantic("x").exit_code(), 35);
        assert_eq!(Sol25Error::internal("x").exit_code(), 99);
    }

    #[test]
    fn display_includes_the_message() {
        let err = Sol25Error::arity("run must have arity 0");
        assert!(err.to_string().contains("run must have arity 0"));
    }
}
