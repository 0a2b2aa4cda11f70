//! Error types for Tin compilation and execution.
//!
//! Errors abort the current `execute` call immediately and surface to the
//! caller; there is no retry and no partial result. Where possible the
//! variant carries the offending source substring or operation glyph.

use thiserror::Error;

/// Everything that can go wrong while compiling or running a Tin program.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TinError {
    /// No pattern in the token table matches at the cursor.
    #[error("no token pattern matches at `{0}`")]
    Lex(String),

    /// An operation tried to pop more values than the stack holds.
    #[error("stack underflow in `{0}`")]
    StackUnderflow(String),

    /// An operand is not acceptable to the operation.
    #[error("type error in `{op}`: {msg}")]
    Type { op: String, msg: String },

    /// `.x` or `←x` on a variable that has never been bound.
    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),

    /// Array shapes cannot be broadcast or stacked together.
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// Integer division or modulo by zero. Float division produces
    /// `inf`/`nan` instead and never raises this.
    #[error("division by zero")]
    DivisionByZero,

    /// Array index outside the leading axis.
    #[error("index {index} out of bounds for axis of length {len}")]
    Index { index: i64, len: usize },

    /// Structurally invalid program: unbalanced control brackets, a
    /// definition whose name is not a valid regex, and similar.
    #[error("malformed program: {0}")]
    Malformed(String),

    /// The machine's step or recursion budget ran out.
    #[error("execution budget exceeded: {0}")]
    LimitExceeded(String),
}
