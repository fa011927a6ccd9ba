//! # Calculator Error Type
//!
//! [`CalcError`] covers every way an evaluation can fail: building the
//! calculator grammar, scanning and parsing the input, and the arithmetic
//! and symbol-table work done by the semantic actions.
//!
//! Failures raised inside an action reach the caller wrapped in a
//! [`ParserError`] of kind [`ParserErrorKind::Handler`](lalrex::ParserErrorKind::Handler),
//! which carries the position. [`CalcError::action`] digs the original
//! error back out.
use crate::SymTabError;
use lalrex::{CompileError, ParserError, ParserErrorKind};
use thiserror::Error;

/// Represents all possible errors that can occur within the calculator.
///
/// # Examples
/// Propagating a parse failure:
/// ```rust
/// # use lalrex_calc::CalcError;
/// # fn demo(s: &str) -> Result<i64, CalcError> {
/// let n: i64 = s.parse()?; // ParseIntError -> CalcError via #[from]
/// # Ok(n) }
/// ```
#[derive(Debug, Error)]
pub enum CalcError {
    /// An integer literal could not be parsed from its string representation.
    #[error("unable to parse {0:?}")]
    ParseInt(#[from] std::num::ParseIntError),

    /// A symbol-table operation failed.
    #[error("symtab error: {0}")]
    SymTab(#[from] SymTabError),

    #[error("division by zero")]
    DivisionByZero,

    #[error("arithmetic overflow")]
    Overflow,

    /// The embedded grammar definition could not be loaded.
    #[error("invalid calculator grammar: {0:#}")]
    Grammar(anyhow::Error),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Parse(#[from] ParserError),
}

impl CalcError {
    /// The calculator error raised by a semantic action, if that is what
    /// stopped the parse.
    pub fn action(&self) -> Option<&CalcError> {
        match self {
            CalcError::Parse(ParserError {
                kind: ParserErrorKind::Handler(e),
                ..
            }) => e.downcast_ref::<CalcError>(),
            _ => None,
        }
    }
}
