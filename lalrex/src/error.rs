//! Errors raised while compiling a grammar for the runtime, binding actions
//! and parsing input.

use crate::cursor::Position;
use lalrex_gen::{DefinitionError, GrammarError};
use smartstring::alias::String;
use std::fmt;
use thiserror::Error;

/// A grammar could not be turned into a [`CompiledGrammar`](crate::CompiledGrammar).
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error("goal symbol {0:?} is not declared")]
    UnknownGoal(String),
}

/// An action was bound to a name the grammar does not declare.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("terminal {0:?} is not declared")]
    UnknownTerminal(String),

    #[error("production {0:?} is not declared")]
    UnknownProduction(String),
}

#[derive(Debug, Error)]
pub enum ParserErrorKind {
    #[error("unexpected {0}")]
    UnexpectedToken(String),

    #[error("unrecognized input")]
    UnrecognizedInput,

    #[error("action failed: {0:#}")]
    Handler(anyhow::Error),

    #[error("input error: {0}")]
    Source(#[source] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// A parse failed. Carries where it failed and what the parser had
/// recognized so far.
#[derive(Debug)]
pub struct ParserError {
    pub kind: ParserErrorKind,
    /// Absolute offset in UTF-16 code units.
    pub position: usize,
    /// Present when lines are tracked.
    pub location: Option<Position>,
    /// The lexeme being scanned or the token being acted on.
    pub lexeme: String,
    /// Symbols on the parser stack, bottom first.
    pub stack: String,
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        match self.location {
            Some(loc) => write!(f, " at {}", loc)?,
            None => write!(f, " at offset {}", self.position)?,
        }
        if !self.lexeme.is_empty() {
            write!(f, " near {:?}", self.lexeme.as_str())?;
        }
        if !self.stack.is_empty() {
            write!(f, " after [{}]", self.stack)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParserError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ParserErrorKind::Source(e) => Some(e),
            ParserErrorKind::Handler(e) => Some(&**e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_send_sync_static<T: Send + Sync + 'static>() {}

    #[test]
    fn errors_are_send_sync_static() {
        _assert_send_sync_static::<CompileError>();
        _assert_send_sync_static::<BindError>();
        _assert_send_sync_static::<ParserError>();
    }

    #[test]
    fn display_prefers_line_and_column() {
        let mut err = ParserError {
            kind: ParserErrorKind::UnexpectedToken("rightParen".into()),
            position: 12,
            location: None,
            lexeme: ")".into(),
            stack: "expr plus".into(),
        };
        assert_eq!(
            err.to_string(),
            "unexpected rightParen at offset 12 near \")\" after [expr plus]"
        );
        err.location = Some(Position::new(2, 3));
        assert!(err.to_string().contains("at 2:3"));
    }
}
