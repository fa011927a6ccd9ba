//! Error types raised while assembling a grammar and building its tables.
//!
//! Three families are kept apart:
//!
//! - [`PatternSyntaxError`]: malformed pattern or character-set text,
//!   reported before any grammar construction proceeds.
//! - [`DefinitionError`]: a grammar assembly call was rejected (unknown or
//!   duplicate name, forward reference, bad pattern).
//! - [`GrammarError`]: the LALR(1) builder found a conflict it could not
//!   resolve. Carries the offending symbol and every conflicting production.
//!
//! [`MatchError`] covers argument validation of a compiled [`Matcher`].
//!
//! [`Matcher`]: crate::lexical::Matcher
use smartstring::alias::String;
use thiserror::Error;

/// A pattern could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("pattern syntax error at {position} in {pattern:?}: {message}")]
pub struct PatternSyntaxError {
    /// The full pattern text.
    pub pattern: String,
    /// Character offset of the error within `pattern`.
    pub position: usize,
    pub message: String,
}

/// A grammar assembly operation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("symbol {0:?} is already declared")]
    DuplicateSymbol(String),

    #[error("production {0:?} is already declared")]
    DuplicateProduction(String),

    /// Includes references to symbols declared later (forward references).
    #[error("symbol {0:?} is not declared")]
    UndeclaredSymbol(String),

    #[error("symbol {0:?} is not a non-terminal")]
    NotNonTerminal(String),

    #[error("production {0:?} is not declared")]
    UnknownProduction(String),

    #[error("symbol {symbol:?} does not occur in the body of {production:?}")]
    MarkerNotInBody { production: String, symbol: String },

    #[error("terminal {0:?} matches the empty string")]
    EmptyMatch(String),

    #[error("terminal {terminal:?}: {source}")]
    Pattern {
        terminal: String,
        #[source]
        source: PatternSyntaxError,
    },
}

/// An ambiguity or structural problem found while building parser states.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("unresolved shift/reduce conflict on {symbol:?} in state {state}: {}", productions.join(", "))]
    ShiftReduce {
        state: usize,
        symbol: String,
        productions: Vec<String>,
    },

    #[error("reduce/reduce conflict on {symbol:?} in state {state}: {}", productions.join(", "))]
    ReduceReduce {
        state: usize,
        symbol: String,
        productions: Vec<String>,
    },

    /// The resolver kept a set of items that still denotes more than one action.
    #[error("core conflict on {symbol:?} in state {state} left unresolved: {}", productions.join(", "))]
    CoreConflict {
        state: usize,
        symbol: String,
        productions: Vec<String>,
    },

    #[error("goal symbol {0:?} is not a non-terminal")]
    InvalidGoal(String),

    #[error("non-terminal {0:?} has no productions")]
    EmptyNonTerminal(String),
}

impl GrammarError {
    /// Name of the lookahead symbol the conflict arose on.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            GrammarError::ShiftReduce { symbol, .. }
            | GrammarError::ReduceReduce { symbol, .. }
            | GrammarError::CoreConflict { symbol, .. } => Some(symbol.as_str()),
            GrammarError::InvalidGoal(_) | GrammarError::EmptyNonTerminal(_) => None,
        }
    }

    /// Names of every production taking part in the conflict.
    pub fn productions(&self) -> &[String] {
        match self {
            GrammarError::ShiftReduce { productions, .. }
            | GrammarError::ReduceReduce { productions, .. }
            | GrammarError::CoreConflict { productions, .. } => productions,
            GrammarError::InvalidGoal(_) | GrammarError::EmptyNonTerminal(_) => &[],
        }
    }
}

/// Invalid arguments passed to a compiled matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("offset {offset} is out of range for input of length {len}")]
    OffsetOutOfRange { offset: usize, len: usize },

    #[error("length {length} at offset {offset} exceeds input of length {len}")]
    LengthOutOfRange {
        offset: usize,
        length: usize,
        len: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_send_sync_static<T: Send + Sync + 'static>() {}

    #[test]
    fn errors_are_send_sync_static() {
        _assert_send_sync_static::<PatternSyntaxError>();
        _assert_send_sync_static::<DefinitionError>();
        _assert_send_sync_static::<GrammarError>();
        _assert_send_sync_static::<MatchError>();
    }

    #[test]
    fn grammar_error_exposes_payload() {
        let err = GrammarError::ShiftReduce {
            state: 7,
            symbol: "else".into(),
            productions: vec!["stmnt:if".into(), "stmnt:ifelse".into()],
        };
        assert_eq!(err.symbol(), Some("else"));
        assert_eq!(err.productions().len(), 2);
        let msg = err.to_string();
        assert!(msg.contains("stmnt:if"));
        assert!(msg.contains("\"else\""));
    }
}
