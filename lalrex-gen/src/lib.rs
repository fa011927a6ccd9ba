//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! Lexical automaton and LALR(1) table builder.
//!
//! `lalrex-gen` turns a declarative [`Grammar`](grammar::Grammar) into:
//!  * a **lexical automaton**: every terminal pattern compiled into one
//!    deterministic automaton over UTF-16 code units, with Unicode category
//!    fallback and surrogate-pair expansion;
//!  * an **LALR(1) table** with explicit overrides and a pluggable
//!    [`ConflictResolver`](lalr::ConflictResolver).
//!
//! The `lalrex` crate interprets both at run time.
//!
//! ```
//! use lalrex_gen::grammar::Grammar;
//! use lalrex_gen::lalr::{Action, DefaultResolver};
//!
//! let mut g = Grammar::new();
//! g.create_terminal("num", "[0-9]+").unwrap();
//! g.create_terminal("minus", "-").unwrap();
//! let expr = g.create_non_terminal("expr").unwrap();
//! g.add_rule(expr, "expr:sub", "expr minus expr").unwrap();
//! g.add_rule(expr, "expr:num", "num").unwrap();
//!
//! assert!(g.create_parser_states(expr).is_err());
//! let table = g.create_parser_states_with(expr, &DefaultResolver).unwrap();
//! let done = table.get_state(0, &[expr]).unwrap();
//! assert_eq!(table.action(done, Grammar::END), Some(Action::Accept));
//! ```

pub mod charset;
pub mod dump;
pub mod error;
pub mod grammar;
pub mod grammar_file;
pub mod lalr;
pub mod lexical;
pub mod regex;
pub mod unicode;

pub use charset::CharSet;
pub use error::{DefinitionError, GrammarError, MatchError, PatternSyntaxError};
pub use grammar::{Grammar, GrammarOptions, ProductionId, SymbolId, SymbolKind, TerminalOptions};
pub use lalr::{Action, ConflictResolver, DefaultResolver, ParserItem, ParserState, ParserTable, Resolution};
pub use lexical::{LexicalAutomaton, LexicalState, MatchOutcome, Matcher};
pub use self::regex::Pattern;
