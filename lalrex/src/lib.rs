//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! Streaming scanner and LALR(1) parser runtime.
//!
//! `lalrex` interprets the tables built by [`lalrex_gen`]: a
//! [`CompiledGrammar`] holds the parser table and lexical automaton, a
//! [`Bindings`] table maps terminal and production names to semantic
//! actions, and a [`Parser`] drives both over in-memory text, any
//! [`std::io::Read`], or any [`tokio::io::AsyncRead`].
//!
//! ```
//! use lalrex::{Bindings, CompiledGrammar, Parser};
//! use lalrex_gen::Grammar;
//!
//! let mut g = Grammar::new();
//! g.create_trivia("ws", "[ ]+").unwrap();
//! g.create_terminal("num", "[0-9]+").unwrap();
//! g.create_terminal("plus", "\\+").unwrap();
//! let sum = g.create_non_terminal("sum").unwrap();
//! g.add_rule(sum, "sum:add", "sum plus num").unwrap();
//! g.add_rule(sum, "sum:num", "num").unwrap();
//! let compiled = CompiledGrammar::compile(g, "sum").unwrap();
//!
//! let bindings = Bindings::<(), i64>::new(compiled.grammar())
//!     .on_token("num", |_, text| Ok(text.parse()?))
//!     .unwrap()
//!     .on_reduce("sum:add", |_, v| Ok(v.take(0)? + v.take(2)?))
//!     .unwrap();
//! let mut parser = Parser::new(&compiled, bindings);
//! assert_eq!(parser.parse_str(&mut (), "1 + 2 + 39").unwrap(), Some(42));
//! ```

pub mod bindings;
pub mod buffer;
pub mod compiled;
pub mod cursor;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod source;

pub use bindings::{Bindings, Values};
pub use buffer::CharBuffer;
pub use compiled::{CompiledGrammar, GrammarCache};
pub use cursor::{LineCounter, Position};
pub use error::{BindError, CompileError, ParserError, ParserErrorKind};
pub use lexer::{Scanner, Token};
pub use parser::{Parser, ParserOptions, ParserStats};
pub use source::{AsyncUtf8Reader, CharSource, StrSource, Utf8Reader};
