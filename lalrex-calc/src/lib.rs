//! # lalrex-calc
//!
//! A small demonstration crate built on **lalrex**: a calculator language
//! whose grammar lives in a grammar definition file, compiled at run time
//! with an operator-precedence conflict resolver and evaluated by semantic
//! actions bound by name.
//!
//! ## Overview
//!
//! - [`parser`]: the grammar, [`PrecedenceResolver`] and [`CalcParser`],
//!   which evaluates programs from strings, readers or async streams.
//! - [`symtab`]: the variables of a session ([`SymTab`]).
//! - [`error`]: [`CalcError`].
//!
//! ## Example
//!
//! ```rust
//! use lalrex_calc::{CalcParser, SymTab};
//!
//! let calc = CalcParser::try_new().unwrap();
//! let mut symtab = SymTab::new();
//! let out = calc.eval_str(&mut symtab, "x = 100 / (1 + 2) * 2; -x - 1").unwrap();
//! assert_eq!(out, [Some(66), Some(-67)]);
//! ```
pub mod error;
pub mod parser;
pub mod symtab;

pub use error::CalcError;
pub use parser::{CalcParser, PrecedenceResolver, TokenValue};
pub use symtab::{SymTab, SymTabError};
