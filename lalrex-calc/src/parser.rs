//! # Calculator Parser
//!
//! Couples the calculator grammar (`calc.lalrex`, compiled once per
//! process) with its semantic actions.
//!
//! ## Behavior highlights
//! - **Operator precedence & associativity** come from
//!   [`PrecedenceResolver`]: shift on a tighter-binding lookahead, otherwise
//!   reduce. Binary operators are left-associative and prefix minus binds
//!   tightest.
//! - **Assignments** store the value in the [`SymTab`] and evaluate to the
//!   assigned value.
//! - **Empty statements** (`;;`) evaluate to `None`.

use crate::{CalcError, SymTab};
use anyhow::anyhow;
use lalrex::{
    AsyncUtf8Reader, Bindings, CharSource, CompiledGrammar, GrammarCache, Parser, ParserOptions,
    ParserStats, Values,
};
use lalrex_gen::{ConflictResolver, Grammar, ProductionId, Resolution, SymbolId, grammar_file};
use once_cell::sync::Lazy;
use std::io::Read;
use std::sync::Arc;
use tokio::io::AsyncRead;

/// Grammar definition of the calculator language.
pub const GRAMMAR: &str = include_str!("calc.lalrex");

static GRAMMARS: Lazy<GrammarCache> = Lazy::new(GrammarCache::new);

/// Value carried on the parser stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenValue {
    Number(i64),
    /// Symbol-table index of an identifier.
    Ident(usize),
    /// Results of the statements reduced so far.
    Stats(Vec<Option<i64>>),
}

/// Binding strength of an operator symbol.
fn precedence(grammar: &Grammar, symbol: SymbolId) -> u8 {
    match grammar.name(symbol) {
        "plus" | "minus" => 1,
        "asterisk" | "slash" => 2,
        _ => 0,
    }
}

/// Settles the shift/reduce conflicts of `Expr -> Expr op Expr` and
/// `Expr -> - Expr` by operator precedence.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecedenceResolver;

impl ConflictResolver for PrecedenceResolver {
    fn resolve_shift_conflict(
        &self,
        grammar: &Grammar,
        symbol: SymbolId,
        production: ProductionId,
    ) -> Resolution {
        let body = grammar.production(production).body();
        let reducing = match body {
            [op, _] if grammar.name(*op) == "minus" => 3,
            [_, op, _] => precedence(grammar, *op),
            _ => 0,
        };
        if precedence(grammar, symbol) > reducing {
            Resolution::Shift
        } else {
            Resolution::Reduce
        }
    }
}

/// Loads and compiles the calculator grammar.
pub fn compile() -> Result<CompiledGrammar, CalcError> {
    let def = grammar_file::load(GRAMMAR).map_err(CalcError::Grammar)?;
    let goal = def.grammar.name(def.goal).to_owned();
    Ok(CompiledGrammar::compile_with(
        def.grammar,
        &goal,
        &PrecedenceResolver,
    )?)
}

fn number(v: &mut Values<TokenValue>, i: usize) -> anyhow::Result<i64> {
    match v.take(i)? {
        TokenValue::Number(n) => Ok(n),
        other => Err(anyhow!("expected a number, found {:?}", other)),
    }
}

fn statement(v: &mut Values<TokenValue>, i: usize) -> Option<i64> {
    match v.take(i) {
        Ok(TokenValue::Number(n)) => Some(n),
        _ => None,
    }
}

fn binary(
    v: &mut Values<TokenValue>,
    op: fn(i64, i64) -> Option<i64>,
) -> anyhow::Result<TokenValue> {
    let (a, b) = (number(v, 0)?, number(v, 2)?);
    let n = op(a, b).ok_or(CalcError::Overflow)?;
    Ok(TokenValue::Number(n))
}

fn bindings(grammar: &Grammar) -> Result<Bindings<'_, SymTab, TokenValue>, CalcError> {
    let b = Bindings::<SymTab, TokenValue>::new(grammar)
        .on_token("number", |_, text| Ok(TokenValue::Number(text.parse().map_err(CalcError::from)?)))
        .and_then(|b| b.on_token("ident", |symtab, text| Ok(TokenValue::Ident(symtab.intern(text)))))
        .and_then(|b| {
            b.on_reduce("Expr:ident", |symtab, v| match v.take(0)? {
                TokenValue::Ident(i) => Ok(TokenValue::Number(symtab.get(i).map_err(CalcError::from)?)),
                other => Err(anyhow!("expected an identifier, found {:?}", other)),
            })
        })
        .and_then(|b| b.on_reduce("Expr:add", |_, v| binary(v, i64::checked_add)))
        .and_then(|b| b.on_reduce("Expr:sub", |_, v| binary(v, i64::checked_sub)))
        .and_then(|b| b.on_reduce("Expr:mul", |_, v| binary(v, i64::checked_mul)))
        .and_then(|b| {
            b.on_reduce("Expr:div", |_, v| {
                if matches!(v.get(2), Some(TokenValue::Number(0))) {
                    return Err(CalcError::DivisionByZero.into());
                }
                binary(v, i64::checked_div)
            })
        })
        .and_then(|b| {
            b.on_reduce("Expr:neg", |_, v| {
                let n = number(v, 1)?.checked_neg().ok_or(CalcError::Overflow)?;
                Ok(TokenValue::Number(n))
            })
        })
        .and_then(|b| {
            b.on_reduce("Stat:assign", |symtab, v| {
                let value = number(v, 2)?;
                match v.take(0)? {
                    TokenValue::Ident(i) => symtab.set(i, value).map_err(CalcError::from)?,
                    other => return Err(anyhow!("expected an identifier, found {:?}", other)),
                }
                Ok(TokenValue::Number(value))
            })
        })
        .and_then(|b| b.on_reduce("Stats:one", |_, v| Ok(TokenValue::Stats(vec![statement(v, 0)]))))
        .and_then(|b| {
            b.on_reduce("Stats:more", |_, v| {
                let last = statement(v, 2);
                match v.take(0)? {
                    TokenValue::Stats(mut all) => {
                        all.push(last);
                        Ok(TokenValue::Stats(all))
                    }
                    other => Err(anyhow!("expected statements, found {:?}", other)),
                }
            })
        })
        .map_err(|e| CalcError::Grammar(e.into()))?;
    Ok(b)
}

fn results(value: Option<TokenValue>) -> Vec<Option<i64>> {
    match value {
        Some(TokenValue::Stats(all)) => all,
        Some(TokenValue::Number(n)) => vec![Some(n)],
        _ => Vec::new(),
    }
}

/// Evaluates calculator programs against a [`SymTab`].
///
/// ```rust
/// # use lalrex_calc::{CalcParser, SymTab};
/// let calc = CalcParser::try_new().unwrap();
/// let mut symtab = SymTab::new();
/// let out = calc.eval_str(&mut symtab, "a = 1 + 2 * 3; a * 2").unwrap();
/// assert_eq!(out, [Some(7), Some(14)]);
/// ```
#[derive(Debug, Clone)]
pub struct CalcParser {
    grammar: Arc<CompiledGrammar>,
    options: ParserOptions,
}

impl CalcParser {
    pub fn try_new() -> Result<Self, CalcError> {
        Self::with_options(ParserOptions::default())
    }

    pub fn with_options(options: ParserOptions) -> Result<Self, CalcError> {
        let grammar = GRAMMARS.get_or_compile("calc", compile)?;
        Ok(Self { grammar, options })
    }

    pub fn grammar(&self) -> &CompiledGrammar {
        &self.grammar
    }

    fn parser(&self) -> Result<Parser<'_, SymTab, TokenValue>, CalcError> {
        let b = bindings(self.grammar.grammar())?;
        Ok(Parser::with_options(&self.grammar, b, self.options))
    }

    /// Evaluates in-memory text; returns one result per statement.
    pub fn eval_str(&self, symtab: &mut SymTab, text: &str) -> Result<Vec<Option<i64>>, CalcError> {
        let mut p = self.parser()?;
        Ok(results(p.parse_str(symtab, text)?))
    }

    /// Evaluates a stream through the configured buffer window.
    pub fn eval<S: CharSource + ?Sized>(
        &self,
        symtab: &mut SymTab,
        src: &mut S,
    ) -> Result<(Vec<Option<i64>>, ParserStats), CalcError> {
        let mut p = self.parser()?;
        let value = p.parse(symtab, src)?;
        Ok((results(value), p.stats()))
    }

    pub fn eval_reader<R: Read>(&self, symtab: &mut SymTab, reader: R) -> Result<Vec<Option<i64>>, CalcError> {
        let mut p = self.parser()?;
        Ok(results(p.parse_reader(symtab, reader)?))
    }

    pub async fn eval_async<R: AsyncRead + Unpin>(
        &self,
        symtab: &mut SymTab,
        reader: R,
    ) -> Result<Vec<Option<i64>>, CalcError> {
        let mut p = self.parser()?;
        let mut src = AsyncUtf8Reader::new(reader);
        Ok(results(p.parse_async(symtab, &mut src).await?))
    }
}
