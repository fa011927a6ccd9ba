//! Registration table mapping terminals and productions to semantic actions.

use crate::error::BindError;
use anyhow::anyhow;
use lalrex_gen::{Grammar, ProductionId, SymbolId};
use std::collections::HashMap;
use std::fmt;

type TokenHandler<C, V> = Box<dyn Fn(&mut C, &str) -> anyhow::Result<V> + Send + Sync>;
type ReduceHandler<C, V> = Box<dyn Fn(&mut C, &mut Values<V>) -> anyhow::Result<V> + Send + Sync>;

/// Values of the body symbols of a production being reduced.
///
/// Terminals without a token handler and line-break markers contribute
/// `None`.
#[derive(Debug)]
pub struct Values<V> {
    items: Vec<Option<V>>,
}

impl<V> Values<V> {
    pub(crate) fn new(items: Vec<Option<V>>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&V> {
        self.items.get(i).and_then(Option::as_ref)
    }

    /// Moves the value of body symbol `i` out.
    pub fn take(&mut self, i: usize) -> anyhow::Result<V> {
        self.items
            .get_mut(i)
            .and_then(Option::take)
            .ok_or_else(|| anyhow!("no value at position {} of {}", i, self.items.len()))
    }

    pub(crate) fn into_first(self) -> Option<V> {
        self.items.into_iter().flatten().next()
    }
}

/// Semantic actions for one grammar, keyed by symbol and production id.
///
/// `C` is caller state threaded through every handler, `V` the value type
/// carried on the parser stack.
pub struct Bindings<'g, C, V> {
    grammar: &'g Grammar,
    tokens: HashMap<SymbolId, TokenHandler<C, V>>,
    reductions: HashMap<ProductionId, ReduceHandler<C, V>>,
}

impl<C, V> fmt::Debug for Bindings<'_, C, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindings")
            .field("tokens", &self.tokens.len())
            .field("reductions", &self.reductions.len())
            .finish()
    }
}

impl<'g, C, V> Bindings<'g, C, V> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            tokens: HashMap::new(),
            reductions: HashMap::new(),
        }
    }

    /// Runs `f` on the text of every `terminal` token.
    pub fn on_token<F>(mut self, terminal: &str, f: F) -> Result<Self, BindError>
    where
        F: Fn(&mut C, &str) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        let id = self
            .grammar
            .symbol(terminal)
            .filter(|id| self.grammar.symbol_info(*id).pattern().is_some())
            .ok_or_else(|| BindError::UnknownTerminal(terminal.into()))?;
        self.tokens.insert(id, Box::new(f));
        Ok(self)
    }

    /// Runs `f` whenever the production named `production` is reduced.
    pub fn on_reduce<F>(mut self, production: &str, f: F) -> Result<Self, BindError>
    where
        F: Fn(&mut C, &mut Values<V>) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        let id = self
            .grammar
            .production_named(production)
            .map(|p| p.id())
            .ok_or_else(|| BindError::UnknownProduction(production.into()))?;
        self.reductions.insert(id, Box::new(f));
        Ok(self)
    }

    pub(crate) fn token(&self, ctx: &mut C, symbol: SymbolId, text: &str) -> anyhow::Result<Option<V>> {
        self.tokens.get(&symbol).map(|f| f(ctx, text)).transpose()
    }

    pub(crate) fn reduce(
        &self,
        ctx: &mut C,
        production: ProductionId,
        mut values: Values<V>,
    ) -> anyhow::Result<Option<V>> {
        match self.reductions.get(&production) {
            Some(f) => f(ctx, &mut values).map(Some),
            None => Ok(values.into_first()),
        }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar() -> Grammar {
        let mut g = Grammar::new();
        g.create_terminal("num", "[0-9]+").unwrap();
        g.create_terminal("plus", "\\+").unwrap();
        let expr = g.create_non_terminal("expr").unwrap();
        g.add_rule(expr, "expr:add", "expr plus num").unwrap();
        g.add_rule(expr, "expr:num", "num").unwrap();
        g
    }

    #[test]
    fn rejects_unknown_names() {
        let g = grammar();
        let err = Bindings::<(), i64>::new(&g).on_token("minus", |_, _| Ok(0)).unwrap_err();
        assert_eq!(err, BindError::UnknownTerminal("minus".into()));
        let err = Bindings::<(), i64>::new(&g).on_token("expr", |_, _| Ok(0)).unwrap_err();
        assert!(matches!(err, BindError::UnknownTerminal(_)));
        let err = Bindings::<(), i64>::new(&g)
            .on_reduce("expr:sub", |_, _| Ok(0))
            .unwrap_err();
        assert_eq!(err, BindError::UnknownProduction("expr:sub".into()));
    }

    #[test]
    fn dispatches_by_id() {
        let g = grammar();
        let b = Bindings::<usize, i64>::new(&g)
            .on_token("num", |calls, text| {
                *calls += 1;
                Ok(text.parse()?)
            })
            .unwrap()
            .on_reduce("expr:add", |_, v| Ok(v.take(0)? + v.take(2)?))
            .unwrap();
        let mut calls = 0;
        let num = g.symbol("num").unwrap();
        let plus = g.symbol("plus").unwrap();
        assert_eq!(b.token(&mut calls, num, "40").unwrap(), Some(40));
        assert_eq!(b.token(&mut calls, plus, "+").unwrap(), None);
        assert!(b.token(&mut calls, num, "x").is_err());
        assert_eq!(calls, 2);

        let add = g.production_named("expr:add").unwrap().id();
        let sum = b.reduce(&mut calls, add, Values::new(vec![Some(40), None, Some(2)]));
        assert_eq!(sum.unwrap(), Some(42));
        let unbound = g.production_named("expr:num").unwrap().id();
        let passed = b.reduce(&mut calls, unbound, Values::new(vec![None, Some(7)]));
        assert_eq!(passed.unwrap(), Some(7));
    }

    #[test]
    fn take_moves_once() {
        let mut v = Values::new(vec![Some(1), None]);
        assert_eq!(v.len(), 2);
        assert_eq!(v.get(0), Some(&1));
        assert_eq!(v.take(0).unwrap(), 1);
        assert!(v.take(0).is_err());
        assert!(v.take(1).is_err());
        assert!(v.take(5).is_err());
    }
}
