//! Conflict-resolution protocol and per-symbol action selection.

use super::{Action, ParserItem};
use crate::error::GrammarError;
use crate::grammar::{Grammar, ProductionId, SymbolId};
use smartstring::alias::String;

/// Outcome of a shift/reduce arbitration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Shift,
    Reduce,
}

/// Policy consulted while building the action table.
///
/// Explicit `shift_on`/`reduce_on` overrides on a production are applied
/// before the resolver is asked.
pub trait ConflictResolver {
    /// A shift on `symbol` competes with reducing `production`.
    fn resolve_shift_conflict(
        &self,
        _grammar: &Grammar,
        _symbol: SymbolId,
        _production: ProductionId,
    ) -> Resolution {
        Resolution::Shift
    }

    /// Several items compete on `symbol`: at least two completed items,
    /// plus the shift items if a shift is possible. Returns the items to
    /// keep; they must denote a single action. `None` fails the build.
    fn resolve_core_conflicts(
        &self,
        _grammar: &Grammar,
        _symbol: SymbolId,
        _items: &[ParserItem],
    ) -> Option<Vec<ParserItem>> {
        None
    }
}

/// Shifts on every shift/reduce conflict and fails on everything else.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultResolver;

impl ConflictResolver for DefaultResolver {}

/// Everything that wants to act on `symbol` in `state`.
pub(crate) struct Candidates<'a> {
    pub state: usize,
    pub symbol: SymbolId,
    pub shift: Option<usize>,
    /// Distinct, ascending.
    pub reduces: &'a [ProductionId],
    pub shift_items: &'a [ParserItem],
}

pub(crate) struct Arbiter<'g> {
    pub grammar: &'g Grammar,
    pub accept: ProductionId,
    pub resolver: Option<&'g dyn ConflictResolver>,
}

impl Arbiter<'_> {
    fn name(&self, p: ProductionId) -> String {
        if p == self.accept {
            "$accept".into()
        } else {
            self.grammar.production(p).name().into()
        }
    }

    fn reduce(&self, p: ProductionId) -> Action {
        if p == self.accept {
            Action::Accept
        } else {
            Action::Reduce(p)
        }
    }

    fn body_len(&self, p: ProductionId) -> usize {
        if p == self.accept {
            1
        } else {
            self.grammar.production(p).body().len()
        }
    }

    fn overrides(&self, p: ProductionId, symbol: SymbolId) -> (bool, bool) {
        if p == self.accept {
            return (false, false);
        }
        let prod = self.grammar.production(p);
        (prod.shift_on().contains(&symbol), prod.reduce_on().contains(&symbol))
    }

    fn names(&self, reduces: &[ProductionId], shift_items: &[ParserItem]) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for p in reduces
            .iter()
            .copied()
            .chain(shift_items.iter().map(|i| i.production))
        {
            let n = self.name(p);
            if !names.contains(&n) {
                names.push(n);
            }
        }
        names
    }

    /// The single action for `c.symbol`, or `None` if nothing applies.
    pub(crate) fn select(&self, c: &Candidates<'_>) -> Result<Option<Action>, GrammarError> {
        let symbol_name = || String::from(self.grammar.name(c.symbol));
        match (c.shift, c.reduces) {
            (shift, []) => Ok(shift.map(Action::Shift)),
            (None, [p]) => Ok(Some(self.reduce(*p))),
            (Some(s), [p]) => {
                let (shift_on, reduce_on) = self.overrides(*p, c.symbol);
                if shift_on {
                    return Ok(Some(Action::Shift(s)));
                }
                if reduce_on {
                    return Ok(Some(self.reduce(*p)));
                }
                match self.resolver {
                    Some(r) if *p != self.accept => {
                        let resolution = r.resolve_shift_conflict(self.grammar, c.symbol, *p);
                        log::debug!(
                            "state {}: shift/reduce on {} between {} and shift resolved as {:?}",
                            c.state,
                            self.grammar.name(c.symbol),
                            self.name(*p),
                            resolution
                        );
                        Ok(Some(match resolution {
                            Resolution::Shift => Action::Shift(s),
                            Resolution::Reduce => self.reduce(*p),
                        }))
                    }
                    _ => Err(GrammarError::ShiftReduce {
                        state: c.state,
                        symbol: symbol_name(),
                        productions: self.names(c.reduces, c.shift_items),
                    }),
                }
            }
            (shift, reduces) => {
                let forced: Vec<ProductionId> = reduces
                    .iter()
                    .copied()
                    .filter(|p| self.overrides(*p, c.symbol).1)
                    .collect();
                if let [p] = forced.as_slice() {
                    return Ok(Some(self.reduce(*p)));
                }
                if let Some(s) = shift {
                    if reduces.iter().all(|p| self.overrides(*p, c.symbol).0) {
                        return Ok(Some(Action::Shift(s)));
                    }
                }
                self.core_conflict(c).map(Some)
            }
        }
    }

    fn core_conflict(&self, c: &Candidates<'_>) -> Result<Action, GrammarError> {
        let mut items: Vec<ParserItem> = c
            .reduces
            .iter()
            .map(|p| ParserItem {
                production: *p,
                dot: self.body_len(*p),
            })
            .collect();
        items.extend_from_slice(c.shift_items);

        let Some(retained) = self
            .resolver
            .and_then(|r| r.resolve_core_conflicts(self.grammar, c.symbol, &items))
        else {
            return Err(GrammarError::ReduceReduce {
                state: c.state,
                symbol: self.grammar.name(c.symbol).into(),
                productions: self.names(c.reduces, &[]),
            });
        };

        let valid = !retained.is_empty() && retained.iter().all(|i| items.contains(i));
        let completed: Vec<&ParserItem> = retained
            .iter()
            .filter(|i| i.dot == self.body_len(i.production))
            .collect();
        let action = match (valid, completed.as_slice(), c.shift) {
            (true, [], Some(s)) => Some(Action::Shift(s)),
            (true, [only], _) if retained.len() == 1 => Some(self.reduce(only.production)),
            _ => None,
        };
        match action {
            Some(action) => {
                log::debug!(
                    "state {}: core conflict on {} resolved as {:?}",
                    c.state,
                    self.grammar.name(c.symbol),
                    action
                );
                Ok(action)
            }
            None => Err(GrammarError::CoreConflict {
                state: c.state,
                symbol: self.grammar.name(c.symbol).into(),
                productions: retained.iter().map(|i| self.name(i.production)).collect(),
            }),
        }
    }
}
