//! LALR(1) construction by lookahead propagation over the LR(0) automaton.
//!
//! 1. LR(0) item sets are built from the augmented start item and merged by
//!    kernel identity.
//! 2. For every kernel item, an LR(1) closure seeded with the dummy
//!    lookahead `#` tells which lookaheads are generated spontaneously in
//!    the goto targets and which are propagated from the kernel item.
//! 3. Propagation runs until no kernel lookahead set grows.
//! 4. A final LR(1) closure of each kernel yields the reduce lookaheads.

use super::conflict::{Arbiter, Candidates, ConflictResolver};
use super::{ParserItem, ParserState, ParserTable};
use crate::error::GrammarError;
use crate::grammar::{Grammar, ProductionId, SymbolId};
use indexmap::IndexSet;
use std::collections::{BTreeMap, BTreeSet};

/// Stands for "whatever follows the kernel item" while discovering
/// propagation links.
const DUMMY: SymbolId = SymbolId(usize::MAX);

type Lookaheads = BTreeSet<SymbolId>;

pub(crate) struct Builder<'g> {
    grammar: &'g Grammar,
    goal: SymbolId,
    accept: ProductionId,
    by_head: Vec<Vec<ProductionId>>,
    first: Vec<Lookaheads>,
    nullable: Vec<bool>,
}

impl<'g> Builder<'g> {
    pub(crate) fn new(grammar: &'g Grammar, goal: SymbolId) -> Result<Self, GrammarError> {
        if goal.0 >= grammar.symbol_count() || !grammar.symbol_info(goal).is_non_terminal() {
            return Err(GrammarError::InvalidGoal(grammar.name(goal).into()));
        }
        let mut by_head = vec![Vec::new(); grammar.symbol_count()];
        for p in grammar.productions() {
            by_head[p.head().0].push(p.id());
        }
        let used = std::iter::once(goal).chain(grammar.productions().flat_map(|p| p.body().iter().copied()));
        for sym in used {
            if grammar.symbol_info(sym).is_non_terminal() && by_head[sym.0].is_empty() {
                return Err(GrammarError::EmptyNonTerminal(grammar.name(sym).into()));
            }
        }
        let mut builder = Self {
            grammar,
            goal,
            accept: ProductionId(grammar.production_count()),
            by_head,
            first: Vec::new(),
            nullable: Vec::new(),
        };
        builder.first_sets();
        Ok(builder)
    }

    fn body(&self, p: ProductionId) -> &[SymbolId] {
        if p == self.accept {
            std::slice::from_ref(&self.goal)
        } else {
            self.grammar.production(p).body()
        }
    }

    fn next_symbol(&self, item: ParserItem) -> Option<SymbolId> {
        self.body(item.production).get(item.dot).copied()
    }

    fn is_non_terminal(&self, sym: SymbolId) -> bool {
        sym != DUMMY && self.grammar.symbol_info(sym).is_non_terminal()
    }

    /// FIRST sets and nullability for every symbol.
    fn first_sets(&mut self) {
        let n = self.grammar.symbol_count();
        let mut first: Vec<Lookaheads> = vec![BTreeSet::new(); n];
        let mut nullable = vec![false; n];
        for sym in self.grammar.symbols() {
            if sym.is_terminal_like() {
                first[sym.id().0].insert(sym.id());
            }
        }
        let mut changed = true;
        while changed {
            changed = false;
            for prod in self.grammar.productions() {
                let lhs = prod.head().0;
                let mut all_nullable = true;
                for &sym in prod.body() {
                    let first_sym = first[sym.0].clone();
                    for f in first_sym {
                        if first[lhs].insert(f) {
                            changed = true;
                        }
                    }
                    if !nullable[sym.0] {
                        all_nullable = false;
                        break;
                    }
                }
                if all_nullable && !nullable[lhs] {
                    nullable[lhs] = true;
                    changed = true;
                }
            }
        }
        self.first = first;
        self.nullable = nullable;
    }

    /// FIRST(`seq` `tail`).
    fn first_of(&self, seq: &[SymbolId], tail: &Lookaheads) -> Lookaheads {
        let mut out = BTreeSet::new();
        for &sym in seq {
            out.extend(self.first[sym.0].iter().copied());
            if !self.nullable[sym.0] {
                return out;
            }
        }
        out.extend(tail.iter().copied());
        out
    }

    fn closure0(&self, kernel: &[ParserItem]) -> BTreeSet<ParserItem> {
        let mut items: BTreeSet<ParserItem> = kernel.iter().copied().collect();
        let mut work: Vec<ParserItem> = kernel.to_vec();
        while let Some(item) = work.pop() {
            let Some(b) = self.next_symbol(item) else {
                continue;
            };
            if !self.is_non_terminal(b) {
                continue;
            }
            for &p in &self.by_head[b.0] {
                let new_item = ParserItem { production: p, dot: 0 };
                if items.insert(new_item) {
                    work.push(new_item);
                }
            }
        }
        items
    }

    fn closure1<I>(&self, seed: I) -> BTreeMap<ParserItem, Lookaheads>
    where
        I: IntoIterator<Item = (ParserItem, Lookaheads)>,
    {
        let mut items: BTreeMap<ParserItem, Lookaheads> = BTreeMap::new();
        let mut work: Vec<ParserItem> = Vec::new();
        for (item, las) in seed {
            items.entry(item).or_default().extend(las);
            work.push(item);
        }
        while let Some(item) = work.pop() {
            let Some(b) = self.next_symbol(item) else {
                continue;
            };
            if !self.is_non_terminal(b) {
                continue;
            }
            let overridden = (item.production != self.accept)
                .then(|| self.grammar.production(item.production).lookahead_override(b))
                .flatten();
            let new_las = match overridden {
                Some(set) => set.clone(),
                None => {
                    let beta = &self.body(item.production)[item.dot + 1..];
                    let las = items.get(&item).cloned().unwrap_or_default();
                    self.first_of(beta, &las)
                }
            };
            for &p in &self.by_head[b.0] {
                let new_item = ParserItem { production: p, dot: 0 };
                let fresh = !items.contains_key(&new_item);
                let entry = items.entry(new_item).or_default();
                let before = entry.len();
                entry.extend(new_las.iter().copied());
                if fresh || entry.len() != before {
                    work.push(new_item);
                }
            }
        }
        items
    }

    pub(crate) fn build(&self, resolver: Option<&dyn ConflictResolver>) -> Result<ParserTable, GrammarError> {
        // LR(0) automaton.
        let mut kernels: IndexSet<Vec<ParserItem>> = IndexSet::new();
        let mut gotos: Vec<BTreeMap<SymbolId, usize>> = Vec::new();
        kernels.insert(vec![ParserItem {
            production: self.accept,
            dot: 0,
        }]);
        let mut i = 0;
        while i < kernels.len() {
            let kernel = kernels.get_index(i).cloned().unwrap_or_default();
            let mut moves: BTreeMap<SymbolId, BTreeSet<ParserItem>> = BTreeMap::new();
            for item in self.closure0(&kernel) {
                if let Some(x) = self.next_symbol(item) {
                    moves.entry(x).or_default().insert(item.advance());
                }
            }
            let mut edges = BTreeMap::new();
            for (x, target) in moves {
                let (j, _) = kernels.insert_full(target.into_iter().collect());
                edges.insert(x, j);
            }
            gotos.push(edges);
            i += 1;
        }
        let kernels: Vec<Vec<ParserItem>> = kernels.into_iter().collect();
        log::debug!("lalr: {} LR(0) states", kernels.len());

        // Spontaneous lookaheads and propagation links.
        let mut lookaheads: Vec<Vec<Lookaheads>> =
            kernels.iter().map(|k| vec![BTreeSet::new(); k.len()]).collect();
        let mut links: Vec<Vec<Vec<(usize, usize)>>> =
            kernels.iter().map(|k| vec![Vec::new(); k.len()]).collect();
        lookaheads[0][0].insert(Grammar::END);
        for (i, kernel) in kernels.iter().enumerate() {
            for (k, &kitem) in kernel.iter().enumerate() {
                let closure = self.closure1([(kitem, BTreeSet::from([DUMMY]))]);
                for (item, las) in closure {
                    let Some(x) = self.next_symbol(item) else {
                        continue;
                    };
                    let Some(&j) = gotos[i].get(&x) else {
                        continue;
                    };
                    let Ok(kj) = kernels[j].binary_search(&item.advance()) else {
                        continue;
                    };
                    for a in las {
                        if a == DUMMY {
                            links[i][k].push((j, kj));
                        } else {
                            lookaheads[j][kj].insert(a);
                        }
                    }
                }
            }
        }

        let mut passes = 0;
        let mut changed = true;
        while changed {
            changed = false;
            passes += 1;
            for i in 0..kernels.len() {
                for k in 0..kernels[i].len() {
                    if links[i][k].is_empty() {
                        continue;
                    }
                    let source = lookaheads[i][k].clone();
                    for &(j, kj) in &links[i][k] {
                        let before = lookaheads[j][kj].len();
                        lookaheads[j][kj].extend(source.iter().copied());
                        if lookaheads[j][kj].len() != before {
                            changed = true;
                        }
                    }
                }
            }
        }
        log::debug!("lalr: lookaheads settled after {} passes", passes);

        // Actions.
        let arbiter = Arbiter {
            grammar: self.grammar,
            accept: self.accept,
            resolver,
        };
        let mut states = Vec::with_capacity(kernels.len());
        for (i, kernel) in kernels.iter().enumerate() {
            let closure = self.closure1(
                kernel
                    .iter()
                    .copied()
                    .zip(lookaheads[i].iter().cloned()),
            );
            let mut reduces: BTreeMap<SymbolId, BTreeSet<ProductionId>> = BTreeMap::new();
            let mut shift_items: BTreeMap<SymbolId, Vec<ParserItem>> = BTreeMap::new();
            for (item, las) in &closure {
                match self.next_symbol(*item) {
                    None => {
                        for a in las {
                            reduces.entry(*a).or_default().insert(item.production);
                        }
                    }
                    Some(x) if !self.is_non_terminal(x) => {
                        shift_items.entry(x).or_default().push(*item);
                    }
                    Some(_) => {}
                }
            }
            let symbols: BTreeSet<SymbolId> = reduces
                .keys()
                .chain(shift_items.keys())
                .copied()
                .collect();
            let mut actions = BTreeMap::new();
            for symbol in symbols {
                let reduce_list: Vec<ProductionId> = reduces
                    .get(&symbol)
                    .map(|s| s.iter().copied().collect())
                    .unwrap_or_default();
                let items = shift_items.get(&symbol).map(Vec::as_slice).unwrap_or(&[]);
                let candidates = Candidates {
                    state: i,
                    symbol,
                    shift: if items.is_empty() { None } else { gotos[i].get(&symbol).copied() },
                    reduces: &reduce_list,
                    shift_items: items,
                };
                if let Some(action) = arbiter.select(&candidates)? {
                    actions.insert(symbol, action);
                }
            }
            let accessing_symbol = kernel
                .first()
                .filter(|item| item.dot > 0)
                .map(|item| self.body(item.production)[item.dot - 1]);
            states.push(ParserState {
                id: i,
                kernel: kernel.clone(),
                lookaheads: lookaheads[i].clone(),
                gotos: gotos[i].clone(),
                actions,
                accessing_symbol,
            });
        }
        log::debug!(
            "lalr: {} states, {} actions",
            states.len(),
            states.iter().map(|s| s.actions.len()).sum::<usize>()
        );
        Ok(ParserTable {
            states,
            goal: self.goal,
            accept: self.accept,
        })
    }
}

