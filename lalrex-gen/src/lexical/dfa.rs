//! Subset construction from the unit NFA into [`LexicalState`]s.
//!
//! A DFA state is keyed by its NFA node set together with the lookahead
//! assertions already decided at the current position. A set that still
//! holds an undecided assertion becomes a lookahead state whose branches
//! re-close the same set with the assertion decided either way.
//!
//! Transitions are computed over elementary intervals: the boundaries of
//! every range in every outgoing class split the BMP into intervals inside
//! which membership depends on the general category alone. Intervals that
//! behave like the category-only fallback of the state are left out.

use super::nfa::{Accept, Edge, Nfa, NodeId};
use super::{CategoryTransition, LexicalState, Lookahead, RangeTransition};
use crate::charset::CharSet;
use crate::unicode::{Categories, Category, CodeRange, SUPPLEMENTARY_START, SURROGATE_END, SURROGATE_START};
use indexmap::IndexSet;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct Key {
    nodes: Vec<NodeId>,
    resolved: Vec<(NodeId, bool)>,
}

type Row = Vec<Option<usize>>;

pub(crate) struct SubsetBuilder<'a> {
    nfa: &'a Nfa,
    lazy: &'a [bool],
    keys: IndexSet<Key>,
    states: Vec<LexicalState>,
    queue: VecDeque<usize>,
    seeds: HashMap<BTreeSet<NodeId>, usize>,
    conditions: HashMap<usize, usize>,
    fallback: Vec<Category>,
}

impl<'a> SubsetBuilder<'a> {
    pub(crate) fn new(nfa: &'a Nfa, lazy: &'a [bool]) -> Self {
        Self {
            nfa,
            lazy,
            keys: IndexSet::new(),
            states: Vec::new(),
            queue: VecDeque::new(),
            seeds: HashMap::new(),
            conditions: HashMap::new(),
            fallback: Category::ALL
                .into_iter()
                .filter(|c| *c != Category::Surrogate)
                .collect(),
        }
    }

    /// Runs the construction from `start` and returns the states; the
    /// start node's state is state 0.
    pub(crate) fn build(mut self, start: NodeId) -> Vec<LexicalState> {
        self.state_for(BTreeSet::from([start]));
        while let Some(id) = self.queue.pop_front() {
            let state = self.expand(id);
            self.states[id] = state;
        }
        self.states
    }

    fn closure(&self, seeds: impl IntoIterator<Item = NodeId>, resolved: &[(NodeId, bool)]) -> (BTreeSet<NodeId>, BTreeSet<NodeId>) {
        let mut nodes = BTreeSet::new();
        let mut pending = BTreeSet::new();
        let mut stack: Vec<NodeId> = seeds.into_iter().collect();
        while let Some(n) = stack.pop() {
            if !nodes.insert(n) {
                continue;
            }
            for edge in &self.nfa.nodes[n].edges {
                match edge {
                    Edge::Epsilon(t) => stack.push(*t),
                    Edge::Assert { negated, target, .. } => {
                        match resolved.iter().find(|(a, _)| *a == n) {
                            Some((_, holds)) if holds != negated => stack.push(*target),
                            Some(_) => {}
                            None => {
                                pending.insert(n);
                            }
                        }
                    }
                    Edge::Units(..) => {}
                }
            }
        }
        (nodes, pending)
    }

    fn intern(&mut self, key: Key) -> usize {
        let (id, inserted) = self.keys.insert_full(key);
        if inserted {
            self.states.push(LexicalState::default());
            self.queue.push_back(id);
        }
        id
    }

    fn state_for(&mut self, seeds: BTreeSet<NodeId>) -> Option<usize> {
        if seeds.is_empty() {
            return None;
        }
        if let Some(id) = self.seeds.get(&seeds) {
            return Some(*id);
        }
        let (nodes, _) = self.closure(seeds.iter().copied(), &[]);
        let id = self.intern(Key {
            nodes: nodes.into_iter().collect(),
            resolved: Vec::new(),
        });
        self.seeds.insert(seeds, id);
        Some(id)
    }

    fn condition_state(&mut self, cond: usize) -> usize {
        if let Some(id) = self.conditions.get(&cond) {
            return *id;
        }
        let entry = self.nfa.conditions[cond];
        let (nodes, _) = self.closure([entry], &[]);
        let id = self.intern(Key {
            nodes: nodes.into_iter().collect(),
            resolved: Vec::new(),
        });
        self.conditions.insert(cond, id);
        id
    }

    fn branch(&mut self, key: &Key, assert: NodeId, holds: bool) -> usize {
        let mut resolved = key.resolved.clone();
        resolved.push((assert, holds));
        resolved.sort_unstable();
        let (nodes, _) = self.closure(key.nodes.iter().copied(), &resolved);
        self.intern(Key {
            nodes: nodes.into_iter().collect(),
            resolved,
        })
    }

    fn expand(&mut self, id: usize) -> LexicalState {
        let Some(key) = self.keys.get_index(id).cloned() else {
            return LexicalState::default();
        };
        let (nodes, pending) = self.closure(key.nodes.iter().copied(), &key.resolved);

        if let Some(&assert) = pending.first() {
            let cond = self.nfa.nodes[assert].edges.iter().find_map(|e| match e {
                Edge::Assert { cond, .. } => Some(*cond),
                _ => None,
            });
            if let Some(cond) = cond {
                let condition = self.condition_state(cond);
                let on_true = self.branch(&key, assert, true);
                let on_false = self.branch(&key, assert, false);
                return LexicalState {
                    lookahead: Some(Lookahead {
                        condition,
                        on_true,
                        on_false,
                    }),
                    ..LexicalState::default()
                };
            }
        }

        let mut terminal: Option<usize> = None;
        let mut condition_met = false;
        for n in &nodes {
            match self.nfa.nodes[*n].accept {
                Some(Accept::Terminal(t)) => terminal = Some(terminal.map_or(t, |p| p.min(t))),
                Some(Accept::Condition) => condition_met = true,
                None => {}
            }
        }
        let is_final = terminal.is_some() || condition_met;

        // Lazy terminals stop at their first accept; conditions stop at any accept.
        let finished: BTreeSet<usize> = nodes
            .iter()
            .filter_map(|n| match self.nfa.nodes[*n].accept {
                Some(Accept::Terminal(t)) if self.lazy.get(t).copied().unwrap_or(false) => Some(t),
                _ => None,
            })
            .collect();
        let mut edges: Vec<(&'a CharSet, NodeId)> = Vec::new();
        if !condition_met {
            let nfa = self.nfa;
            for n in &nodes {
                let node = &nfa.nodes[*n];
                if node.owner.is_some_and(|o| finished.contains(&o)) {
                    continue;
                }
                for edge in &node.edges {
                    if let Edge::Units(class, target) = edge {
                        edges.push((class, *target));
                    }
                }
            }
        }

        let (ranges, categories, default) = self.transitions(&edges);
        LexicalState {
            ranges,
            categories,
            default,
            is_final,
            terminal,
            lookahead: None,
        }
    }

    fn transitions(
        &mut self,
        edges: &[(&CharSet, NodeId)],
    ) -> (Vec<RangeTransition>, Vec<CategoryTransition>, Option<usize>) {
        let outside = self.row(edges, None);
        let (categories, default) = match uniform(&outside) {
            Some(target) => (Vec::new(), target),
            None => (group(&self.fallback, &outside), None),
        };

        let mut points = BTreeSet::from([0, SURROGATE_START, SURROGATE_END + 1, SUPPLEMENTARY_START]);
        for (class, _) in edges {
            boundaries(class, &mut points);
        }
        let points: Vec<u32> = points.into_iter().filter(|p| *p <= SUPPLEMENTARY_START).collect();

        let mut ranges: Vec<RangeTransition> = Vec::new();
        for w in points.windows(2) {
            let range = CodeRange::new(w[0], w[1] - 1);
            let entry = if (SURROGATE_START..=SURROGATE_END).contains(&range.start) {
                let seeds = targets(edges, Some(range.start), Category::Surrogate);
                let target = self.state_for(seeds);
                if target == default {
                    continue;
                }
                RangeTransition {
                    range,
                    categories: Vec::new(),
                    default: target,
                }
            } else {
                let row = self.row(edges, Some(range.start));
                if row == outside {
                    continue;
                }
                match uniform(&row) {
                    Some(target) => RangeTransition {
                        range,
                        categories: Vec::new(),
                        default: target,
                    },
                    None => RangeTransition {
                        range,
                        categories: group(&self.fallback, &row),
                        default: None,
                    },
                }
            };
            match ranges.last_mut() {
                Some(last)
                    if last.range.end + 1 == entry.range.start
                        && last.categories == entry.categories
                        && last.default == entry.default =>
                {
                    last.range.end = entry.range.end;
                }
                _ => ranges.push(entry),
            }
        }
        (ranges, categories, default)
    }

    /// Target state per fallback category for a unit at `point`
    /// (`None`: a unit outside every listed range).
    fn row(&mut self, edges: &[(&CharSet, NodeId)], point: Option<u32>) -> Row {
        let cats = self.fallback.clone();
        cats.into_iter()
            .map(|cat| {
                let seeds = targets(edges, point, cat);
                self.state_for(seeds)
            })
            .collect()
    }
}

fn targets(edges: &[(&CharSet, NodeId)], point: Option<u32>, cat: Category) -> BTreeSet<NodeId> {
    edges
        .iter()
        .filter(|(class, _)| member(class, point, cat))
        .map(|(_, t)| *t)
        .collect()
}

/// Membership of a unit with category `cat` at `point`, where `point` lies
/// inside one elementary interval.
fn member(class: &CharSet, point: Option<u32>, cat: Category) -> bool {
    let positive =
        point.is_some_and(|p| class.ranges().contains(p)) || class.categories().contains(cat);
    positive && !class.excluded().is_some_and(|e| member(e, point, cat))
}

fn boundaries(class: &CharSet, points: &mut BTreeSet<u32>) {
    for r in class.ranges().iter() {
        points.insert(r.start.min(SUPPLEMENTARY_START));
        points.insert((r.end + 1).min(SUPPLEMENTARY_START));
    }
    if let Some(e) = class.excluded() {
        boundaries(e, points);
    }
}

fn uniform(row: &Row) -> Option<Option<usize>> {
    let first = *row.first()?;
    row.iter().all(|t| *t == first).then_some(first)
}

fn group(cats: &[Category], row: &Row) -> Vec<CategoryTransition> {
    let mut by_target: BTreeMap<usize, Categories> = BTreeMap::new();
    for (cat, target) in cats.iter().zip(row) {
        if let Some(t) = target {
            by_target.entry(*t).or_default().insert(*cat);
        }
    }
    by_target
        .into_iter()
        .map(|(target, categories)| CategoryTransition { categories, target })
        .collect()
}
