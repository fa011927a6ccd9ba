//! Thompson-style NFA over UTF-16 code units.
//!
//! Every character set is lowered twice: its BMP part becomes one edge on a
//! unit class, its supplementary part becomes high-surrogate edges into
//! intermediate nodes that continue on the matching low-surrogate ranges.

use crate::charset::CharSet;
use crate::regex::{Pattern, Repeat};
use crate::unicode::{split_surrogates, CodeRange, RangeList, LOW_SURROGATE_START, SURROGATE_END};
use std::collections::BTreeMap;

pub(crate) type NodeId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Accept {
    Terminal(usize),
    Condition,
}

#[derive(Clone, Debug)]
pub(crate) enum Edge {
    Epsilon(NodeId),
    /// Consumes one unit out of the class. The class is BMP-only.
    Units(CharSet, NodeId),
    /// Zero-width test of condition `cond` at the current position.
    Assert {
        cond: usize,
        negated: bool,
        target: NodeId,
    },
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Node {
    pub edges: Vec<Edge>,
    pub accept: Option<Accept>,
    pub owner: Option<usize>,
}

#[derive(Debug, Default)]
pub(crate) struct Nfa {
    pub nodes: Vec<Node>,
    /// Entry node of each lookahead condition.
    pub conditions: Vec<NodeId>,
    case_insensitive: bool,
}

/// Entry and exit of a compiled sub-pattern.
#[derive(Clone, Copy)]
struct Fragment {
    entry: NodeId,
    exit: NodeId,
}

impl Nfa {
    pub(crate) fn new(case_insensitive: bool) -> Self {
        Self {
            case_insensitive,
            ..Self::default()
        }
    }

    /// Adds `pattern` as terminal `terminal` and returns its entry node.
    pub(crate) fn add_terminal(&mut self, pattern: &Pattern, terminal: usize) -> NodeId {
        let frag = self.compile(pattern, Some(terminal));
        self.nodes[frag.exit].accept = Some(Accept::Terminal(terminal));
        frag.entry
    }

    pub(crate) fn add_node(&mut self, owner: Option<usize>) -> NodeId {
        self.nodes.push(Node {
            owner,
            ..Node::default()
        });
        self.nodes.len() - 1
    }

    pub(crate) fn add_edge(&mut self, from: NodeId, edge: Edge) {
        self.nodes[from].edges.push(edge);
    }

    fn compile(&mut self, pattern: &Pattern, owner: Option<usize>) -> Fragment {
        match pattern {
            Pattern::Text(text) => {
                let entry = self.add_node(owner);
                let mut exit = entry;
                for c in text.chars() {
                    let set = CharSet::from_char(c);
                    let frag = self.compile_set(&set, owner);
                    self.add_edge(exit, Edge::Epsilon(frag.entry));
                    exit = frag.exit;
                }
                Fragment { entry, exit }
            }
            Pattern::Set(set) => self.compile_set(set, owner),
            Pattern::Concat(items) => {
                let entry = self.add_node(owner);
                let mut exit = entry;
                for item in items {
                    let frag = self.compile(item, owner);
                    self.add_edge(exit, Edge::Epsilon(frag.entry));
                    exit = frag.exit;
                }
                Fragment { entry, exit }
            }
            Pattern::Alternate(items) => {
                let entry = self.add_node(owner);
                let exit = self.add_node(owner);
                for item in items {
                    let frag = self.compile(item, owner);
                    self.add_edge(entry, Edge::Epsilon(frag.entry));
                    self.add_edge(frag.exit, Edge::Epsilon(exit));
                }
                Fragment { entry, exit }
            }
            Pattern::Repeat(inner, kind) => {
                let entry = self.add_node(owner);
                let exit = self.add_node(owner);
                let frag = self.compile(inner, owner);
                self.add_edge(entry, Edge::Epsilon(frag.entry));
                self.add_edge(frag.exit, Edge::Epsilon(exit));
                if matches!(kind, Repeat::ZeroOrMore | Repeat::OneOrMore) {
                    self.add_edge(frag.exit, Edge::Epsilon(frag.entry));
                }
                if matches!(kind, Repeat::ZeroOrMore | Repeat::Optional) {
                    self.add_edge(entry, Edge::Epsilon(exit));
                }
                Fragment { entry, exit }
            }
            Pattern::Lookahead { pattern, negated } => {
                let cond = self.compile(pattern, None);
                self.nodes[cond.exit].accept = Some(Accept::Condition);
                self.conditions.push(cond.entry);
                let entry = self.add_node(owner);
                let exit = self.add_node(owner);
                self.add_edge(
                    entry,
                    Edge::Assert {
                        cond: self.conditions.len() - 1,
                        negated: *negated,
                        target: exit,
                    },
                );
                Fragment { entry, exit }
            }
        }
    }

    fn compile_set(&mut self, set: &CharSet, owner: Option<usize>) -> Fragment {
        let folded;
        let set = if self.case_insensitive {
            folded = set.to_any_case();
            &folded
        } else {
            set
        };
        let entry = self.add_node(owner);
        let exit = self.add_node(owner);
        let bmp = set.to_bmp();
        if !bmp.is_empty() {
            self.add_edge(entry, Edge::Units(bmp, exit));
        }
        for (high, low) in surrogate_pairs(&set.supplementary()) {
            let mid = self.add_node(owner);
            self.add_edge(entry, Edge::Units(CharSet::from_ranges(RangeList::from_ranges([high])), mid));
            self.add_edge(mid, Edge::Units(CharSet::from_ranges(low), exit));
        }
        Fragment { entry, exit }
    }
}

/// Splits supplementary code points into runs of high surrogates sharing the
/// same set of low surrogates.
pub(crate) fn surrogate_pairs(supplementary: &RangeList) -> Vec<(CodeRange, RangeList)> {
    let mut lows: BTreeMap<u32, Vec<CodeRange>> = BTreeMap::new();
    for r in supplementary.iter() {
        let (hs, ls) = split_surrogates(r.start);
        let (he, le) = split_surrogates(r.end);
        if hs == he {
            lows.entry(hs).or_default().push(CodeRange::new(ls, le));
            continue;
        }
        lows.entry(hs)
            .or_default()
            .push(CodeRange::new(ls, SURROGATE_END));
        for h in hs + 1..he {
            lows.entry(h)
                .or_default()
                .push(CodeRange::new(LOW_SURROGATE_START, SURROGATE_END));
        }
        lows.entry(he)
            .or_default()
            .push(CodeRange::new(LOW_SURROGATE_START, le));
    }

    let mut out: Vec<(CodeRange, RangeList)> = Vec::new();
    for (high, ranges) in lows {
        let ranges = RangeList::from_ranges(ranges);
        match out.last_mut() {
            Some((prev, prev_lows)) if prev.end + 1 == high && *prev_lows == ranges => {
                prev.end = high;
            }
            _ => out.push((CodeRange::single(high), ranges)),
        }
    }
    out
}
