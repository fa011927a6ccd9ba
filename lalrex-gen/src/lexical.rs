//! The lexical automaton: every terminal pattern of a grammar compiled into
//! one deterministic automaton over UTF-16 code units.
//!
//! Each [`LexicalState`] dispatches a unit first through its sorted list of
//! disjoint [`RangeTransition`]s, then through its category transitions,
//! then through its default. Supplementary code points take two steps: the
//! high surrogate leads into an inner state keyed by the low surrogate.
//! Unpaired surrogates never match.
//!
//! Terminals are numbered in declaration order. When two terminals accept
//! the same longest lexeme, the lower number wins, so keywords declared
//! before the identifier pattern take precedence over it.

mod dfa;
pub(crate) mod nfa;

use crate::error::MatchError;
use crate::regex::Pattern;
use crate::unicode::{Categories, Category, CodeRange};

pub type LexStateId = usize;

/// Transition on any unit whose category is in `categories`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryTransition {
    pub categories: Categories,
    pub target: LexStateId,
}

/// Transitions for units inside `range`: by category when the target
/// depends on it, otherwise `default`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeTransition {
    pub range: CodeRange,
    pub categories: Vec<CategoryTransition>,
    pub default: Option<LexStateId>,
}

/// Zero-width branch: run the automaton from `condition` at the current
/// position and continue in `on_true` if it accepts, otherwise `on_false`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lookahead {
    pub condition: LexStateId,
    pub on_true: LexStateId,
    pub on_false: LexStateId,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LexicalState {
    /// Strictly ascending, pairwise disjoint.
    pub ranges: Vec<RangeTransition>,
    pub categories: Vec<CategoryTransition>,
    pub default: Option<LexStateId>,
    pub is_final: bool,
    /// Terminal accepted in this state (lowest index among candidates).
    pub terminal: Option<usize>,
    pub lookahead: Option<Lookahead>,
}

/// Category of a single UTF-16 unit; surrogate halves are `Cs`.
#[inline]
pub fn unit_category(unit: u16) -> Category {
    Category::of(unit as u32)
}

impl LexicalState {
    /// Next state on `unit`, if any.
    pub fn next(&self, unit: u16) -> Option<LexStateId> {
        let u = unit as u32;
        let i = self.ranges.partition_point(|r| r.range.end < u);
        let (cats, default) = match self.ranges.get(i) {
            Some(r) if r.range.start <= u => (&r.categories, r.default),
            _ => (&self.categories, self.default),
        };
        if !cats.is_empty() {
            let cat = unit_category(unit);
            if let Some(t) = cats.iter().find(|t| t.categories.contains(cat)) {
                return Some(t.target);
            }
        }
        default
    }

    /// No transition leaves this state.
    pub fn is_dead_end(&self) -> bool {
        self.lookahead.is_none()
            && self.default.is_none()
            && self.categories.is_empty()
            && self
                .ranges
                .iter()
                .all(|r| r.default.is_none() && r.categories.is_empty())
    }
}

/// A terminal pattern handed to [`LexicalAutomaton::build`].
#[derive(Clone, Copy, Debug)]
pub struct TerminalPattern<'a> {
    pub pattern: &'a Pattern,
    /// Stop at the first accept instead of the longest one.
    pub lazy: bool,
}

/// Result of running the automaton over a prefix of the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched { terminal: usize, len: usize },
    NoMatch,
    /// The input ended while a longer match was still possible.
    NeedMore,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexicalAutomaton {
    states: Vec<LexicalState>,
    terminals: usize,
}

enum Walk {
    Done(Option<(Option<usize>, usize)>),
    NeedMore,
}

impl LexicalAutomaton {
    pub fn build(terminals: &[TerminalPattern<'_>], case_insensitive: bool) -> LexicalAutomaton {
        let mut nfa = nfa::Nfa::new(case_insensitive);
        let start = nfa.add_node(None);
        for (i, t) in terminals.iter().enumerate() {
            let entry = nfa.add_terminal(t.pattern, i);
            nfa.add_edge(start, nfa::Edge::Epsilon(entry));
        }
        let lazy: Vec<bool> = terminals.iter().map(|t| t.lazy).collect();
        let states = dfa::SubsetBuilder::new(&nfa, &lazy).build(start);
        log::debug!(
            "lexical automaton: {} terminals, {} nfa nodes, {} states",
            terminals.len(),
            nfa.nodes.len(),
            states.len()
        );
        LexicalAutomaton {
            states,
            terminals: terminals.len(),
        }
    }

    pub fn start(&self) -> LexStateId {
        0
    }

    pub fn states(&self) -> &[LexicalState] {
        &self.states
    }

    pub fn state(&self, id: LexStateId) -> &LexicalState {
        &self.states[id]
    }

    pub fn terminal_count(&self) -> usize {
        self.terminals
    }

    /// Longest (or, for lazy terminals, first) match at the start of `input`.
    ///
    /// With `at_end == false`, `input` is a window onto a longer stream and
    /// the result is [`MatchOutcome::NeedMore`] whenever the automaton is
    /// still alive at the end of the window.
    pub fn longest_match(&self, input: &[u16], at_end: bool) -> MatchOutcome {
        match self.walk(self.start(), input, at_end, false) {
            Walk::NeedMore => MatchOutcome::NeedMore,
            Walk::Done(Some((Some(terminal), len))) => MatchOutcome::Matched { terminal, len },
            Walk::Done(_) => MatchOutcome::NoMatch,
        }
    }

    fn walk(&self, start: LexStateId, input: &[u16], at_end: bool, first: bool) -> Walk {
        let mut state = start;
        let mut pos = 0;
        let mut last = None;
        loop {
            while let Some(la) = self.states[state].lookahead {
                state = match self.walk(la.condition, &input[pos..], at_end, true) {
                    Walk::NeedMore => return Walk::NeedMore,
                    Walk::Done(Some(_)) => la.on_true,
                    Walk::Done(None) => la.on_false,
                };
            }
            let st = &self.states[state];
            if st.is_final {
                last = Some((st.terminal, pos));
                if first {
                    break;
                }
            }
            if pos == input.len() {
                if !at_end && !st.is_dead_end() {
                    return Walk::NeedMore;
                }
                break;
            }
            match st.next(input[pos]) {
                Some(next) => {
                    state = next;
                    pos += 1;
                }
                None => break,
            }
        }
        Walk::Done(last)
    }
}

/// A single compiled pattern.
#[derive(Clone, Debug)]
pub struct Matcher {
    automaton: LexicalAutomaton,
}

impl Matcher {
    pub fn new(pattern: &Pattern) -> Matcher {
        Self::with_case(pattern, false)
    }

    pub fn with_case(pattern: &Pattern, case_insensitive: bool) -> Matcher {
        let automaton = LexicalAutomaton::build(
            &[TerminalPattern {
                pattern,
                lazy: false,
            }],
            case_insensitive,
        );
        Matcher { automaton }
    }

    pub fn automaton(&self) -> &LexicalAutomaton {
        &self.automaton
    }

    /// Length in units of the longest match starting at `offset` within
    /// `input[offset..offset + length]`, or `None` when nothing matches.
    pub fn match_length(
        &self,
        input: &[u16],
        offset: usize,
        length: usize,
    ) -> Result<Option<usize>, MatchError> {
        let len = input.len();
        if offset > len {
            return Err(MatchError::OffsetOutOfRange { offset, len });
        }
        if length > len - offset {
            return Err(MatchError::LengthOutOfRange {
                offset,
                length,
                len,
            });
        }
        Ok(
            match self
                .automaton
                .longest_match(&input[offset..offset + length], true)
            {
                MatchOutcome::Matched { len, .. } => Some(len),
                _ => None,
            },
        )
    }

    /// Convenience form over a whole string; the length is in UTF-16 units.
    pub fn match_str(&self, text: &str) -> Option<usize> {
        let units: Vec<u16> = text.encode_utf16().collect();
        self.match_length(&units, 0, units.len()).ok().flatten()
    }
}

impl Pattern {
    pub fn compile(&self) -> Matcher {
        Matcher::new(self)
    }
}
