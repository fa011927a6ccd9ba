//! LALR(1) parser states and action tables.
//!
//! [`Grammar::create_parser_states`] builds the table with no resolver, so
//! every conflict that is not settled by an explicit `shift_on`/`reduce_on`
//! override fails. [`Grammar::create_parser_states_with`] consults a
//! [`ConflictResolver`] first.
//!
//! State 0 is the initial state. The augmented production `$accept -> goal`
//! has id `ProductionId(grammar.production_count())`; reducing it on `$end`
//! is recorded as [`Action::Accept`].

mod build;
pub mod conflict;

pub use conflict::{ConflictResolver, DefaultResolver, Resolution};

use crate::error::GrammarError;
use crate::grammar::{Grammar, ProductionId, SymbolId};
use std::collections::{BTreeMap, BTreeSet};

/// A production with a dot position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParserItem {
    pub production: ProductionId,
    pub dot: usize,
}

impl ParserItem {
    pub fn advance(self) -> Self {
        Self {
            production: self.production,
            dot: self.dot + 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Shift(usize),
    Reduce(ProductionId),
    Accept,
}

impl Action {
    pub fn is_shift(&self) -> bool {
        matches!(self, Action::Shift(_))
    }
}

#[derive(Clone, Debug)]
pub struct ParserState {
    pub(crate) id: usize,
    pub(crate) kernel: Vec<ParserItem>,
    pub(crate) lookaheads: Vec<BTreeSet<SymbolId>>,
    pub(crate) gotos: BTreeMap<SymbolId, usize>,
    pub(crate) actions: BTreeMap<SymbolId, Action>,
    pub(crate) accessing_symbol: Option<SymbolId>,
}

impl ParserState {
    pub fn id(&self) -> usize {
        self.id
    }

    /// Kernel items, sorted.
    pub fn kernel(&self) -> &[ParserItem] {
        &self.kernel
    }

    /// Lookaheads of each kernel item, parallel to [`kernel`](Self::kernel).
    pub fn lookaheads(&self) -> &[BTreeSet<SymbolId>] {
        &self.lookaheads
    }

    /// Transitions on every symbol, terminal or not.
    pub fn gotos(&self) -> &BTreeMap<SymbolId, usize> {
        &self.gotos
    }

    pub fn actions(&self) -> &BTreeMap<SymbolId, Action> {
        &self.actions
    }

    pub fn action(&self, symbol: SymbolId) -> Option<Action> {
        self.actions.get(&symbol).copied()
    }

    /// The symbol every transition into this state crosses; `None` for
    /// state 0.
    pub fn accessing_symbol(&self) -> Option<SymbolId> {
        self.accessing_symbol
    }
}

/// The LALR(1) automaton of a grammar for one goal symbol.
#[derive(Clone, Debug)]
pub struct ParserTable {
    pub(crate) states: Vec<ParserState>,
    pub(crate) goal: SymbolId,
    pub(crate) accept: ProductionId,
}

impl ParserTable {
    pub fn states(&self) -> &[ParserState] {
        &self.states
    }

    pub fn state(&self, id: usize) -> &ParserState {
        &self.states[id]
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn goal(&self) -> SymbolId {
        self.goal
    }

    /// Id of the augmented `$accept -> goal` production.
    pub fn accept_production(&self) -> ProductionId {
        self.accept
    }

    pub fn action(&self, state: usize, symbol: SymbolId) -> Option<Action> {
        self.states.get(state)?.action(symbol)
    }

    pub fn goto(&self, state: usize, symbol: SymbolId) -> Option<usize> {
        self.states.get(state)?.gotos.get(&symbol).copied()
    }

    /// Follows gotos from `from` across `symbols`.
    pub fn get_state(&self, from: usize, symbols: &[SymbolId]) -> Option<usize> {
        symbols
            .iter()
            .try_fold(from, |state, sym| self.goto(state, *sym))
    }

    /// Body of `production`, including the augmented one.
    pub fn body<'a>(&'a self, grammar: &'a Grammar, production: ProductionId) -> &'a [SymbolId] {
        if production == self.accept {
            std::slice::from_ref(&self.goal)
        } else {
            grammar.production(production).body()
        }
    }

    /// Name of `production`, `$accept` for the augmented one.
    pub fn production_name<'a>(&self, grammar: &'a Grammar, production: ProductionId) -> &'a str {
        if production == self.accept {
            "$accept"
        } else {
            grammar.production(production).name()
        }
    }
}

impl Grammar {
    /// Builds the LALR(1) table for `goal`; any conflict without an explicit
    /// override fails.
    pub fn create_parser_states(&self, goal: SymbolId) -> Result<ParserTable, GrammarError> {
        build::Builder::new(self, goal)?.build(None)
    }

    /// Builds the LALR(1) table for `goal`, asking `resolver` about the
    /// conflicts that explicit overrides leave open.
    pub fn create_parser_states_with(
        &self,
        goal: SymbolId,
        resolver: &dyn ConflictResolver,
    ) -> Result<ParserTable, GrammarError> {
        build::Builder::new(self, goal)?.build(Some(resolver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Precedence;

    fn precedence(name: &str) -> u8 {
        match name {
            "plus" | "minus" => 1,
            "star" | "slash" => 2,
            _ => 0,
        }
    }

    impl ConflictResolver for Precedence {
        fn resolve_shift_conflict(&self, grammar: &Grammar, symbol: SymbolId, production: ProductionId) -> Resolution {
            let op = grammar
                .production(production)
                .body()
                .get(1)
                .map(|s| precedence(grammar.name(*s)))
                .unwrap_or(0);
            if precedence(grammar.name(symbol)) > op {
                Resolution::Shift
            } else {
                Resolution::Reduce
            }
        }
    }

    fn arithmetic() -> Grammar {
        let mut g = Grammar::new();
        g.create_terminal("num", "[0-9]+").unwrap();
        g.create_terminal("plus", "\\+").unwrap();
        g.create_terminal("minus", "-").unwrap();
        g.create_terminal("star", "\\*").unwrap();
        g.create_terminal("slash", "/").unwrap();
        let expr = g.create_non_terminal("expr").unwrap();
        g.add_rule(expr, "expr:add", "expr plus expr").unwrap();
        g.add_rule(expr, "expr:sub", "expr minus expr").unwrap();
        g.add_rule(expr, "expr:mul", "expr star expr").unwrap();
        g.add_rule(expr, "expr:div", "expr slash expr").unwrap();
        g.add_rule(expr, "expr:num", "num").unwrap();
        g
    }

    fn ids(g: &Grammar, names: &[&str]) -> Vec<SymbolId> {
        names.iter().map(|n| g.symbol(n).unwrap()).collect()
    }

    #[test]
    fn resolver_encodes_precedence_and_associativity() {
        let _ = env_logger::builder().is_test(true).try_init();
        let g = arithmetic();
        let expr = g.symbol("expr").unwrap();
        let table = g.create_parser_states_with(expr, &Precedence).unwrap();
        let add = g.production_named("expr:add").unwrap().id();

        let state = table.get_state(0, &ids(&g, &["expr", "plus", "expr"])).unwrap();
        assert!(matches!(table.action(state, g.symbol("star").unwrap()), Some(Action::Shift(_))));
        assert_eq!(table.action(state, g.symbol("plus").unwrap()), Some(Action::Reduce(add)));
        assert_eq!(table.action(state, Grammar::END), Some(Action::Reduce(add)));

        let mul = g.production_named("expr:mul").unwrap().id();
        let state = table.get_state(0, &ids(&g, &["expr", "star", "expr"])).unwrap();
        assert_eq!(table.action(state, g.symbol("plus").unwrap()), Some(Action::Reduce(mul)));
        assert_eq!(table.action(state, g.symbol("slash").unwrap()), Some(Action::Reduce(mul)));
    }

    #[test]
    fn ambiguous_arithmetic_fails_without_resolver() {
        let g = arithmetic();
        let err = g.create_parser_states(g.symbol("expr").unwrap()).unwrap_err();
        assert!(matches!(err, GrammarError::ShiftReduce { .. }));
    }

    fn dangling_else(shift_on_else: bool) -> Grammar {
        let mut g = Grammar::new();
        g.create_terminal("if", "if").unwrap();
        g.create_terminal("else", "else").unwrap();
        g.create_terminal("x", "x").unwrap();
        let stmnt = g.create_non_terminal("stmnt").unwrap();
        let rule = g.add_rule(stmnt, "stmnt:if", "if stmnt").unwrap();
        if shift_on_else {
            rule.shift_on(&["else"]).unwrap();
        }
        g.add_rule(stmnt, "stmnt:ifelse", "if stmnt else stmnt").unwrap();
        g.add_rule(stmnt, "stmnt:x", "x").unwrap();
        g
    }

    #[test]
    fn dangling_else_needs_explicit_shift() {
        let _ = env_logger::builder().is_test(true).try_init();
        let g = dangling_else(false);
        let err = g.create_parser_states(g.symbol("stmnt").unwrap()).unwrap_err();
        assert!(matches!(err, GrammarError::ShiftReduce { .. }));
        assert_eq!(err.symbol(), Some("else"));
        assert!(err.productions().iter().any(|p| p.as_str() == "stmnt:if"));

        let g = dangling_else(true);
        let table = g.create_parser_states(g.symbol("stmnt").unwrap()).unwrap();
        let state = table.get_state(0, &ids(&g, &["if", "stmnt"])).unwrap();
        assert!(matches!(table.action(state, g.symbol("else").unwrap()), Some(Action::Shift(_))));
        let if_ = g.production_named("stmnt:if").unwrap().id();
        assert_eq!(table.action(state, Grammar::END), Some(Action::Reduce(if_)));
    }

    #[test]
    fn two_token_lookahead_is_rejected() {
        let mut g = Grammar::new();
        for (name, pattern) in [("a", "a"), ("b", "b"), ("c", "c"), ("x", "x")] {
            g.create_terminal(name, pattern).unwrap();
        }
        let s = g.create_non_terminal("s").unwrap();
        let a = g.create_non_terminal("A").unwrap();
        let b = g.create_non_terminal("B").unwrap();
        g.add_rule(s, "s:ab", "A a b").unwrap();
        g.add_rule(s, "s:ac", "B a c").unwrap();
        g.add_rule(a, "A:x", "x").unwrap();
        g.add_rule(b, "B:x", "x").unwrap();
        let err = g.create_parser_states_with(s, &DefaultResolver).unwrap_err();
        assert!(matches!(err, GrammarError::ReduceReduce { .. }));
        assert_eq!(err.symbol(), Some("a"));
        assert_eq!(err.productions().len(), 2);
    }

    struct PreferParams;

    impl ConflictResolver for PreferParams {
        fn resolve_core_conflicts(
            &self,
            grammar: &Grammar,
            _symbol: SymbolId,
            items: &[ParserItem],
        ) -> Option<Vec<ParserItem>> {
            Some(
                items
                    .iter()
                    .copied()
                    .filter(|i| grammar.production(i.production).name() == "param:id")
                    .collect(),
            )
        }
    }

    #[test]
    fn core_conflict_keeps_the_resolvers_items() {
        let mut g = Grammar::new();
        g.create_terminal("lparen", "\\(").unwrap();
        g.create_terminal("rparen", "\\)").unwrap();
        g.create_terminal("arrow", "=>").unwrap();
        g.create_terminal("id", "[a-z]+").unwrap();
        let s = g.create_non_terminal("s").unwrap();
        let param = g.create_non_terminal("param").unwrap();
        let expr = g.create_non_terminal("expr").unwrap();
        g.add_rule(s, "s:lambda", "lparen param rparen arrow expr").unwrap();
        g.add_rule(s, "s:group", "lparen expr rparen").unwrap();
        g.add_rule(param, "param:id", "id").unwrap();
        g.add_rule(expr, "expr:id", "id").unwrap();

        assert!(g.create_parser_states(s).is_err());

        let table = g.create_parser_states_with(s, &PreferParams).unwrap();
        let state = table.get_state(0, &ids(&g, &["lparen", "id"])).unwrap();
        let param_id = g.production_named("param:id").unwrap().id();
        assert_eq!(table.action(state, g.symbol("rparen").unwrap()), Some(Action::Reduce(param_id)));
    }

    #[test]
    fn construction_is_deterministic() {
        let g = arithmetic();
        let expr = g.symbol("expr").unwrap();
        let a = g.create_parser_states_with(expr, &Precedence).unwrap();
        let b = g.create_parser_states_with(expr, &Precedence).unwrap();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.states().iter().zip(b.states()) {
            assert_eq!(x.kernel(), y.kernel());
            assert_eq!(x.actions(), y.actions());
            assert_eq!(x.gotos(), y.gotos());
        }
        let done = a.get_state(0, &[expr]).unwrap();
        assert_eq!(a.action(done, Grammar::END), Some(Action::Accept));
        assert_eq!(a.state(done).accessing_symbol(), Some(expr));
        assert_eq!(a.state(0).accessing_symbol(), None);
        assert_eq!(a.production_name(&g, a.accept_production()), "$accept");
    }

    #[test]
    fn line_break_markers_select_the_action() {
        let mut g = Grammar::new();
        g.create_terminal("id", "[a-z]+").unwrap();
        g.create_terminal("semi", ";").unwrap();
        let list = g.create_non_terminal("list").unwrap();
        let stmt = g.create_non_terminal("stmt").unwrap();
        let expr = g.create_non_terminal("expr").unwrap();
        g.add_rule(list, "list:one", "stmt").unwrap();
        g.add_rule(list, "list:more", "list stmt").unwrap();
        g.add_rule(stmt, "stmt:semi", "expr semi").unwrap();
        g.add_rule(stmt, "stmt:nl", "expr $nl").unwrap();
        g.add_rule(expr, "expr:id", "id").unwrap();
        g.add_rule(expr, "expr:apply", "expr $nonl id").unwrap();
        let table = g.create_parser_states(list).unwrap();

        let after_expr = table.get_state(0, &[expr]).unwrap();
        let on_nl = table.action(after_expr, Grammar::LINE_BREAK);
        let on_nonl = table.action(after_expr, Grammar::NO_LINE_BREAK);
        assert!(matches!(on_nl, Some(Action::Shift(_))));
        assert!(matches!(on_nonl, Some(Action::Shift(_))));
        assert_ne!(on_nl, on_nonl);

        let id = g.symbol("id").unwrap();
        let nl = g.production_named("stmt:nl").unwrap().id();
        let terminated = table.get_state(0, &[expr, Grammar::LINE_BREAK]).unwrap();
        assert_eq!(table.action(terminated, id), Some(Action::Reduce(nl)));
        assert_eq!(table.action(terminated, Grammar::END), Some(Action::Reduce(nl)));
        let applied = table.get_state(0, &[expr, Grammar::NO_LINE_BREAK]).unwrap();
        assert!(matches!(table.action(applied, id), Some(Action::Shift(_))));
    }

    #[test]
    fn lookahead_override_replaces_follow() {
        let mut g = Grammar::new();
        g.create_terminal("x", "x").unwrap();
        g.create_terminal("y", "y").unwrap();
        g.create_terminal("z", "z").unwrap();
        let s = g.create_non_terminal("s").unwrap();
        let b = g.create_non_terminal("b").unwrap();
        g.add_rule(s, "s:main", "b x")
            .unwrap()
            .override_lookaheads("b", &["y"])
            .unwrap();
        g.add_rule(b, "b:z", "z").unwrap();
        let table = g.create_parser_states(s).unwrap();
        let state = table.get_state(0, &ids(&g, &["z"])).unwrap();
        let bz = g.production_named("b:z").unwrap().id();
        assert_eq!(table.action(state, g.symbol("y").unwrap()), Some(Action::Reduce(bz)));
        assert_eq!(table.action(state, g.symbol("x").unwrap()), None);
    }

    #[test]
    fn goal_is_validated() {
        let mut g = Grammar::new();
        let x = g.create_terminal("x", "x").unwrap();
        let s = g.create_non_terminal("s").unwrap();
        let t = g.create_non_terminal("t").unwrap();
        assert!(matches!(g.create_parser_states(x), Err(GrammarError::InvalidGoal(_))));
        g.add_rule(s, "s:t", "t x").unwrap();
        assert!(matches!(
            g.create_parser_states(s),
            Err(GrammarError::EmptyNonTerminal(n)) if n.as_str() == "t"
        ));
        g.add_rule(t, "t:empty", "").unwrap();
        let table = g.create_parser_states(s).unwrap();
        let t_empty = g.production_named("t:empty").unwrap().id();
        assert_eq!(table.action(0, x), Some(Action::Reduce(t_empty)));
    }
}
