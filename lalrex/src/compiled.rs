//! An immutable grammar with its tables, ready to drive parsers.

use crate::error::CompileError;
use crate::lexer::terminal_symbols;
use lalrex_gen::{ConflictResolver, Grammar, LexicalAutomaton, ParserTable, SymbolId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A grammar together with its LALR(1) table and lexical automaton.
///
/// Read-only once built, so a single value can back any number of parsers
/// on any number of threads.
#[derive(Debug, Clone)]
pub struct CompiledGrammar {
    grammar: Grammar,
    goal: SymbolId,
    table: ParserTable,
    lexer: LexicalAutomaton,
    terminals: Vec<SymbolId>,
}

impl CompiledGrammar {
    /// Builds the tables without a conflict resolver: every conflict the
    /// grammar does not settle with explicit overrides is an error.
    pub fn compile(grammar: Grammar, goal: &str) -> Result<Self, CompileError> {
        let goal_id = Self::goal_id(&grammar, goal)?;
        let table = grammar.create_parser_states(goal_id)?;
        Ok(Self::assemble(grammar, goal_id, table))
    }

    pub fn compile_with(
        grammar: Grammar,
        goal: &str,
        resolver: &dyn ConflictResolver,
    ) -> Result<Self, CompileError> {
        let goal_id = Self::goal_id(&grammar, goal)?;
        let table = grammar.create_parser_states_with(goal_id, resolver)?;
        Ok(Self::assemble(grammar, goal_id, table))
    }

    fn goal_id(grammar: &Grammar, goal: &str) -> Result<SymbolId, CompileError> {
        grammar
            .symbol(goal)
            .ok_or_else(|| CompileError::UnknownGoal(goal.into()))
    }

    fn assemble(grammar: Grammar, goal: SymbolId, table: ParserTable) -> Self {
        let lexer = grammar.create_lexical_automaton();
        let terminals = terminal_symbols(&grammar);
        log::debug!(
            "compiled grammar for {}: {} parser states, {} lexical states",
            grammar.name(goal),
            table.len(),
            lexer.states().len()
        );
        Self {
            grammar,
            goal,
            table,
            lexer,
            terminals,
        }
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn goal(&self) -> SymbolId {
        self.goal
    }

    pub fn table(&self) -> &ParserTable {
        &self.table
    }

    pub fn lexer(&self) -> &LexicalAutomaton {
        &self.lexer
    }

    /// Grammar symbols of the automaton's terminals, indexed like the
    /// automaton's terminal numbers.
    pub fn terminals(&self) -> &[SymbolId] {
        &self.terminals
    }
}

/// A keyed, process-wide store of compiled grammars.
#[derive(Debug, Default)]
pub struct GrammarCache {
    entries: Mutex<HashMap<String, Arc<CompiledGrammar>>>,
}

impl GrammarCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the grammar cached under `key`, building it with `build`
    /// on first use. A failed build is not cached.
    pub fn get_or_compile<F, E>(&self, key: &str, build: F) -> Result<Arc<CompiledGrammar>, E>
    where
        F: FnOnce() -> Result<CompiledGrammar, E>,
    {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(g) = entries.get(key) {
            return Ok(Arc::clone(g));
        }
        let g = Arc::new(build()?);
        entries.insert(key.to_owned(), Arc::clone(&g));
        Ok(g)
    }

    pub fn get(&self, key: &str) -> Option<Arc<CompiledGrammar>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lalrex_gen::{DefaultResolver, GrammarError};

    fn ambiguous() -> Grammar {
        let mut g = Grammar::new();
        g.create_terminal("num", "[0-9]+").unwrap();
        g.create_terminal("minus", "-").unwrap();
        let expr = g.create_non_terminal("expr").unwrap();
        g.add_rule(expr, "expr:sub", "expr minus expr").unwrap();
        g.add_rule(expr, "expr:num", "num").unwrap();
        g
    }

    #[test]
    fn compile_reports_conflicts_and_unknown_goal() {
        let err = CompiledGrammar::compile(ambiguous(), "expr").unwrap_err();
        assert!(matches!(err, CompileError::Grammar(GrammarError::ShiftReduce { .. })));
        let err = CompiledGrammar::compile(ambiguous(), "stmt").unwrap_err();
        assert!(matches!(err, CompileError::UnknownGoal(ref g) if g.as_str() == "stmt"));
        let ok = CompiledGrammar::compile_with(ambiguous(), "expr", &DefaultResolver).unwrap();
        assert_eq!(ok.grammar().name(ok.goal()), "expr");
        assert_eq!(ok.terminals().len(), 2);
    }

    #[test]
    fn cache_builds_once() {
        let cache = GrammarCache::new();
        let mut builds = 0;
        for _ in 0..3 {
            let g = cache
                .get_or_compile("expr", || {
                    builds += 1;
                    CompiledGrammar::compile_with(ambiguous(), "expr", &DefaultResolver)
                })
                .unwrap();
            assert!(!g.table().is_empty());
        }
        assert_eq!(builds, 1);
        assert!(cache
            .get_or_compile("bad", || CompiledGrammar::compile(ambiguous(), "expr"))
            .is_err());
        assert_eq!(cache.len(), 1);
        assert!(cache.get("bad").is_none());
    }

    #[test]
    fn shared_across_threads() {
        let g = Arc::new(CompiledGrammar::compile_with(ambiguous(), "expr", &DefaultResolver).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let g = Arc::clone(&g);
                std::thread::spawn(move || g.table().len())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), g.table().len());
        }
    }
}
