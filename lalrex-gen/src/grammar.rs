//! Grammar model: symbols, productions and the incremental builder.
//!
//! Symbols are created in order and referenced by name in production bodies.
//! A body may only name symbols that already exist, so non-terminals must be
//! declared before the first rule that mentions them.
//!
//! ```
//! use lalrex_gen::grammar::Grammar;
//!
//! let mut g = Grammar::new();
//! let num = g.create_terminal("num", "[0-9]+").unwrap();
//! g.create_terminal("plus", "\\+").unwrap();
//! g.create_trivia("ws", "[ \\t]+").unwrap();
//! let expr = g.create_non_terminal("expr").unwrap();
//! g.add_rule(expr, "expr:add", "expr plus num").unwrap();
//! g.add_rule(expr, "expr:num", "num").unwrap();
//! assert_eq!(g.symbol("num"), Some(num));
//! assert_eq!(g.productions_of(expr).count(), 2);
//! ```

use crate::error::DefinitionError;
use crate::lexical::{LexicalAutomaton, TerminalPattern};
use crate::regex::Pattern;
use indexmap::IndexMap;
use smartstring::alias::String;
use std::collections::BTreeSet;
use std::fmt;

/// Dense index of a symbol within its grammar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub usize);

/// Dense index of a production within its grammar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductionId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Terminal,
    NonTerminal,
    /// `$end`
    EndOfSource,
    /// `$nl`: a line break precedes the next token.
    LineBreak,
    /// `$nonl`: no line break precedes the next token.
    NoLineBreak,
}

/// Per-terminal configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TerminalOptions {
    /// Stop at the first accepting position instead of the longest.
    pub lazy: bool,
    /// Matched and skipped by the scanner; never seen by the parser.
    pub trivia: bool,
}

/// Grammar-wide build configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GrammarOptions {
    pub case_insensitive: bool,
}

#[derive(Clone, Debug)]
pub struct Symbol {
    id: SymbolId,
    name: String,
    kind: SymbolKind,
    pattern: Option<Pattern>,
    options: TerminalOptions,
}

impl Symbol {
    pub fn id(&self) -> SymbolId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn is_non_terminal(&self) -> bool {
        self.kind == SymbolKind::NonTerminal
    }

    /// Terminals and the structural markers: everything that can label a
    /// parser action.
    pub fn is_terminal_like(&self) -> bool {
        self.kind != SymbolKind::NonTerminal
    }

    pub fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }

    pub fn options(&self) -> TerminalOptions {
        self.options
    }
}

#[derive(Clone, Debug)]
pub struct Production {
    id: ProductionId,
    name: String,
    head: SymbolId,
    body: Vec<SymbolId>,
    shift_on: BTreeSet<SymbolId>,
    reduce_on: BTreeSet<SymbolId>,
    lookahead_overrides: Vec<(SymbolId, BTreeSet<SymbolId>)>,
}

impl Production {
    pub fn id(&self) -> ProductionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn head(&self) -> SymbolId {
        self.head
    }

    pub fn body(&self) -> &[SymbolId] {
        &self.body
    }

    /// Symbols on which a conflict with this production's reduction is
    /// settled as a shift.
    pub fn shift_on(&self) -> &BTreeSet<SymbolId> {
        &self.shift_on
    }

    /// Symbols on which this production's reduction wins any conflict.
    pub fn reduce_on(&self) -> &BTreeSet<SymbolId> {
        &self.reduce_on
    }

    /// Exact lookaheads for the items introduced at body occurrences of the
    /// given marker symbol.
    pub fn lookahead_override(&self, marker: SymbolId) -> Option<&BTreeSet<SymbolId>> {
        self.lookahead_overrides
            .iter()
            .find(|(m, _)| *m == marker)
            .map(|(_, syms)| syms)
    }
}

#[derive(Clone, Debug)]
pub struct Grammar {
    options: GrammarOptions,
    symbols: IndexMap<String, Symbol>,
    productions: IndexMap<String, Production>,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar {
    pub const END: SymbolId = SymbolId(0);
    pub const LINE_BREAK: SymbolId = SymbolId(1);
    pub const NO_LINE_BREAK: SymbolId = SymbolId(2);

    pub fn new() -> Self {
        Self::with_options(GrammarOptions::default())
    }

    pub fn with_options(options: GrammarOptions) -> Self {
        let mut g = Self {
            options,
            symbols: IndexMap::new(),
            productions: IndexMap::new(),
        };
        for (name, kind) in [
            ("$end", SymbolKind::EndOfSource),
            ("$nl", SymbolKind::LineBreak),
            ("$nonl", SymbolKind::NoLineBreak),
        ] {
            g.insert_symbol(name, kind, None, TerminalOptions::default());
        }
        g
    }

    pub fn options(&self) -> GrammarOptions {
        self.options
    }

    fn insert_symbol(
        &mut self,
        name: &str,
        kind: SymbolKind,
        pattern: Option<Pattern>,
        options: TerminalOptions,
    ) -> SymbolId {
        let id = SymbolId(self.symbols.len());
        self.symbols.insert(
            name.into(),
            Symbol {
                id,
                name: name.into(),
                kind,
                pattern,
                options,
            },
        );
        id
    }

    fn check_new(&self, name: &str) -> Result<(), DefinitionError> {
        if self.symbols.contains_key(name) {
            return Err(DefinitionError::DuplicateSymbol(name.into()));
        }
        Ok(())
    }

    /// Declares a terminal matched by pattern text.
    pub fn create_terminal(&mut self, name: &str, pattern: &str) -> Result<SymbolId, DefinitionError> {
        self.create_terminal_text(name, pattern, TerminalOptions::default())
    }

    pub fn create_lazy_terminal(&mut self, name: &str, pattern: &str) -> Result<SymbolId, DefinitionError> {
        self.create_terminal_text(
            name,
            pattern,
            TerminalOptions {
                lazy: true,
                ..TerminalOptions::default()
            },
        )
    }

    /// Declares a terminal that the scanner skips (whitespace, comments).
    pub fn create_trivia(&mut self, name: &str, pattern: &str) -> Result<SymbolId, DefinitionError> {
        self.create_terminal_text(
            name,
            pattern,
            TerminalOptions {
                trivia: true,
                ..TerminalOptions::default()
            },
        )
    }

    pub fn create_terminal_text(
        &mut self,
        name: &str,
        pattern: &str,
        options: TerminalOptions,
    ) -> Result<SymbolId, DefinitionError> {
        self.check_new(name)?;
        let pattern = Pattern::parse(pattern).map_err(|source| DefinitionError::Pattern {
            terminal: name.into(),
            source,
        })?;
        self.create_terminal_from(name, pattern, options)
    }

    /// Declares a terminal from an assembled pattern tree.
    pub fn create_terminal_from(
        &mut self,
        name: &str,
        pattern: Pattern,
        options: TerminalOptions,
    ) -> Result<SymbolId, DefinitionError> {
        self.check_new(name)?;
        if pattern.is_nullable() {
            return Err(DefinitionError::EmptyMatch(name.into()));
        }
        Ok(self.insert_symbol(name, SymbolKind::Terminal, Some(pattern), options))
    }

    pub fn create_non_terminal(&mut self, name: &str) -> Result<SymbolId, DefinitionError> {
        self.check_new(name)?;
        Ok(self.insert_symbol(name, SymbolKind::NonTerminal, None, TerminalOptions::default()))
    }

    /// Adds production `name` for `head` with a space-separated body of
    /// already declared symbol names. An empty body gives an ε-production.
    pub fn add_rule(&mut self, head: SymbolId, name: &str, body: &str) -> Result<RuleBuilder<'_>, DefinitionError> {
        let head_sym = self
            .symbols
            .get_index(head.0)
            .map(|(_, s)| s)
            .ok_or_else(|| DefinitionError::UndeclaredSymbol(format!("#{}", head.0).into()))?;
        if !head_sym.is_non_terminal() {
            return Err(DefinitionError::NotNonTerminal(head_sym.name.clone()));
        }
        if self.productions.contains_key(name) {
            return Err(DefinitionError::DuplicateProduction(name.into()));
        }
        let body = body
            .split_whitespace()
            .map(|s| self.resolve(s))
            .collect::<Result<Vec<_>, _>>()?;
        let id = ProductionId(self.productions.len());
        self.productions.insert(
            name.into(),
            Production {
                id,
                name: name.into(),
                head,
                body,
                shift_on: BTreeSet::new(),
                reduce_on: BTreeSet::new(),
                lookahead_overrides: Vec::new(),
            },
        );
        Ok(RuleBuilder { grammar: self, id })
    }

    /// Reopens an existing production to attach overrides.
    pub fn rule(&mut self, name: &str) -> Result<RuleBuilder<'_>, DefinitionError> {
        let id = self
            .productions
            .get(name)
            .map(|p| p.id)
            .ok_or_else(|| DefinitionError::UnknownProduction(name.into()))?;
        Ok(RuleBuilder { grammar: self, id })
    }

    fn resolve(&self, name: &str) -> Result<SymbolId, DefinitionError> {
        self.symbol(name)
            .ok_or_else(|| DefinitionError::UndeclaredSymbol(name.into()))
    }

    fn resolve_all(&self, names: &[&str]) -> Result<BTreeSet<SymbolId>, DefinitionError> {
        names.iter().map(|n| self.resolve(n)).collect()
    }

    pub fn symbol(&self, name: &str) -> Option<SymbolId> {
        self.symbols.get(name).map(|s| s.id)
    }

    pub fn symbol_info(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn name(&self, id: SymbolId) -> &str {
        self.symbols
            .get_index(id.0)
            .map(|(_, s)| s.name())
            .unwrap_or("?")
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn production(&self, id: ProductionId) -> &Production {
        &self.productions[id.0]
    }

    pub fn production_named(&self, name: &str) -> Option<&Production> {
        self.productions.get(name)
    }

    pub fn productions(&self) -> impl Iterator<Item = &Production> {
        self.productions.values()
    }

    pub fn production_count(&self) -> usize {
        self.productions.len()
    }

    pub fn productions_of(&self, head: SymbolId) -> impl Iterator<Item = &Production> {
        self.productions.values().filter(move |p| p.head == head)
    }

    /// Terminals in declaration order; position `i` is terminal `i` of the
    /// lexical automaton.
    pub fn terminals(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols
            .values()
            .filter(|s| s.kind == SymbolKind::Terminal)
    }

    /// Compiles every terminal pattern into one automaton.
    pub fn create_lexical_automaton(&self) -> LexicalAutomaton {
        let terminals: Vec<TerminalPattern<'_>> = self
            .terminals()
            .filter_map(|s| {
                s.pattern.as_ref().map(|pattern| TerminalPattern {
                    pattern,
                    lazy: s.options.lazy,
                })
            })
            .collect();
        LexicalAutomaton::build(&terminals, self.options.case_insensitive)
    }

    /// `head -> body` with symbol names.
    pub fn format_production(&self, id: ProductionId) -> std::string::String {
        let p = self.production(id);
        let mut s = format!("{} ->", self.name(p.head));
        for sym in &p.body {
            s.push(' ');
            s.push_str(self.name(*sym));
        }
        s
    }
}

/// Fluent access to a production's overrides.
pub struct RuleBuilder<'g> {
    grammar: &'g mut Grammar,
    id: ProductionId,
}

impl<'g> RuleBuilder<'g> {
    pub fn id(&self) -> ProductionId {
        self.id
    }

    fn production(&mut self) -> &mut Production {
        &mut self.grammar.productions[self.id.0]
    }

    /// Prefer shifting over reducing this production on `symbols`.
    pub fn shift_on(mut self, symbols: &[&str]) -> Result<Self, DefinitionError> {
        let set = self.grammar.resolve_all(symbols)?;
        self.production().shift_on.extend(set);
        Ok(self)
    }

    /// Prefer reducing this production on `symbols`.
    pub fn reduce_on(mut self, symbols: &[&str]) -> Result<Self, DefinitionError> {
        let set = self.grammar.resolve_all(symbols)?;
        self.production().reduce_on.extend(set);
        Ok(self)
    }

    /// Replaces the computed lookaheads of the items introduced by closing
    /// over `marker` in this production's body with exactly `symbols`.
    pub fn override_lookaheads(mut self, marker: &str, symbols: &[&str]) -> Result<Self, DefinitionError> {
        let marker_id = self.grammar.resolve(marker)?;
        let set = self.grammar.resolve_all(symbols)?;
        let production = self.production();
        if !production.body.contains(&marker_id) {
            return Err(DefinitionError::MarkerNotInBody {
                production: production.name.clone(),
                symbol: marker.into(),
            });
        }
        production.lookahead_overrides.retain(|(m, _)| *m != marker_id);
        production.lookahead_overrides.push((marker_id, set));
        Ok(self)
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_symbols_come_first() {
        let g = Grammar::new();
        assert_eq!(g.symbol("$end"), Some(Grammar::END));
        assert_eq!(g.symbol("$nl"), Some(Grammar::LINE_BREAK));
        assert_eq!(g.symbol("$nonl"), Some(Grammar::NO_LINE_BREAK));
        assert_eq!(g.symbol_info(Grammar::END).kind(), SymbolKind::EndOfSource);
    }

    #[test]
    fn indices_follow_creation_order() {
        let mut g = Grammar::new();
        let a = g.create_terminal("a", "a").unwrap();
        let s = g.create_non_terminal("s").unwrap();
        assert_eq!(a, SymbolId(3));
        assert_eq!(s, SymbolId(4));
        assert_eq!(g.name(s), "s");
    }

    #[test]
    fn rejects_duplicates_and_forward_references() {
        let mut g = Grammar::new();
        g.create_terminal("a", "a").unwrap();
        let s = g.create_non_terminal("s").unwrap();
        assert!(matches!(
            g.create_non_terminal("a"),
            Err(DefinitionError::DuplicateSymbol(n)) if n.as_str() == "a"
        ));
        assert!(matches!(
            g.add_rule(s, "s:1", "a t"),
            Err(DefinitionError::UndeclaredSymbol(n)) if n.as_str() == "t"
        ));
        g.add_rule(s, "s:1", "a").unwrap();
        assert!(matches!(
            g.add_rule(s, "s:1", "a a"),
            Err(DefinitionError::DuplicateProduction(_))
        ));
        let a = g.symbol("a").unwrap();
        assert!(matches!(
            g.add_rule(a, "a:1", "a"),
            Err(DefinitionError::NotNonTerminal(_))
        ));
    }

    #[test]
    fn pattern_errors_name_the_terminal() {
        let mut g = Grammar::new();
        let err = g.create_terminal("bad", "[a-").unwrap_err();
        assert!(matches!(err, DefinitionError::Pattern { ref terminal, .. } if terminal.as_str() == "bad"));
        assert!(matches!(
            g.create_terminal("empty", "a*"),
            Err(DefinitionError::EmptyMatch(_))
        ));
    }

    #[test]
    fn overrides_are_recorded() {
        let mut g = Grammar::new();
        g.create_terminal("if", "if").unwrap();
        g.create_terminal("else", "else").unwrap();
        g.create_terminal("x", "x").unwrap();
        let s = g.create_non_terminal("s").unwrap();
        let id = g
            .add_rule(s, "s:if", "if s")
            .unwrap()
            .shift_on(&["else"])
            .unwrap()
            .id();
        g.add_rule(s, "s:x", "x").unwrap();
        let else_ = g.symbol("else").unwrap();
        assert!(g.production(id).shift_on().contains(&else_));

        g.rule("s:x").unwrap().reduce_on(&["else"]).unwrap();
        assert!(g.production_named("s:x").unwrap().reduce_on().contains(&else_));

        let err = g.rule("s:x").unwrap().override_lookaheads("s", &["x"]);
        assert!(matches!(err, Err(DefinitionError::MarkerNotInBody { .. })));
        g.rule("s:if").unwrap().override_lookaheads("s", &["else"]).unwrap();
        assert!(g.production(id).lookahead_override(s).is_some());
        assert!(matches!(g.rule("nope"), Err(DefinitionError::UnknownProduction(_))));
    }

    #[test]
    fn lexical_automaton_uses_declaration_order() {
        let mut g = Grammar::with_options(GrammarOptions {
            case_insensitive: true,
        });
        g.create_terminal("kw_if", "if").unwrap();
        g.create_terminal("ident", "[a-z]+").unwrap();
        let lexer = g.create_lexical_automaton();
        let input: Vec<u16> = "IF".encode_utf16().collect();
        assert_eq!(
            lexer.longest_match(&input, true),
            crate::lexical::MatchOutcome::Matched { terminal: 0, len: 2 }
        );
        assert_eq!(g.production_count(), 0);
    }
}
