//! Grammar definition files.
//!
//! A file has a terminal section and a production section separated by a
//! line holding only `%%`:
//!
//! ```text
//! -- terminals
//! num: [0-9]+
//! plus: \+
//! ws: <skip> [ \t]+
//! %%
//! %start Expr
//! add: Expr -> Expr + num
//! Expr -> num
//! ```
//!
//! Production names are `Head:label`, or `Head:<n>` for the n-th unlabelled
//! production of that head. `%shift_on Head:label syms...` and
//! `%reduce_on Head:label syms...` attach overrides; `%nl` and `%nonl` in a
//! body are the line-break markers. Without `%start`, the head of the first
//! production is the goal.

mod lexer;
mod parser;
mod terminals;

pub use lexer::SYM_NAMES;

use crate::grammar::{Grammar, GrammarOptions, SymbolId, TerminalOptions};
use anyhow::{Context, Result, anyhow, bail};
use chumsky::Parser;
use parser::{Item, Symbol};
use std::collections::HashMap;
use std::path::Path;

/// A grammar loaded from text, with its goal symbol.
#[derive(Debug, Clone)]
pub struct GrammarDefinition {
    pub grammar: Grammar,
    pub goal: SymbolId,
}

/// Reads and loads a grammar file.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<GrammarDefinition> {
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.as_ref().display()))?;
    load(&text)
}

/// Loads a grammar from the text of a definition file.
pub fn load(text: &str) -> Result<GrammarDefinition> {
    let (terms_text, prods_text, prods_line) = split_sections(text)?;
    let section = terminals::parse_terminals(terms_text, 1)?;

    let mut prods_text = prods_text.to_string();
    if !prods_text.ends_with('\n') {
        prods_text.push('\n');
    }
    let tokens = lexer::tokenize(&prods_text, prods_line)?;
    let items = parser::parser()
        .parse(&tokens)
        .into_result()
        .map_err(|errs| {
            let msgs: Vec<String> = errs.iter().map(|e| format!("{:?}", e)).collect();
            anyhow!("Syntax error in production section: {}", msgs.join("; "))
        })?;

    let mut grammar = Grammar::with_options(GrammarOptions {
        case_insensitive: section.case_insensitive,
    });
    for t in &section.terminals {
        let options = TerminalOptions {
            lazy: t.lazy,
            trivia: t.skip,
        };
        grammar
            .create_terminal_text(&t.name, &t.pattern, options)
            .with_context(|| format!("Terminal at line {}", t.line_no))?;
    }

    // Non-terminals in order of first appearance: heads first.
    let mut non_terminals: Vec<&str> = Vec::new();
    for item in &items {
        if let Item::Production { head, .. } = item {
            if !non_terminals.contains(&head.as_str()) {
                non_terminals.push(head);
            }
        }
    }
    for item in &items {
        if let Item::Production { body, .. } = item {
            for sym in body {
                if let Symbol::NonTerm(n) = sym {
                    if !non_terminals.contains(&n.as_str()) {
                        non_terminals.push(n);
                    }
                }
            }
        }
    }
    for name in &non_terminals {
        grammar.create_non_terminal(name)?;
    }

    let mut counters: HashMap<&str, usize> = HashMap::new();
    let mut goal: Option<SymbolId> = None;
    let mut first_head: Option<SymbolId> = None;
    for item in &items {
        match item {
            Item::Production { label, head, body } => {
                let head_id = grammar
                    .symbol(head)
                    .ok_or_else(|| anyhow!("Undeclared non-terminal {:?}", head))?;
                first_head.get_or_insert(head_id);
                let counter = counters.entry(head.as_str()).or_insert(0);
                *counter += 1;
                let name = match label {
                    Some(l) => format!("{}:{}", head, l),
                    None => format!("{}:{}", head, counter),
                };
                let body_text = body.iter().map(Symbol::name).collect::<Vec<_>>().join(" ");
                grammar
                    .add_rule(head_id, &name, &body_text)
                    .with_context(|| format!("In production {}", name))?;
            }
            Item::Start(head) => {
                goal = Some(
                    grammar
                        .symbol(head)
                        .ok_or_else(|| anyhow!("Unknown start symbol {:?}", head))?,
                );
            }
            Item::ShiftOn { .. } | Item::ReduceOn { .. } => {}
        }
    }

    // Overrides may name productions declared further down.
    for item in &items {
        match item {
            Item::ShiftOn { production, symbols } => {
                let syms: Vec<&str> = symbols.iter().map(String::as_str).collect();
                grammar
                    .rule(production)?
                    .shift_on(&syms)
                    .with_context(|| format!("In %shift_on {}", production))?;
            }
            Item::ReduceOn { production, symbols } => {
                let syms: Vec<&str> = symbols.iter().map(String::as_str).collect();
                grammar
                    .rule(production)?
                    .reduce_on(&syms)
                    .with_context(|| format!("In %reduce_on {}", production))?;
            }
            _ => {}
        }
    }

    let goal = match goal.or(first_head) {
        Some(goal) => goal,
        None => bail!("Grammar has no productions"),
    };
    log::debug!(
        "loaded grammar: {} symbols, {} productions, goal {}",
        grammar.symbol_count(),
        grammar.production_count(),
        grammar.name(goal)
    );
    Ok(GrammarDefinition { grammar, goal })
}

/// Splits at the `%%` line; returns both sections and the 1-based line
/// number where the second one starts.
fn split_sections(text: &str) -> Result<(&str, &str, usize)> {
    let mut offset = 0;
    for (i, line) in text.split_inclusive('\n').enumerate() {
        if line.trim() == "%%" {
            return Ok((&text[..offset], &text[offset + line.len()..], i + 2));
        }
        offset += line.len();
    }
    bail!("Missing %% separator between terminal and production sections")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lalr::Action;

    const CALC: &str = r#"
-- a tiny calculator
DIGIT = [0-9]
num: {{DIGIT}}+
plus: \+
asterisk: \*
leftParen: \(
rightParen: \)
ws: <skip> [ \t\r\n]+
%%
%start Expr
add: Expr -> Expr + Term
Expr -> Term
mul: Term -> Term * Factor
Term -> Factor
Factor -> ( Expr )
Factor -> num
"#;

    #[test]
    fn loads_and_builds() {
        let _ = env_logger::builder().is_test(true).try_init();
        let def = load(CALC).unwrap();
        let g = &def.grammar;
        assert_eq!(g.name(def.goal), "Expr");
        assert_eq!(g.production_count(), 6);
        assert!(g.production_named("Expr:add").is_some());
        assert!(g.production_named("Expr:2").is_some());
        assert!(g.production_named("Factor:2").is_some());
        assert!(g.symbol_info(g.symbol("ws").unwrap()).options().trivia);

        let table = g.create_parser_states(def.goal).unwrap();
        let done = table.get_state(0, &[def.goal]).unwrap();
        assert_eq!(table.action(done, Grammar::END), Some(Action::Accept));
    }

    #[test]
    fn overrides_and_markers() {
        let text = "if: if\nelse: else\nx: x\n%%\nif: S -> if S\nS -> if S else S\nS -> x %nl\n%shift_on S:if else\n";
        let def = load(text).unwrap();
        let g = &def.grammar;
        let p = g.production_named("S:if").unwrap();
        assert!(p.shift_on().contains(&g.symbol("else").unwrap()));
        let p = g.production_named("S:3").unwrap();
        assert_eq!(p.body().last(), Some(&Grammar::LINE_BREAK));
        assert!(g.create_parser_states(def.goal).is_ok());
    }

    #[test]
    fn reports_errors() {
        assert!(load("num: [0-9]+\n").is_err());
        let err = load("num: [0-9]+\n%%\nS -> num plus\n").unwrap_err();
        assert!(format!("{:#}", err).contains("plus"));
        let err = load("num: [0-9\n%%\nS -> num\n").unwrap_err();
        assert!(format!("{:#}", err).contains("line 1"));
        assert!(load("num: [0-9]+\n%%\n").is_err());
    }
}
