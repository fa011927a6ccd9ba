//! Human-readable dumps of productions, parser states and lexical states.
//!
//! The output is line oriented and comma tagged so it can be grepped or
//! diffed:
//!
//! ```text
//! PS,<number of productions>
//!
//! P,<index>,<name>,<head> -> <body>
//! ```

use crate::grammar::{Grammar, SymbolId};
use crate::lalr::{Action, ParserTable};
use crate::lexical::{CategoryTransition, LexicalAutomaton, LexicalState};
use std::collections::BTreeSet;
use std::io::{self, Write};

/// Writes every production of `grammar`.
pub fn write_prods<W: Write>(out: &mut W, grammar: &Grammar) -> io::Result<()> {
    writeln!(out, "PS,{}\n", grammar.production_count())?;
    for prod in grammar.productions() {
        writeln!(
            out,
            "P,{},{},{}",
            prod.id().0,
            prod.name(),
            grammar.format_production(prod.id())
        )?;
    }
    Ok(())
}

fn write_symbols<W: Write>(out: &mut W, grammar: &Grammar, set: &BTreeSet<SymbolId>) -> io::Result<()> {
    write!(out, "{{")?;
    for (i, sym) in set.iter().enumerate() {
        if i > 0 {
            write!(out, ", ")?;
        }
        write!(out, "{}", grammar.name(*sym))?;
    }
    write!(out, "}}")
}

/// Writes each parser state: kernel items with their lookaheads, then the
/// actions and the non-terminal gotos.
///
/// ```text
/// C,<state>,<head> -> <body with a dot>  <lookaheads>
/// A,<state>,<symbol>,<action>
/// G,<state>,<symbol>,<target>
/// ```
pub fn write_states<W: Write>(out: &mut W, grammar: &Grammar, table: &ParserTable) -> io::Result<()> {
    writeln!(out, "CS,{}\n", table.len())?;
    for state in table.states() {
        let i = state.id();
        for (item, las) in state.kernel().iter().zip(state.lookaheads()) {
            let body = table.body(grammar, item.production);
            let head = if item.production == table.accept_production() {
                "$accept"
            } else {
                grammar.name(grammar.production(item.production).head())
            };
            write!(out, "C,{},{} -> ", i, head)?;
            for (j, t) in body.iter().enumerate() {
                if j == item.dot {
                    write!(out, ". ")?;
                }
                write!(out, "{} ", grammar.name(*t))?;
            }
            if body.len() == item.dot {
                write!(out, ". ")?;
            }
            write!(out, " ")?;
            write_symbols(out, grammar, las)?;
            writeln!(out)?;
        }
        for (sym, action) in state.actions() {
            write!(out, "A,{},{},", i, grammar.name(*sym))?;
            match action {
                Action::Shift(s) => writeln!(out, "shift {}", s)?,
                Action::Reduce(p) => writeln!(out, "reduce {}", table.production_name(grammar, *p))?,
                Action::Accept => writeln!(out, "accept")?,
            }
        }
        for (sym, target) in state.gotos() {
            if grammar.symbol_info(*sym).is_non_terminal() {
                writeln!(out, "G,{},{},{}", i, grammar.name(*sym), target)?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_categories<W: Write>(out: &mut W, cats: &[CategoryTransition]) -> io::Result<()> {
    for t in cats {
        write!(out, " {}->{}", t.categories, t.target)?;
    }
    Ok(())
}

fn write_lex_state<W: Write>(out: &mut W, grammar: &Grammar, id: usize, st: &LexicalState) -> io::Result<()> {
    write!(out, "L,{}", id)?;
    if let Some(t) = st.terminal {
        let name = grammar.terminals().nth(t).map(|s| s.name()).unwrap_or("?");
        write!(out, ",accept {}", name)?;
    } else if st.is_final {
        write!(out, ",accept")?;
    }
    writeln!(out)?;
    if let Some(la) = st.lookahead {
        writeln!(
            out,
            "  if {} then {} else {}",
            la.condition, la.on_true, la.on_false
        )?;
    }
    for r in &st.ranges {
        write!(out, "  {}", r.range)?;
        if let Some(d) = r.default {
            write!(out, " ->{}", d)?;
        }
        write_categories(out, &r.categories)?;
        writeln!(out)?;
    }
    if !st.categories.is_empty() {
        write!(out, "  *")?;
        write_categories(out, &st.categories)?;
        writeln!(out)?;
    }
    if let Some(d) = st.default {
        writeln!(out, "  * ->{}", d)?;
    }
    Ok(())
}

/// Writes every state of a lexical automaton; accepting states name the
/// grammar terminal they recognize.
pub fn write_lexer<W: Write>(out: &mut W, grammar: &Grammar, automaton: &LexicalAutomaton) -> io::Result<()> {
    writeln!(out, "LS,{}\n", automaton.states().len())?;
    for (id, st) in automaton.states().iter().enumerate() {
        write_lex_state(out, grammar, id, st)?;
    }
    Ok(())
}
