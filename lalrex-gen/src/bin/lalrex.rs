//! Command-line interface for the `lalrex` generator.
//!
//! Loads a grammar definition file, builds its lexical automaton and
//! LALR(1) table, and prints the requested dumps. A conflict is reported
//! with the offending symbol and productions.

#[cfg(feature = "cli")]
mod real {
    use anyhow::Context;
    use clap::Parser;
    use lalrex_gen::dump;
    use lalrex_gen::grammar_file;
    use std::io::Write;
    use std::path::PathBuf;

    #[derive(Parser)]
    #[command(about = "Build lexer and LALR(1) tables from a grammar file")]
    struct Args {
        /// Path to the grammar definition file
        #[arg(short = 'g', long)]
        grammar: PathBuf,

        /// Print the productions.
        #[arg(short = 'p', long)]
        productions: bool,

        /// Print the parser states.
        #[arg(short = 's', long)]
        states: bool,

        /// Print the lexical automaton.
        #[arg(short = 'l', long)]
        lexer: bool,

        /// Enable debug logging (off by default).
        #[arg(short = 'd', long)]
        debug: bool,
    }

    pub fn main() -> anyhow::Result<()> {
        let args = Args::parse();
        let mut logger = env_logger::Builder::from_default_env();
        if args.debug {
            logger.filter_level(log::LevelFilter::Debug);
        }
        logger.init();

        let def = grammar_file::load_file(&args.grammar)?;
        let g = &def.grammar;
        let table = g
            .create_parser_states(def.goal)
            .with_context(|| format!("Cannot build parser states for {}", args.grammar.display()))?;
        let lexer = g.create_lexical_automaton();

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        if args.productions {
            dump::write_prods(&mut out, g)?;
            writeln!(out)?;
        }
        if args.states {
            dump::write_states(&mut out, g, &table)?;
        }
        if args.lexer {
            dump::write_lexer(&mut out, g, &lexer)?;
        }
        writeln!(
            out,
            "{}: {} terminals, {} productions, {} parser states, {} lexical states",
            args.grammar.display(),
            g.terminals().count(),
            g.production_count(),
            table.len(),
            lexer.states().len()
        )?;
        Ok(())
    }
}

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    real::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("lalrex disabled (compiled without `cli` feature)");
}
