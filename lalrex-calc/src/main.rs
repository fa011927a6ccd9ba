//! Command-line interface for lalrex-calc.
//!
//! `lalrex-calc eval EXPR` evaluates a program given on the command line;
//! `lalrex-calc file PATH` streams one from a file through a buffer of the
//! requested size. Each statement's value is printed on its own line,
//! followed by the assigned variables.

use anyhow::Context;
use clap::{Parser as ClapParser, Subcommand};
use lalrex::{ParserOptions, Utf8Reader};
use lalrex_calc::{CalcParser, SymTab};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Command
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluates a program given as an argument
    Eval {
        /// Statements separated by `;`
        expr: String,
    },
    /// Evaluates a program read from a file
    File {
        /// Input file with lalrex-calc statements
        path: PathBuf,

        /// Initial buffer size in UTF-16 code units
        #[arg(short, long, default_value_t = 4096)]
        buffer: usize,
    },
}

fn print(results: &[Option<i64>], symtab: &SymTab) {
    for r in results {
        match r {
            Some(n) => println!("{}", n),
            None => println!("-"),
        }
    }
    for (name, value) in symtab.iter() {
        log::info!("{} = {}", name, value);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let mut symtab = SymTab::new();

    match args.command {
        Commands::Eval { expr } => {
            let calc = CalcParser::try_new()?;
            let results = calc.eval_str(&mut symtab, &expr)?;
            print(&results, &symtab);
        }
        Commands::File { path, buffer } => {
            let calc = CalcParser::with_options(ParserOptions {
                buffer_capacity: buffer,
                ..ParserOptions::default()
            })?;
            let file = File::open(&path).with_context(|| format!("can't open {}", path.display()))?;
            let mut src = Utf8Reader::new(BufReader::new(file));
            let (results, stats) = calc
                .eval(&mut symtab, &mut src)
                .with_context(|| format!("while evaluating {}", path.display()))?;
            log::debug!("{:?}", stats);
            print(&results, &symtab);
        }
    }
    Ok(())
}
