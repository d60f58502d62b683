//! Command-line interface (CLI) for the lalrex-calc demo.
//!
//! Evaluates arithmetic statements either given on the command line or read
//! line by line from standard input. Variables persist across statements
//! within one run.

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use lalrex_calc::{Calc, Evaluation};
use std::io::BufRead;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Command
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluates the given statements in order
    Eval {
        /// Statements such as "x = 6 * 7" or "x + 1"
        statements: Vec<String>,
    },
}

fn report(calc: &mut Calc, line: &str) -> Result<()> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(());
    }
    match calc
        .eval(line)
        .with_context(|| format!("evaluating {:?}", line))?
    {
        Evaluation::Value(v) => println!("{}", v),
        Evaluation::Assigned => {}
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let mut calc = Calc::try_new().context("building the calculator tables")?;

    match args.command {
        Some(Commands::Eval { statements }) => {
            for statement in &statements {
                report(&mut calc, statement)?;
            }
        }
        None => {
            for line in std::io::stdin().lock().lines() {
                report(&mut calc, &line?)?;
            }
        }
    }
    Ok(())
}
