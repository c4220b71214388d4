//! maat CLI: evaluate and check authorization rule files.

use std::fs;

use clap::{Parser, Subcommand};
use miette::{miette, IntoDiagnostic, Result};

use maat::{Bounds, Engine, Termination};

#[derive(Parser)]
#[command(name = "maat", version, about = "Trust-management authorization logic engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a query against a set of assertion files.
    Query {
        /// Assertion sources as PRINCIPAL=FILE pairs (repeatable).
        #[arg(long = "assert", value_name = "PRINCIPAL=FILE")]
        assertions: Vec<String>,

        /// The query, e.g. 'app says may(alice, read)'.
        query: String,

        /// Maximum scheduler steps.
        #[arg(long, default_value_t = 10_000)]
        step_limit: usize,

        /// Maximum answers.
        #[arg(long, default_value_t = 100)]
        answer_limit: usize,

        /// Emit answers as a JSON array.
        #[arg(long)]
        json: bool,
    },

    /// Parse and mode-check assertion files without querying.
    Check {
        /// Assertion sources as PRINCIPAL=FILE pairs.
        #[arg(value_name = "PRINCIPAL=FILE", required = true)]
        assertions: Vec<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    match Cli::parse().command {
        Commands::Query {
            assertions,
            query,
            step_limit,
            answer_limit,
            json,
        } => {
            let mut engine = Engine::with_builtins()?;
            load_assertions(&mut engine, &assertions)?;
            let answers = engine.query_text(&query, &Bounds::new(step_limit, answer_limit))?;

            if json {
                let out = serde_json::to_string_pretty(&answers.literals).into_diagnostic()?;
                println!("{out}");
            } else {
                for lit in &answers.literals {
                    println!("{lit}");
                }
            }
            match answers.termination {
                Termination::Exhausted => {}
                bound => eprintln!(
                    "note: {bound} after {} step(s), {} answer(s)",
                    answers.steps,
                    answers.literals.len()
                ),
            }
            Ok(())
        }

        Commands::Check { assertions } => {
            let mut engine = Engine::with_builtins()?;
            load_assertions(&mut engine, &assertions)?;
            println!("ok: {} assertion file(s)", assertions.len());
            Ok(())
        }
    }
}

/// Parse `PRINCIPAL=FILE` pairs and install each file under its
/// principal. Installation mode-checks against everything loaded so far,
/// builtins included.
fn load_assertions(engine: &mut Engine, specs: &[String]) -> Result<()> {
    for spec in specs {
        let (principal, path) = spec
            .split_once('=')
            .ok_or_else(|| miette!("assertion source must be PRINCIPAL=FILE, got \"{spec}\""))?;
        let source = fs::read_to_string(path)
            .map_err(|e| miette!("cannot read assertion file {path}: {e}"))?;
        engine.install_text(principal, &source)?;
    }
    Ok(())
}
