//! Convert a regular expression to an automaton, then eliminate its states
//! one at a time until a single expression remains

#![deny(
    clippy::disallowed_methods,
    clippy::suspicious,
    clippy::style,
    clippy::clone_on_ref_ptr,
    missing_debug_implementations,
    missing_copy_implementations
)]
#![warn(clippy::pedantic, missing_docs)]
#![allow(clippy::module_name_repetitions)]

fn main() { entry::main(); }

mod entry {
    use anyhow::{Context, Result};
    use clap::Parser;
    use reconv::{Operator, op::registry, reduce};
    use tracing_subscriber::{filter::LevelFilter, prelude::*};

    #[derive(Debug, Parser)]
    #[command(version, author, about)]
    struct Opts {
        /// Print more verbose logs
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,

        /// Symbol for the STAR operator
        #[arg(long, env = "RECONV_STAR")]
        star: Option<char>,

        /// Symbol for the CONCATENATION operator
        #[arg(long, env = "RECONV_CONCAT")]
        concat: Option<char>,

        /// Symbol for the UNION operator
        #[arg(long, env = "RECONV_UNION")]
        union: Option<char>,

        /// Only print the resulting expression
        #[arg(short, long)]
        quiet: bool,

        /// Expression to convert
        expr: String,
    }

    #[inline]
    pub fn main() {
        let opts = Opts::parse();

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(match (cfg!(debug_assertions), opts.verbose) {
                (false, 0) => LevelFilter::INFO,
                (false, 1) | (true, 0) => LevelFilter::DEBUG,
                _ => LevelFilter::TRACE,
            })
            .init();
        tracing::debug!("{opts:#?}");

        std::process::exit(run(opts).map_or_else(
            |e| {
                tracing::error!("{e:?}");
                1
            },
            |()| 0,
        ));
    }

    fn apply_symbols(overrides: [(Operator, Option<char>); 3]) -> Result<()> {
        for (op, sym) in overrides {
            if let Some(sym) = sym {
                registry::try_set_symbol(op, sym)
                    .with_context(|| format!("Error setting the {op} symbol"))?;
            }
        }

        Ok(())
    }

    #[inline]
    fn run(
        Opts {
            verbose: _,
            star,
            concat,
            union,
            quiet,
            expr,
        }: Opts,
    ) -> Result<()> {
        apply_symbols([
            (Operator::Star, star),
            (Operator::Concat, concat),
            (Operator::Union, union),
        ])?;
        let syms = registry::get();

        let expr = reconv::parse(&expr, &syms).context("Error parsing expression")?;
        let mut autom = reconv::build(&expr);
        tracing::info!(
            states = autom.len(),
            transitions = autom.transition_count(),
            "Automaton built"
        );

        let order: Vec<_> = autom
            .states()
            .filter(|&s| !autom.is_initial(s) && !autom.is_final(s))
            .collect();

        for state in order {
            let rewrites = reduce::reduce_state(&mut autom, state, &syms)
                .with_context(|| format!("Error eliminating {state}"))?;

            if !quiet {
                println!("eliminate {state}");
                for rewrite in rewrites {
                    println!("  {rewrite}");
                }
            }
        }

        let regex = reduce::final_regex(&autom, &syms).context("Error reading final expression")?;
        println!("{regex}");

        Ok(())
    }
}
