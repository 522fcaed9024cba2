//! `tsp-solver`: roll out attention-policy tours on random Euclidean TSP
//! instances and report cost statistics.

mod config;
mod pipeline;
mod results;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pipeline::SolveArgs;

#[derive(Parser)]
#[command(name = "tsp-solver", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate random instances and roll out tours with the policy.
    Solve {
        /// Path to the solver TOML config.
        #[arg(long, default_value = "configs/solver.toml")]
        config: PathBuf,
        /// Number of instances per batch.
        #[arg(long)]
        batch_size: Option<usize>,
        /// Number of nodes per instance.
        #[arg(long)]
        num_nodes: Option<usize>,
        /// Decode mode: "greedy" or "sampling".
        #[arg(long, default_value = "greedy")]
        decode_type: String,
        /// Sampling temperature (logit divisor).
        #[arg(long)]
        temperature: Option<f64>,
        /// Number of sampled rollouts per instance (best-of-N).
        #[arg(long)]
        samples: Option<usize>,
        /// RNG seed for the tensor backend.
        #[arg(long)]
        seed: Option<u64>,
        /// Write the JSON summary to this path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Solve {
            config,
            batch_size,
            num_nodes,
            decode_type,
            temperature,
            samples,
            seed,
            output,
        } => pipeline::run_solve(SolveArgs {
            config,
            batch_size,
            num_nodes,
            decode_type,
            temperature,
            samples,
            seed,
            output,
        }),
    }
}
