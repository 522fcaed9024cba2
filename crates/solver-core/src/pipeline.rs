//! Solve pipeline: build the model, generate instances, roll out tours.

use std::path::PathBuf;

use burn::backend::ndarray::NdArray;
use burn::prelude::Backend;
use indicatif::ProgressBar;
use policy::{DecodeOptions, DecodeType, EuclideanTsp};

use crate::config::load_solver_toml;
use crate::results::RolloutSummary;

type NdBackend = NdArray<f32>;

/// Arguments for the `solve` subcommand, CLI overrides included.
pub struct SolveArgs {
    pub config: PathBuf,
    pub batch_size: Option<usize>,
    pub num_nodes: Option<usize>,
    pub decode_type: String,
    pub temperature: Option<f64>,
    pub samples: Option<usize>,
    pub seed: Option<u64>,
    pub output: Option<PathBuf>,
}

/// Generate a batch of random instances and roll out tours.
///
/// Greedy mode does a single deterministic pass; sampling mode draws
/// `samples` rollouts per instance and keeps the best cost of each.
pub fn run_solve(args: SolveArgs) -> anyhow::Result<()> {
    let mut cfg = load_solver_toml(&args.config)?;

    // CLI overrides take priority over the TOML values.
    if let Some(n) = args.batch_size {
        cfg.rollout.batch_size = n;
    }
    if let Some(n) = args.num_nodes {
        cfg.rollout.num_nodes = n;
    }
    if let Some(t) = args.temperature {
        cfg.rollout.temperature = t;
    }
    if let Some(s) = args.samples {
        cfg.rollout.samples = s;
    }
    if let Some(s) = args.seed {
        cfg.rollout.seed = Some(s);
    }

    let decode_type: DecodeType = args.decode_type.parse()?;
    if let Some(seed) = cfg.rollout.seed {
        NdBackend::seed(seed);
    }

    let device = Default::default();
    let model = cfg.model.to_config().init::<NdBackend>(&device);
    tracing::info!(
        embedding_dim = cfg.model.embedding_dim,
        n_heads = cfg.model.n_heads,
        n_encode_layers = cfg.model.n_encode_layers,
        "Initialized attention model"
    );

    let coords = tsp::random_instances::<NdBackend>(
        cfg.rollout.batch_size,
        cfg.rollout.num_nodes,
        &device,
    );
    let problem = EuclideanTsp;

    // `samples_ran` is the round count actually executed, so the summary
    // reflects what ran: 0 for the single greedy pass, at least 1 when
    // sampling even if the config asked for 0 rounds.
    let (costs, samples_ran) = match decode_type {
        DecodeType::Greedy => {
            let rollout = model.forward(&problem, coords, &DecodeOptions::greedy(), None);
            (tensor_costs(rollout.cost), 0)
        }
        DecodeType::Sampling => {
            let rounds = cfg.rollout.samples.max(1);
            let opts = DecodeOptions::sampling(cfg.rollout.temperature);
            let bar = ProgressBar::new(rounds as u64);
            let mut best: Option<Vec<f32>> = None;
            for _ in 0..rounds {
                let rollout = model.forward(&problem, coords.clone(), &opts, None);
                let costs = tensor_costs(rollout.cost);
                best = Some(match best {
                    None => costs,
                    Some(prev) => prev
                        .into_iter()
                        .zip(costs)
                        .map(|(a, b)| a.min(b))
                        .collect(),
                });
                bar.inc(1);
            }
            bar.finish_and_clear();
            (best.expect("at least one sampling round"), rounds)
        }
    };

    let summary = RolloutSummary::from_costs(
        &costs,
        cfg.rollout.num_nodes,
        &args.decode_type,
        cfg.rollout.temperature,
        samples_ran,
    );
    tracing::info!(%summary, "Rollout complete");
    println!("{summary}");

    if let Some(path) = &args.output {
        std::fs::write(path, serde_json::to_string_pretty(&summary)?)?;
        tracing::info!(path = %path.display(), "Wrote summary JSON");
    }
    Ok(())
}

fn tensor_costs(cost: burn::tensor::Tensor<NdBackend, 1>) -> Vec<f32> {
    cost.into_data().to_vec().expect("contiguous cost data")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(dir: &TempDir, decode_type: &str, samples: Option<usize>) -> SolveArgs {
        SolveArgs {
            config: dir.path().join("missing.toml"),
            batch_size: Some(2),
            num_nodes: Some(5),
            decode_type: decode_type.to_string(),
            temperature: None,
            samples,
            seed: Some(7),
            output: Some(dir.path().join("summary.json")),
        }
    }

    #[test]
    fn test_greedy_solve_writes_summary() {
        let dir = TempDir::new().unwrap();
        run_solve(args(&dir, "greedy", None)).unwrap();

        let json = std::fs::read_to_string(dir.path().join("summary.json")).unwrap();
        let summary: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(summary["num_instances"], 2);
        assert_eq!(summary["num_nodes"], 5);
        assert_eq!(summary["decode_type"], "greedy");
        assert!(summary["mean_cost"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_sampling_solve_best_of_n() {
        let dir = TempDir::new().unwrap();
        run_solve(args(&dir, "sampling", Some(3))).unwrap();

        let json = std::fs::read_to_string(dir.path().join("summary.json")).unwrap();
        let summary: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(summary["samples"], 3);
        assert!(summary["min_cost"].as_f64().unwrap() <= summary["max_cost"].as_f64().unwrap());
    }

    #[test]
    fn test_sampling_with_zero_samples_reports_one_round() {
        // samples = 0 in sampling mode still runs a single round; the
        // summary must say so rather than echo the configured 0.
        let dir = TempDir::new().unwrap();
        run_solve(args(&dir, "sampling", None)).unwrap();

        let json = std::fs::read_to_string(dir.path().join("summary.json")).unwrap();
        let summary: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(summary["samples"], 1);
    }

    #[test]
    fn test_unknown_decode_type_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = run_solve(args(&dir, "beam", None)).unwrap_err();
        assert!(err.to_string().contains("beam"));
    }
}
