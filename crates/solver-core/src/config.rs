//! TOML config loading for the solver CLI.
//!
//! Deserializes `configs/solver.toml` with `[model]` and `[rollout]`
//! sections, then merges with CLI overrides.

use std::path::Path;

use policy::AttentionModelConfig;
use serde::Deserialize;

/// Top-level structure matching `configs/solver.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct SolverToml {
    /// Model architecture parameters.
    #[serde(default)]
    pub model: ModelSection,
    /// Rollout parameters.
    #[serde(default)]
    pub rollout: RolloutSection,
}

/// Model hyperparameters, mirrored into [`AttentionModelConfig`].
#[derive(Debug, Deserialize)]
pub struct ModelSection {
    /// Per-node embedding dimension.
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    /// Number of attention heads.
    #[serde(default = "default_n_heads")]
    pub n_heads: usize,

    /// Number of encoder self-attention blocks.
    #[serde(default = "default_n_encode_layers")]
    pub n_encode_layers: usize,

    /// Encoder feed-forward hidden dimension.
    #[serde(default = "default_feed_forward_dim")]
    pub feed_forward_dim: usize,

    /// Logit clip constant.
    #[serde(default = "default_tanh_clipping")]
    pub tanh_clipping: f64,
}

/// Instance generation and decode parameters.
#[derive(Debug, Deserialize)]
pub struct RolloutSection {
    /// Number of instances per rollout.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Nodes per instance.
    #[serde(default = "default_num_nodes")]
    pub num_nodes: usize,

    /// Softmax temperature for sampling decode.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Sampled rollouts per instance for best-of-N (0 = greedy only).
    #[serde(default)]
    pub samples: usize,

    /// Backend RNG seed for reproducible instances and weights.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_embedding_dim() -> usize {
    128
}
fn default_n_heads() -> usize {
    8
}
fn default_n_encode_layers() -> usize {
    3
}
fn default_feed_forward_dim() -> usize {
    512
}
fn default_tanh_clipping() -> f64 {
    10.0
}
fn default_batch_size() -> usize {
    128
}
fn default_num_nodes() -> usize {
    20
}
fn default_temperature() -> f64 {
    1.0
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            embedding_dim: default_embedding_dim(),
            n_heads: default_n_heads(),
            n_encode_layers: default_n_encode_layers(),
            feed_forward_dim: default_feed_forward_dim(),
            tanh_clipping: default_tanh_clipping(),
        }
    }
}

impl Default for RolloutSection {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            num_nodes: default_num_nodes(),
            temperature: default_temperature(),
            samples: 0,
            seed: None,
        }
    }
}

impl ModelSection {
    /// Build the model config this section describes.
    pub fn to_config(&self) -> AttentionModelConfig {
        AttentionModelConfig::new()
            .with_embedding_dim(self.embedding_dim)
            .with_n_heads(self.n_heads)
            .with_n_encode_layers(self.n_encode_layers)
            .with_feed_forward_dim(self.feed_forward_dim)
            .with_tanh_clipping(self.tanh_clipping)
    }
}

/// Load and deserialize a `SolverToml`. A missing file yields the defaults.
pub fn load_solver_toml(path: &Path) -> anyhow::Result<SolverToml> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "No config file found, using defaults");
        return Ok(SolverToml::default());
    }
    let contents = std::fs::read_to_string(path)?;
    let config: SolverToml = toml::from_str(&contents)?;
    tracing::info!(path = %path.display(), "Loaded solver config");
    Ok(config)
}
