//! Summary statistics for a batch of rollouts.

use std::fmt;

use serde::Serialize;

/// Cost statistics over one batch of solved instances.
#[derive(Debug, Clone, Serialize)]
pub struct RolloutSummary {
    /// Number of instances in the batch.
    pub num_instances: usize,
    /// Nodes per instance.
    pub num_nodes: usize,
    /// Decode mode used ("greedy" or "sampling").
    pub decode_type: String,
    /// Softmax temperature.
    pub temperature: f64,
    /// Sampled rollouts per instance (0 = single pass).
    pub samples: usize,
    /// Mean tour cost over the batch.
    pub mean_cost: f64,
    /// Best (shortest) tour cost in the batch.
    pub min_cost: f64,
    /// Worst tour cost in the batch.
    pub max_cost: f64,
}

impl RolloutSummary {
    /// Aggregate per-instance costs into a summary.
    ///
    /// # Panics
    /// Panics if `costs` is empty.
    pub fn from_costs(
        costs: &[f32],
        num_nodes: usize,
        decode_type: &str,
        temperature: f64,
        samples: usize,
    ) -> Self {
        assert!(!costs.is_empty(), "no costs to summarize");
        let mean = costs.iter().map(|c| *c as f64).sum::<f64>() / costs.len() as f64;
        let min = costs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = costs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        Self {
            num_instances: costs.len(),
            num_nodes,
            decode_type: decode_type.to_string(),
            temperature,
            samples,
            mean_cost: mean,
            min_cost: min as f64,
            max_cost: max as f64,
        }
    }
}

impl fmt::Display for RolloutSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} instances x {} nodes [{}]: mean cost {:.4}, min {:.4}, max {:.4}",
            self.num_instances,
            self.num_nodes,
            self.decode_type,
            self.mean_cost,
            self.min_cost,
            self.max_cost
        )
    }
}
