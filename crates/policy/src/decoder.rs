use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::{log_softmax, softmax};

use crate::heads::{merge_heads, split_heads};

/// Configuration for the attention decoder head.
#[derive(Config, Debug)]
pub struct DecoderHeadConfig {
    /// Per-node embedding dimension.
    pub embedding_dim: usize,
    /// Number of glimpse attention heads.
    pub n_heads: usize,
    /// Clip constant `C` for `tanh(logits) * C`.
    #[config(default = 10.0)]
    pub tanh_clipping: f64,
}

/// Step-invariant projections of the node embeddings, computed once per
/// rollout and shared read-only by every decode step.
///
/// The embeddings never change within a rollout, so none of this needs to be
/// recomputed per step.
#[derive(Debug, Clone)]
pub struct FixedContext<B: Backend> {
    /// Projected mean graph embedding, shape `(batch, 1, embed)`.
    pub graph_context: Tensor<B, 3>,
    /// Glimpse attention keys, shape `(batch, n_heads, nodes, head_dim)`.
    pub glimpse_keys: Tensor<B, 4>,
    /// Glimpse attention values, shape `(batch, n_heads, nodes, head_dim)`.
    pub glimpse_values: Tensor<B, 4>,
    /// Single-head keys for the final logits, shape `(batch, nodes, embed)`.
    pub logit_keys: Tensor<B, 3>,
}

impl<B: Backend> FixedContext<B> {
    pub fn num_nodes(&self) -> usize {
        self.logit_keys.dims()[1]
    }
}

/// One-to-many attention head producing the per-step action distribution.
///
/// A context query attends over the precomputed glimpse keys/values
/// (multi-head, scaled dot-product), the merged glimpse forms single-head
/// logits against the logit keys, and the logits are tanh-clipped, masked,
/// and log-softmaxed into log-probabilities over the nodes.
#[derive(Module, Debug)]
pub struct DecoderHead<B: Backend> {
    /// Node embeddings -> glimpse key / glimpse value / logit key (3x embed).
    project_node_embeddings: Linear<B>,
    /// Mean graph embedding -> graph context.
    project_fixed_context: Linear<B>,
    /// Step context (2x embed) -> query.
    project_step_context: Linear<B>,
    /// Merged glimpse heads -> final glimpse.
    project_out: Linear<B>,
    n_heads: usize,
    tanh_clipping: f64,
}

impl DecoderHeadConfig {
    /// Initialize a DecoderHead. All projections are bias-free.
    pub fn init<B: Backend>(&self, device: &B::Device) -> DecoderHead<B> {
        assert_eq!(
            self.embedding_dim % self.n_heads,
            0,
            "embedding dim {} not divisible by {} heads",
            self.embedding_dim,
            self.n_heads
        );
        let linear = |d_in: usize, d_out: usize| {
            LinearConfig::new(d_in, d_out).with_bias(false).init(device)
        };
        DecoderHead {
            project_node_embeddings: linear(self.embedding_dim, 3 * self.embedding_dim),
            project_fixed_context: linear(self.embedding_dim, self.embedding_dim),
            project_step_context: linear(2 * self.embedding_dim, self.embedding_dim),
            project_out: linear(self.embedding_dim, self.embedding_dim),
            n_heads: self.n_heads,
            tanh_clipping: self.tanh_clipping,
        }
    }
}

impl<B: Backend> DecoderHead<B> {
    /// Derive the fixed context from the node embeddings `(batch, nodes, embed)`.
    ///
    /// The graph context is the projected mean embedding; the node projections
    /// are one 3x-wide linear map chunked into glimpse keys, glimpse values,
    /// and logit keys.
    pub fn precompute(&self, embeddings: &Tensor<B, 3>) -> FixedContext<B> {
        let graph_context = self
            .project_fixed_context
            .forward(embeddings.clone().mean_dim(1)); // (batch, 1, embed)

        let projected = self.project_node_embeddings.forward(embeddings.clone());
        let chunks: [Tensor<B, 3>; 3] = projected
            .chunk(3, 2)
            .try_into()
            .unwrap_or_else(|_| unreachable!("chunk(3) yields three tensors"));
        let [keys, values, logit_keys] = chunks;

        FixedContext {
            graph_context,
            glimpse_keys: split_heads(keys, self.n_heads),
            glimpse_values: split_heads(values, self.n_heads),
            logit_keys,
        }
    }

    /// Masked log-probabilities over the nodes, shape `(batch, nodes)`.
    ///
    /// `step_context` is the concatenated first + current node embedding
    /// (or the learned placeholder), shape `(batch, 2 * embed)`. Masked
    /// positions carry probability exactly zero.
    ///
    /// # Panics
    /// Panics if the result contains NaN, which means every action was
    /// masked. That cannot happen for a well-formed non-terminal state.
    pub fn log_probabilities(
        &self,
        fixed: &FixedContext<B>,
        step_context: Tensor<B, 2>,
        mask: &Tensor<B, 2, Bool>,
        temperature: f64,
    ) -> Tensor<B, 2> {
        assert!(temperature > 0.0, "temperature must be positive");
        let query = fixed.graph_context.clone()
            + self
                .project_step_context
                .forward(step_context)
                .unsqueeze_dim::<3>(1); // (batch, 1, embed)

        let logits = self.one_to_many_logits(query, fixed, mask);
        let log_p = log_softmax(logits.div_scalar(temperature), 1);

        let has_nan: i64 = log_p.clone().is_nan().any().int().into_scalar().elem();
        assert_eq!(
            has_nan, 0,
            "NaN in log-probabilities: degenerate all-masked row"
        );
        log_p
    }

    /// Raw masked logits for one query against all nodes, shape `(batch, nodes)`.
    fn one_to_many_logits(
        &self,
        query: Tensor<B, 3>,
        fixed: &FixedContext<B>,
        mask: &Tensor<B, 2, Bool>,
    ) -> Tensor<B, 2> {
        let [_, _, embed] = query.dims();
        let head_dim = embed / self.n_heads;

        // Multi-head glimpse: scaled dot-product over the node axis.
        let q = split_heads(query, self.n_heads); // (batch, heads, 1, head_dim)
        let compatibility = q
            .matmul(fixed.glimpse_keys.clone().transpose())
            .div_scalar((head_dim as f64).sqrt()); // (batch, heads, 1, nodes)
        let attention = softmax(compatibility, 3);
        let glimpse = self
            .project_out
            .forward(merge_heads(attention.matmul(fixed.glimpse_values.clone()))); // (batch, 1, embed)

        // Single-head logits against the logit keys.
        let logits = glimpse
            .matmul(fixed.logit_keys.clone().transpose()) // (batch, 1, nodes)
            .div_scalar((embed as f64).sqrt())
            .squeeze::<2>(1);

        let logits = logits.tanh().mul_scalar(self.tanh_clipping);
        logits.mask_fill(mask.clone(), f64::NEG_INFINITY)
    }
}
