use burn::module::Param;
use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::Distribution;
use rand::Rng;

use tsp::edge_distance;

use crate::critic::{ValueNet, ValueNetConfig};
use crate::decode::{DecodeOptions, DecodeType};
use crate::decoder::{DecoderHead, DecoderHeadConfig, FixedContext};
use crate::encoder::{GraphEncoder, GraphEncoderConfig};
use crate::problem::{Problem, ProblemState};

/// Cap on rejection resampling of masked actions. Masked probabilities are
/// exactly zero after the log-softmax, so a single retry is already
/// anomalous; exceeding the cap means the distribution is degenerate.
const MAX_RESAMPLES: usize = 64;

/// Configuration for the full attention model (encoder, decoder head, critic).
#[derive(Config, Debug)]
pub struct AttentionModelConfig {
    /// Per-node embedding dimension. Must be divisible by `n_heads`.
    #[config(default = 128)]
    pub embedding_dim: usize,
    /// Number of attention heads (encoder and glimpse).
    #[config(default = 8)]
    pub n_heads: usize,
    /// Number of encoder self-attention blocks.
    #[config(default = 3)]
    pub n_encode_layers: usize,
    /// Hidden dimension of the encoder feed-forward sublayers.
    #[config(default = 512)]
    pub feed_forward_dim: usize,
    /// Logit clip constant `C` for `tanh(logits) * C`.
    #[config(default = 10.0)]
    pub tanh_clipping: f64,
    /// First hidden layer dimension of the critic.
    #[config(default = 512)]
    pub critic_hidden1: usize,
    /// Second hidden layer dimension of the critic.
    #[config(default = 256)]
    pub critic_hidden2: usize,
}

/// Attention encoder-decoder policy with a value critic.
///
/// One [`AttentionModel::forward`] call performs a full rollout: encode the
/// instance once, precompute the fixed context, then select one node per
/// step until the tour is complete, accumulating log-probabilities, instant
/// rewards, and value estimates along the way.
#[derive(Module, Debug)]
pub struct AttentionModel<B: Backend> {
    /// Raw 2D coordinates -> embedding dim.
    node_embedder: Linear<B>,
    encoder: GraphEncoder<B>,
    decoder: DecoderHead<B>,
    critic: ValueNet<B>,
    /// Learned stand-in for the first + current node embedding at step 0,
    /// size `2 * embed`. Uniform(-1, 1) init keeps it in activation range.
    first_step_placeholder: Param<Tensor<B, 1>>,
}

/// Aggregated outputs of one full rollout.
///
/// Every per-step field has one column per decode step; each row of `tours`
/// is a permutation of the node indices.
#[derive(Debug, Clone)]
pub struct Rollout<B: Backend> {
    /// Log-probability of each selected action, shape `(batch, nodes)`.
    pub log_ps: Tensor<B, 2>,
    /// Per-step reward: zero at step 0, else the negative edge length from
    /// the previous selection. Shape `(batch, nodes)`.
    pub instant_rewards: Tensor<B, 2>,
    /// Critic estimates per step, shape `(batch, nodes)`.
    pub values: Tensor<B, 2>,
    /// Selected node index per step, shape `(batch, nodes)`.
    pub tours: Tensor<B, 2, Int>,
    /// Total tour length including the closing edge, shape `(batch,)`.
    pub cost: Tensor<B, 1>,
    /// Negative closing-edge length (last node back to first), shape `(batch,)`.
    pub reward_final: Tensor<B, 1>,
}

impl AttentionModelConfig {
    /// Initialize an AttentionModel.
    ///
    /// # Panics
    /// Panics if `embedding_dim` is not divisible by `n_heads`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> AttentionModel<B> {
        assert_eq!(
            self.embedding_dim % self.n_heads,
            0,
            "embedding dim {} not divisible by {} heads",
            self.embedding_dim,
            self.n_heads
        );
        AttentionModel {
            node_embedder: LinearConfig::new(2, self.embedding_dim).init(device),
            encoder: GraphEncoderConfig::new(self.embedding_dim, self.n_heads)
                .with_n_layers(self.n_encode_layers)
                .with_feed_forward_dim(self.feed_forward_dim)
                .init(device),
            decoder: DecoderHeadConfig::new(self.embedding_dim, self.n_heads)
                .with_tanh_clipping(self.tanh_clipping)
                .init(device),
            critic: ValueNetConfig::new(self.embedding_dim)
                .with_d_hidden1(self.critic_hidden1)
                .with_d_hidden2(self.critic_hidden2)
                .init(device),
            first_step_placeholder: Param::from_tensor(Tensor::random(
                [2 * self.embedding_dim],
                Distribution::Uniform(-1.0, 1.0),
                device,
            )),
        }
    }
}

impl<B: Backend> AttentionModel<B> {
    /// Encode raw coordinates `(batch, nodes, 2)` into per-node embeddings.
    pub fn embed(&self, coords: &Tensor<B, 3>) -> Tensor<B, 3> {
        self.encoder
            .forward(self.node_embedder.forward(coords.clone()))
    }

    /// Roll out a full tour for each instance in the batch.
    ///
    /// With `reference = None` the policy selects nodes freely according to
    /// `opts`; with a reference tour supplied, its actions are replayed and
    /// `log_ps` reflects their likelihood under the policy (evaluation mode).
    pub fn forward<P: Problem<B>>(
        &self,
        problem: &P,
        coords: Tensor<B, 3>,
        opts: &DecodeOptions,
        reference: Option<&Tensor<B, 2, Int>>,
    ) -> Rollout<B> {
        let [batch, nodes, _] = coords.dims();
        if let Some(tour) = reference {
            assert_eq!(
                tour.dims(),
                [batch, nodes],
                "reference tour must be (batch, nodes)"
            );
        }

        let embeddings = self.embed(&coords);
        let fixed = self.decoder.precompute(&embeddings);

        let mut state = problem.make_state(coords.clone());
        let mut log_ps: Vec<Tensor<B, 2>> = Vec::with_capacity(nodes);
        let mut rewards: Vec<Tensor<B, 2>> = Vec::with_capacity(nodes);
        let mut values: Vec<Tensor<B, 2>> = Vec::with_capacity(nodes);
        let mut tour_steps: Vec<Tensor<B, 2, Int>> = Vec::with_capacity(nodes);
        let mut previous: Option<Tensor<B, 2, Int>> = None;

        while !state.all_finished() {
            let step = state.step();
            let step_context = self.step_context(&embeddings, &state);
            let mask = state.visited_mask();
            let log_p =
                self.decoder
                    .log_probabilities(&fixed, step_context.clone(), &mask, opts.temperature);

            let selected = match reference {
                Some(tour) => tour.clone().slice([0..batch, step..step + 1]),
                None => select_node(log_p.clone().exp(), &mask, opts),
            };

            let reward = match &previous {
                Some(prev) => edge_distance(&coords, prev, &selected).neg(),
                None => Tensor::zeros([batch, 1], &coords.device()),
            };
            let value = self
                .critic
                .forward(&embeddings, &mask, &step_context)
                .unsqueeze_dim::<2>(1);

            log_ps.push(log_p.gather(1, selected.clone()));
            rewards.push(reward);
            values.push(value);
            tour_steps.push(selected.clone());
            previous = Some(selected.clone());
            state = state.update(selected);
        }

        let first = tour_steps
            .first()
            .expect("rollout performs at least one step")
            .clone();
        let last = tour_steps
            .last()
            .expect("rollout performs at least one step")
            .clone();
        let reward_final = edge_distance(&coords, &last, &first)
            .neg()
            .reshape([batch]);

        let tours = Tensor::cat(tour_steps, 1);
        let cost = problem.costs(&coords, &tours);

        Rollout {
            log_ps: Tensor::cat(log_ps, 1),
            instant_rewards: Tensor::cat(rewards, 1),
            values: Tensor::cat(values, 1),
            tours,
            cost,
            reward_final,
        }
    }

    /// Decoder query input for the current step, shape `(batch, 2 * embed)`.
    ///
    /// Step 0 has no selection yet, so a learned placeholder stands in for
    /// the first + current node embeddings; afterwards both are gathered
    /// from the encoder output and concatenated.
    fn step_context<S: ProblemState<B>>(
        &self,
        embeddings: &Tensor<B, 3>,
        state: &S,
    ) -> Tensor<B, 2> {
        let [batch, _, embed] = embeddings.dims();
        match (state.first_node(), state.current_node()) {
            (Some(first), Some(current)) => {
                let idx = Tensor::cat(vec![first, current], 1) // (batch, 2)
                    .unsqueeze_dim::<3>(2)
                    .expand([batch, 2, embed]);
                embeddings
                    .clone()
                    .gather(1, idx)
                    .reshape([batch, 2 * embed])
            }
            _ => self
                .first_step_placeholder
                .val()
                .unsqueeze_dim::<2>(0)
                .expand([batch, 2 * embed]),
        }
    }
}

/// Total log-likelihood of a rollout's tours: per-row sum of the
/// selected-action log-probabilities, shape `(batch,)`.
pub fn tour_log_likelihood<B: Backend>(log_ps: &Tensor<B, 2>) -> Tensor<B, 1> {
    let [batch, _] = log_ps.dims();
    log_ps.clone().sum_dim(1).reshape([batch])
}

/// Choose the next node per batch row from the action probabilities.
fn select_node<B: Backend>(
    probs: Tensor<B, 2>,
    mask: &Tensor<B, 2, Bool>,
    opts: &DecodeOptions,
) -> Tensor<B, 2, Int> {
    match opts.decode_type {
        DecodeType::Greedy => {
            let selected = probs.argmax(1); // (batch, 1)
            let hit_masked: i64 = mask
                .clone()
                .int()
                .gather(1, selected.clone())
                .sum()
                .into_scalar()
                .elem();
            assert_eq!(
                hit_masked, 0,
                "greedy selection landed on a visited node; masking is broken"
            );
            selected
        }
        DecodeType::Sampling => sample_nodes(probs, mask),
    }
}

/// Categorical draw per batch row, rejecting masked actions.
///
/// Masked actions carry probability exactly zero, so rejections only arise
/// from floating-point corner cases; each retry emits a diagnostic and the
/// loop aborts after [`MAX_RESAMPLES`] draws.
fn sample_nodes<B: Backend>(probs: Tensor<B, 2>, mask: &Tensor<B, 2, Bool>) -> Tensor<B, 2, Int> {
    let [batch, nodes] = probs.dims();
    let device = probs.device();
    let rows: Vec<f32> = probs
        .into_data()
        .convert::<f32>()
        .to_vec()
        .expect("contiguous probability data");
    let visited: Vec<i64> = mask
        .clone()
        .int()
        .into_data()
        .convert::<i64>()
        .to_vec()
        .expect("contiguous mask data");

    let mut rng = rand::thread_rng();
    let mut selected: Vec<i64> = Vec::with_capacity(batch);
    for b in 0..batch {
        let row = &rows[b * nodes..(b + 1) * nodes];
        let row_mask = &visited[b * nodes..(b + 1) * nodes];

        let mut choice = sample_row(row, &mut rng);
        let mut retries = 0;
        while row_mask[choice] != 0 {
            retries += 1;
            assert!(
                retries <= MAX_RESAMPLES,
                "resampling diverged after {MAX_RESAMPLES} draws, distribution is degenerate"
            );
            tracing::warn!(row = b, choice, retries, "sampled a visited node, resampling");
            choice = sample_row(row, &mut rng);
        }
        selected.push(choice as i64);
    }

    Tensor::from_data(TensorData::new(selected, [batch, 1]), &device)
}

/// Draw one index from an unnormalized probability row by cumulative
/// threshold; falls back to the arg-max on rounding shortfall.
fn sample_row(probs: &[f32], rng: &mut impl Rng) -> usize {
    let total: f32 = probs.iter().sum();
    let mut threshold = rng.gen_range(0.0..total.max(f32::MIN_POSITIVE));
    for (idx, &p) in probs.iter().enumerate() {
        threshold -= p;
        if threshold <= 0.0 {
            return idx;
        }
    }
    probs
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}
