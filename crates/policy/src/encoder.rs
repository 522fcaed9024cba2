use burn::nn::attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig};
use burn::nn::{LayerNorm, LayerNormConfig, Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::relu;

/// Configuration for the graph attention encoder.
#[derive(Config, Debug)]
pub struct GraphEncoderConfig {
    /// Per-node embedding dimension.
    pub embedding_dim: usize,
    /// Number of attention heads per layer.
    pub n_heads: usize,
    /// Number of stacked self-attention blocks.
    #[config(default = 3)]
    pub n_layers: usize,
    /// Hidden dimension of the position-wise feed-forward sublayer.
    #[config(default = 512)]
    pub feed_forward_dim: usize,
}

/// One residual self-attention block: MHA + feed-forward, each followed by
/// a residual connection and layer normalization.
#[derive(Module, Debug)]
pub struct EncoderLayer<B: Backend> {
    attention: MultiHeadAttention<B>,
    norm_attention: LayerNorm<B>,
    feed_forward_up: Linear<B>,
    feed_forward_down: Linear<B>,
    norm_feed_forward: LayerNorm<B>,
}

impl<B: Backend> EncoderLayer<B> {
    fn forward(&self, input: Tensor<B, 3>) -> Tensor<B, 3> {
        let attended = self.attention.forward(MhaInput::self_attn(input.clone()));
        let hidden = self.norm_attention.forward(input + attended.context);

        let ff = self
            .feed_forward_down
            .forward(relu(self.feed_forward_up.forward(hidden.clone())));
        self.norm_feed_forward.forward(hidden + ff)
    }
}

/// Graph attention encoder: maps embedded node features `(batch, nodes, embed)`
/// to per-node embeddings of the same shape via stacked self-attention.
///
/// Computed once per rollout; the embeddings are read-only afterwards.
#[derive(Module, Debug)]
pub struct GraphEncoder<B: Backend> {
    layers: Vec<EncoderLayer<B>>,
}

impl GraphEncoderConfig {
    /// Initialize a GraphEncoder with the given configuration.
    pub fn init<B: Backend>(&self, device: &B::Device) -> GraphEncoder<B> {
        assert_eq!(
            self.embedding_dim % self.n_heads,
            0,
            "embedding dim {} not divisible by {} heads",
            self.embedding_dim,
            self.n_heads
        );
        let layers = (0..self.n_layers)
            .map(|_| EncoderLayer {
                attention: MultiHeadAttentionConfig::new(self.embedding_dim, self.n_heads)
                    .init(device),
                norm_attention: LayerNormConfig::new(self.embedding_dim).init(device),
                feed_forward_up: LinearConfig::new(self.embedding_dim, self.feed_forward_dim)
                    .init(device),
                feed_forward_down: LinearConfig::new(self.feed_forward_dim, self.embedding_dim)
                    .init(device),
                norm_feed_forward: LayerNormConfig::new(self.embedding_dim).init(device),
            })
            .collect();
        GraphEncoder { layers }
    }
}

impl<B: Backend> GraphEncoder<B> {
    /// Forward pass over all blocks.
    ///
    /// Input and output shape: `(batch, nodes, embed)`.
    pub fn forward(&self, node_features: Tensor<B, 3>) -> Tensor<B, 3> {
        let mut hidden = node_features;
        for layer in &self.layers {
            hidden = layer.forward(hidden);
        }
        hidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_forward_preserves_shape() {
        let device = Default::default();
        let encoder = GraphEncoderConfig::new(16, 4)
            .with_n_layers(2)
            .with_feed_forward_dim(32)
            .init::<TestBackend>(&device);
        let input = Tensor::<TestBackend, 3>::random(
            [3, 10, 16],
            Distribution::Normal(0.0, 1.0),
            &device,
        );
        let output = encoder.forward(input);
        assert_eq!(output.dims(), [3, 10, 16]);
    }

    #[test]
    fn test_output_is_finite() {
        let device = Default::default();
        let encoder = GraphEncoderConfig::new(8, 2)
            .with_n_layers(3)
            .with_feed_forward_dim(16)
            .init::<TestBackend>(&device);
        let input = Tensor::<TestBackend, 3>::random(
            [2, 6, 8],
            Distribution::Uniform(0.0, 1.0),
            &device,
        );
        let output = encoder.forward(input);
        let has_nan: i64 = output.is_nan().any().int().into_scalar();
        assert_eq!(has_nan, 0);
    }

    #[test]
    #[should_panic(expected = "not divisible")]
    fn test_bad_head_count_fails_at_init() {
        let device = Default::default();
        let _ = GraphEncoderConfig::new(10, 3).init::<TestBackend>(&device);
    }
}
