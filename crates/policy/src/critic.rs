use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::relu;

/// Configuration for the value critic.
///
/// Hidden sizes follow the usual wide-then-narrow MLP shape.
#[derive(Config, Debug)]
pub struct ValueNetConfig {
    /// Per-node embedding dimension.
    pub embedding_dim: usize,
    /// First hidden layer dimension.
    #[config(default = 512)]
    pub d_hidden1: usize,
    /// Second hidden layer dimension.
    #[config(default = 256)]
    pub d_hidden2: usize,
}

/// Value critic: estimates expected remaining tour cost per batch row.
///
/// Pools the embeddings of the nodes still to be visited (mean over the
/// unvisited set), concatenates the projected step context, and maps the
/// result through a 3-layer ReLU MLP to a scalar. Used purely as a baseline
/// signal, never as control flow.
#[derive(Module, Debug)]
pub struct ValueNet<B: Backend> {
    /// Step context (2x embed) -> embed.
    project_context: Linear<B>,
    hidden1: Linear<B>,
    hidden2: Linear<B>,
    output: Linear<B>,
}

impl ValueNetConfig {
    /// Initialize a ValueNet with the given configuration.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ValueNet<B> {
        ValueNet {
            project_context: LinearConfig::new(2 * self.embedding_dim, self.embedding_dim)
                .init(device),
            hidden1: LinearConfig::new(2 * self.embedding_dim, self.d_hidden1).init(device),
            hidden2: LinearConfig::new(self.d_hidden1, self.d_hidden2).init(device),
            output: LinearConfig::new(self.d_hidden2, 1).init(device),
        }
    }
}

impl<B: Backend> ValueNet<B> {
    /// Value estimate per batch row, shape `(batch,)`.
    ///
    /// `visited` marks nodes excluded from the pool; the mean runs over the
    /// unvisited set only, which must be non-empty (the critic is evaluated
    /// before the state update, so at least one node always remains).
    pub fn forward(
        &self,
        embeddings: &Tensor<B, 3>,
        visited: &Tensor<B, 2, Bool>,
        step_context: &Tensor<B, 2>,
    ) -> Tensor<B, 1> {
        let [batch, nodes, _] = embeddings.dims();
        assert_eq!(visited.dims(), [batch, nodes], "mask must be (batch, nodes)");

        // Mean over unvisited nodes: zero out visited rows, divide by count.
        let keep = visited.clone().bool_not().float().unsqueeze_dim::<3>(2); // (batch, nodes, 1)
        let remaining = keep.clone().sum_dim(1); // (batch, 1, 1)
        let pooled = (embeddings.clone() * keep)
            .sum_dim(1)
            .div(remaining.clamp_min(1.0))
            .squeeze::<2>(1); // (batch, embed)

        let context = self.project_context.forward(step_context.clone());
        let x = Tensor::cat(vec![pooled, context], 1);
        let x = relu(self.hidden1.forward(x));
        let x = relu(self.hidden2.forward(x));
        self.output.forward(x).squeeze::<1>(1) // (batch,)
    }
}
