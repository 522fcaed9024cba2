use burn::prelude::*;
use burn::tensor::Distribution;

/// Generate a batch of random TSP instances with coordinates drawn
/// uniformly from the unit square, shape `(batch, nodes, 2)`.
pub fn random_instances<B: Backend>(
    batch: usize,
    nodes: usize,
    device: &B::Device,
) -> Tensor<B, 3> {
    assert!(batch > 0, "batch must be positive");
    assert!(nodes > 0, "nodes must be positive");
    Tensor::random([batch, nodes, 2], Distribution::Uniform(0.0, 1.0), device)
}
