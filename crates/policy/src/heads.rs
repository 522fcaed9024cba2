//! Head splitting/merging for multi-head attention.
//!
//! Pure reshape/swap views; no arithmetic. Kept as explicit utilities so the
//! per-head dimension `embed / n_heads` is computed in exactly one place.

use burn::prelude::*;

/// Reshape `(batch, nodes, embed)` into `(batch, n_heads, nodes, embed / n_heads)`.
///
/// # Panics
/// Panics if `embed` is not divisible by `n_heads`.
pub fn split_heads<B: Backend>(tensor: Tensor<B, 3>, n_heads: usize) -> Tensor<B, 4> {
    let [batch, nodes, embed] = tensor.dims();
    assert_eq!(
        embed % n_heads,
        0,
        "embedding dim {embed} not divisible by {n_heads} heads"
    );
    let head_dim = embed / n_heads;
    tensor
        .reshape([batch, nodes, n_heads, head_dim])
        .swap_dims(1, 2)
}

/// Inverse of [`split_heads`]: `(batch, n_heads, nodes, head_dim)` back to
/// `(batch, nodes, n_heads * head_dim)`.
pub fn merge_heads<B: Backend>(tensor: Tensor<B, 4>) -> Tensor<B, 3> {
    let [batch, n_heads, nodes, head_dim] = tensor.dims();
    tensor
        .swap_dims(1, 2)
        .reshape([batch, nodes, n_heads * head_dim])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_split_shape() {
        let device = Default::default();
        let t = Tensor::<TestBackend, 3>::random(
            [2, 5, 8],
            Distribution::Normal(0.0, 1.0),
            &device,
        );
        assert_eq!(split_heads(t, 4).dims(), [2, 4, 5, 2]);
    }

    #[test]
    fn test_split_merge_round_trip() {
        let device = Default::default();
        let t = Tensor::<TestBackend, 3>::random(
            [3, 7, 12],
            Distribution::Normal(0.0, 1.0),
            &device,
        );
        let original: Vec<f32> = t.clone().into_data().to_vec().unwrap();

        let merged = merge_heads(split_heads(t, 3));
        assert_eq!(merged.dims(), [3, 7, 12]);
        let restored: Vec<f32> = merged.into_data().to_vec().unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn test_heads_partition_the_embedding() {
        // Head h of node n must hold the contiguous slice of that node's
        // embedding starting at h * head_dim.
        let device = Default::default();
        let values: Vec<f32> = (0..6).map(|v| v as f32).collect();
        let t = Tensor::<TestBackend, 3>::from_data(
            TensorData::new(values, [1, 1, 6]),
            &device,
        );
        let split = split_heads(t, 2); // (1, 2, 1, 3)
        let flat: Vec<f32> = split.into_data().to_vec().unwrap();
        assert_eq!(flat, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    #[should_panic(expected = "not divisible")]
    fn test_indivisible_heads_panics() {
        let device = Default::default();
        let t = Tensor::<TestBackend, 3>::zeros([1, 2, 7], &device);
        let _ = split_heads(t, 2);
    }
}
