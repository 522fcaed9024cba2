use burn::prelude::*;

/// Total Euclidean tour length per batch row, including the closing edge
/// back to the starting node.
///
/// `tours` holds node indices, shape `(batch, nodes)`.
///
/// # Panics
/// Panics if any row of `tours` is not a permutation of `0..nodes`. An
/// infeasible tour signals a defect in the decode loop, not a runtime
/// condition to recover from.
pub fn tour_costs<B: Backend>(coords: &Tensor<B, 3>, tours: &Tensor<B, 2, Int>) -> Tensor<B, 1> {
    let [batch, nodes, dims] = coords.dims();
    assert_eq!(
        tours.dims(),
        [batch, nodes],
        "tours must be (batch, nodes)"
    );
    assert_permutations(tours);

    if nodes == 1 {
        return Tensor::zeros([batch], &coords.device());
    }

    let idx = tours
        .clone()
        .unsqueeze_dim::<3>(2)
        .expand([batch, nodes, dims]);
    let ordered = coords.clone().gather(1, idx); // (batch, nodes, 2) in tour order

    // Successor of each tour position, wrapping back to the start.
    let head = ordered.clone().slice([0..batch, 0..1, 0..dims]);
    let rest = ordered.clone().slice([0..batch, 1..nodes, 0..dims]);
    let next = Tensor::cat(vec![rest, head], 1);

    (next - ordered)
        .powf_scalar(2.0)
        .sum_dim(2)
        .sqrt()
        .sum_dim(1)
        .reshape([batch])
}

/// Batched point-to-point Euclidean distance, shape `(batch, 1)`.
///
/// `from` and `to` hold one node index per batch row, shape `(batch, 1)`.
pub fn edge_distance<B: Backend>(
    coords: &Tensor<B, 3>,
    from: &Tensor<B, 2, Int>,
    to: &Tensor<B, 2, Int>,
) -> Tensor<B, 2> {
    let [batch, _, _] = coords.dims();
    let a = gather_points(coords, from);
    let b = gather_points(coords, to);
    (a - b)
        .powf_scalar(2.0)
        .sum_dim(2)
        .sqrt()
        .reshape([batch, 1])
}

/// Gather one coordinate per batch row, shape `(batch, 1, 2)`.
fn gather_points<B: Backend>(coords: &Tensor<B, 3>, idx: &Tensor<B, 2, Int>) -> Tensor<B, 3> {
    let [batch, _, dims] = coords.dims();
    assert_eq!(idx.dims(), [batch, 1], "node indices must be (batch, 1)");
    let idx = idx.clone().unsqueeze_dim::<3>(2).expand([batch, 1, dims]);
    coords.clone().gather(1, idx)
}

/// Assert every row of `tours` visits each node exactly once.
fn assert_permutations<B: Backend>(tours: &Tensor<B, 2, Int>) {
    let [batch, nodes] = tours.dims();
    let device = tours.device();
    let counts = Tensor::<B, 2, Int>::zeros([batch, nodes], &device).scatter(
        1,
        tours.clone(),
        Tensor::ones([batch, nodes], &device),
    );
    let valid: i64 = counts.equal_elem(1).all().int().into_scalar().elem();
    assert_eq!(valid, 1, "tour is not a permutation of 0..{nodes}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn square() -> Tensor<TestBackend, 3> {
        let device = Default::default();
        Tensor::from_data(
            TensorData::new(
                vec![0.0_f32, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
                [1, 4, 2],
            ),
            &device,
        )
    }

    fn tour(indices: Vec<i64>) -> Tensor<TestBackend, 2, Int> {
        let device = Default::default();
        let n = indices.len();
        Tensor::from_data(TensorData::new(indices, [1, n]), &device)
    }

    #[test]
    fn test_unit_square_perimeter() {
        let cost = tour_costs(&square(), &tour(vec![0, 1, 2, 3]));
        let cost: f32 = cost.into_scalar();
        assert!((cost - 4.0).abs() < 1e-6, "expected 4.0, got {cost}");
    }

    #[test]
    fn test_diagonal_tour_is_longer() {
        // 0 -> 2 -> 1 -> 3 crosses both diagonals: 2*sqrt(2) + 2.
        let cost: f32 = tour_costs(&square(), &tour(vec![0, 2, 1, 3])).into_scalar();
        let expected = 2.0 * 2.0_f32.sqrt() + 2.0;
        assert!((cost - expected).abs() < 1e-6, "expected {expected}, got {cost}");
    }

    #[test]
    fn test_cost_invariant_under_rotation() {
        let a: f32 = tour_costs(&square(), &tour(vec![0, 1, 2, 3])).into_scalar();
        let b: f32 = tour_costs(&square(), &tour(vec![2, 3, 0, 1])).into_scalar();
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn test_single_node_cost_is_zero() {
        let device = Default::default();
        let coords = Tensor::<TestBackend, 3>::from_data(
            TensorData::new(vec![0.3_f32, 0.7], [1, 1, 2]),
            &device,
        );
        let cost: f32 = tour_costs(&coords, &tour(vec![0])).into_scalar();
        assert_eq!(cost, 0.0);
    }

    #[test]
    #[should_panic(expected = "not a permutation")]
    fn test_duplicate_node_panics() {
        let _ = tour_costs(&square(), &tour(vec![0, 1, 1, 3]));
    }

    #[test]
    fn test_edge_distance() {
        let coords = square();
        let from = tour(vec![0]);
        let to = tour(vec![2]);
        let d: f32 = edge_distance(&coords, &from, &to).into_scalar();
        assert!((d - 2.0_f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_edge_distance_batched() {
        let device = Default::default();
        // Two rows with different geometry.
        let coords = Tensor::<TestBackend, 3>::from_data(
            TensorData::new(
                vec![0.0_f32, 0.0, 3.0, 4.0, 0.0, 0.0, 1.0, 0.0],
                [2, 2, 2],
            ),
            &device,
        );
        let from = Tensor::<TestBackend, 2, Int>::from_data(
            TensorData::new(vec![0_i64, 0], [2, 1]),
            &device,
        );
        let to = Tensor::<TestBackend, 2, Int>::from_data(
            TensorData::new(vec![1_i64, 1], [2, 1]),
            &device,
        );
        let d: Vec<f32> = edge_distance(&coords, &from, &to)
            .into_data()
            .to_vec()
            .unwrap();
        assert!((d[0] - 5.0).abs() < 1e-6);
        assert!((d[1] - 1.0).abs() < 1e-6);
    }
}
