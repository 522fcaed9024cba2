use burn::prelude::*;

/// Visitation state for a batch of TSP instances, advanced one node per step.
///
/// The state is immutable per step: [`TspState::update`] returns a fresh
/// state with the selected nodes marked visited. The decode loop owns the
/// current state and discards the previous one.
///
/// Invariants:
/// - exactly one new node becomes visited per step
/// - the visited mask only ever grows
/// - terminal once `step == num_nodes`
#[derive(Debug, Clone)]
pub struct TspState<B: Backend> {
    /// Node coordinates, shape `(batch, nodes, 2)`.
    coords: Tensor<B, 3>,
    /// Visit counts per node, shape `(batch, nodes)`. Nonzero = visited.
    visited: Tensor<B, 2, Int>,
    /// Index of the first selected node, shape `(batch, 1)`.
    first: Option<Tensor<B, 2, Int>>,
    /// Index of the most recently selected node, shape `(batch, 1)`.
    current: Option<Tensor<B, 2, Int>>,
    /// Number of selections made so far.
    step: usize,
}

impl<B: Backend> TspState<B> {
    /// Fresh state with nothing visited and no node selected yet.
    pub fn new(coords: Tensor<B, 3>) -> Self {
        let [batch, nodes, _] = coords.dims();
        assert!(nodes > 0, "instance must have at least one node");
        let device = coords.device();
        Self {
            coords,
            visited: Tensor::zeros([batch, nodes], &device),
            first: None,
            current: None,
            step: 0,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.coords.dims()[0]
    }

    pub fn num_nodes(&self) -> usize {
        self.coords.dims()[1]
    }

    pub fn coords(&self) -> &Tensor<B, 3> {
        &self.coords
    }

    /// Number of selections made so far.
    pub fn step(&self) -> usize {
        self.step
    }

    /// True once every node has been visited.
    pub fn all_finished(&self) -> bool {
        self.step >= self.num_nodes()
    }

    /// Boolean mask over nodes, shape `(batch, nodes)`; true = visited.
    pub fn visited_mask(&self) -> Tensor<B, 2, Bool> {
        self.visited.clone().greater_elem(0)
    }

    /// Index of the first selected node, `None` before the first selection.
    pub fn first_node(&self) -> Option<&Tensor<B, 2, Int>> {
        self.first.as_ref()
    }

    /// Index of the most recently selected node, `None` before the first selection.
    pub fn current_node(&self) -> Option<&Tensor<B, 2, Int>> {
        self.current.as_ref()
    }

    /// Advance the state by one selection, returning the new state.
    ///
    /// `selected` holds one node index per batch row, shape `(batch, 1)`.
    pub fn update(&self, selected: Tensor<B, 2, Int>) -> Self {
        assert_eq!(
            selected.dims(),
            [self.batch_size(), 1],
            "selected indices must be (batch, 1)"
        );
        assert!(
            !self.all_finished(),
            "update called on a finished state (step {})",
            self.step
        );
        let ones = Tensor::<B, 2, Int>::ones([self.batch_size(), 1], &self.visited.device());
        let visited = self.visited.clone().scatter(1, selected.clone(), ones);
        Self {
            coords: self.coords.clone(),
            visited,
            first: Some(self.first.clone().unwrap_or_else(|| selected.clone())),
            current: Some(selected),
            step: self.step + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn test_coords(batch: usize, nodes: usize) -> Tensor<TestBackend, 3> {
        let device = Default::default();
        Tensor::random(
            [batch, nodes, 2],
            burn::tensor::Distribution::Uniform(0.0, 1.0),
            &device,
        )
    }

    fn visited_count(state: &TspState<TestBackend>) -> i64 {
        state.visited_mask().int().sum().into_scalar()
    }

    fn select(batch: usize, node: i64) -> Tensor<TestBackend, 2, Int> {
        let device = Default::default();
        Tensor::<TestBackend, 2, Int>::from_data(
            TensorData::new(vec![node; batch], [batch, 1]),
            &device,
        )
    }

    #[test]
    fn test_fresh_state_is_empty() {
        let state = TspState::new(test_coords(3, 5));
        assert_eq!(state.step(), 0);
        assert_eq!(visited_count(&state), 0);
        assert!(state.first_node().is_none());
        assert!(state.current_node().is_none());
        assert!(!state.all_finished());
    }

    #[test]
    fn test_update_marks_one_node_per_row() {
        let state = TspState::new(test_coords(4, 6));
        let state = state.update(select(4, 2));
        assert_eq!(state.step(), 1);
        assert_eq!(visited_count(&state), 4);

        let state = state.update(select(4, 5));
        assert_eq!(state.step(), 2);
        assert_eq!(visited_count(&state), 8);
    }

    #[test]
    fn test_mask_count_matches_step() {
        // Property: i nodes visited before the i-th action, i+1 after.
        let mut state = TspState::new(test_coords(2, 5));
        for i in 0..5 {
            assert_eq!(visited_count(&state), 2 * i as i64);
            state = state.update(select(2, i as i64));
            assert_eq!(visited_count(&state), 2 * (i as i64 + 1));
        }
        assert!(state.all_finished());
    }

    #[test]
    fn test_first_node_stays_fixed() {
        let state = TspState::new(test_coords(2, 4));
        let state = state.update(select(2, 3));
        let state = state.update(select(2, 1));

        let first: Vec<i64> = state
            .first_node()
            .unwrap()
            .clone()
            .into_data()
            .to_vec()
            .unwrap();
        let current: Vec<i64> = state
            .current_node()
            .unwrap()
            .clone()
            .into_data()
            .to_vec()
            .unwrap();
        assert_eq!(first, vec![3, 3]);
        assert_eq!(current, vec![1, 1]);
    }

    #[test]
    fn test_update_is_persistent() {
        let state = TspState::new(test_coords(1, 3));
        let next = state.update(select(1, 0));
        // The original state is untouched.
        assert_eq!(state.step(), 0);
        assert_eq!(visited_count(&state), 0);
        assert_eq!(next.step(), 1);
    }

    #[test]
    #[should_panic(expected = "finished state")]
    fn test_update_past_terminal_panics() {
        let state = TspState::new(test_coords(1, 1));
        let state = state.update(select(1, 0));
        assert!(state.all_finished());
        let _ = state.update(select(1, 0));
    }

    #[test]
    fn test_single_node_finishes_in_one_step() {
        let state = TspState::new(test_coords(2, 1));
        let state = state.update(select(2, 0));
        assert!(state.all_finished());
        assert_eq!(state.step(), 1);
    }
}
