//! Bridges between the decode-loop traits and the tsp crate types.

use burn::prelude::*;
use tsp::TspState;

use crate::problem::{Problem, ProblemState};

/// Euclidean TSP as a rollout problem.
pub struct EuclideanTsp;

impl<B: Backend> Problem<B> for EuclideanTsp {
    type State = TspState<B>;

    fn make_state(&self, coords: Tensor<B, 3>) -> TspState<B> {
        TspState::new(coords)
    }

    fn costs(&self, coords: &Tensor<B, 3>, tours: &Tensor<B, 2, Int>) -> Tensor<B, 1> {
        tsp::tour_costs(coords, tours)
    }
}

impl<B: Backend> ProblemState<B> for TspState<B> {
    fn step(&self) -> usize {
        TspState::step(self)
    }

    fn all_finished(&self) -> bool {
        TspState::all_finished(self)
    }

    fn visited_mask(&self) -> Tensor<B, 2, Bool> {
        TspState::visited_mask(self)
    }

    fn first_node(&self) -> Option<Tensor<B, 2, Int>> {
        TspState::first_node(self).cloned()
    }

    fn current_node(&self) -> Option<Tensor<B, 2, Int>> {
        TspState::current_node(self).cloned()
    }

    fn update(&self, selected: Tensor<B, 2, Int>) -> Self {
        TspState::update(self, selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_trait_round_trip() {
        let device = Default::default();
        let coords = Tensor::<TestBackend, 3>::random(
            [2, 4, 2],
            Distribution::Uniform(0.0, 1.0),
            &device,
        );
        let problem = EuclideanTsp;
        let state = Problem::<TestBackend>::make_state(&problem, coords);
        assert_eq!(ProblemState::<TestBackend>::step(&state), 0);
        assert!(!ProblemState::<TestBackend>::all_finished(&state));
        assert!(ProblemState::<TestBackend>::first_node(&state).is_none());
    }
}
