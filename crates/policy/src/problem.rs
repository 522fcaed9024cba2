//! Capability traits between the decode loop and the problem environment.
//!
//! The decode loop only needs mask/first/current/termination queries and a
//! cost function, so those are trait seams: alternative constructive problems
//! can be rolled out without touching the model. Implementations for the tsp
//! crate live in [`crate::adapters`].

use burn::prelude::*;

/// Per-step construction state for a batch of instances.
///
/// States are immutable per step: `update` returns the successor state and
/// leaves `self` untouched.
pub trait ProblemState<B: Backend>: Sized {
    /// Number of selections made so far.
    fn step(&self) -> usize;

    /// True once every position of the solution is filled.
    fn all_finished(&self) -> bool;

    /// Boolean mask over actions, shape `(batch, nodes)`; true = infeasible.
    fn visited_mask(&self) -> Tensor<B, 2, Bool>;

    /// First selected node per row `(batch, 1)`, `None` before step 1.
    fn first_node(&self) -> Option<Tensor<B, 2, Int>>;

    /// Most recently selected node per row `(batch, 1)`, `None` before step 1.
    fn current_node(&self) -> Option<Tensor<B, 2, Int>>;

    /// Successor state after selecting `selected`, shape `(batch, 1)`.
    fn update(&self, selected: Tensor<B, 2, Int>) -> Self;
}

/// A constructive combinatorial problem the decode loop can roll out.
pub trait Problem<B: Backend> {
    type State: ProblemState<B>;

    /// Fresh state for a batch of instances, coordinates `(batch, nodes, 2)`.
    fn make_state(&self, coords: Tensor<B, 3>) -> Self::State;

    /// Total solution cost per batch row, shape `(batch,)`.
    ///
    /// Must validate feasibility of `tours` and abort on violations.
    fn costs(&self, coords: &Tensor<B, 3>, tours: &Tensor<B, 2, Int>) -> Tensor<B, 1>;
}
