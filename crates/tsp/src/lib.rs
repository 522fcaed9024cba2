//! Euclidean TSP environment for constructive tour rollouts.
//!
//! Provides the problem side of the solver: random instance generation,
//! the per-step visitation state consumed by the decode loop, and tour
//! cost evaluation. The policy crate drives this via its problem traits.
//!
//! # Key types
//!
//! - [`TspState`]: immutable-per-step visitation state (mask, first/current
//!   node, step counter)
//! - [`tour_costs`] / [`edge_distance`]: batched Euclidean tour costs
//! - [`random_instances`]: uniform `[0,1)^2` instance generation

pub mod cost;
pub mod generate;
pub mod state;

pub use cost::{edge_distance, tour_costs};
pub use generate::random_instances;
pub use state::TspState;
