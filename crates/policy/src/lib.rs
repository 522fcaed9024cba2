//! Attention-based encoder-decoder policy for constructive tour building.
//!
//! The model encodes node coordinates into per-node embeddings once, then
//! autoregressively selects one node per step: a context query attends over
//! precomputed node projections (the fixed context), producing masked,
//! tanh-clipped action logits. A value critic estimates expected remaining
//! cost from the unvisited set as a baseline signal. The decode loop is
//! generic over the problem via trait seams, so it can roll out freely or
//! replay a reference tour for likelihood evaluation.
//!
//! # Key types
//!
//! - [`AttentionModel`] / [`AttentionModelConfig`]: the full policy + critic
//! - [`Rollout`]: aggregated per-step outputs of one forward pass
//! - [`DecodeOptions`] / [`DecodeType`]: greedy or sampled selection
//! - [`Problem`] / [`ProblemState`]: capability traits for the environment
//! - [`EuclideanTsp`]: adapter implementing the traits for the tsp crate

pub mod adapters;
pub mod critic;
pub mod decode;
pub mod decoder;
pub mod encoder;
pub mod heads;
pub mod model;
pub mod problem;

pub use adapters::EuclideanTsp;
pub use critic::{ValueNet, ValueNetConfig};
pub use decode::{DecodeOptions, DecodeType, PolicyError};
pub use decoder::{DecoderHead, DecoderHeadConfig, FixedContext};
pub use encoder::{GraphEncoder, GraphEncoderConfig};
pub use model::{tour_log_likelihood, AttentionModel, AttentionModelConfig, Rollout};
pub use problem::{Problem, ProblemState};
