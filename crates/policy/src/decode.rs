use std::str::FromStr;

use serde::Deserialize;

/// Errors from policy configuration.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// Decode mode string not recognized.
    #[error("unsupported decode type {0:?} (expected \"greedy\" or \"sampling\")")]
    UnsupportedDecodeType(String),
}

/// How the next node is chosen from the action distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeType {
    /// Arg-max over action probabilities.
    Greedy,
    /// Categorical draw from the action distribution.
    Sampling,
}

impl FromStr for DecodeType {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greedy" => Ok(Self::Greedy),
            "sampling" => Ok(Self::Sampling),
            other => Err(PolicyError::UnsupportedDecodeType(other.to_string())),
        }
    }
}

/// Decode configuration threaded through each forward call.
///
/// This is an explicit per-call parameter rather than mutable model state,
/// so concurrent evaluations cannot interfere with each other.
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    pub decode_type: DecodeType,
    /// Temperature divisor applied to logits before the log-softmax.
    pub temperature: f64,
}

impl DecodeOptions {
    pub fn greedy() -> Self {
        Self {
            decode_type: DecodeType::Greedy,
            temperature: 1.0,
        }
    }

    pub fn sampling(temperature: f64) -> Self {
        Self {
            decode_type: DecodeType::Sampling,
            temperature,
        }
    }
}
