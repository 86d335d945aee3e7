//! Error types for the simulation engine

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while configuring or driving the engine
///
/// Configuration errors fail fast and never corrupt network state.
/// Numerical degeneracies during stepping are clamped in-band and do
/// not surface as errors.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid parameter value
    #[error("Invalid parameter {parameter}: {value} (expected {constraint})")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Neuron index out of range
    #[error("Neuron {index} not found (network has {count} neurons)")]
    NeuronNotFound {
        /// Index that was out of range
        index: usize,
        /// Number of neurons in the network
        count: usize,
    },

    /// Topology construction error
    #[error("Invalid topology: {reason}")]
    InvalidTopology {
        /// Reason the topology could not be built
        reason: String,
    },
}

impl EngineError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }

    /// Create a neuron-not-found error
    pub fn neuron_not_found(index: usize, count: usize) -> Self {
        Self::NeuronNotFound { index, count }
    }

    /// Create an invalid topology error
    pub fn invalid_topology(reason: impl Into<String>) -> Self {
        Self::InvalidTopology {
            reason: reason.into(),
        }
    }
}
