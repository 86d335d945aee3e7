//! Synapse record with axonal delay and per-edge plasticity state

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::plasticity::PlasticityParams;

/// Lower weight bound
pub const WEIGHT_MIN: f32 = 0.0;
/// Upper weight bound
pub const WEIGHT_MAX: f32 = 2.0;
/// Weight changes smaller than this do not touch the history
pub const WEIGHT_EPSILON: f32 = 0.001;
/// Bound on the per-synapse weight history
pub const WEIGHT_HISTORY_CAPACITY: usize = 100;

/// Stable identifier for a synapse
///
/// Identifies the edge across event deliveries; unlike the neuron index
/// pair it survives topology rebuilds that reuse indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SynapseId(pub u64);

impl SynapseId {
    /// Create a new synapse ID
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SynapseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "syn{}", self.0)
    }
}

/// Directed, weighted, delayed edge between two neurons
///
/// Only the owning network mutates `weight`; everything else is fixed at
/// construction. The weight history starts with the construction weight,
/// which `reset` restores.
#[derive(Debug, Clone)]
pub struct Synapse {
    id: SynapseId,
    /// Pre-synaptic neuron index
    pub from: usize,
    /// Post-synaptic neuron index
    pub to: usize,
    /// Axonal delay in whole milliseconds, at least 1
    pub delay_ms: u32,
    /// Per-edge plasticity parameters
    pub plasticity: PlasticityParams,
    weight: f32,
    weight_history: Vec<f32>,
    last_update_time: f64,
    // Exponential traces for the online STDP variant
    pub(crate) pre_trace: f32,
    pub(crate) post_trace: f32,
    pub(crate) trace_time: f64,
}

impl Synapse {
    /// Create a synapse; fails fast on an out-of-range weight or zero delay
    pub fn new(
        id: SynapseId,
        from: usize,
        to: usize,
        weight: f32,
        delay_ms: u32,
        plasticity: PlasticityParams,
    ) -> Result<Self> {
        if !(WEIGHT_MIN..=WEIGHT_MAX).contains(&weight) {
            return Err(EngineError::invalid_parameter(
                "weight",
                weight.to_string(),
                format!("in [{}, {}]", WEIGHT_MIN, WEIGHT_MAX),
            ));
        }
        if delay_ms < 1 {
            return Err(EngineError::invalid_parameter(
                "delay_ms",
                delay_ms.to_string(),
                ">= 1",
            ));
        }
        plasticity.validate()?;
        Ok(Self {
            id,
            from,
            to,
            delay_ms,
            plasticity,
            weight,
            weight_history: vec![weight],
            last_update_time: 0.0,
            pre_trace: 0.0,
            post_trace: 0.0,
            trace_time: 0.0,
        })
    }

    /// Stable identifier
    pub fn id(&self) -> SynapseId {
        self.id
    }

    /// Current weight
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// The construction-time weight, restored by `reset`
    pub fn initial_weight(&self) -> f32 {
        self.weight_history[0]
    }

    /// Recorded weight values, oldest first; `[0]` is the construction weight
    pub fn weight_history(&self) -> &[f32] {
        &self.weight_history
    }

    /// Time of the last recorded weight change (ms)
    pub fn last_update_time(&self) -> f64 {
        self.last_update_time
    }

    /// Apply a weight change, clamping into bounds. Changes larger than
    /// `WEIGHT_EPSILON` are appended to the bounded history.
    pub(crate) fn apply_weight_delta(&mut self, delta: f32, now_ms: f64) {
        let old = self.weight;
        let new = (old + delta).clamp(WEIGHT_MIN, WEIGHT_MAX);
        self.weight = new;
        if (new - old).abs() > WEIGHT_EPSILON {
            if self.weight_history.len() == WEIGHT_HISTORY_CAPACITY {
                // Keep the construction weight at index 0 for reset
                self.weight_history.remove(1);
            }
            self.weight_history.push(new);
            self.last_update_time = now_ms;
        }
    }

    /// Restore the construction weight and truncate the history to it
    pub fn reset(&mut self) {
        self.weight = self.weight_history[0];
        self.weight_history.truncate(1);
        self.last_update_time = 0.0;
        self.pre_trace = 0.0;
        self.post_trace = 0.0;
        self.trace_time = 0.0;
    }
}
