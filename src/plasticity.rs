//! Spike-timing-dependent plasticity rules
//!
//! Two interchangeable STDP variants share the same per-edge parameters:
//!
//! - [`StdpMode::Trace`] (default): per-synapse exponential pre/post
//!   traces updated once per spike. Depression is applied when a spike is
//!   delivered through the edge, potentiation when the post-synaptic
//!   neuron fires. Each spike pair contributes exactly once and the
//!   per-event cost is constant.
//! - [`StdpMode::Pairwise`]: on every delivery, sum the kernel over all
//!   pre/post spike pairs inside a trailing 100 ms window. Cost grows
//!   with history length squared and pairs can recontribute across
//!   deliveries; retained for behavioural parity with the original
//!   pair-summation rule.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::synapse::Synapse;

/// Trailing window over spike histories for the pairwise rule (ms)
pub const STDP_WINDOW_MS: f64 = 100.0;

/// Which STDP formulation a network applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StdpMode {
    /// Exponential pre/post traces, one contribution per spike pair
    #[default]
    Trace,
    /// All-pairs summation over the trailing history window
    Pairwise,
}

/// Per-edge STDP parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlasticityParams {
    /// Whether this edge learns at all
    pub enabled: bool,
    /// Potentiation amplitude
    pub a_plus: f32,
    /// Depression amplitude
    pub a_minus: f32,
    /// Potentiation time constant (ms)
    pub tau_plus: f32,
    /// Depression time constant (ms)
    pub tau_minus: f32,
}

impl Default for PlasticityParams {
    fn default() -> Self {
        Self {
            enabled: true,
            a_plus: 0.01,
            a_minus: 0.012,
            tau_plus: 20.0,
            tau_minus: 20.0,
        }
    }
}

impl PlasticityParams {
    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        if self.a_plus < 0.0 {
            return Err(EngineError::invalid_parameter(
                "a_plus",
                self.a_plus.to_string(),
                ">= 0.0",
            ));
        }
        if self.a_minus < 0.0 {
            return Err(EngineError::invalid_parameter(
                "a_minus",
                self.a_minus.to_string(),
                ">= 0.0",
            ));
        }
        if self.tau_plus <= 0.0 {
            return Err(EngineError::invalid_parameter(
                "tau_plus",
                self.tau_plus.to_string(),
                "> 0.0",
            ));
        }
        if self.tau_minus <= 0.0 {
            return Err(EngineError::invalid_parameter(
                "tau_minus",
                self.tau_minus.to_string(),
                "> 0.0",
            ));
        }
        Ok(())
    }
}

/// Kernel sum over all pre/post spike pairs in the trailing window.
///
/// `dt = t_post - t_pre`; positive pairs potentiate, negative pairs
/// depress, coincident pairs contribute nothing.
pub(crate) fn pairwise_delta(
    params: &PlasticityParams,
    pre_history: &VecDeque<f64>,
    post_history: &VecDeque<f64>,
    now_ms: f64,
) -> f32 {
    let cutoff = now_ms - STDP_WINDOW_MS;
    let mut delta = 0.0f32;

    for &t_pre in pre_history.iter().filter(|&&t| t > cutoff) {
        for &t_post in post_history.iter().filter(|&&t| t > cutoff) {
            let dt = (t_post - t_pre) as f32;
            if dt > 0.0 {
                delta += params.a_plus * (-dt / params.tau_plus).exp();
            } else if dt < 0.0 {
                delta -= params.a_minus * (dt / params.tau_minus).exp();
            }
        }
    }

    delta
}

/// Decay a synapse's traces forward to `now_ms`
fn decay_traces(synapse: &mut Synapse, now_ms: f64) {
    let elapsed = (now_ms - synapse.trace_time) as f32;
    if elapsed > 0.0 {
        synapse.pre_trace *= (-elapsed / synapse.plasticity.tau_plus).exp();
        synapse.post_trace *= (-elapsed / synapse.plasticity.tau_minus).exp();
    }
    synapse.trace_time = now_ms;
}

/// Trace rule, pre side: a spike was delivered through this edge.
/// Depress by the decayed post trace, then mark the pre spike.
pub(crate) fn trace_on_delivery(synapse: &mut Synapse, now_ms: f64) {
    decay_traces(synapse, now_ms);
    let delta = -synapse.plasticity.a_minus * synapse.post_trace;
    synapse.apply_weight_delta(delta, now_ms);
    synapse.pre_trace += 1.0;
}

/// Trace rule, post side: the post-synaptic neuron fired.
/// Potentiate by the decayed pre trace, then mark the post spike.
pub(crate) fn trace_on_post_spike(synapse: &mut Synapse, now_ms: f64) {
    decay_traces(synapse, now_ms);
    let delta = synapse.plasticity.a_plus * synapse.pre_trace;
    synapse.apply_weight_delta(delta, now_ms);
    synapse.post_trace += 1.0;
}
