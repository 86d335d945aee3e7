//! Leaky integrate-and-fire neuron model
//!
//! Single-compartment LIF dynamics with refractory gating, spike-frequency
//! adaptation, and bounded spike/voltage histories read by the learning
//! rule and the statistics layer.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Bound on the spike and voltage history ring buffers
pub const HISTORY_CAPACITY: usize = 200;

/// Ceiling applied to the membrane potential after integration (mV).
/// Pathological inputs saturate here instead of propagating non-finite
/// values through the network.
const V_CLAMP_MAX_MV: f32 = 200.0;

/// Parameters for a leaky integrate-and-fire neuron
///
/// All values are in biological units: millivolts, milliseconds,
/// picofarads, megaohms, picoamps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeuronParams {
    /// Firing threshold (mV); mutated by the homeostatic controller
    pub threshold: f32,
    /// Resting potential (mV)
    pub v_rest: f32,
    /// Reset potential after a spike (mV)
    pub v_reset: f32,
    /// Membrane time constant (ms)
    pub tau_m: f32,
    /// Absolute refractory period (ms)
    pub t_refrac: f32,
    /// Membrane capacitance (pF)
    pub c_m: f32,
    /// Membrane resistance (MΩ)
    pub r_m: f32,
    /// Adaptation current time constant (ms)
    pub tau_adapt: f32,
    /// Adaptation current increment per spike (pA)
    pub adapt_increment: f32,
}

impl Default for NeuronParams {
    fn default() -> Self {
        Self {
            threshold: -50.0,
            v_rest: -70.0,
            v_reset: -70.0,
            tau_m: 20.0,
            t_refrac: 2.0,
            c_m: 100.0,
            r_m: 200.0,
            tau_adapt: 100.0,
            adapt_increment: 2.0,
        }
    }
}

impl NeuronParams {
    /// Create new neuron parameters with validation
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        threshold: f32,
        v_rest: f32,
        v_reset: f32,
        tau_m: f32,
        t_refrac: f32,
        c_m: f32,
        r_m: f32,
        tau_adapt: f32,
        adapt_increment: f32,
    ) -> Result<Self> {
        let params = Self {
            threshold,
            v_rest,
            v_reset,
            tau_m,
            t_refrac,
            c_m,
            r_m,
            tau_adapt,
            adapt_increment,
        };
        params.validate()?;
        Ok(params)
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        if self.tau_m <= 0.0 {
            return Err(EngineError::invalid_parameter(
                "tau_m",
                self.tau_m.to_string(),
                "> 0.0",
            ));
        }
        if self.threshold <= self.v_rest {
            return Err(EngineError::invalid_parameter(
                "threshold",
                format!("{} (with v_rest={})", self.threshold, self.v_rest),
                "> v_rest",
            ));
        }
        if self.v_reset > self.v_rest {
            return Err(EngineError::invalid_parameter(
                "v_reset",
                format!("{} (with v_rest={})", self.v_reset, self.v_rest),
                "<= v_rest",
            ));
        }
        if self.t_refrac < 0.0 {
            return Err(EngineError::invalid_parameter(
                "t_refrac",
                self.t_refrac.to_string(),
                ">= 0.0",
            ));
        }
        if self.c_m <= 0.0 {
            return Err(EngineError::invalid_parameter(
                "c_m",
                self.c_m.to_string(),
                "> 0.0",
            ));
        }
        if self.r_m <= 0.0 {
            return Err(EngineError::invalid_parameter(
                "r_m",
                self.r_m.to_string(),
                "> 0.0",
            ));
        }
        if self.tau_adapt <= 0.0 {
            return Err(EngineError::invalid_parameter(
                "tau_adapt",
                self.tau_adapt.to_string(),
                "> 0.0",
            ));
        }
        if self.adapt_increment < 0.0 {
            return Err(EngineError::invalid_parameter(
                "adapt_increment",
                self.adapt_increment.to_string(),
                ">= 0.0",
            ));
        }
        Ok(())
    }
}

/// A single leaky integrate-and-fire neuron
#[derive(Debug, Clone)]
pub struct Neuron {
    /// Neuron parameters; `threshold` is the only field the engine mutates
    /// after construction (homeostatic regulation)
    pub params: NeuronParams,
    v_m: f32,
    adaptation: f32,
    fired: bool,
    refractory_until: f64,
    last_spike_time: Option<f64>,
    spike_history: VecDeque<f64>,
    voltage_history: VecDeque<f32>,
    total_spikes: u64,
}

impl Neuron {
    /// Create a neuron at rest with the given parameters
    pub fn new(params: NeuronParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            v_m: params.v_rest,
            adaptation: 0.0,
            fired: false,
            refractory_until: 0.0,
            last_spike_time: None,
            spike_history: VecDeque::with_capacity(HISTORY_CAPACITY),
            voltage_history: VecDeque::with_capacity(HISTORY_CAPACITY),
            total_spikes: 0,
        })
    }

    /// Advance the neuron by one time step and report whether it fired.
    ///
    /// `input` is the summed injected plus synaptic current in pA. During
    /// the refractory window the membrane is held at the reset potential
    /// and no integration happens.
    pub fn step(&mut self, input: f32, dt_ms: f32, now_ms: f64) -> bool {
        self.fired = false;

        if now_ms < self.refractory_until {
            self.v_m = self.params.v_reset;
            return false;
        }

        let p = self.params;
        let effective = input - self.adaptation;

        // Forward Euler. The drive term is I·R over the RC product, with
        // pA·MΩ read as µV and pF·MΩ as µs (hence the 1e-3 factors).
        let i_drive = effective * 1e-3 * p.r_m;
        let tau_rc = p.c_m * p.r_m * 1e-3;
        let dv = (p.v_rest - self.v_m) / p.tau_m + i_drive / tau_rc;
        self.v_m += dv * dt_ms;

        if !self.v_m.is_finite() {
            self.v_m = p.v_reset;
        }
        // Reset potential is the floor; the ceiling absorbs runaway drive
        self.v_m = self.v_m.min(V_CLAMP_MAX_MV).max(p.v_reset);

        self.adaptation *= (-dt_ms / p.tau_adapt).exp();

        push_bounded(&mut self.voltage_history, self.v_m);

        if self.v_m >= self.params.threshold {
            self.fired = true;
            self.last_spike_time = Some(now_ms);
            self.refractory_until = now_ms + f64::from(p.t_refrac);
            self.v_m = p.v_reset;
            self.adaptation += p.adapt_increment;
            self.total_spikes += 1;
            push_bounded(&mut self.spike_history, now_ms);
        }

        self.fired
    }

    /// Restore the neuron to its construction-time state
    pub fn reset(&mut self) {
        self.v_m = self.params.v_rest;
        self.adaptation = 0.0;
        self.fired = false;
        self.refractory_until = 0.0;
        self.last_spike_time = None;
        self.spike_history.clear();
        self.voltage_history.clear();
        self.total_spikes = 0;
    }

    /// Firing rate in Hz estimated from the last up-to-10 recorded spikes.
    /// Returns 0 when fewer than two spikes have been recorded.
    pub fn instantaneous_firing_rate(&self) -> f32 {
        let n = self.spike_history.len();
        if n < 2 {
            return 0.0;
        }
        let recent: Vec<f64> = self
            .spike_history
            .iter()
            .skip(n.saturating_sub(10))
            .copied()
            .collect();
        let total: f64 = recent.windows(2).map(|w| w[1] - w[0]).sum();
        let mean_isi = total / (recent.len() - 1) as f64;
        if mean_isi <= 0.0 {
            0.0
        } else {
            (1000.0 / mean_isi) as f32
        }
    }

    /// Membrane potential mapped to `[0, 1]` between rest and threshold
    pub fn normalized_potential(&self) -> f32 {
        let denom = self.params.threshold - self.params.v_rest;
        let x = (self.v_m - self.params.v_rest) / denom;
        if x.is_finite() {
            x.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Whether the neuron is refractory at time `t`
    pub fn is_refractory(&self, t: f64) -> bool {
        t < self.refractory_until
    }

    /// Current membrane potential (mV)
    pub fn membrane_potential(&self) -> f32 {
        self.v_m
    }

    /// Current adaptation current (pA)
    pub fn adaptation_current(&self) -> f32 {
        self.adaptation
    }

    /// Whether the neuron fired during the most recent step
    pub fn fired_this_step(&self) -> bool {
        self.fired
    }

    /// Time of the most recent spike, if any (ms)
    pub fn last_spike_time(&self) -> Option<f64> {
        self.last_spike_time
    }

    /// Spikes emitted since construction or the last reset
    pub fn total_spikes(&self) -> u64 {
        self.total_spikes
    }

    /// Recent spike times (ms), oldest first, bounded
    pub fn spike_history(&self) -> &VecDeque<f64> {
        &self.spike_history
    }

    /// Recent membrane potentials (mV), oldest first, bounded
    pub fn voltage_history(&self) -> &VecDeque<f32> {
        &self.voltage_history
    }
}

fn push_bounded<T>(buf: &mut VecDeque<T>, value: T) {
    if buf.len() == HISTORY_CAPACITY {
        buf.pop_front();
    }
    buf.push_back(value);
}
