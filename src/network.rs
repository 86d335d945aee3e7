//! Network container and per-step scheduling
//!
//! Owns the neuron sequence, the synapse sequence, and the in-flight
//! event queue, and advances the whole system one time step at a time.
//! The per-step ordering is fixed: advance time, drain due deliveries
//! (applying STDP per delivery), integrate neurons and emit delayed
//! events, record population activity, recompute synchrony, and run the
//! homeostatic controller on its cadence.

use std::collections::{HashMap, VecDeque};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{EngineError, Result};
use crate::event::{EventQueue, SpikeEvent};
use crate::neuron::{Neuron, NeuronParams};
use crate::plasticity::{self, PlasticityParams, StdpMode};
use crate::synapse::{Synapse, SynapseId};
use crate::topology::{self, Blueprint};

/// Bound on the population activity history (entries, one per step)
pub const ACTIVITY_CAPACITY: usize = 1000;
/// Number of trailing activity entries feeding the synchrony index
const SYNCHRONY_WINDOW: usize = 10;
/// Threshold adjustment per homeostasis pass, per Hz of rate error
const HOMEOSTASIS_GAIN: f32 = 0.001;
/// Rate errors smaller than this leave the threshold alone (Hz)
const HOMEOSTASIS_DEADBAND_HZ: f32 = 1.0;
/// Homeostatic threshold floor (mV)
const THRESHOLD_MIN_MV: f32 = -60.0;
/// Homeostatic threshold ceiling (mV)
const THRESHOLD_MAX_MV: f32 = -40.0;
/// Tolerance when comparing the accumulated clock against arrival times
const TIME_EPSILON_MS: f64 = 1e-9;

/// Read-only snapshot of network-level statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    /// Cumulative spikes across all neurons
    pub total_spikes: u64,
    /// Mean instantaneous firing rate across neurons (Hz)
    pub avg_firing_rate: f32,
    /// Number of synapses
    pub total_synapses: usize,
    /// Mean synaptic weight
    pub avg_weight: f32,
    /// Synapse count over the number of possible directed edges
    pub connectivity: f32,
    /// Neurons that spiked within the trailing 100 ms
    pub active_neurons: usize,
    /// Variance-to-mean ratio of recent population activity
    pub synchrony_index: f32,
    /// Current simulation time (ms)
    pub current_time: f64,
}

/// A spiking neural network advanced in discrete time steps
///
/// The network exclusively owns its neurons, synapses, and queued
/// events. Global simulation switches are plain public fields; external
/// code mutates them between steps (the engine is single-threaded, see
/// the crate docs).
#[derive(Debug)]
pub struct Network {
    neurons: Vec<Neuron>,
    synapses: Vec<Synapse>,
    synapse_index: HashMap<SynapseId, usize>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
    queue: EventQueue,
    injection: Vec<f32>,
    activity: VecDeque<u32>,
    synchrony_index: f32,
    current_time: f64,
    next_synapse_id: u64,
    rng: StdRng,

    /// Simulation step size (ms)
    pub dt_ms: f64,
    /// Master switch for all STDP updates
    pub plasticity_enabled: bool,
    /// Master switch for homeostatic threshold regulation
    pub homeostasis_enabled: bool,
    /// Firing rate the homeostatic controller steers toward (Hz)
    pub target_rate_hz: f32,
    /// Which STDP formulation to apply
    pub stdp_mode: StdpMode,
}

impl Network {
    /// Create an empty network with entropy-seeded randomness
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create an empty network with a fixed seed; identical seeds yield
    /// identical topologies
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            neurons: Vec::new(),
            synapses: Vec::new(),
            synapse_index: HashMap::new(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
            queue: EventQueue::new(),
            injection: Vec::new(),
            activity: VecDeque::with_capacity(ACTIVITY_CAPACITY),
            synchrony_index: 0.0,
            current_time: 0.0,
            next_synapse_id: 0,
            rng,
            dt_ms: crate::DEFAULT_DT_MS,
            plasticity_enabled: true,
            homeostasis_enabled: false,
            target_rate_hz: 10.0,
            stdp_mode: StdpMode::default(),
        }
    }

    /// Add a neuron, returning its index. Indices are stable for the
    /// lifetime of the network.
    pub fn add_neuron(&mut self, params: NeuronParams) -> Result<usize> {
        let neuron = Neuron::new(params)?;
        self.neurons.push(neuron);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        self.injection.push(0.0);
        Ok(self.neurons.len() - 1)
    }

    /// Add a synapse between two existing neurons
    pub fn add_synapse(
        &mut self,
        from: usize,
        to: usize,
        weight: f32,
        delay_ms: u32,
        plasticity: PlasticityParams,
    ) -> Result<SynapseId> {
        let count = self.neurons.len();
        if from >= count {
            return Err(EngineError::neuron_not_found(from, count));
        }
        if to >= count {
            return Err(EngineError::neuron_not_found(to, count));
        }
        self.push_synapse(from, to, weight, delay_ms, plasticity)
    }

    fn push_synapse(
        &mut self,
        from: usize,
        to: usize,
        weight: f32,
        delay_ms: u32,
        plasticity: PlasticityParams,
    ) -> Result<SynapseId> {
        let id = SynapseId::new(self.next_synapse_id);
        let synapse = Synapse::new(id, from, to, weight, delay_ms, plasticity)?;
        self.next_synapse_id += 1;
        let index = self.synapses.len();
        self.synapse_index.insert(id, index);
        self.outgoing[from].push(index);
        self.incoming[to].push(index);
        self.synapses.push(synapse);
        Ok(id)
    }

    /// Accumulate external currents (pA) into the injection buffer
    /// consumed by the next `step`
    pub fn inject(&mut self, currents: &[f32]) {
        for (slot, current) in self.injection.iter_mut().zip(currents) {
            *slot += current;
        }
    }

    /// Accumulate an external current (pA) into one neuron's slot
    pub fn inject_current(&mut self, index: usize, current: f32) -> Result<()> {
        let count = self.neurons.len();
        let slot = self
            .injection
            .get_mut(index)
            .ok_or(EngineError::NeuronNotFound { index, count })?;
        *slot += current;
        Ok(())
    }

    /// Advance the simulation by one time step; returns the number of
    /// neurons that fired this step
    pub fn step(&mut self) -> usize {
        self.current_time += self.dt_ms;
        let now = self.current_time;
        let n = self.neurons.len();

        // Per-neuron input accumulator, seeded with the injection buffer
        let mut inputs = std::mem::replace(&mut self.injection, vec![0.0; n]);
        inputs.resize(n, 0.0);

        // Deliver due events; each delivery triggers one STDP evaluation
        for event in self.queue.drain_due(now + TIME_EPSILON_MS) {
            if event.target < n {
                inputs[event.target] += event.weight_at_emission;
            }
            if let Some(&index) = self.synapse_index.get(&event.synapse_id) {
                self.stdp_on_delivery(index, event.source, event.target, now);
            }
        }

        // Integrate neurons; fired neurons emit delayed events on every
        // outgoing synapse, with the weight observed at emission
        let mut active_spikes = 0u32;
        for i in 0..n {
            let fired = self.neurons[i].step(inputs[i], self.dt_ms as f32, now);
            if !fired {
                continue;
            }
            active_spikes += 1;
            for &si in &self.outgoing[i] {
                let synapse = &self.synapses[si];
                self.queue.enqueue(SpikeEvent {
                    source: i,
                    target: synapse.to,
                    weight_at_emission: synapse.weight(),
                    arrival_time: now + f64::from(synapse.delay_ms),
                    synapse_id: synapse.id(),
                });
            }
            if self.plasticity_enabled && self.stdp_mode == StdpMode::Trace {
                for &si in &self.incoming[i] {
                    if self.synapses[si].plasticity.enabled {
                        plasticity::trace_on_post_spike(&mut self.synapses[si], now);
                    }
                }
            }
        }

        if self.activity.len() == ACTIVITY_CAPACITY {
            self.activity.pop_front();
        }
        self.activity.push_back(active_spikes);
        self.update_synchrony();

        if self.homeostasis_enabled && (now.floor() as i64).rem_euclid(100) == 0 {
            self.apply_homeostasis();
        }

        active_spikes as usize
    }

    fn stdp_on_delivery(&mut self, index: usize, source: usize, target: usize, now: f64) {
        if !self.plasticity_enabled || !self.synapses[index].plasticity.enabled {
            return;
        }
        match self.stdp_mode {
            StdpMode::Trace => plasticity::trace_on_delivery(&mut self.synapses[index], now),
            StdpMode::Pairwise => {
                let (Some(pre), Some(post)) = (self.neurons.get(source), self.neurons.get(target))
                else {
                    return;
                };
                let delta = plasticity::pairwise_delta(
                    &self.synapses[index].plasticity,
                    pre.spike_history(),
                    post.spike_history(),
                    now,
                );
                if delta != 0.0 {
                    self.synapses[index].apply_weight_delta(delta, now);
                }
            }
        }
    }

    fn update_synchrony(&mut self) {
        if self.activity.len() < SYNCHRONY_WINDOW {
            self.synchrony_index = 0.0;
            return;
        }
        let recent: Vec<f32> = self
            .activity
            .iter()
            .rev()
            .take(SYNCHRONY_WINDOW)
            .map(|&a| a as f32)
            .collect();
        let mean = recent.iter().sum::<f32>() / recent.len() as f32;
        let variance =
            recent.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / recent.len() as f32;
        self.synchrony_index = variance / (mean + 0.001);
    }

    /// Nudge each neuron's threshold against its rate error: firing above
    /// target raises the threshold, firing below lowers it.
    fn apply_homeostasis(&mut self) {
        let mut adjusted = 0usize;
        for neuron in self.neurons.iter_mut() {
            let rate = neuron.instantaneous_firing_rate();
            let error = self.target_rate_hz - rate;
            if error.abs() > HOMEOSTASIS_DEADBAND_HZ {
                let threshold = neuron.params.threshold + HOMEOSTASIS_GAIN * (rate - self.target_rate_hz);
                neuron.params.threshold = threshold.clamp(THRESHOLD_MIN_MV, THRESHOLD_MAX_MV);
                adjusted += 1;
            }
        }
        if adjusted > 0 {
            trace!(adjusted, time_ms = self.current_time, "homeostasis pass");
        }
    }

    /// Replace the whole population with a random graph
    pub fn create_random(&mut self, size: usize, p: f64) -> Result<()> {
        let blueprint = topology::random(size, p, &mut self.rng)?;
        self.apply_blueprint(blueprint)
    }

    /// Replace the whole population with a three-layer feedforward net
    pub fn create_feedforward(&mut self, size: usize) -> Result<()> {
        let blueprint = topology::feedforward(size, &mut self.rng)?;
        self.apply_blueprint(blueprint)
    }

    /// Replace the whole population with a directed ring
    pub fn create_ring(&mut self, size: usize) -> Result<()> {
        let blueprint = topology::ring(size)?;
        self.apply_blueprint(blueprint)
    }

    /// Replace the whole population with a rewired ring (small world)
    pub fn create_small_world(&mut self, size: usize, rewire_p: f64) -> Result<()> {
        let blueprint = topology::small_world(size, rewire_p, &mut self.rng)?;
        self.apply_blueprint(blueprint)
    }

    /// Replace the whole population with a layered cortical column
    pub fn create_cortical_column(&mut self, layer_sizes: &[usize]) -> Result<()> {
        let blueprint = topology::cortical_column(layer_sizes, &mut self.rng)?;
        self.apply_blueprint(blueprint)
    }

    fn apply_blueprint(&mut self, blueprint: Blueprint) -> Result<()> {
        let (params_list, specs) = blueprint;

        let mut neurons = Vec::with_capacity(params_list.len());
        for params in params_list {
            neurons.push(Neuron::new(params)?);
        }

        let count = neurons.len();
        self.neurons = neurons;
        self.synapses.clear();
        self.synapse_index.clear();
        self.outgoing = vec![Vec::new(); count];
        self.incoming = vec![Vec::new(); count];
        self.queue.clear();
        self.injection = vec![0.0; count];
        self.activity.clear();
        self.synchrony_index = 0.0;
        self.current_time = 0.0;

        let synapse_count = specs.len();
        for spec in specs {
            self.push_synapse(
                spec.from,
                spec.to,
                spec.weight,
                spec.delay_ms,
                PlasticityParams::default(),
            )?;
        }
        debug!(neurons = count, synapses = synapse_count, "topology applied");
        Ok(())
    }

    /// Zero time, drain the queue, and restore every neuron and synapse
    /// to its construction-time state. Idempotent.
    pub fn reset(&mut self) {
        self.current_time = 0.0;
        self.queue.clear();
        self.injection.iter_mut().for_each(|slot| *slot = 0.0);
        self.activity.clear();
        self.synchrony_index = 0.0;
        for neuron in &mut self.neurons {
            neuron.reset();
        }
        for synapse in &mut self.synapses {
            synapse.reset();
        }
    }

    /// Compute the current network statistics
    pub fn stats(&self) -> NetworkStats {
        let n = self.neurons.len();
        let total_spikes = self.neurons.iter().map(Neuron::total_spikes).sum();
        let avg_firing_rate = if n == 0 {
            0.0
        } else {
            self.neurons
                .iter()
                .map(Neuron::instantaneous_firing_rate)
                .sum::<f32>()
                / n as f32
        };
        let total_synapses = self.synapses.len();
        let avg_weight = if total_synapses == 0 {
            0.0
        } else {
            self.synapses.iter().map(Synapse::weight).sum::<f32>() / total_synapses as f32
        };
        let connectivity = if n < 2 {
            0.0
        } else {
            total_synapses as f32 / (n * (n - 1)) as f32
        };
        let cutoff = self.current_time - 100.0;
        let active_neurons = self
            .neurons
            .iter()
            .filter(|neuron| neuron.last_spike_time().is_some_and(|t| t > cutoff))
            .count();

        NetworkStats {
            total_spikes,
            avg_firing_rate,
            total_synapses,
            avg_weight,
            connectivity,
            active_neurons,
            synchrony_index: self.synchrony_index,
            current_time: self.current_time,
        }
    }

    /// Number of neurons
    pub fn neuron_count(&self) -> usize {
        self.neurons.len()
    }

    /// Number of synapses
    pub fn synapse_count(&self) -> usize {
        self.synapses.len()
    }

    /// The neurons, index-addressed
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    /// A neuron by index
    pub fn neuron(&self, index: usize) -> Option<&Neuron> {
        self.neurons.get(index)
    }

    /// Mutable access to a neuron, for collaborators adjusting parameters
    /// between steps
    pub fn neuron_mut(&mut self, index: usize) -> Option<&mut Neuron> {
        self.neurons.get_mut(index)
    }

    /// The synapses
    pub fn synapses(&self) -> &[Synapse] {
        &self.synapses
    }

    /// A synapse by id
    pub fn synapse(&self, id: SynapseId) -> Option<&Synapse> {
        self.synapse_index.get(&id).map(|&index| &self.synapses[index])
    }

    /// Spike events still in flight
    pub fn pending_events(&self) -> &[SpikeEvent] {
        self.queue.pending()
    }

    /// Current simulation time (ms)
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Spikes per step, oldest first, bounded
    pub fn activity(&self) -> &VecDeque<u32> {
        &self.activity
    }

    /// Variance-to-mean ratio of recent population activity
    pub fn synchrony_index(&self) -> f32 {
        self.synchrony_index
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIG_CURRENT: f32 = 1_000_000.0;

    /// Two neurons wired pre -> post; the post threshold sits a hair above
    /// rest so a single delivered weight drives it over.
    fn two_neuron_net(weight: f32, delay_ms: u32) -> (Network, SynapseId) {
        let mut net = Network::with_seed(7);
        net.add_neuron(NeuronParams::default()).unwrap();
        let sensitive = NeuronParams {
            threshold: 0.0005,
            v_rest: 0.0,
            v_reset: 0.0,
            ..NeuronParams::default()
        };
        net.add_neuron(sensitive).unwrap();
        let id = net
            .add_synapse(0, 1, weight, delay_ms, PlasticityParams::default())
            .unwrap();
        (net, id)
    }

    #[test]
    fn test_add_synapse_validates_indices() {
        let mut net = Network::with_seed(1);
        net.add_neuron(NeuronParams::default()).unwrap();
        let err = net.add_synapse(0, 5, 0.5, 1, PlasticityParams::default());
        assert!(matches!(err, Err(EngineError::NeuronNotFound { .. })));
        let err = net.add_synapse(3, 0, 0.5, 1, PlasticityParams::default());
        assert!(err.is_err());
    }

    #[test]
    fn test_step_advances_time() {
        let mut net = Network::with_seed(1);
        net.step();
        net.step();
        assert!((net.current_time() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_fired_neuron_enqueues_delayed_events() {
        let (mut net, id) = two_neuron_net(2.0, 5);
        net.inject_current(0, BIG_CURRENT).unwrap();
        net.step();
        assert!(net.neuron(0).unwrap().fired_this_step());
        assert_eq!(net.pending_events().len(), 1);
        let event = net.pending_events()[0];
        assert_eq!(event.synapse_id, id);
        assert!((event.arrival_time - 5.1).abs() < 1e-9);
        assert_eq!(event.weight_at_emission, 2.0);
    }

    #[test]
    fn test_delivery_at_first_step_past_arrival() {
        let (mut net, _) = two_neuron_net(2.0, 5);
        net.inject_current(0, BIG_CURRENT).unwrap();
        net.step(); // N0 fires at t = 0.1, arrival at 5.1

        // Walk up to just before the arrival time
        while net.current_time() < 5.0 {
            net.step();
            assert!(!net.neuron(1).unwrap().fired_this_step());
        }

        // The step reaching t = 5.1 delivers and fires the target
        net.step();
        assert!(net.neuron(1).unwrap().fired_this_step());
        assert!(net.pending_events().is_empty());
    }

    #[test]
    fn test_plasticity_disabled_freezes_weights() {
        let (mut net, id) = two_neuron_net(2.0, 1);
        net.plasticity_enabled = false;
        for step in 0..500 {
            if step % 20 == 0 {
                net.inject_current(0, BIG_CURRENT).unwrap();
                net.inject_current(1, BIG_CURRENT).unwrap();
            }
            net.step();
        }
        assert_eq!(net.synapse(id).unwrap().weight(), 2.0);
        assert_eq!(net.synapse(id).unwrap().weight_history().len(), 1);
    }

    #[test]
    fn test_trace_stdp_potentiates_pre_before_post() {
        let mut net = Network::with_seed(3);
        net.add_neuron(NeuronParams::default()).unwrap();
        net.add_neuron(NeuronParams::default()).unwrap();
        let id = net
            .add_synapse(0, 1, 0.5, 1, PlasticityParams::default())
            .unwrap();

        // Pre fires, delivery at +1 ms, post fires ~4 ms later: LTP
        for round in 0..20 {
            let t0 = round as f64 * 100.0;
            while net.current_time() < t0 + 10.0 {
                net.step();
            }
            net.inject_current(0, BIG_CURRENT).unwrap();
            net.step();
            while net.current_time() < t0 + 15.0 {
                net.step();
            }
            net.inject_current(1, BIG_CURRENT).unwrap();
            net.step();
        }
        assert!(net.synapse(id).unwrap().weight() > 0.5);
    }

    #[test]
    fn test_pairwise_stdp_depresses_post_before_pre() {
        let mut net = Network::with_seed(4);
        net.stdp_mode = StdpMode::Pairwise;
        net.add_neuron(NeuronParams::default()).unwrap();
        net.add_neuron(NeuronParams::default()).unwrap();
        let id = net
            .add_synapse(0, 1, 0.5, 1, PlasticityParams::default())
            .unwrap();

        // Post fires first, pre follows: the delivery sees a negative pair
        for round in 0..20 {
            let t0 = round as f64 * 100.0;
            while net.current_time() < t0 + 10.0 {
                net.step();
            }
            net.inject_current(1, BIG_CURRENT).unwrap();
            net.step();
            while net.current_time() < t0 + 15.0 {
                net.step();
            }
            net.inject_current(0, BIG_CURRENT).unwrap();
            net.step();
        }
        assert!(net.synapse(id).unwrap().weight() < 0.5);
    }

    #[test]
    fn test_synchrony_zero_until_window_fills() {
        let mut net = Network::with_seed(5);
        net.add_neuron(NeuronParams::default()).unwrap();
        for _ in 0..9 {
            net.step();
            assert_eq!(net.synchrony_index(), 0.0);
        }
        net.step();
        // Window full of zeros: variance 0, index 0
        assert_eq!(net.synchrony_index(), 0.0);
    }

    #[test]
    fn test_synchrony_rises_with_bursty_activity() {
        let mut net = Network::with_seed(6);
        net.add_neuron(NeuronParams::default()).unwrap();
        for step in 0..40 {
            if step % 35 == 0 {
                net.inject_current(0, BIG_CURRENT).unwrap();
            }
            net.step();
        }
        // The spike at step 35 sits inside the trailing window
        assert!(net.synchrony_index() > 0.0);
    }

    #[test]
    fn test_homeostasis_raises_threshold_when_too_fast() {
        let mut net = Network::with_seed(8);
        net.homeostasis_enabled = true;
        net.target_rate_hz = 10.0;
        net.add_neuron(NeuronParams::default()).unwrap();
        let initial = net.neuron(0).unwrap().params.threshold;

        // Drive well above 10 Hz for a while
        for _ in 0..3000 {
            net.inject_current(0, 400.0).unwrap();
            net.step();
        }
        let threshold = net.neuron(0).unwrap().params.threshold;
        assert!(threshold > initial);
        assert!(threshold <= THRESHOLD_MAX_MV);
    }

    #[test]
    fn test_homeostasis_lowers_threshold_when_silent() {
        let mut net = Network::with_seed(9);
        net.homeostasis_enabled = true;
        net.target_rate_hz = 10.0;
        net.add_neuron(NeuronParams::default()).unwrap();
        // Two spikes 400 ms apart put the rate estimate at ~2.5 Hz
        net.inject_current(0, BIG_CURRENT).unwrap();
        net.step();
        for _ in 0..4000 {
            net.step();
        }
        net.inject_current(0, BIG_CURRENT).unwrap();
        net.step();

        let initial = net.neuron(0).unwrap().params.threshold;
        for _ in 0..2000 {
            net.step();
        }
        let threshold = net.neuron(0).unwrap().params.threshold;
        assert!(threshold < initial);
        assert!(threshold >= THRESHOLD_MIN_MV);
    }

    #[test]
    fn test_topology_constructors_reset_state() {
        let mut net = Network::with_seed(10);
        net.add_neuron(NeuronParams::default()).unwrap();
        net.inject_current(0, BIG_CURRENT).unwrap();
        net.step();
        assert!(net.current_time() > 0.0);

        net.create_ring(6).unwrap();
        assert_eq!(net.neuron_count(), 6);
        assert_eq!(net.synapse_count(), 6);
        assert_eq!(net.current_time(), 0.0);
        assert!(net.pending_events().is_empty());
        assert!(net.activity().is_empty());
    }

    #[test]
    fn test_reset_round_trip() {
        let mut net = Network::with_seed(11);
        net.create_cortical_column(&[4, 6, 4, 2]).unwrap();
        let initial_weights: Vec<f32> =
            net.synapses().iter().map(|s| s.initial_weight()).collect();

        for step in 0..2000 {
            if step % 40 == 0 {
                net.inject_current(0, BIG_CURRENT).unwrap();
                net.inject_current(1, BIG_CURRENT).unwrap();
            }
            net.step();
        }

        net.reset();
        assert_eq!(net.current_time(), 0.0);
        assert!(net.pending_events().is_empty());
        for neuron in net.neurons() {
            assert_eq!(neuron.membrane_potential(), neuron.params.v_rest);
            assert_eq!(neuron.total_spikes(), 0);
        }
        for (synapse, initial) in net.synapses().iter().zip(&initial_weights) {
            assert_eq!(synapse.weight(), *initial);
            assert_eq!(synapse.weight_history().len(), 1);
        }

        // Idempotent
        net.reset();
        assert_eq!(net.current_time(), 0.0);
    }

    #[test]
    fn test_stats() {
        let mut net = Network::with_seed(12);
        net.create_ring(4).unwrap();
        let stats = net.stats();
        assert_eq!(stats.total_synapses, 4);
        assert!((stats.avg_weight - 0.8).abs() < 1e-6);
        assert!((stats.connectivity - 4.0 / 12.0).abs() < 1e-6);
        assert_eq!(stats.total_spikes, 0);
        assert_eq!(stats.active_neurons, 0);

        net.inject_current(0, BIG_CURRENT).unwrap();
        net.step();
        let stats = net.stats();
        assert_eq!(stats.total_spikes, 1);
        assert_eq!(stats.active_neurons, 1);
        assert!((stats.current_time - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_weight_bounds_hold_under_learning() {
        let mut net = Network::with_seed(13);
        net.create_random(12, 0.4).unwrap();
        for step in 0..5000 {
            if step % 10 == 0 {
                for i in 0..12 {
                    net.inject_current(i, 3000.0).unwrap();
                }
            }
            net.step();
            for synapse in net.synapses() {
                let w = synapse.weight();
                assert!((0.0..=2.0).contains(&w), "weight out of bounds: {w}");
            }
        }
    }
}
