//! Core simulation engine for a spiking neural network sandbox
//!
//! A discrete-time, event-driven simulator of leaky integrate-and-fire
//! neurons connected by delayed, plastic synapses, with spike-timing
//! dependent plasticity and homeostatic threshold regulation.
//!
//! The engine is strictly single-threaded and cooperative: one time step
//! is one indivisible sequence (drain deliveries, integrate neurons, emit
//! delayed events, housekeeping). The [`Simulator`] introduces asynchrony
//! only at the tick boundary, and external readers snapshot state through
//! its barrier. Units are fixed: time in ms, voltage in mV, current in pA.
//!
//! ```
//! use snn_sandbox::{Network, NeuronParams, PlasticityParams};
//!
//! let mut net = Network::with_seed(1);
//! let pre = net.add_neuron(NeuronParams::default()).unwrap();
//! let post = net.add_neuron(NeuronParams::default()).unwrap();
//! net.add_synapse(pre, post, 1.0, 2, PlasticityParams::default()).unwrap();
//!
//! net.inject_current(pre, 400.0).unwrap();
//! net.step();
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod event;
pub mod input;
pub mod network;
pub mod neuron;
pub mod plasticity;
pub mod simulation;
pub mod synapse;
pub mod topology;

pub use error::{EngineError, Result};
pub use event::{EventQueue, SpikeEvent};
pub use input::{InputPattern, InputStage, MiniConfig};
pub use network::{Network, NetworkStats};
pub use neuron::{Neuron, NeuronParams};
pub use plasticity::{PlasticityParams, StdpMode};
pub use simulation::{SimulationObserver, Simulator};
pub use synapse::{Synapse, SynapseId};

/// Default simulation step size (ms)
pub const DEFAULT_DT_MS: f64 = 0.1;
