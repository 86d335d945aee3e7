//! Topology constructors
//!
//! Each builder produces a neuron parameter list and a synapse spec list
//! for a named wiring scheme; the network turns those into owned neurons
//! and synapses, replacing its collections wholesale.

use rand::Rng;

use crate::error::{EngineError, Result};
use crate::neuron::NeuronParams;

/// Blueprint for one synapse, before the network assigns it an id
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynapseSpec {
    /// Pre-synaptic neuron index
    pub from: usize,
    /// Post-synaptic neuron index
    pub to: usize,
    /// Initial weight
    pub weight: f32,
    /// Axonal delay (ms)
    pub delay_ms: u32,
}

/// Blueprint for a whole network: neuron parameters plus wiring
pub type Blueprint = (Vec<NeuronParams>, Vec<SynapseSpec>);

fn check_probability(name: &str, p: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(EngineError::invalid_parameter(
            name,
            p.to_string(),
            "in [0.0, 1.0]",
        ));
    }
    Ok(())
}

/// Random graph: every ordered pair `i != j` is connected with
/// probability `p`. Weights `U(0.2, 1.0)`, delays `U{1..5}`.
pub fn random(size: usize, p: f64, rng: &mut impl Rng) -> Result<Blueprint> {
    if size == 0 {
        return Err(EngineError::invalid_topology("random topology needs size >= 1"));
    }
    check_probability("p", p)?;

    let neurons = vec![NeuronParams::default(); size];
    let mut synapses = Vec::new();
    for from in 0..size {
        for to in 0..size {
            if from != to && rng.gen_bool(p) {
                synapses.push(SynapseSpec {
                    from,
                    to,
                    weight: rng.gen_range(0.2..1.0),
                    delay_ms: rng.gen_range(1..=5),
                });
            }
        }
    }
    Ok((neurons, synapses))
}

/// Three-layer feedforward net of roughly equal layers; each neuron
/// connects to each neuron of the next layer with p = 0.5.
/// Weights `U(0.5, 1.0)`, delays `U{1..5}`.
pub fn feedforward(size: usize, rng: &mut impl Rng) -> Result<Blueprint> {
    if size < 3 {
        return Err(EngineError::invalid_topology(
            "feedforward topology needs size >= 3",
        ));
    }

    let third = size / 3;
    let layers = [third, third, size - 2 * third];
    let neurons = vec![NeuronParams::default(); size];

    let mut synapses = Vec::new();
    let mut layer_start = 0;
    for window in layers.windows(2) {
        let (a, b) = (window[0], window[1]);
        let next_start = layer_start + a;
        for from in layer_start..layer_start + a {
            for to in next_start..next_start + b {
                if rng.gen_bool(0.5) {
                    synapses.push(SynapseSpec {
                        from,
                        to,
                        weight: rng.gen_range(0.5..1.0),
                        delay_ms: rng.gen_range(1..=5),
                    });
                }
            }
        }
        layer_start = next_start;
    }
    Ok((neurons, synapses))
}

/// Directed ring: `i -> (i + 1) mod size`, weight 0.8, delay 2 ms
pub fn ring(size: usize) -> Result<Blueprint> {
    if size < 2 {
        return Err(EngineError::invalid_topology("ring topology needs size >= 2"));
    }

    let neurons = vec![NeuronParams::default(); size];
    let synapses = (0..size)
        .map(|i| SynapseSpec {
            from: i,
            to: (i + 1) % size,
            weight: 0.8,
            delay_ms: 2,
        })
        .collect();
    Ok((neurons, synapses))
}

/// Watts-Strogatz style small world: start from a ring, then rewire each
/// edge's target with probability `rewire_p` to a random other neuron,
/// preserving source, weight, and delay.
pub fn small_world(size: usize, rewire_p: f64, rng: &mut impl Rng) -> Result<Blueprint> {
    check_probability("rewire_p", rewire_p)?;
    let (neurons, mut synapses) = ring(size)?;

    for spec in synapses.iter_mut() {
        if rng.gen_bool(rewire_p) {
            let mut target = rng.gen_range(0..size);
            while target == spec.from {
                target = rng.gen_range(0..size);
            }
            spec.to = target;
        }
    }
    Ok((neurons, synapses))
}

/// Layered cortical column. Consecutive layers are wired feedforward
/// (p = 0.8 out of layer 0, 0.6 deeper) with weights `U(0.3, 0.7)` and
/// delays `U{1..3}`; each layer is recurrently wired with p = 0.1,
/// weights `U(0.1, 0.3)`, delay 1, and no self-loops. Deeper layers get
/// slightly higher thresholds and slower membranes.
pub fn cortical_column(layer_sizes: &[usize], rng: &mut impl Rng) -> Result<Blueprint> {
    if layer_sizes.is_empty() {
        return Err(EngineError::invalid_topology("cortical column needs at least one layer"));
    }
    if layer_sizes.contains(&0) {
        return Err(EngineError::invalid_topology("cortical column layers must be non-empty"));
    }

    let defaults = NeuronParams::default();
    let mut neurons = Vec::with_capacity(layer_sizes.iter().sum());
    for (depth, &count) in layer_sizes.iter().enumerate() {
        let params = NeuronParams {
            threshold: defaults.threshold + 0.5 * depth as f32,
            tau_m: defaults.tau_m + 2.0 * depth as f32,
            ..defaults
        };
        neurons.extend(std::iter::repeat(params).take(count));
    }

    let mut starts = Vec::with_capacity(layer_sizes.len());
    let mut acc = 0;
    for &count in layer_sizes {
        starts.push(acc);
        acc += count;
    }

    let mut synapses = Vec::new();

    // Inter-layer feedforward
    for depth in 0..layer_sizes.len().saturating_sub(1) {
        let p = if depth == 0 { 0.8 } else { 0.6 };
        for from in starts[depth]..starts[depth] + layer_sizes[depth] {
            for to in starts[depth + 1]..starts[depth + 1] + layer_sizes[depth + 1] {
                if rng.gen_bool(p) {
                    synapses.push(SynapseSpec {
                        from,
                        to,
                        weight: rng.gen_range(0.3..0.7),
                        delay_ms: rng.gen_range(1..=3),
                    });
                }
            }
        }
    }

    // Within-layer recurrence
    for (depth, &count) in layer_sizes.iter().enumerate() {
        let start = starts[depth];
        for from in start..start + count {
            for to in start..start + count {
                if from != to && rng.gen_bool(0.1) {
                    synapses.push(SynapseSpec {
                        from,
                        to,
                        weight: rng.gen_range(0.1..0.3),
                        delay_ms: 1,
                    });
                }
            }
        }
    }

    Ok((neurons, synapses))
}
