//! In-flight spike events and the delayed-delivery queue

use crate::synapse::SynapseId;

/// A spike in flight between emission and delivery
///
/// Created when the pre-synaptic neuron fires, destroyed when the queue
/// delivers it. Carries the weight observed at emission so a later
/// plasticity update cannot retroactively change a delivery in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpikeEvent {
    /// Index of the neuron that fired
    pub source: usize,
    /// Index of the neuron receiving the delivery
    pub target: usize,
    /// Synaptic weight at emission time (pA contribution on delivery)
    pub weight_at_emission: f32,
    /// Absolute delivery time (ms)
    pub arrival_time: f64,
    /// Synapse the spike travelled through
    pub synapse_id: SynapseId,
}

/// Queue of delayed spike events, drained once per step
///
/// A flat vector scanned linearly: adequate for the expected scale of
/// dozens to low hundreds of neurons with low thousands of in-flight
/// events. Ordering among events with equal arrival time is arbitrary;
/// every enqueued event is delivered exactly once, at the first step
/// whose time reaches its arrival time.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: Vec<SpikeEvent>,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event to the queue
    pub fn enqueue(&mut self, event: SpikeEvent) {
        self.events.push(event);
    }

    /// Remove and return every event with `arrival_time <= now_ms`
    pub fn drain_due(&mut self, now_ms: f64) -> Vec<SpikeEvent> {
        let mut due = Vec::new();
        self.events.retain(|event| {
            if event.arrival_time <= now_ms {
                due.push(*event);
                false
            } else {
                true
            }
        });
        due
    }

    /// Number of events still in flight
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are in flight
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop all pending events
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// The pending events, in insertion order
    pub fn pending(&self) -> &[SpikeEvent] {
        &self.events
    }
}
