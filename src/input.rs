//! Injected-current generation
//!
//! An [`InputPattern`] turns `(time, neuron count)` into a vector of
//! injected currents in pA. The [`InputStage`] owns the active pattern
//! plus the global strength multiplier, Gaussian background noise, and
//! miniature synaptic events, and produces the final per-step vector the
//! simulator hands to the network.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::warn;

use std::f64::consts::PI;

/// Named injected-current pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputPattern {
    /// Each neuron independently receives `U(0, 50)` pA with p = 0.1
    Random,
    /// Each neuron independently receives `U(20, 50)` pA with p = 0.05
    Poisson,
    /// `sin(0.02·t) > 0.5` gates a 40 pA injection into the first 2 neurons
    Rhythmic,
    /// 100 ms period, 5 ms pulse width; 60 pA into the first 3 neurons
    PulseTrain,
    /// Neuron `i` receives `max(0, sin(0.01·t + i·π/N)) · 30` pA
    Wave,
    /// 500 ms period, 50 ms burst; 80 pA into neuron 0
    Burst,
}

impl InputPattern {
    /// All available patterns
    pub const ALL: [Self; 6] = [
        Self::Random,
        Self::Poisson,
        Self::Rhythmic,
        Self::PulseTrain,
        Self::Wave,
        Self::Burst,
    ];

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Random => "Random",
            Self::Poisson => "Poisson",
            Self::Rhythmic => "Rhythmic",
            Self::PulseTrain => "Pulse Train",
            Self::Wave => "Wave",
            Self::Burst => "Burst",
        }
    }

    /// Resolve a pattern by name. `"None"` resolves to no pattern;
    /// unrecognized names are diagnosed and also treated as no pattern.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "None" => None,
            "Random" => Some(Self::Random),
            "Poisson" => Some(Self::Poisson),
            "Rhythmic" => Some(Self::Rhythmic),
            "Pulse Train" => Some(Self::PulseTrain),
            "Wave" => Some(Self::Wave),
            "Burst" => Some(Self::Burst),
            other => {
                warn!(pattern = other, "unknown input pattern, using none");
                None
            }
        }
    }

    /// Fill `out` with this pattern's current for each neuron at time
    /// `t_ms`. `out` has already been zeroed by the caller.
    pub fn generate(&self, t_ms: f64, out: &mut [f32], rng: &mut impl Rng) {
        let n = out.len();
        match self {
            Self::Random => {
                for current in out.iter_mut() {
                    if rng.gen_bool(0.1) {
                        *current = rng.gen_range(0.0..50.0);
                    }
                }
            }
            Self::Poisson => {
                for current in out.iter_mut() {
                    if rng.gen_bool(0.05) {
                        *current = rng.gen_range(20.0..50.0);
                    }
                }
            }
            Self::Rhythmic => {
                if (0.02 * t_ms).sin() > 0.5 {
                    for current in out.iter_mut().take(2) {
                        *current = 40.0;
                    }
                }
            }
            Self::PulseTrain => {
                if t_ms.rem_euclid(100.0) < 5.0 {
                    for current in out.iter_mut().take(3) {
                        *current = 60.0;
                    }
                }
            }
            Self::Wave => {
                for (i, current) in out.iter_mut().enumerate() {
                    let phase = 0.01 * t_ms + i as f64 * PI / n as f64;
                    *current = (phase.sin().max(0.0) * 30.0) as f32;
                }
            }
            Self::Burst => {
                if t_ms.rem_euclid(500.0) < 50.0 {
                    if let Some(first) = out.first_mut() {
                        *first = 80.0;
                    }
                }
            }
        }
    }
}

/// Miniature synaptic event configuration
///
/// Spontaneous background currents applied per neuron per step,
/// independently of the pattern and the noise level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MiniConfig {
    /// Per-neuron per-step probability of a miniature event
    pub probability: f64,
    /// Lower bound of the event amplitude (pA)
    pub min_amplitude: f32,
    /// Upper bound of the event amplitude (pA)
    pub max_amplitude: f32,
}

impl Default for MiniConfig {
    fn default() -> Self {
        Self {
            probability: 0.01,
            min_amplitude: 2.0,
            max_amplitude: 10.0,
        }
    }
}

/// Produces the per-step injected-current vector for the simulator
#[derive(Debug)]
pub struct InputStage {
    /// Active pattern; `None` injects nothing beyond noise and minis
    pub pattern: Option<InputPattern>,
    /// Multiplier applied to the pattern output
    pub strength: f32,
    /// Gaussian noise level; the standard deviation is `noise_level · 10` pA
    pub noise_level: f32,
    /// Miniature event settings
    pub mini: MiniConfig,
    rng: StdRng,
}

impl InputStage {
    /// Create a stage with no pattern and entropy-seeded randomness
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create a stage with a fixed seed for reproducible input streams
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            pattern: None,
            strength: 1.0,
            noise_level: 0.0,
            mini: MiniConfig::default(),
            rng,
        }
    }

    /// Generate the injected-current vector for `n` neurons at time `t_ms`
    pub fn generate(&mut self, t_ms: f64, n: usize) -> Vec<f32> {
        let mut currents = vec![0.0f32; n];

        if let Some(pattern) = self.pattern {
            pattern.generate(t_ms, &mut currents, &mut self.rng);
            for current in currents.iter_mut() {
                *current *= self.strength;
            }
        }

        if self.noise_level > 0.0 {
            if let Ok(normal) = Normal::new(0.0f32, self.noise_level * 10.0) {
                for current in currents.iter_mut() {
                    *current += normal.sample(&mut self.rng);
                }
            }
        }

        if self.mini.probability > 0.0 && self.mini.max_amplitude > self.mini.min_amplitude {
            for current in currents.iter_mut() {
                if self.rng.gen_bool(self.mini.probability.min(1.0)) {
                    *current += self
                        .rng
                        .gen_range(self.mini.min_amplitude..self.mini.max_amplitude);
                }
            }
        }

        currents
    }
}

impl Default for InputStage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_stage(seed: u64) -> InputStage {
        let mut stage = InputStage::with_seed(seed);
        stage.mini.probability = 0.0;
        stage
    }

    #[test]
    fn test_no_pattern_is_silent() {
        let mut stage = quiet_stage(1);
        let currents = stage.generate(10.0, 5);
        assert_eq!(currents, vec![0.0; 5]);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(InputPattern::from_name("Wave"), Some(InputPattern::Wave));
        assert_eq!(
            InputPattern::from_name("Pulse Train"),
            Some(InputPattern::PulseTrain)
        );
        assert_eq!(InputPattern::from_name("None"), None);
        assert_eq!(InputPattern::from_name("nope"), None);
    }

    #[test]
    fn test_pulse_train_gating() {
        let mut stage = quiet_stage(2);
        stage.pattern = Some(InputPattern::PulseTrain);

        // Inside the 5 ms pulse window
        let on = stage.generate(102.0, 5);
        assert_eq!(on[0], 60.0);
        assert_eq!(on[1], 60.0);
        assert_eq!(on[2], 60.0);
        assert_eq!(on[3], 0.0);

        // Outside the pulse window
        let off = stage.generate(150.0, 5);
        assert_eq!(off, vec![0.0; 5]);
    }

    #[test]
    fn test_burst_targets_first_neuron() {
        let mut stage = quiet_stage(3);
        stage.pattern = Some(InputPattern::Burst);

        let on = stage.generate(20.0, 4);
        assert_eq!(on[0], 80.0);
        assert_eq!(&on[1..], &[0.0, 0.0, 0.0]);

        let off = stage.generate(120.0, 4);
        assert_eq!(off, vec![0.0; 4]);
    }

    #[test]
    fn test_wave_is_bounded_and_nonnegative() {
        let mut stage = quiet_stage(4);
        stage.pattern = Some(InputPattern::Wave);
        for t in 0..200 {
            let currents = stage.generate(t as f64 * 5.0, 8);
            for current in currents {
                assert!((0.0..=30.0).contains(&current));
            }
        }
    }

    #[test]
    fn test_strength_scales_pattern() {
        let mut stage = quiet_stage(5);
        stage.pattern = Some(InputPattern::Burst);
        stage.strength = 2.5;
        let currents = stage.generate(10.0, 2);
        assert_eq!(currents[0], 200.0);
    }

    #[test]
    fn test_noise_perturbs_all_neurons() {
        let mut stage = quiet_stage(6);
        stage.noise_level = 1.0;
        let currents = stage.generate(0.0, 100);
        let nonzero = currents.iter().filter(|c| **c != 0.0).count();
        assert!(nonzero > 90);
        // Sigma is 10 pA; anything past 8 sigma means broken scaling
        assert!(currents.iter().all(|c| c.abs() < 80.0));
    }

    #[test]
    fn test_minis_are_rare_and_bounded() {
        let mut stage = InputStage::with_seed(7);
        stage.mini.probability = 0.5;
        let currents = stage.generate(0.0, 1000);
        let hit = currents.iter().filter(|c| **c != 0.0).count();
        assert!(hit > 300 && hit < 700, "hits: {hit}");
        for current in currents.iter().filter(|c| **c != 0.0) {
            assert!((stage.mini.min_amplitude..stage.mini.max_amplitude).contains(current));
        }
    }

    #[test]
    fn test_seeded_streams_reproduce() {
        let mut a = InputStage::with_seed(42);
        let mut b = InputStage::with_seed(42);
        a.pattern = Some(InputPattern::Random);
        b.pattern = Some(InputPattern::Random);
        a.noise_level = 0.5;
        b.noise_level = 0.5;
        for t in 0..20 {
            assert_eq!(a.generate(t as f64, 10), b.generate(t as f64, 10));
        }
    }
}
