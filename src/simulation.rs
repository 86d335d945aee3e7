//! Wall-clock driver for the engine
//!
//! The [`Simulator`] paces the network against real time: a ~60 Hz tick
//! runs a batch of engine steps, then notifies the observer once. The
//! tick thread is the only mutator of the network; every other access
//! goes through the shared-state barrier exposed by [`Simulator::with_network`].

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::input::{InputPattern, InputStage, MiniConfig};
use crate::network::{Network, NetworkStats};

/// Visual frame cadence the tick loop targets (~60 Hz)
pub const FRAME_INTERVAL_MS: f64 = 1000.0 / 60.0;
/// Lower bound of the speed dial; 10 is roughly real time
pub const SPEED_MIN: f64 = 1.0;
/// Upper bound of the speed dial
pub const SPEED_MAX: f64 = 100.0;
/// Cap on engine steps per tick
const MAX_STEPS_PER_FRAME: i64 = 100;

/// Callback invoked after every batch of engine steps
///
/// Runs synchronously on the engine thread and must not block; heavy
/// consumers should hand the snapshot off and return. A panicking
/// observer is caught and logged, and the simulation continues.
pub trait SimulationObserver: Send {
    /// Called once per batch with the stepped network and its clock
    fn on_batch(&mut self, network: &Network, time_ms: f64);
}

impl<F> SimulationObserver for F
where
    F: FnMut(&Network, f64) + Send,
{
    fn on_batch(&mut self, network: &Network, time_ms: f64) {
        self(network, time_ms)
    }
}

/// Engine steps per visual frame for a given speed dial setting
fn steps_per_frame(frame_ms: f64, speed: f64, dt_ms: f64) -> usize {
    if dt_ms <= 0.0 {
        return 1;
    }
    let raw = (frame_ms * (speed / 10.0) / dt_ms).round() as i64;
    raw.clamp(1, MAX_STEPS_PER_FRAME) as usize
}

struct Control {
    speed: f64,
    stage: InputStage,
}

struct Shared {
    network: Mutex<Network>,
    control: Mutex<Control>,
    observer: Mutex<Box<dyn SimulationObserver>>,
    running: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Drives a [`Network`] forward against wall-clock time
pub struct Simulator {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Simulator {
    /// Wrap a network with an observer and an initial speed (clamped to
    /// `[SPEED_MIN, SPEED_MAX]`)
    pub fn new(
        network: Network,
        observer: impl SimulationObserver + 'static,
        speed: f64,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                network: Mutex::new(network),
                control: Mutex::new(Control {
                    speed: speed.clamp(SPEED_MIN, SPEED_MAX),
                    stage: InputStage::new(),
                }),
                observer: Mutex::new(Box::new(observer)),
                running: AtomicBool::new(false),
            }),
            worker: None,
        }
    }

    /// Start the recurring tick. No-op when already playing.
    pub fn play(&mut self) {
        if self.worker.is_some() {
            return;
        }
        self.shared.running.store(true, Ordering::SeqCst);
        let shared = Arc::clone(&self.shared);
        self.worker = Some(thread::spawn(move || run_loop(&shared)));
        info!("simulation started");
    }

    /// Stop the recurring tick and wait for the worker to finish the
    /// batch in progress
    pub fn pause(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("simulation worker panicked");
            }
            info!("simulation paused");
        }
    }

    /// Pause, zero the clock, and restore the network to its initial
    /// state; the observer is notified once with the reset network
    pub fn reset(&mut self) {
        self.pause();
        let mut network = lock(&self.shared.network);
        network.reset();
        notify(&self.shared, &network);
        info!("simulation reset");
    }

    /// Run one batch synchronously on the calling thread, for hosts that
    /// drive the cadence themselves
    pub fn tick(&self) {
        run_batch(&self.shared, None);
    }

    /// Step the network through `duration_ms` of simulated time without
    /// pacing, then notify the observer once
    pub fn run_for(&self, duration_ms: f64) {
        run_batch(&self.shared, Some(duration_ms));
    }

    /// Whether the tick loop is currently scheduled
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Adjust the speed dial; takes effect on the next tick
    pub fn set_speed(&self, speed: f64) {
        lock(&self.shared.control).speed = speed.clamp(SPEED_MIN, SPEED_MAX);
    }

    /// Current speed dial setting
    pub fn speed(&self) -> f64 {
        lock(&self.shared.control).speed
    }

    /// Select the injected-current pattern, or none
    pub fn set_input_pattern(&self, pattern: Option<InputPattern>) {
        lock(&self.shared.control).stage.pattern = pattern;
    }

    /// Select the injected-current pattern by display name; unknown names
    /// are diagnosed and treated as no pattern
    pub fn set_input_pattern_by_name(&self, name: Option<&str>) {
        let pattern = name.and_then(InputPattern::from_name);
        self.set_input_pattern(pattern);
    }

    /// Set the multiplier applied to pattern output
    pub fn set_input_strength(&self, strength: f32) {
        lock(&self.shared.control).stage.strength = strength.max(0.0);
    }

    /// Set the Gaussian background noise level
    pub fn set_noise_level(&self, level: f32) {
        lock(&self.shared.control).stage.noise_level = level.max(0.0);
    }

    /// Configure miniature synaptic events
    pub fn set_mini_config(&self, mini: MiniConfig) {
        lock(&self.shared.control).stage.mini = mini;
    }

    /// Reseed the input stage, preserving pattern and level settings
    pub fn seed_inputs(&self, seed: u64) {
        let mut control = lock(&self.shared.control);
        let mut stage = InputStage::with_seed(seed);
        stage.pattern = control.stage.pattern;
        stage.strength = control.stage.strength;
        stage.noise_level = control.stage.noise_level;
        stage.mini = control.stage.mini;
        control.stage = stage;
    }

    /// Read network state under the engine's barrier. The closure must
    /// not block; the tick loop is held out for its duration.
    pub fn with_network<T>(&self, f: impl FnOnce(&Network) -> T) -> T {
        f(&lock(&self.shared.network))
    }

    /// Mutate network state (flags, parameters) between batches
    pub fn with_network_mut<T>(&self, f: impl FnOnce(&mut Network) -> T) -> T {
        f(&mut lock(&self.shared.network))
    }

    /// Snapshot of the network statistics
    pub fn stats(&self) -> NetworkStats {
        self.with_network(Network::stats)
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run_loop(shared: &Shared) {
    let frame = Duration::from_secs_f64(FRAME_INTERVAL_MS / 1000.0);
    while shared.running.load(Ordering::SeqCst) {
        let started = Instant::now();
        run_batch(shared, None);
        let elapsed = started.elapsed();
        if elapsed < frame {
            thread::sleep(frame - elapsed);
        }
    }
}

/// Run one batch of engine steps. With a duration this runs unpaced for
/// that much simulated time; otherwise the batch size follows the speed
/// dial.
fn run_batch(shared: &Shared, duration_ms: Option<f64>) {
    let mut network = lock(&shared.network);
    let mut control = lock(&shared.control);

    match duration_ms {
        Some(duration) => {
            let end = network.current_time() + duration;
            while network.current_time() < end - 1e-9 {
                advance_one(&mut network, &mut control.stage);
            }
        }
        None => {
            let steps = steps_per_frame(FRAME_INTERVAL_MS, control.speed, network.dt_ms);
            for _ in 0..steps {
                advance_one(&mut network, &mut control.stage);
            }
        }
    }

    drop(control);
    notify(shared, &network);
}

fn advance_one(network: &mut Network, stage: &mut InputStage) {
    let currents = stage.generate(network.current_time(), network.neuron_count());
    network.inject(&currents);
    network.step();
}

fn notify(shared: &Shared, network: &Network) {
    let time_ms = network.current_time();
    let mut observer = lock(&shared.observer);
    let outcome = catch_unwind(AssertUnwindSafe(|| observer.on_batch(network, time_ms)));
    if outcome.is_err() {
        error!("observer panicked during batch notification");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neuron::NeuronParams;
    use std::sync::atomic::AtomicUsize;

    fn small_network() -> Network {
        let mut net = Network::with_seed(21);
        net.create_ring(4).unwrap();
        net
    }

    #[test]
    fn test_steps_per_frame_formula() {
        // Speed 10 with dt 0.1: 16.67 / 0.1 rounds to 167, clamped to 100
        assert_eq!(steps_per_frame(FRAME_INTERVAL_MS, 10.0, 0.1), 100);
        // Slow dial settings floor at one step
        assert_eq!(steps_per_frame(FRAME_INTERVAL_MS, 1.0, 2.0), 1);
        // Mid-range stays inside the clamp
        assert_eq!(steps_per_frame(FRAME_INTERVAL_MS, 3.0, 0.1), 50);
        // Degenerate dt
        assert_eq!(steps_per_frame(FRAME_INTERVAL_MS, 10.0, 0.0), 1);
    }

    #[test]
    fn test_tick_advances_and_notifies_once() {
        let batches = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&batches);
        let sim = Simulator::new(
            small_network(),
            move |_: &Network, _| {
                seen.fetch_add(1, Ordering::SeqCst);
            },
            10.0,
        );

        sim.tick();
        assert_eq!(batches.load(Ordering::SeqCst), 1);
        // Speed 10, dt 0.1: a full 100-step batch is 10 ms of sim time
        let time = sim.with_network(|net| net.current_time());
        assert!((time - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_run_for_duration() {
        let sim = Simulator::new(small_network(), |_: &Network, _| {}, 10.0);
        sim.run_for(50.0);
        let time = sim.with_network(|net| net.current_time());
        assert!((time - 50.0).abs() < 0.11);
    }

    #[test]
    fn test_speed_is_clamped() {
        let sim = Simulator::new(small_network(), |_: &Network, _| {}, 500.0);
        assert_eq!(sim.speed(), SPEED_MAX);
        sim.set_speed(0.0);
        assert_eq!(sim.speed(), SPEED_MIN);
    }

    #[test]
    fn test_reset_zeroes_time_and_notifies() {
        let last_time = Arc::new(Mutex::new(f64::NAN));
        let seen = Arc::clone(&last_time);
        let mut sim = Simulator::new(
            small_network(),
            move |_: &Network, t| {
                *seen.lock().unwrap() = t;
            },
            10.0,
        );

        sim.tick();
        sim.reset();
        assert_eq!(*last_time.lock().unwrap(), 0.0);
        assert_eq!(sim.with_network(|net| net.current_time()), 0.0);
    }

    #[test]
    fn test_observer_panic_does_not_stop_the_engine() {
        let sim = Simulator::new(
            small_network(),
            |_: &Network, _| panic!("misbehaving observer"),
            10.0,
        );
        sim.tick();
        sim.tick();
        let time = sim.with_network(|net| net.current_time());
        assert!(time > 0.0);
    }

    #[test]
    fn test_play_pause_cycle() {
        let mut sim = Simulator::new(small_network(), |_: &Network, _| {}, 10.0);
        sim.play();
        assert!(sim.is_running());
        thread::sleep(Duration::from_millis(120));
        sim.pause();
        assert!(!sim.is_running());

        let time = sim.with_network(|net| net.current_time());
        assert!(time > 0.0, "no batches ran while playing");

        // Paused: the clock stands still
        thread::sleep(Duration::from_millis(40));
        assert_eq!(sim.with_network(|net| net.current_time()), time);
    }

    #[test]
    fn test_pattern_changes_apply_next_batch() {
        let mut net = Network::with_seed(22);
        // One neuron that fires on any burst current
        net.add_neuron(NeuronParams {
            threshold: 0.001,
            v_rest: 0.0,
            v_reset: 0.0,
            ..NeuronParams::default()
        })
        .unwrap();

        let sim = Simulator::new(net, |_: &Network, _| {}, 10.0);
        sim.seed_inputs(5);
        sim.set_mini_config(MiniConfig {
            probability: 0.0,
            ..MiniConfig::default()
        });
        sim.set_input_pattern_by_name(Some("Burst"));
        sim.tick();
        let spikes = sim.with_network(|net| net.stats().total_spikes);
        assert!(spikes > 0);

        sim.set_input_pattern_by_name(Some("no-such-pattern"));
        let before = sim.with_network(|net| net.stats().total_spikes);
        // A long quiet stretch: no pattern means no new spikes
        sim.run_for(100.0);
        let after = sim.with_network(|net| net.stats().total_spikes);
        assert_eq!(before, after);
    }
}
