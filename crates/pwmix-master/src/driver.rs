//! Real-time output loop.
//!
//! Polls a clock, and each time the integer sample index at the mixer rate
//! moves on, mixes exactly once and writes the duty cycle to the actuator.
//! Between samples it spins.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use pwmix_audio::{duty_cycle_ns, Actuator, ActuatorError};

use crate::clock::Clock;

/// Lifecycle of the output thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputState {
    /// Thread spawned, actuator not yet acquired.
    Starting = 0,
    Running = 1,
    /// Actuator acquisition failed; output is silent.
    Failed = 2,
    Stopped = 3,
}

impl OutputState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => OutputState::Starting,
            1 => OutputState::Running,
            2 => OutputState::Failed,
            _ => OutputState::Stopped,
        }
    }
}

/// Counts failed duty writes and logs the first and every `every`-th.
#[derive(Debug)]
struct WriteFailures {
    count: u64,
    every: u64,
}

impl WriteFailures {
    fn new(every: u32) -> Self {
        Self {
            count: 0,
            every: u64::from(every.max(1)),
        }
    }

    fn record(&mut self, err: &ActuatorError) {
        self.count += 1;
        if self.count == 1 || self.count % self.every == 0 {
            let count = self.count;
            permit_alloc(|| tracing::warn!(error = %err, count, "duty cycle write failed"));
        }
    }
}

/// Drives an actuator from a mix function at a fixed sample rate.
pub struct OutputDriver<C, A> {
    clock: C,
    actuator: A,
    sample_rate: u32,
    start: Option<f64>,
    last_sample: u64,
    failures: WriteFailures,
}

impl<C: Clock, A: Actuator> OutputDriver<C, A> {
    pub fn new(clock: C, actuator: A, sample_rate: u32) -> Self {
        Self {
            clock,
            actuator,
            sample_rate,
            start: None,
            last_sample: 0,
            failures: WriteFailures::new(sample_rate),
        }
    }

    /// One loop iteration. Returns whether a sample was mixed and written.
    ///
    /// The first call records the start time.
    pub fn poll(&mut self, mut mix: impl FnMut() -> f32) -> bool {
        let now = self.clock.now();
        let start = *self.start.get_or_insert(now);
        let sample = ((now - start) * f64::from(self.sample_rate)) as u64;
        if sample == self.last_sample {
            return false;
        }
        self.last_sample = sample;

        let duty_ns = duty_cycle_ns(mix(), self.actuator.period_ns());
        if let Err(e) = self.actuator.write_duty_ns(duty_ns) {
            self.failures.record(&e);
        }
        true
    }

    /// Spin until `stop` is set. Returns how many samples were written.
    pub fn run(&mut self, stop: &AtomicBool, mut mix: impl FnMut() -> f32) -> u64 {
        realtime(|| {
            let mut produced = 0;
            while !stop.load(Ordering::Relaxed) {
                if self.poll(&mut mix) {
                    produced += 1;
                } else {
                    std::hint::spin_loop();
                }
            }
            produced
        })
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// Failed writes so far.
    pub fn write_failures(&self) -> u64 {
        self.failures.count
    }
}

/// Handle to a running output thread. Stops and joins it when dropped.
pub struct OutputHandle {
    stop: Arc<AtomicBool>,
    state: Arc<AtomicU8>,
    thread: Option<JoinHandle<()>>,
}

impl OutputHandle {
    pub fn state(&self) -> OutputState {
        OutputState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for OutputHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawn the output thread.
///
/// `open` runs on the new thread. If it fails the error is logged, the state
/// becomes [`OutputState::Failed`] and the thread exits.
pub fn spawn_output<C, A, O, M>(clock: C, open: O, sample_rate: u32, mix: M) -> OutputHandle
where
    C: Clock + Send + 'static,
    A: Actuator,
    O: FnOnce() -> Result<A, ActuatorError> + Send + 'static,
    M: FnMut() -> f32 + Send + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let state = Arc::new(AtomicU8::new(OutputState::Starting as u8));

    let thread = {
        let stop = stop.clone();
        let state = state.clone();
        std::thread::spawn(move || {
            output_thread(clock, open, sample_rate, mix, &stop, &state);
        })
    };

    OutputHandle {
        stop,
        state,
        thread: Some(thread),
    }
}

fn output_thread<C, A, O, M>(
    clock: C,
    open: O,
    sample_rate: u32,
    mix: M,
    stop: &AtomicBool,
    state: &AtomicU8,
) where
    C: Clock,
    A: Actuator,
    O: FnOnce() -> Result<A, ActuatorError>,
    M: FnMut() -> f32,
{
    let actuator = match open() {
        Ok(actuator) => actuator,
        Err(e) => {
            tracing::error!(error = %e, "could not acquire audio output, sound disabled");
            state.store(OutputState::Failed as u8, Ordering::Release);
            return;
        }
    };

    state.store(OutputState::Running as u8, Ordering::Release);
    tracing::info!(sample_rate, "output loop running");

    let mut driver = OutputDriver::new(clock, actuator, sample_rate);
    let produced = driver.run(stop, mix);

    tracing::info!(produced, failures = driver.write_failures(), "output loop stopped");
    state.store(OutputState::Stopped as u8, Ordering::Release);
}

#[cfg(feature = "alloc_check")]
fn realtime<T>(f: impl FnOnce() -> T) -> T {
    assert_no_alloc::assert_no_alloc(f)
}

#[cfg(not(feature = "alloc_check"))]
fn realtime<T>(f: impl FnOnce() -> T) -> T {
    f()
}

#[cfg(feature = "alloc_check")]
fn permit_alloc<T>(f: impl FnOnce() -> T) -> T {
    assert_no_alloc::permit_alloc(f)
}

#[cfg(not(feature = "alloc_check"))]
fn permit_alloc<T>(f: impl FnOnce() -> T) -> T {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use pwmix_audio::NullActuator;
    use std::time::Duration;

    /// Fails every write.
    struct BrokenActuator;

    impl Actuator for BrokenActuator {
        fn period_ns(&self) -> u32 {
            10_000
        }

        fn write_duty_ns(&mut self, _duty_ns: u32) -> Result<(), ActuatorError> {
            Err(ActuatorError::Write(std::io::Error::other("gone")))
        }
    }

    fn tick(rate: u32) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(rate))
    }

    #[test]
    fn nothing_is_mixed_until_the_index_moves() {
        let clock = ManualClock::new();
        let mut driver = OutputDriver::new(clock.clone(), NullActuator::new(10_000), 1000);
        let mut mixes = 0;
        assert!(!driver.poll(|| {
            mixes += 1;
            0.5
        }));
        assert!(!driver.poll(|| 0.5));
        assert_eq!(mixes, 0);
        assert_eq!(driver.actuator().writes(), 0);
    }

    #[test]
    fn mixes_once_per_sample_period() {
        let clock = ManualClock::new();
        let mut driver = OutputDriver::new(clock.clone(), NullActuator::new(10_000), 1000);
        let mut mixes = 0;
        driver.poll(|| 0.5);
        for _ in 0..10 {
            clock.advance(tick(1000) + Duration::from_nanos(10));
            for _ in 0..5 {
                driver.poll(|| {
                    mixes += 1;
                    0.25
                });
            }
        }
        assert_eq!(mixes, 10);
        assert_eq!(driver.actuator().writes(), 10);
        assert_eq!(driver.actuator().last_duty_ns(), Some(2_500));
    }

    #[test]
    fn skipped_samples_mix_only_once() {
        let clock = ManualClock::new();
        let mut driver = OutputDriver::new(clock.clone(), NullActuator::new(10_000), 1000);
        driver.poll(|| 0.5);
        clock.advance(Duration::from_millis(5));
        let mut mixes = 0;
        driver.poll(|| {
            mixes += 1;
            1.0
        });
        driver.poll(|| {
            mixes += 1;
            1.0
        });
        assert_eq!(mixes, 1);
        assert_eq!(driver.actuator().last_duty_ns(), Some(10_000));
    }

    #[test]
    fn write_failures_are_counted_not_fatal() {
        let clock = ManualClock::new();
        let mut driver = OutputDriver::new(clock.clone(), BrokenActuator, 100);
        driver.poll(|| 0.5);
        for _ in 0..250 {
            clock.advance(Duration::from_micros(10_001));
            assert!(driver.poll(|| 0.5));
        }
        assert_eq!(driver.write_failures(), 250);
    }

    #[test]
    fn run_returns_when_stopped() {
        let stop = AtomicBool::new(true);
        let mut driver = OutputDriver::new(ManualClock::new(), NullActuator::new(10_000), 11025);
        assert_eq!(driver.run(&stop, || 0.5), 0);
    }

    #[test]
    fn failed_acquisition_leaves_thread_failed() {
        let mut handle = spawn_output(
            ManualClock::new(),
            || Err::<NullActuator, _>(ActuatorError::NoDevice),
            11025,
            || 0.5,
        );
        while handle.state() == OutputState::Starting {
            std::thread::yield_now();
        }
        assert_eq!(handle.state(), OutputState::Failed);
        handle.stop();
        assert_eq!(handle.state(), OutputState::Failed);
    }

    #[test]
    fn spawned_thread_runs_until_stopped() {
        let clock = ManualClock::new();
        let mut handle = spawn_output(
            clock.clone(),
            || Ok(NullActuator::new(10_000)),
            11025,
            || 0.5,
        );
        while handle.state() == OutputState::Starting {
            std::thread::yield_now();
        }
        assert_eq!(handle.state(), OutputState::Running);
        clock.advance(Duration::from_millis(10));
        handle.stop();
        assert_eq!(handle.state(), OutputState::Stopped);
    }
}
