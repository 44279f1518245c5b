//! Headless sound system.
//!
//! [`SoundSystem`] is what game logic talks to: it starts effects on the
//! shared voice pool, runs the output thread that mixes that pool onto an
//! actuator, and carries the inert music interface.

mod clock;
mod config;
mod driver;
mod music;
mod offline;
mod shared;
mod tick;
mod wav;

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use pwmix_audio::{Actuator, ActuatorError};
use pwmix_engine::{SfxSource, SoundTables, StartRequest};

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{SoundConfig, DEFAULT_SAMPLE_RATE};
pub use driver::{spawn_output, OutputDriver, OutputHandle, OutputState};
pub use music::{MusicStub, SONG_HANDLE, SONG_SECONDS, TICRATE};
pub use offline::{samples_per_tic, OfflineRenderer};
pub use shared::SharedVoicePool;
pub use tick::TickSource;
pub use wav::{duty_to_pcm, duty_to_wav, write_wav};

// Re-export common types so callers don't need the engine crate directly.
pub use pwmix_engine::{SfxId, SoundHandle, StartError, Voice, NUM_VOICES};

/// Error type for facade operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundError {
    /// An earlier fatal error stopped the sound system
    Halted,
    /// A start request was rejected
    Start(StartError),
}

impl std::fmt::Display for SoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SoundError::Halted => write!(f, "sound system halted"),
            SoundError::Start(e) => write!(f, "start sound failed: {}", e),
        }
    }
}

impl std::error::Error for SoundError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SoundError::Start(e) => Some(e),
            SoundError::Halted => None,
        }
    }
}

impl From<StartError> for SoundError {
    fn from(e: StartError) -> Self {
        SoundError::Start(e)
    }
}

/// State reachable from both game logic and the output thread.
struct Shared {
    tables: SoundTables,
    pool: SharedVoicePool,
}

impl Shared {
    fn mix_one_sample(&self) -> f32 {
        self.pool.mix_one_sample(&self.tables.attenuation)
    }
}

/// The sound subsystem facade.
pub struct SoundSystem<S> {
    config: SoundConfig,
    shared: Arc<Shared>,
    sfx: S,
    tick: Arc<dyn TickSource>,
    handles: Mutex<pwmix_engine::HandleCounter>,
    music: Mutex<MusicStub>,
    sfx_volume: AtomicI32,
    halted: AtomicBool,
    output: Mutex<Option<OutputHandle>>,
}

impl<S: SfxSource> SoundSystem<S> {
    /// Build the tables and an idle voice pool. No output runs yet.
    pub fn new(config: SoundConfig, sfx: S, tick: Arc<dyn TickSource>) -> Self {
        let shared = Arc::new(Shared {
            tables: SoundTables::new(),
            pool: SharedVoicePool::new(),
        });
        tracing::info!(
            sample_rate = config.sample_rate,
            exclusive = config.exclusive.ids().len(),
            "sound tables built"
        );
        Self {
            config,
            shared,
            sfx,
            tick,
            handles: Mutex::new(pwmix_engine::HandleCounter::new()),
            music: Mutex::new(MusicStub::new()),
            sfx_volume: AtomicI32::new(0),
            halted: AtomicBool::new(false),
            output: Mutex::new(None),
        }
    }

    /// Start the output thread on the wall clock.
    ///
    /// `open` acquires the actuator on the output thread. A failure there is
    /// logged and leaves the system silent; see [`SoundSystem::output_state`].
    pub fn init<A, O>(&self, open: O)
    where
        A: Actuator,
        O: FnOnce() -> Result<A, ActuatorError> + Send + 'static,
    {
        self.start_output_with(SystemClock::new(), open);
    }

    /// Start the output thread on a caller-supplied clock. Replaces any
    /// output thread already running.
    pub fn start_output_with<C, A, O>(&self, clock: C, open: O)
    where
        C: Clock + Send + 'static,
        A: Actuator,
        O: FnOnce() -> Result<A, ActuatorError> + Send + 'static,
    {
        let mut output = self.output.lock();
        // The old actuator must be released before the new one is opened.
        if let Some(mut previous) = output.take() {
            previous.stop();
        }
        let shared = self.shared.clone();
        *output = Some(spawn_output(clock, open, self.config.sample_rate, move || {
            shared.mix_one_sample()
        }));
    }

    /// Stop the output thread and silence every voice.
    pub fn shutdown(&self) {
        let previous = self.output.lock().take();
        if let Some(mut handle) = previous {
            handle.stop();
            tracing::info!("sound output shut down");
        }
        self.shared.pool.clear();
    }

    /// Start effect `id`.
    ///
    /// `pitch` indexes the step table directly (128 plays at recorded speed).
    /// Separation and priority are accepted and ignored. A volume outside
    /// 0..=127 halts the whole sound system.
    pub fn start_sound(
        &self,
        id: SfxId,
        volume: i32,
        separation: i32,
        pitch: u8,
        _priority: i32,
    ) -> Result<SoundHandle, SoundError> {
        if self.is_halted() {
            return Err(SoundError::Halted);
        }

        let request = StartRequest {
            sfx: id,
            volume,
            separation,
            step: self.shared.tables.steps.step(pitch),
        };
        let params = match request.voice_params(self.sfx.sample(id), self.tick.tic()) {
            Ok(params) => params,
            Err(e) => {
                tracing::error!(error = %e, sfx = id, "fatal sound configuration error, halting");
                self.halt();
                return Err(e.into());
            }
        };

        let slot = self.shared.pool.start(params, &self.config.exclusive);
        let handle = self.handles.lock().next_handle();
        tracing::trace!(sfx = id, slot, handle = handle.raw(), "sound started");
        Ok(handle)
    }

    /// Inert: sounds always play to the end.
    pub fn stop_sound(&self, _handle: SoundHandle) {}

    /// Inert: gains are fixed at start.
    pub fn update_sound_params(
        &self,
        _handle: SoundHandle,
        _volume: i32,
        _separation: i32,
        _pitch: u8,
    ) {
    }

    /// Inert: mixing happens on the output thread.
    pub fn update_sound(&self) {}

    /// Inert: mixing happens on the output thread.
    pub fn submit_sound(&self) {}

    /// Whether the current game tick is below the handle value.
    pub fn sound_is_playing(&self, handle: SoundHandle) -> bool {
        self.tick.tic() < i32::from(handle.raw())
    }

    /// Stored only; start volumes come from the caller.
    pub fn set_sfx_volume(&self, level: i32) {
        self.sfx_volume.store(level, Ordering::Relaxed);
    }

    pub fn sfx_volume(&self) -> i32 {
        self.sfx_volume.load(Ordering::Relaxed)
    }

    /// Stored only.
    pub fn set_music_volume(&self, level: i32) {
        self.music.lock().set_volume(level);
    }

    pub fn music_volume(&self) -> i32 {
        self.music.lock().volume()
    }

    // --- Music ---

    pub fn init_music(&self) {}

    pub fn shutdown_music(&self) {}

    pub fn register_song(&self, data: &[u8]) -> i32 {
        self.music.lock().register(data)
    }

    pub fn unregister_song(&self, handle: i32) {
        self.music.lock().unregister(handle);
    }

    pub fn play_song(&self, handle: i32, looping: bool) {
        let now = self.tick.tic();
        self.music.lock().play(handle, looping, now);
    }

    pub fn pause_song(&self, handle: i32) {
        self.music.lock().pause(handle);
    }

    pub fn resume_song(&self, handle: i32) {
        self.music.lock().resume(handle);
    }

    pub fn stop_song(&self, handle: i32) {
        self.music.lock().stop(handle);
    }

    pub fn song_is_playing(&self, handle: i32) -> bool {
        let now = self.tick.tic();
        self.music.lock().is_playing(handle, now)
    }

    // --- Inspection ---

    /// Mix one sample on the calling thread. Only meaningful while no output
    /// thread is consuming the same pool.
    pub fn mix_one_sample(&self) -> f32 {
        self.shared.mix_one_sample()
    }

    pub fn voice(&self, slot: usize) -> Option<Voice> {
        self.shared.pool.voice(slot)
    }

    pub fn active_voices(&self) -> usize {
        self.shared.pool.active_count()
    }

    /// `None` when no output thread was ever started.
    pub fn output_state(&self) -> Option<OutputState> {
        self.output.lock().as_ref().map(OutputHandle::state)
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &SoundConfig {
        &self.config
    }

    pub fn tables(&self) -> &SoundTables {
        &self.shared.tables
    }

    fn halt(&self) {
        self.halted.store(true, Ordering::Release);
        self.shutdown();
    }
}

impl<S> Drop for SoundSystem<S> {
    fn drop(&mut self) {
        if let Some(mut handle) = self.output.get_mut().take() {
            handle.stop();
        }
    }
}
