//! VoicePool: the fixed arena of voices and the start/evict policy.
//!
//! The placement decision is a pure function over the current voices
//! (`plan_start`) so the same policy drives both the single-threaded
//! [`VoicePool`] and lock-protected pools owned elsewhere.

use core::fmt;

use crate::mixer;
use crate::tables::AttenuationTable;
use crate::voice::{SampleData, SfxId, Voice, VoiceParams, Volume};

/// Number of simultaneous voices.
pub const NUM_VOICES: usize = 8;

/// Capacity of an [`ExclusiveSet`].
pub const MAX_EXCLUSIVE: usize = 16;

/// First handle issued, and the value handles restart from after wrapping.
pub const FIRST_HANDLE: u16 = 100;

/// Effects that may never have more than one active voice at a time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExclusiveSet {
    ids: heapless::Vec<SfxId, MAX_EXCLUSIVE>,
}

impl ExclusiveSet {
    pub const fn new() -> Self {
        Self {
            ids: heapless::Vec::new(),
        }
    }

    /// `None` if more than [`MAX_EXCLUSIVE`] ids are given.
    pub fn from_ids(ids: &[SfxId]) -> Option<Self> {
        let mut set = Self::new();
        for &id in ids {
            if !set.insert(id) {
                return None;
            }
        }
        Some(set)
    }

    /// Returns false when the set is full.
    pub fn insert(&mut self, id: SfxId) -> bool {
        if self.contains(id) {
            return true;
        }
        self.ids.push(id).is_ok()
    }

    pub fn contains(&self, id: SfxId) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &[SfxId] {
        &self.ids
    }
}

/// Opaque value returned from a sound start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SoundHandle(u16);

impl SoundHandle {
    pub const fn raw(self) -> u16 {
        self.0
    }
}

/// Issues handles counting up from [`FIRST_HANDLE`], wrapping at 2^16 and
/// skipping everything below [`FIRST_HANDLE`].
#[derive(Debug, Default)]
pub struct HandleCounter {
    next: u16,
}

impl HandleCounter {
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    pub fn next_handle(&mut self) -> SoundHandle {
        if self.next == 0 {
            self.next = FIRST_HANDLE;
        }
        let handle = SoundHandle(self.next);
        self.next = self.next.wrapping_add(1);
        handle
    }
}

/// Output side named by a gain error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Error starting a sound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StartError {
    /// A computed gain fell outside 0..=127.
    GainOutOfRange { side: Side, gain: i32 },
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartError::GainOutOfRange { side: Side::Left, gain } => {
                write!(f, "left volume out of bounds: {}", gain)
            }
            StartError::GainOutOfRange { side: Side::Right, gain } => {
                write!(f, "right volume out of bounds: {}", gain)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StartError {}

/// Left and right gains for a start request.
///
/// Stereo separation is accepted but not applied; both sides get `volume`.
pub fn resolve_gains(volume: i32, _separation: i32) -> Result<(Volume, Volume), StartError> {
    let (left, right) = (volume, volume);
    let right = Volume::new(right).ok_or(StartError::GainOutOfRange {
        side: Side::Right,
        gain: right,
    })?;
    let left = Volume::new(left).ok_or(StartError::GainOutOfRange {
        side: Side::Left,
        gain: left,
    })?;
    Ok((left, right))
}

/// A request from game logic to start a sound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StartRequest {
    pub sfx: SfxId,
    pub volume: i32,
    pub separation: i32,
    /// 16.16 playback step. Any value is accepted.
    pub step: u32,
}

impl StartRequest {
    /// Resolve gains and bind the sample, ready for placement.
    pub fn voice_params(&self, sample: SampleData, now: i32) -> Result<VoiceParams, StartError> {
        let (left, right) = resolve_gains(self.volume, self.separation)?;
        Ok(VoiceParams {
            sample,
            sfx: self.sfx,
            step: self.step,
            left,
            right,
            start_tic: now,
        })
    }
}

/// Where a new sound goes and which voices it silences first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartPlan {
    /// Active voices of the same exclusive effect, stopped before placement.
    pub evict: heapless::Vec<usize, NUM_VOICES>,
    /// Slot receiving the new voice.
    pub slot: usize,
}

/// Decide the placement of `sfx` over the current voices.
///
/// Exclusive effects first silence every active voice playing the same
/// effect. The slot is then the first free voice, or failing that the voice
/// with the oldest start tic (lowest index on ties).
pub fn plan_start(voices: &[&Voice], sfx: SfxId, exclusive: &ExclusiveSet) -> StartPlan {
    let mut evict = heapless::Vec::new();
    if exclusive.contains(sfx) {
        for (i, voice) in voices.iter().enumerate().take(NUM_VOICES) {
            if voice.is_active() && voice.sfx() == sfx {
                let _ = evict.push(i);
            }
        }
    }

    let slot = select_slot(voices.iter().enumerate().map(|(i, voice)| {
        (voice.is_active() && !evict.contains(&i)).then_some(voice.start_tic())
    }));

    StartPlan { evict, slot }
}

/// Pick a slot given each slot's occupancy (`None` = free, `Some(tic)` = busy
/// since `tic`). Never fails: a full pool yields the oldest voice.
pub fn select_slot(slots: impl IntoIterator<Item = Option<i32>>) -> usize {
    let mut oldest: Option<(usize, i32)> = None;
    for (i, slot) in slots.into_iter().enumerate() {
        match slot {
            None => return i,
            Some(tic) => {
                if oldest.map_or(true, |(_, t)| tic < t) {
                    oldest = Some((i, tic));
                }
            }
        }
    }
    oldest.map_or(0, |(i, _)| i)
}

/// Single-owner arena of voices.
pub struct VoicePool {
    voices: [Voice; NUM_VOICES],
}

impl VoicePool {
    pub fn new() -> Self {
        Self {
            voices: Default::default(),
        }
    }

    /// Place a sound, returning the slot it landed in.
    ///
    /// Gains are validated before anything is touched, so a rejected request
    /// leaves the pool unchanged.
    pub fn start(
        &mut self,
        request: &StartRequest,
        sample: SampleData,
        now: i32,
        exclusive: &ExclusiveSet,
    ) -> Result<usize, StartError> {
        let params = request.voice_params(sample, now)?;
        let plan = plan_start(&self.voices.each_ref(), request.sfx, exclusive);
        for &i in &plan.evict {
            self.voices[i].deactivate();
        }
        self.voices[plan.slot] = Voice::new(params);
        Ok(plan.slot)
    }

    pub fn get(&self, id: usize) -> Option<&Voice> {
        self.voices.get(id)
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Free a slot immediately.
    pub fn kill(&mut self, id: usize) {
        if let Some(voice) = self.voices.get_mut(id) {
            voice.deactivate();
        }
    }

    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    /// Mix every voice for one output tick; see [`mixer::mix_one_sample`].
    pub fn mix_one_sample(&mut self, table: &AttenuationTable) -> f32 {
        mixer::mix_one_sample(self.voices.iter_mut(), table)
    }
}

impl Default for VoicePool {
    fn default() -> Self {
        Self::new()
    }
}
