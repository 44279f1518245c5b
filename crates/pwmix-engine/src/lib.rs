//! Mixing core for the pwmix sound subsystem.
//!
//! Lookup tables, the fixed voice arena with its start/evict policy, and the
//! mono mixer that turns active voices into a PWM duty ratio.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod mixer;
mod tables;
mod voice;
mod voice_pool;

pub use mixer::{duty_ratio, mix_one_sample, MIX_GAIN, NEUTRAL_DUTY};
pub use tables::{
    attenuate, pitch_step, AttenuationTable, GainRow, SoundTables, StepTable, NORM_PITCH,
};
pub use voice::{SampleData, SfxId, Voice, VoiceParams, Volume, FRAC_BITS};
pub use voice_pool::{
    plan_start, resolve_gains, select_slot, ExclusiveSet, HandleCounter, Side, SoundHandle,
    StartError, StartPlan, StartRequest, VoicePool, FIRST_HANDLE, MAX_EXCLUSIVE, NUM_VOICES,
};

/// Provides the sample buffer for a sound effect.
///
/// Implementations never fail: an unknown or missing effect resolves to a
/// fallback sound.
pub trait SfxSource {
    fn sample(&self, sfx: SfxId) -> SampleData;
}
