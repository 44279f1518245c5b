//! Mono mixdown into a duty ratio.
//!
//! Voices are summed as signed 16-bit-range values, boosted to make use of the
//! few bits a PWM output resolves, clamped and mapped onto 0.0..=1.0.

use crate::tables::AttenuationTable;
use crate::voice::Voice;

/// Post-sum boost applied before clamping.
pub const MIX_GAIN: i32 = 8;

/// Largest boosted mix that is not clipped high.
pub const MIX_MAX: i32 = 0x7fff;

/// Smallest boosted mix that is not clipped low.
pub const MIX_MIN: i32 = -0x8000;

/// Duty ratio of a silent mix.
pub const NEUTRAL_DUTY: f32 = 0.5;

/// Mix one output sample from `voices`, advancing each active voice and
/// freeing those that reach the end of their sample.
#[inline]
pub fn mix_one_sample<'a>(
    voices: impl IntoIterator<Item = &'a mut Voice>,
    table: &AttenuationTable,
) -> f32 {
    let sum: i32 = voices.into_iter().map(|voice| voice.render(table)).sum();
    duty_ratio(sum)
}

/// Boost, clamp and rescale a raw voice sum into a duty ratio.
#[inline]
pub fn duty_ratio(sum: i32) -> f32 {
    let mix = sum * MIX_GAIN;
    if mix > MIX_MAX {
        1.0
    } else if mix < MIX_MIN {
        0.0
    } else {
        mix as f32 / 65536.0 + NEUTRAL_DUTY
    }
}
