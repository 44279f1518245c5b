//! Sound system configuration.

use pwmix_audio::PwmConfig;
use pwmix_engine::ExclusiveSet;

/// Mixer rate the stock sound lumps are recorded at.
pub const DEFAULT_SAMPLE_RATE: u32 = 11025;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoundConfig {
    /// Output ticks per second.
    pub sample_rate: u32,
    /// Effects that may only have one voice at a time.
    pub exclusive: ExclusiveSet,
    pub pwm: PwmConfig,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            exclusive: pwmix_wad::default_exclusive(),
            pwm: PwmConfig::default(),
        }
    }
}
