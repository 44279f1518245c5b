//! Precomputed lookup tables used by the mixer.
//!
//! Both tables are built once when the sound subsystem starts and are only
//! read afterwards, so they can be shared between threads without locking.

use alloc::boxed::Box;
use alloc::vec;

use crate::voice::Volume;

/// Number of distinct volume levels (0..=127).
pub const VOLUME_LEVELS: usize = 128;

/// Number of distinct unsigned 8-bit sample values.
pub const SAMPLE_VALUES: usize = 256;

/// Number of entries in the pitch step table.
pub const PITCH_STEPS: usize = 256;

/// Pitch table position that plays a sample at its recorded speed.
pub const NORM_PITCH: u8 = 128;

/// One row of the attenuation table: the signed contribution of every
/// unsigned sample byte at a fixed volume.
pub type GainRow = [i32; SAMPLE_VALUES];

/// Volume lookup that also recentres unsigned samples around zero.
pub struct AttenuationTable {
    rows: Box<[GainRow]>,
}

impl AttenuationTable {
    pub fn new() -> Self {
        let mut rows = vec![[0i32; SAMPLE_VALUES]; VOLUME_LEVELS].into_boxed_slice();
        for (volume, row) in rows.iter_mut().enumerate() {
            for (sample, entry) in row.iter_mut().enumerate() {
                *entry = attenuate(volume as i32, sample as i32);
            }
        }
        Self { rows }
    }

    /// The gain row selected by a volume level.
    #[inline]
    pub fn row(&self, volume: Volume) -> &GainRow {
        &self.rows[volume.level() as usize]
    }

    /// Signed contribution of `sample` played at `volume`.
    #[inline]
    pub fn lookup(&self, volume: Volume, sample: u8) -> i32 {
        self.row(volume)[sample as usize]
    }
}

impl Default for AttenuationTable {
    fn default() -> Self {
        Self::new()
    }
}

/// `volume * (sample - 128) * 256 / 127`, truncated toward zero.
#[inline]
pub const fn attenuate(volume: i32, sample: i32) -> i32 {
    volume * (sample - 128) * 256 / 127
}

/// Pitch to 16.16 playback step.
///
/// Position `i` holds the step for signed offset `i - 128`; each 64 positions
/// double the playback rate.
pub struct StepTable {
    steps: [u32; PITCH_STEPS],
}

impl StepTable {
    pub fn new() -> Self {
        let mut steps = [0u32; PITCH_STEPS];
        for (i, step) in steps.iter_mut().enumerate() {
            *step = pitch_step(i as i32 - NORM_PITCH as i32);
        }
        Self { steps }
    }

    /// Step for a raw table position (128 = unit speed).
    #[inline]
    pub fn step(&self, pitch: u8) -> u32 {
        self.steps[pitch as usize]
    }

    /// Step for a signed pitch offset.
    #[inline]
    pub fn step_for_offset(&self, offset: i8) -> u32 {
        self.steps[(offset as i16 + NORM_PITCH as i16) as usize]
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.steps
    }
}

impl Default for StepTable {
    fn default() -> Self {
        Self::new()
    }
}

/// `round(2^(offset / 64) * 65536)`.
pub fn pitch_step(offset: i32) -> u32 {
    libm::round(libm::pow(2.0, offset as f64 / 64.0) * 65536.0) as u32
}

/// The two immutable tables, built together at subsystem start.
pub struct SoundTables {
    pub attenuation: AttenuationTable,
    pub steps: StepTable,
}

impl SoundTables {
    pub fn new() -> Self {
        Self {
            attenuation: AttenuationTable::new(),
            steps: StepTable::new(),
        }
    }
}

impl Default for SoundTables {
    fn default() -> Self {
        Self::new()
    }
}
