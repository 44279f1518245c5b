//! Voice: one playback slot stepping through an unsigned 8-bit sample.

use alloc::sync::Arc;

use crate::tables::AttenuationTable;

/// Raw unsigned 8-bit PCM. Owned by the asset side; voices hold a shared
/// reference for as long as they play it.
pub type SampleData = Arc<[u8]>;

/// Sound effect identifier. Also the category used for de-duplication.
pub type SfxId = u16;

/// Fractional bits of the 16.16 step format.
pub const FRAC_BITS: u32 = 16;

const FRAC_MASK: u32 = (1 << FRAC_BITS) - 1;

/// Attenuation row selector, always within 0..=127.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Volume(u8);

impl Volume {
    pub const MAX: Volume = Volume(127);

    /// `None` when `level` is outside 0..=127.
    pub const fn new(level: i32) -> Option<Self> {
        if level >= 0 && level <= Self::MAX.0 as i32 {
            Some(Volume(level as u8))
        } else {
            None
        }
    }

    pub const fn level(self) -> u8 {
        self.0
    }
}

/// A fully resolved sound start, ready to be placed on a voice.
#[derive(Clone, Debug)]
pub struct VoiceParams {
    pub sample: SampleData,
    pub sfx: SfxId,
    pub step: u32,
    pub left: Volume,
    pub right: Volume,
    pub start_tic: i32,
}

/// A single playback slot. Inactive when it holds no sample.
#[derive(Clone, Debug, Default)]
pub struct Voice {
    /// Sample being played; `None` marks a free slot.
    sample: Option<SampleData>,
    /// Read position in whole samples.
    cursor: usize,
    /// Advance per output tick (16.16 fixed-point).
    step: u32,
    /// Fractional position carried between ticks.
    step_remainder: u32,
    start_tic: i32,
    sfx: SfxId,
    left: Volume,
    right: Volume,
}

impl Voice {
    /// Build an active voice positioned at the start of its sample.
    pub fn new(params: VoiceParams) -> Self {
        Self {
            cursor: 0,
            step: params.step,
            step_remainder: 0,
            start_tic: params.start_tic,
            sfx: params.sfx,
            left: params.left,
            right: params.right,
            sample: Some(params.sample),
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.sample.is_some()
    }

    pub fn deactivate(&mut self) {
        self.sample = None;
    }

    pub fn sfx(&self) -> SfxId {
        self.sfx
    }

    pub fn start_tic(&self) -> i32 {
        self.start_tic
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Exclusive end of the sample, 0 when inactive.
    pub fn end(&self) -> usize {
        self.sample.as_ref().map_or(0, |s| s.len())
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn step_remainder(&self) -> u32 {
        self.step_remainder
    }

    pub fn left_gain(&self) -> Volume {
        self.left
    }

    pub fn right_gain(&self) -> Volume {
        self.right
    }

    /// Produce this voice's contribution for one output tick and advance.
    ///
    /// Only the left gain is summed: both gains are always equal and there is
    /// a single output. The voice frees itself once the cursor reaches the end.
    #[inline]
    pub fn render(&mut self, table: &AttenuationTable) -> i32 {
        let Some(sample) = self.sample.as_ref() else {
            return 0;
        };
        let len = sample.len();
        let Some(&byte) = sample.get(self.cursor) else {
            self.sample = None;
            return 0;
        };

        let contribution = table.lookup(self.left, byte);

        // Widened so any 32-bit step advances without overflow.
        let position = u64::from(self.step_remainder) + u64::from(self.step);
        self.cursor = self
            .cursor
            .saturating_add((position >> FRAC_BITS) as usize);
        self.step_remainder = (position as u32) & FRAC_MASK;

        if self.cursor >= len {
            self.sample = None;
        }
        contribution
    }
}
