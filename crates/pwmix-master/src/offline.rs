//! Mixing without the output thread, for export and inspection.

use pwmix_engine::{ExclusiveSet, SfxId, SfxSource, SoundTables, StartError, StartRequest, VoicePool};

/// Samples per game tick at the given mixer rate, rounded down.
pub fn samples_per_tic(sample_rate: u32) -> usize {
    (sample_rate / crate::music::TICRATE as u32) as usize
}

/// Owns a private voice pool and renders it on demand.
pub struct OfflineRenderer<S> {
    tables: SoundTables,
    pool: VoicePool,
    sfx: S,
    exclusive: ExclusiveSet,
    tic: i32,
}

impl<S: SfxSource> OfflineRenderer<S> {
    pub fn new(sfx: S, exclusive: ExclusiveSet) -> Self {
        Self {
            tables: SoundTables::new(),
            pool: VoicePool::new(),
            sfx,
            exclusive,
            tic: 0,
        }
    }

    /// Start an effect at the current tick. Returns the slot it landed in.
    pub fn start(&mut self, id: SfxId, volume: i32, pitch: u8) -> Result<usize, StartError> {
        let request = StartRequest {
            sfx: id,
            volume,
            separation: 128,
            step: self.tables.steps.step(pitch),
        };
        self.pool
            .start(&request, self.sfx.sample(id), self.tic, &self.exclusive)
    }

    pub fn advance_tics(&mut self, tics: i32) {
        self.tic = self.tic.wrapping_add(tics);
    }

    pub fn tic(&self) -> i32 {
        self.tic
    }

    /// Mix `count` output samples.
    pub fn render(&mut self, count: usize) -> Vec<f32> {
        (0..count)
            .map(|_| self.pool.mix_one_sample(&self.tables.attenuation))
            .collect()
    }

    /// Mix until every voice has finished, up to `limit` samples.
    pub fn render_until_idle(&mut self, limit: usize) -> Vec<f32> {
        let mut out = Vec::new();
        while !self.is_idle() && out.len() < limit {
            out.push(self.pool.mix_one_sample(&self.tables.attenuation));
        }
        out
    }

    pub fn is_idle(&self) -> bool {
        self.pool.active_count() == 0
    }

    pub fn pool(&self) -> &VoicePool {
        &self.pool
    }
}
