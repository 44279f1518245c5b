//! Voice pool shared between game logic and the output loop.
//!
//! Each slot sits behind its own lock. A start replaces the whole slot value
//! while holding it, so the mixer only ever sees a voice before or after a
//! start, never in between. Starts take every slot lock in index order; the
//! mixer takes one at a time, so the two can never deadlock.

use parking_lot::{Mutex, MutexGuard};
use pwmix_engine::{
    duty_ratio, plan_start, AttenuationTable, ExclusiveSet, Voice, VoiceParams, NUM_VOICES,
};

pub struct SharedVoicePool {
    slots: [Mutex<Voice>; NUM_VOICES],
}

impl SharedVoicePool {
    pub fn new() -> Self {
        Self {
            slots: Default::default(),
        }
    }

    /// Place a resolved sound, returning its slot.
    pub fn start(&self, params: VoiceParams, exclusive: &ExclusiveSet) -> usize {
        let mut guards: [MutexGuard<'_, Voice>; NUM_VOICES] =
            std::array::from_fn(|i| self.slots[i].lock());

        let plan = {
            let voices: [&Voice; NUM_VOICES] = std::array::from_fn(|i| &*guards[i]);
            plan_start(&voices, params.sfx, exclusive)
        };
        for &i in &plan.evict {
            guards[i].deactivate();
        }
        *guards[plan.slot] = Voice::new(params);
        plan.slot
    }

    /// Mix every slot for one output tick.
    pub fn mix_one_sample(&self, table: &AttenuationTable) -> f32 {
        let sum: i32 = self.slots.iter().map(|slot| slot.lock().render(table)).sum();
        duty_ratio(sum)
    }

    /// Copy of a slot's current state.
    pub fn voice(&self, id: usize) -> Option<Voice> {
        self.slots.get(id).map(|slot| slot.lock().clone())
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.lock().is_active()).count()
    }

    /// Free every slot.
    pub fn clear(&self) {
        for slot in &self.slots {
            slot.lock().deactivate();
        }
    }
}

impl Default for SharedVoicePool {
    fn default() -> Self {
        Self::new()
    }
}
