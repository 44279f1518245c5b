//! Sound system behaviour through the public facade.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pwmix_audio::{ActuatorError, NullActuator};
use pwmix_engine::{attenuate, SampleData, SfxId, SfxSource, NORM_PITCH};
use pwmix_master::{
    ManualClock, OutputState, SoundConfig, SoundError, SoundSystem, StartError, NUM_VOICES,
};
use pwmix_wad::{ids, SfxBank, Wad};

/// Each effect id plays its own buffer.
struct PerId(Vec<SampleData>);

impl SfxSource for PerId {
    fn sample(&self, sfx: SfxId) -> SampleData {
        self.0[sfx as usize].clone()
    }
}

fn system(samples: Vec<Vec<u8>>) -> (SoundSystem<PerId>, Arc<AtomicI32>) {
    let tick = Arc::new(AtomicI32::new(0));
    let bank = PerId(samples.into_iter().map(SampleData::from).collect());
    (SoundSystem::new(SoundConfig::default(), bank, tick.clone()), tick)
}

fn uniform(count: usize, data: &[u8]) -> Vec<Vec<u8>> {
    vec![data.to_vec(); count]
}

fn wait_while_starting(sound: &SoundSystem<impl SfxSource>) {
    while sound.output_state() == Some(OutputState::Starting) {
        std::thread::yield_now();
    }
}

#[test]
fn silent_buffer_plays_out_in_four_mixes() {
    let (sound, _) = system(uniform(2, &[128, 128, 128, 128]));
    sound.start_sound(1, 64, 128, NORM_PITCH, 0).unwrap();

    for _ in 0..4 {
        assert_eq!(attenuate(64, 128), 0);
        assert_eq!(sound.mix_one_sample(), 0.5);
    }
    assert_eq!(sound.active_voices(), 0);
    assert_eq!(sound.mix_one_sample(), 0.5);
}

#[test]
fn idle_mix_is_midpoint() {
    let (sound, _) = system(uniform(1, &[]));
    assert_eq!(sound.mix_one_sample(), 0.5);
}

#[test]
fn exclusive_effect_keeps_one_voice() {
    let (sound, tick) = system(uniform(109, &[200; 64]));
    for t in 0..5 {
        tick.store(t, Ordering::Relaxed);
        sound.start_sound(ids::SAWIDL, 100, 128, NORM_PITCH, 0).unwrap();
        sound.start_sound(ids::SHOTGN, 100, 128, NORM_PITCH, 0).unwrap();
    }
    let voices: Vec<_> = (0..NUM_VOICES).filter_map(|i| sound.voice(i)).collect();
    let saws = voices
        .iter()
        .filter(|v| v.is_active() && v.sfx() == ids::SAWIDL)
        .count();
    let shotguns = voices
        .iter()
        .filter(|v| v.is_active() && v.sfx() == ids::SHOTGN)
        .count();
    assert_eq!(saws, 1);
    assert_eq!(shotguns, 5);
}

#[test]
fn full_pool_evicts_the_oldest_start() {
    let (sound, tick) = system(uniform(20, &[140; 1000]));
    let tics = [5, 3, 9, 3, 7, 8, 6, 4];
    for (i, &t) in tics.iter().enumerate() {
        tick.store(t, Ordering::Relaxed);
        sound.start_sound(2 + i as SfxId, 50, 128, NORM_PITCH, 0).unwrap();
    }
    tick.store(10, Ordering::Relaxed);
    sound.start_sound(15, 50, 128, NORM_PITCH, 0).unwrap();

    // Slots 1 and 3 tie at tic 3; the lower index goes.
    let slot1 = sound.voice(1).unwrap();
    assert_eq!(slot1.sfx(), 15);
    assert_eq!(slot1.start_tic(), 10);
    assert_eq!(sound.voice(3).unwrap().sfx(), 5);
    assert_eq!(sound.active_voices(), NUM_VOICES);
}

#[test]
fn out_of_range_gain_halts_without_clamping() {
    let (sound, _) = system(uniform(3, &[255; 16]));
    sound.start_output_with(ManualClock::new(), || Ok(NullActuator::new(10_000)));
    wait_while_starting(&sound);
    sound.start_sound(1, 127, 128, NORM_PITCH, 0).unwrap();

    let err = sound.start_sound(2, -1, 128, NORM_PITCH, 0).unwrap_err();
    assert!(matches!(
        err,
        SoundError::Start(StartError::GainOutOfRange { gain: -1, .. })
    ));
    assert!(sound.is_halted());
    assert_eq!(sound.output_state(), None);
    assert_eq!(sound.active_voices(), 0);
    assert_eq!(
        sound.start_sound(1, 127, 128, NORM_PITCH, 0),
        Err(SoundError::Halted)
    );
}

#[test]
fn output_thread_drains_voices() {
    let (sound, _) = system(uniform(2, &[255; 32]));
    let clock = ManualClock::new();
    sound.start_output_with(clock.clone(), || Ok(NullActuator::new(10_000)));
    wait_while_starting(&sound);
    assert_eq!(sound.output_state(), Some(OutputState::Running));

    sound.start_sound(1, 127, 128, NORM_PITCH, 0).unwrap();
    // Every clock step moves the sample index, so each step the output
    // thread observes mixes once.
    for _ in 0..500 {
        clock.advance(Duration::from_millis(1));
        std::thread::sleep(Duration::from_millis(1));
        if sound.active_voices() == 0 {
            break;
        }
    }
    assert_eq!(sound.active_voices(), 0);
    sound.shutdown();
}

#[test]
fn failed_actuator_stays_silent() {
    let (sound, _) = system(uniform(2, &[255; 32]));
    sound.start_output_with(ManualClock::new(), || {
        Err::<NullActuator, _>(ActuatorError::NoDevice)
    });
    wait_while_starting(&sound);
    assert_eq!(sound.output_state(), Some(OutputState::Failed));

    // Starting still works; nothing consumes the voice.
    sound.start_sound(1, 127, 128, NORM_PITCH, 0).unwrap();
    assert_eq!(sound.active_voices(), 1);
    assert!(!sound.is_halted());
}

#[test]
fn handles_wrap_past_reserved_range() {
    let (sound, _) = system(uniform(2, &[128]));
    let mut last = 0;
    for _ in 0..(65536 - 100) {
        last = sound.start_sound(1, 1, 128, NORM_PITCH, 0).unwrap().raw();
    }
    assert_eq!(last, 65535);
    let next = sound.start_sound(1, 1, 128, NORM_PITCH, 0).unwrap();
    assert_eq!(next.raw(), 100);
}

fn build_wad(lumps: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();
    let mut dir = Vec::new();
    for (name, data) in lumps {
        dir.extend_from_slice(&(12 + body.len() as i32).to_le_bytes());
        dir.extend_from_slice(&(data.len() as i32).to_le_bytes());
        let mut raw = [0u8; 8];
        raw[..name.len()].copy_from_slice(name.as_bytes());
        dir.extend_from_slice(&raw);
        body.extend_from_slice(data);
    }
    let mut out = b"IWAD".to_vec();
    out.extend_from_slice(&(lumps.len() as i32).to_le_bytes());
    out.extend_from_slice(&(12 + body.len() as i32).to_le_bytes());
    out.extend(body);
    out.extend(dir);
    out
}

fn dmx(samples: &[u8]) -> Vec<u8> {
    let mut lump = vec![3, 0, 0x11, 0x2b];
    lump.extend_from_slice(&(samples.len() as u32).to_le_bytes());
    lump.extend_from_slice(samples);
    lump
}

#[test]
fn wad_backed_system_plays_fallback_for_missing_effects() {
    let wad = Wad::from_bytes(build_wad(&[
        ("DSPISTOL", dmx(&[128, 128])),
        ("DSSHOTGN", dmx(&[255, 255, 255])),
    ]))
    .unwrap();
    let bank = SfxBank::load(&wad).unwrap();
    let tick = Arc::new(AtomicI32::new(0));
    let sound = SoundSystem::new(SoundConfig::default(), bank, tick);

    sound.start_sound(ids::DOROPN, 127, 128, NORM_PITCH, 0).unwrap();
    assert_eq!(sound.voice(0).unwrap().end(), 2);

    sound.start_sound(ids::SHOTGN, 127, 128, NORM_PITCH, 0).unwrap();
    assert_eq!(sound.voice(1).unwrap().end(), 3);
    // A full-scale byte at full volume clips high.
    assert_eq!(sound.mix_one_sample(), 1.0);
}
