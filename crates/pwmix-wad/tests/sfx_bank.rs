//! Integration tests: synthetic WAD → sample bank.

use pwmix_engine::SfxSource;
use pwmix_wad::{ids, sfx_id, SfxBank, Wad, WadError, NUM_SFX};

fn dmx(samples: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&3u16.to_le_bytes());
    out.extend_from_slice(&11025u16.to_le_bytes());
    out.extend_from_slice(&(samples.len() as u32).to_le_bytes());
    out.extend_from_slice(samples);
    out
}

fn build_wad(lumps: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();
    let mut dir = Vec::new();
    for (name, data) in lumps {
        let pos = 12 + body.len() as i32;
        body.extend_from_slice(data);
        dir.extend_from_slice(&pos.to_le_bytes());
        dir.extend_from_slice(&(data.len() as i32).to_le_bytes());
        let mut raw = [0u8; 8];
        raw[..name.len()].copy_from_slice(name.as_bytes());
        dir.extend_from_slice(&raw);
    }
    let mut out = b"PWAD".to_vec();
    out.extend_from_slice(&(lumps.len() as i32).to_le_bytes());
    out.extend_from_slice(&(12 + body.len() as i32).to_le_bytes());
    out.extend(body);
    out.extend(dir);
    out
}

fn bank(lumps: &[(&str, Vec<u8>)]) -> Result<SfxBank, WadError> {
    let wad = Wad::from_bytes(build_wad(lumps))?;
    SfxBank::load(&wad)
}

#[test]
fn loads_payloads_without_header() {
    let bank = bank(&[
        ("DSPISTOL", dmx(&[1, 2, 3])),
        ("DSSAWUP", dmx(&[200, 201])),
    ])
    .unwrap();
    assert_eq!(&*bank.sample(ids::PISTOL), &[1, 2, 3]);
    assert_eq!(&*bank.sample(ids::SAWUP), &[200, 201]);
    assert_eq!(bank.len(), NUM_SFX);
}

#[test]
fn missing_effects_play_fallback() {
    let bank = bank(&[("DSPISTOL", dmx(&[7, 7]))]).unwrap();
    let oof = sfx_id("oof").unwrap();
    assert_eq!(&*bank.sample(oof), &[7, 7]);
    assert!(bank.substituted().contains(&oof));
    assert!(!bank.substituted().contains(&ids::PISTOL));
}

#[test]
fn alias_shares_linked_buffer() {
    let bank = bank(&[("DSPISTOL", dmx(&[5, 6, 7, 8]))]).unwrap();
    let pistol = bank.sample(ids::PISTOL);
    let chgun = bank.sample(ids::CHGUN);
    assert!(std::sync::Arc::ptr_eq(&pistol, &chgun));
    assert_eq!(chgun.len(), 4);
}

#[test]
fn unknown_id_plays_fallback() {
    let bank = bank(&[("DSPISTOL", dmx(&[9]))]).unwrap();
    assert_eq!(&*bank.sample(9999), &[9]);
}

#[test]
fn fallback_lump_is_required() {
    let result = bank(&[("DSOOF", dmx(&[1]))]);
    assert!(matches!(result, Err(WadError::MissingLump(name)) if name == "dspistol"));
}
