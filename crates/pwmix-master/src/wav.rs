//! WAV export of a duty-ratio stream as 16-bit mono PCM.

use std::io::Write;

const NUM_CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

/// Map a duty ratio back onto the signed 16-bit range the mixer clamps to.
pub fn duty_to_pcm(ratio: f32) -> i16 {
    ((ratio - 0.5) * 65536.0).clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

pub fn write_wav(w: &mut impl Write, duty: &[f32], sample_rate: u32) -> std::io::Result<()> {
    let block_align = NUM_CHANNELS * (BITS_PER_SAMPLE / 8);
    let data_size = duty.len() as u32 * u32::from(block_align);

    write_riff_header(w, data_size)?;
    write_fmt_chunk(w, sample_rate, block_align)?;
    write_data_chunk(w, duty, data_size)
}

/// Encode into an in-memory WAV file.
pub fn duty_to_wav(duty: &[f32], sample_rate: u32) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(44 + duty.len() * 2);
    write_wav(&mut buf, duty, sample_rate)?;
    Ok(buf)
}

fn write_riff_header(w: &mut impl Write, data_size: u32) -> std::io::Result<()> {
    w.write_all(b"RIFF")?;
    w.write_all(&(36 + data_size).to_le_bytes())?;
    w.write_all(b"WAVE")
}

fn write_fmt_chunk(w: &mut impl Write, sample_rate: u32, block_align: u16) -> std::io::Result<()> {
    w.write_all(b"fmt ")?;
    w.write_all(&16u32.to_le_bytes())?;
    w.write_all(&1u16.to_le_bytes())?;
    w.write_all(&NUM_CHANNELS.to_le_bytes())?;
    w.write_all(&sample_rate.to_le_bytes())?;
    w.write_all(&(sample_rate * u32::from(block_align)).to_le_bytes())?;
    w.write_all(&block_align.to_le_bytes())?;
    w.write_all(&BITS_PER_SAMPLE.to_le_bytes())
}

fn write_data_chunk(w: &mut impl Write, duty: &[f32], data_size: u32) -> std::io::Result<()> {
    w.write_all(b"data")?;
    w.write_all(&data_size.to_le_bytes())?;
    for &ratio in duty {
        w.write_all(&duty_to_pcm(ratio).to_le_bytes())?;
    }
    Ok(())
}
