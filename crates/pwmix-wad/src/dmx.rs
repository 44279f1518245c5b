//! DMX digitized sound lumps.
//!
//! A short little-endian header followed by unsigned 8-bit mono PCM.

use binrw::BinRead;
use std::io::Cursor;

/// Format tag of a digitized sound.
pub const DMX_FORMAT: u16 = 3;

/// Bytes before the first sample.
pub const DMX_HEADER_LEN: usize = 8;

#[derive(BinRead, Clone, Copy, Debug, PartialEq, Eq)]
#[br(little)]
pub struct DmxHeader {
    pub format: u16,
    pub sample_rate: u16,
    pub sample_count: u32,
}

impl DmxHeader {
    /// `None` unless `lump` starts with a digitized sound header.
    pub fn parse(lump: &[u8]) -> Option<Self> {
        let header = DmxHeader::read(&mut Cursor::new(lump)).ok()?;
        (header.format == DMX_FORMAT).then_some(header)
    }
}

/// The PCM payload of a sound lump.
///
/// The declared sample count is clipped to the bytes actually present.
/// Lumps without a valid header are returned whole.
pub fn sound_payload(lump: &[u8]) -> &[u8] {
    let Some(header) = DmxHeader::parse(lump) else {
        return lump;
    };
    let body = &lump[DMX_HEADER_LEN..];
    let count = usize::try_from(header.sample_count).map_or(body.len(), |n| n.min(body.len()));
    &body[..count]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lump(rate: u16, count: u32, samples: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&DMX_FORMAT.to_le_bytes());
        out.extend_from_slice(&rate.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(samples);
        out
    }

    #[test]
    fn parses_header() {
        let data = lump(11025, 3, &[1, 2, 3]);
        assert_eq!(
            DmxHeader::parse(&data),
            Some(DmxHeader { format: 3, sample_rate: 11025, sample_count: 3 })
        );
    }

    #[test]
    fn strips_header() {
        let data = lump(11025, 3, &[10, 20, 30]);
        assert_eq!(sound_payload(&data), &[10, 20, 30]);
    }

    #[test]
    fn drops_trailing_padding() {
        let data = lump(11025, 2, &[10, 20, 128, 128]);
        assert_eq!(sound_payload(&data), &[10, 20]);
    }

    #[test]
    fn clips_overlong_count() {
        let data = lump(11025, 1000, &[10, 20]);
        assert_eq!(sound_payload(&data), &[10, 20]);
    }

    #[test]
    fn headerless_lump_is_raw() {
        let data = [0x80u8, 0x81, 0x82];
        assert_eq!(sound_payload(&data), &data);
        let wrong_format = [9u8, 0, 0x11, 0x2b, 1, 0, 0, 0, 5];
        assert_eq!(sound_payload(&wrong_format), &wrong_format);
    }
}
