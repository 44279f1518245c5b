//! WAD archive directory.

use arrayvec::ArrayString;
use binrw::BinRead;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use crate::WadError;

/// Lump names are at most eight bytes, stored upper case.
pub type LumpName = ArrayString<8>;

#[derive(BinRead, Debug)]
#[br(little)]
struct WadHeader {
    ident: [u8; 4],
    num_lumps: i32,
    info_table_offset: i32,
}

#[derive(BinRead, Debug)]
#[br(little)]
struct RawLump {
    file_pos: i32,
    size: i32,
    name: [u8; 8],
}

/// Archive flavour from the identification string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WadKind {
    Iwad,
    Pwad,
}

/// One directory entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LumpInfo {
    pub name: LumpName,
    pub offset: usize,
    pub size: usize,
}

/// An archive loaded fully into memory.
pub struct Wad {
    kind: WadKind,
    data: Vec<u8>,
    lumps: Vec<LumpInfo>,
}

impl Wad {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, WadError> {
        let data = fs::read(path)?;
        Self::from_bytes(data)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self, WadError> {
        let (kind, lumps) = read_directory(&data)?;
        tracing::debug!(lumps = lumps.len(), ?kind, "WAD directory loaded");
        Ok(Self { kind, data, lumps })
    }

    pub fn kind(&self) -> WadKind {
        self.kind
    }

    pub fn lumps(&self) -> &[LumpInfo] {
        &self.lumps
    }

    /// Index of the named lump, ignoring case. Later entries override
    /// earlier ones of the same name.
    pub fn check_num_for_name(&self, name: &str) -> Option<usize> {
        let wanted = normalize(name.as_bytes())?;
        self.lumps.iter().rposition(|lump| lump.name == wanted)
    }

    pub fn lump(&self, index: usize) -> Option<&[u8]> {
        let info = self.lumps.get(index)?;
        self.data.get(info.offset..info.offset + info.size)
    }

    pub fn lump_by_name(&self, name: &str) -> Option<&[u8]> {
        self.lump(self.check_num_for_name(name)?)
    }
}

fn read_directory(data: &[u8]) -> Result<(WadKind, Vec<LumpInfo>), WadError> {
    let mut cursor = Cursor::new(data);
    let header = WadHeader::read(&mut cursor)?;

    let kind = match &header.ident {
        b"IWAD" => WadKind::Iwad,
        b"PWAD" => WadKind::Pwad,
        _ => return Err(WadError::InvalidHeader),
    };
    let (Ok(num_lumps), Ok(table_offset)) = (
        usize::try_from(header.num_lumps),
        u64::try_from(header.info_table_offset),
    ) else {
        return Err(WadError::InvalidHeader);
    };

    cursor.set_position(table_offset);
    let mut lumps = Vec::with_capacity(num_lumps.min(data.len() / 16));
    for _ in 0..num_lumps {
        let raw = RawLump::read(&mut cursor)?;
        let name = normalize(&raw.name).unwrap_or_default();
        let (Ok(offset), Ok(size)) = (usize::try_from(raw.file_pos), usize::try_from(raw.size))
        else {
            return Err(WadError::LumpOutOfBounds { name: name.to_string() });
        };
        if offset.checked_add(size).map_or(true, |end| end > data.len()) {
            return Err(WadError::LumpOutOfBounds { name: name.to_string() });
        }
        lumps.push(LumpInfo { name, offset, size });
    }
    Ok((kind, lumps))
}

/// Upper-case a NUL-padded name; `None` if it cannot be a lump name.
fn normalize(raw: &[u8]) -> Option<LumpName> {
    let mut name = LumpName::new();
    for &b in raw.iter().take_while(|&&b| b != 0) {
        if !b.is_ascii() {
            return None;
        }
        name.try_push(b.to_ascii_uppercase() as char).ok()?;
    }
    Some(name)
}
