//! Asset side of pwmix.
//!
//! Reads WAD archives, decodes DMX sound lumps and builds the bank of
//! sound effect samples the mixer plays from.

mod dmx;
mod sfx;
mod wad;

pub use dmx::{sound_payload, DmxHeader, DMX_FORMAT, DMX_HEADER_LEN};
pub use sfx::{
    default_exclusive, lump_name, sfx_id, SfxBank, SfxInfo, FALLBACK_LUMP, NUM_SFX, SFX,
};
pub use wad::{LumpInfo, LumpName, Wad, WadKind};

/// Stock sound effect ids.
pub mod ids {
    use pwmix_engine::SfxId;

    pub const NONE: SfxId = 0;
    pub const PISTOL: SfxId = 1;
    pub const SHOTGN: SfxId = 2;
    pub const SAWUP: SfxId = 10;
    pub const SAWIDL: SfxId = 11;
    pub const SAWFUL: SfxId = 12;
    pub const SAWHIT: SfxId = 13;
    pub const DOROPN: SfxId = 20;
    pub const STNMOV: SfxId = 22;
    pub const CHGUN: SfxId = 86;
    pub const RADIO: SfxId = 108;
}

/// Error type for asset loading.
#[derive(Debug)]
pub enum WadError {
    /// I/O error reading the archive
    Io(std::io::Error),
    /// Malformed header or directory entry
    Parse(binrw::Error),
    /// Identification string is neither IWAD nor PWAD
    InvalidHeader,
    /// A directory entry points outside the file
    LumpOutOfBounds { name: String },
    /// A required lump is absent
    MissingLump(String),
}

impl std::fmt::Display for WadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WadError::Io(e) => write!(f, "WAD I/O error: {}", e),
            WadError::Parse(e) => write!(f, "WAD parse error: {}", e),
            WadError::InvalidHeader => write!(f, "not an IWAD or PWAD file"),
            WadError::LumpOutOfBounds { name } => {
                write!(f, "lump {} extends past end of file", name)
            }
            WadError::MissingLump(name) => write!(f, "required lump {} not found", name),
        }
    }
}

impl std::error::Error for WadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WadError::Io(e) => Some(e),
            WadError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for WadError {
    fn from(e: std::io::Error) -> Self {
        WadError::Io(e)
    }
}

impl From<binrw::Error> for WadError {
    fn from(e: binrw::Error) -> Self {
        WadError::Parse(e)
    }
}
