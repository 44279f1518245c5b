//! Sound effect table and the sample bank built from a WAD.

use pwmix_engine::{ExclusiveSet, SampleData, SfxId, SfxSource};

use crate::dmx::{sound_payload, DmxHeader};
use crate::ids;
use crate::wad::Wad;
use crate::WadError;

/// Lump substituted for any effect missing from the archive.
pub const FALLBACK_LUMP: &str = "dspistol";

/// Rate every sound lump is expected to be recorded at.
const EXPECTED_RATE: u16 = 11025;

/// Static description of a sound effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SfxInfo {
    pub name: &'static str,
    /// Effect whose sample data this one reuses.
    pub link: Option<SfxId>,
}

const fn sfx(name: &'static str) -> SfxInfo {
    SfxInfo { name, link: None }
}

const fn alias(name: &'static str, link: SfxId) -> SfxInfo {
    SfxInfo { name, link: Some(link) }
}

/// Number of entries in [`SFX`], including the empty id 0.
pub const NUM_SFX: usize = 109;

/// All stock sound effects, indexed by id.
pub static SFX: [SfxInfo; NUM_SFX] = [
    sfx("none"),
    sfx("pistol"),
    sfx("shotgn"),
    sfx("sgcock"),
    sfx("dshtgn"),
    sfx("dbopn"),
    sfx("dbcls"),
    sfx("dbload"),
    sfx("plasma"),
    sfx("bfg"),
    sfx("sawup"),
    sfx("sawidl"),
    sfx("sawful"),
    sfx("sawhit"),
    sfx("rlaunc"),
    sfx("rxplod"),
    sfx("firsht"),
    sfx("firxpl"),
    sfx("pstart"),
    sfx("pstop"),
    sfx("doropn"),
    sfx("dorcls"),
    sfx("stnmov"),
    sfx("swtchn"),
    sfx("swtchx"),
    sfx("plpain"),
    sfx("dmpain"),
    sfx("popain"),
    sfx("vipain"),
    sfx("mnpain"),
    sfx("pepain"),
    sfx("slop"),
    sfx("itemup"),
    sfx("wpnup"),
    sfx("oof"),
    sfx("telept"),
    sfx("posit1"),
    sfx("posit2"),
    sfx("posit3"),
    sfx("bgsit1"),
    sfx("bgsit2"),
    sfx("sgtsit"),
    sfx("cacsit"),
    sfx("brssit"),
    sfx("cybsit"),
    sfx("spisit"),
    sfx("bspsit"),
    sfx("kntsit"),
    sfx("vilsit"),
    sfx("mansit"),
    sfx("pesit"),
    sfx("sklatk"),
    sfx("sgtatk"),
    sfx("skepch"),
    sfx("vilatk"),
    sfx("claw"),
    sfx("skeswg"),
    sfx("pldeth"),
    sfx("pdiehi"),
    sfx("podth1"),
    sfx("podth2"),
    sfx("podth3"),
    sfx("bgdth1"),
    sfx("bgdth2"),
    sfx("sgtdth"),
    sfx("cacdth"),
    sfx("skldth"),
    sfx("brsdth"),
    sfx("cybdth"),
    sfx("spidth"),
    sfx("bspdth"),
    sfx("vildth"),
    sfx("kntdth"),
    sfx("pedth"),
    sfx("skedth"),
    sfx("posact"),
    sfx("bgact"),
    sfx("dmact"),
    sfx("bspact"),
    sfx("bspwlk"),
    sfx("vilact"),
    sfx("noway"),
    sfx("barexp"),
    sfx("punch"),
    sfx("hoof"),
    sfx("metal"),
    alias("chgun", ids::PISTOL),
    sfx("tink"),
    sfx("bdopn"),
    sfx("bdcls"),
    sfx("itmbk"),
    sfx("flame"),
    sfx("flamst"),
    sfx("getpow"),
    sfx("bospit"),
    sfx("boscub"),
    sfx("bossit"),
    sfx("bospn"),
    sfx("bosdth"),
    sfx("manatk"),
    sfx("mandth"),
    sfx("sssit"),
    sfx("ssdth"),
    sfx("keenpn"),
    sfx("keendt"),
    sfx("skeact"),
    sfx("skesit"),
    sfx("skeatk"),
    sfx("radio"),
];

/// Id of the effect called `name`, ignoring case.
pub fn sfx_id(name: &str) -> Option<SfxId> {
    SFX.iter()
        .position(|info| info.name.eq_ignore_ascii_case(name))
        .map(|i| i as SfxId)
}

/// Archive lump holding an effect's samples.
pub fn lump_name(sfx_name: &str) -> String {
    format!("ds{}", sfx_name)
}

/// Effects that only ever play one voice at a time: the chainsaw family,
/// the moving-floor loop and the pistol.
pub fn default_exclusive() -> ExclusiveSet {
    let mut set = ExclusiveSet::new();
    for id in [
        ids::SAWUP,
        ids::SAWIDL,
        ids::SAWFUL,
        ids::SAWHIT,
        ids::STNMOV,
        ids::PISTOL,
    ] {
        set.insert(id);
    }
    set
}

/// Sample data for every effect id, loaded once and kept for the life of
/// the sound system.
#[derive(Clone)]
pub struct SfxBank {
    samples: Vec<SampleData>,
    fallback: SampleData,
    substituted: Vec<SfxId>,
}

impl SfxBank {
    /// Load every stock effect from `wad`.
    ///
    /// Effects whose lump is missing play the fallback sound instead; only
    /// the fallback itself is required.
    pub fn load(wad: &Wad) -> Result<Self, WadError> {
        let fallback_lump = wad
            .lump_by_name(FALLBACK_LUMP)
            .ok_or_else(|| WadError::MissingLump(FALLBACK_LUMP.to_string()))?;
        let fallback = decode(FALLBACK_LUMP, fallback_lump);

        let mut samples = vec![fallback.clone(); NUM_SFX];
        let mut substituted = Vec::new();
        for (id, info) in SFX.iter().enumerate().skip(1) {
            if info.link.is_some() {
                continue;
            }
            let name = lump_name(info.name);
            match wad.lump_by_name(&name) {
                Some(lump) => samples[id] = decode(&name, lump),
                None => {
                    tracing::debug!(lump = %name, "sound lump missing, using {}", FALLBACK_LUMP);
                    substituted.push(id as SfxId);
                }
            }
        }
        for (id, info) in SFX.iter().enumerate() {
            if let Some(link) = info.link {
                samples[id] = samples[link as usize].clone();
                if substituted.contains(&link) {
                    substituted.push(id as SfxId);
                }
            }
        }

        tracing::info!(
            loaded = NUM_SFX - 1 - substituted.len(),
            substituted = substituted.len(),
            "pre-cached sound data"
        );
        Ok(Self {
            samples,
            fallback,
            substituted,
        })
    }

    /// Bank from explicit per-id samples. Ids past the end play `fallback`.
    pub fn from_samples(samples: Vec<SampleData>, fallback: SampleData) -> Self {
        Self {
            samples,
            fallback,
            substituted: Vec::new(),
        }
    }

    pub fn get(&self, sfx: SfxId) -> &SampleData {
        self.samples.get(sfx as usize).unwrap_or(&self.fallback)
    }

    /// Ids that resolved to the fallback because their lump was missing.
    pub fn substituted(&self) -> &[SfxId] {
        &self.substituted
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl SfxSource for SfxBank {
    fn sample(&self, sfx: SfxId) -> SampleData {
        self.get(sfx).clone()
    }
}

fn decode(name: &str, lump: &[u8]) -> SampleData {
    if let Some(header) = DmxHeader::parse(lump) {
        if header.sample_rate != EXPECTED_RATE {
            tracing::warn!(
                lump = name,
                rate = header.sample_rate,
                "sound recorded at unexpected rate, playing at {} Hz",
                EXPECTED_RATE
            );
        }
    }
    SampleData::from(sound_payload(lump))
}
