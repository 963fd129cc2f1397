//! Parses the optional `--metadata FILE` TOML file into the per-ROM
//! `chip8rec_codegen::RomMetadata` values `emit_batch`/`emit_single_rom`
//! consume. `chip8rec-codegen` has no opinion on TOML; that parsing lives
//! here, on a plain `toml` + `serde` settings-file stack.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use chip8rec_codegen::RomMetadata;

/// One ROM's catalog fields as they appear in the TOML file, before
/// conversion to `chip8rec_codegen::RomMetadata`.
#[derive(Debug, Deserialize, Default, Clone)]
struct TomlRomMetadata {
    title: Option<String>,
    description: Option<String>,
    authors: Option<String>,
    release: Option<String>,
    recommended_cpu_hz: Option<u32>,
}

impl From<TomlRomMetadata> for RomMetadata {
    fn from(m: TomlRomMetadata) -> Self {
        RomMetadata {
            title: m.title,
            description: m.description,
            authors: m.authors,
            release: m.release,
            recommended_cpu_hz: m.recommended_cpu_hz,
        }
    }
}

/// The whole `--metadata FILE`: top-level fields apply to single-ROM mode
/// (the file describes that one ROM); a `[roms.<identifier>]` subtable per
/// entry applies to batch mode, keyed by the ROM's derived identifier.
#[derive(Debug, Deserialize, Default)]
struct TomlMetadataFile {
    #[serde(flatten)]
    default: TomlRomMetadata,
    #[serde(default)]
    roms: HashMap<String, TomlRomMetadata>,
}

#[derive(Debug, Default)]
pub struct MetadataFile {
    pub default: RomMetadata,
    pub roms: HashMap<String, RomMetadata>,
}

pub fn load_metadata_file(path: &Path) -> Result<MetadataFile, MetadataError> {
    let text = std::fs::read_to_string(path).map_err(MetadataError::Io)?;
    let parsed: TomlMetadataFile = toml::from_str(&text).map_err(MetadataError::Parse)?;
    Ok(MetadataFile {
        default: parsed.default.into(),
        roms: parsed.roms.into_iter().map(|(k, v)| (k, v.into())).collect(),
    })
}

#[derive(Debug)]
pub enum MetadataError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "{e}"),
            Self::Parse(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for MetadataError {}
