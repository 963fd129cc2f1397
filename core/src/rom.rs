//! ROM loading and validation.
//!
//! A CHIP-8 ROM is a raw big-endian byte stream meant to be loaded at virtual
//! address `0x200`. There is no header and no checksum; the only structural
//! validation possible is a size bound.

use std::fmt;
use std::fs;
use std::path::Path;

/// Minimum valid ROM size in bytes (one instruction).
pub const MIN_SIZE: usize = 2;
/// Maximum valid ROM size in bytes (`0xFFF - 0x200 + 1`).
pub const MAX_SIZE: usize = 3584;

/// Errors that can occur while loading or validating a ROM.
#[derive(Debug)]
pub enum RomLoadError {
    /// The ROM file does not exist.
    NotFound(std::path::PathBuf),
    /// The ROM is larger than [`MAX_SIZE`] bytes.
    TooLarge { size: usize },
    /// The ROM is smaller than [`MIN_SIZE`] bytes.
    TooSmall { size: usize },
    /// Underlying I/O error (permission denied, etc).
    Io(std::io::Error),
}

impl fmt::Display for RomLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "ROM not found: {}", path.display()),
            Self::TooLarge { size } => {
                write!(f, "ROM too large: {size} bytes (max {MAX_SIZE})")
            }
            Self::TooSmall { size } => {
                write!(f, "ROM too small: {size} bytes (min {MIN_SIZE})")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for RomLoadError {}

impl From<std::io::Error> for RomLoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// A loaded, validated CHIP-8 ROM with its derived identifier.
#[derive(Debug, Clone)]
pub struct Rom {
    /// Sanitized, language-safe identifier derived from the source name.
    pub identifier: String,
    /// Raw program bytes, as they will be loaded at `0x200`.
    pub bytes: Vec<u8>,
    /// True if an odd trailing byte was dropped (see [`Rom::from_bytes`]).
    pub trailing_byte_dropped: bool,
}

impl Rom {
    /// Read a ROM from disk, validate its size, and derive its identifier
    /// from the file stem.
    pub fn load(path: &Path) -> Result<Rom, RomLoadError> {
        if !path.is_file() {
            return Err(RomLoadError::NotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        let name_hint = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::from_bytes(&name_hint, bytes)
    }

    /// Build a ROM from an in-memory byte buffer. Pure and side-effect free;
    /// used directly by tests and by the batch orchestrator, which already
    /// has the bytes of each directory entry in hand.
    ///
    /// An odd trailing byte is dropped with `trailing_byte_dropped = true`
    /// rather than rejected, per the size-bound invariant in the data model.
    pub fn from_bytes(name_hint: &str, mut bytes: Vec<u8>) -> Result<Rom, RomLoadError> {
        let mut trailing_byte_dropped = false;
        if bytes.len() % 2 != 0 && !bytes.is_empty() {
            bytes.pop();
            trailing_byte_dropped = true;
        }

        let size = bytes.len();
        if size < MIN_SIZE {
            return Err(RomLoadError::TooSmall { size });
        }
        if size > MAX_SIZE {
            return Err(RomLoadError::TooLarge { size });
        }

        Ok(Rom {
            identifier: Self::derive_identifier(name_hint),
            bytes,
            trailing_byte_dropped,
        })
    }

    /// Derive a valid Rust identifier from an arbitrary ROM file name.
    ///
    /// Strips bracketed/parenthesized metadata (`"Pong (1990)"` →
    /// `"Pong"`), lowercases, collapses non-alphanumeric runs to a single
    /// `_`, trims leading/trailing `_`, prefixes `rom_` if the result would
    /// start with a digit, and falls back to `"rom"` if the result is empty.
    pub fn derive_identifier(name: &str) -> String {
        let stripped = strip_bracketed(name);

        let mut out = String::with_capacity(stripped.len());
        let mut last_was_sep = false;
        for ch in stripped.chars() {
            if ch.is_ascii_alphanumeric() {
                out.push(ch.to_ascii_lowercase());
                last_was_sep = false;
            } else if !last_was_sep && !out.is_empty() {
                out.push('_');
                last_was_sep = true;
            }
        }
        while out.ends_with('_') {
            out.pop();
        }

        if out.is_empty() {
            return "rom".to_string();
        }
        if out.as_bytes()[0].is_ascii_digit() {
            out.insert_str(0, "rom_");
        }
        out
    }

    /// ROM size in bytes after any trailing-byte adjustment.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Remove any `(...)` or `[...]` delimited runs, e.g. `"Pong (1990) [hack]"`
/// → `"Pong "`.
fn strip_bracketed(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut depth = 0u32;
    for ch in name.chars() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_strips_bracketed_metadata() {
        assert_eq!(Rom::derive_identifier("Pong (1990)"), "pong");
        assert_eq!(Rom::derive_identifier("Tetris [hack]"), "tetris");
    }

    #[test]
    fn identifier_lowercases_and_collapses_separators() {
        assert_eq!(Rom::derive_identifier("Space Invaders!!"), "space_invaders");
        assert_eq!(Rom::derive_identifier("UFO---2"), "ufo_2");
    }

    #[test]
    fn identifier_trims_leading_and_trailing_underscores() {
        assert_eq!(Rom::derive_identifier("--Pong--"), "pong");
    }

    #[test]
    fn identifier_prefixes_leading_digit() {
        assert_eq!(Rom::derive_identifier("15puzzle"), "rom_15puzzle");
    }

    #[test]
    fn identifier_falls_back_when_empty() {
        assert_eq!(Rom::derive_identifier("!!!"), "rom");
        assert_eq!(Rom::derive_identifier(""), "rom");
    }

    #[test]
    fn identifier_matches_valid_rust_ident_pattern() {
        for name in ["Pong (1990)", "15 Puzzle", "!!!", "UFO_2", "Tetris [a][b]"] {
            let id = Rom::derive_identifier(name);
            let mut chars = id.chars();
            let first = chars.next().expect("identifier must be non-empty");
            assert!(first == '_' || first.is_ascii_alphabetic());
            assert!(id.chars().all(|c| c == '_' || c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn from_bytes_rejects_too_small() {
        let result = Rom::from_bytes("x", vec![0x00]);
        assert!(matches!(result, Err(RomLoadError::TooSmall { size: 0 })));
    }

    #[test]
    fn from_bytes_rejects_too_large() {
        let result = Rom::from_bytes("x", vec![0u8; MAX_SIZE + 2]);
        assert!(matches!(result, Err(RomLoadError::TooLarge { .. })));
    }

    #[test]
    fn from_bytes_accepts_boundary_sizes() {
        assert!(Rom::from_bytes("x", vec![0u8; MIN_SIZE]).is_ok());
        assert!(Rom::from_bytes("x", vec![0u8; MAX_SIZE]).is_ok());
    }

    #[test]
    fn from_bytes_drops_odd_trailing_byte() {
        let rom = Rom::from_bytes("x", vec![0x12, 0x34, 0x56]).unwrap();
        assert_eq!(rom.bytes, vec![0x12, 0x34]);
        assert!(rom.trailing_byte_dropped);
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let result = Rom::load(Path::new("/nonexistent/path/to/rom.ch8"));
        assert!(matches!(result, Err(RomLoadError::NotFound(_))));
    }
}
