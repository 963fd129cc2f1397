//! Emission errors (stage D): filesystem failures while writing a generated
//! project, and internal invariants of the code generator itself.

use std::fmt;
use std::io;
use std::path::PathBuf;

#[derive(Debug)]
pub enum EmitError {
    CreateDir(io::Error),
    WriteFile { path: PathBuf, source: io::Error },
    /// A generated `TokenStream` failed to parse as a `syn::File`. This
    /// names a defect in `chip8rec-codegen` itself, not a recoverable
    /// condition in the ROM being emitted.
    Internal(String),
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateDir(e) => write!(f, "failed to create output directory: {e}"),
            Self::WriteFile { path, source } => {
                write!(f, "failed to write {}: {source}", path.display())
            }
            Self::Internal(msg) => write!(f, "internal emitter error: {msg}"),
        }
    }
}

impl std::error::Error for EmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CreateDir(e) => Some(e),
            Self::WriteFile { source, .. } => Some(source),
            Self::Internal(_) => None,
        }
    }
}
