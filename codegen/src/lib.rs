//! Stage D of the recompilation pipeline: turns an [`chip8rec_core::AnalysisResult`]
//! into a generated Rust project. `instr_codegen`/`control` translate
//! instructions and control flow into `TokenStream`s; `function_emit` and
//! `single_function_emit` assemble those into whole routines under the two
//! emission modes; `project` and `batch` assemble the per-ROM and
//! multi-ROM artifact sets; `write` puts them on disk.

pub mod batch;
pub mod cfg;
pub mod control;
pub mod error;
pub mod function_emit;
pub mod instr_codegen;
pub mod options;
pub mod project;
pub mod single_function_emit;
pub mod write;

pub use batch::{BatchError, BatchProject, CatalogEntry, RomMetadata, emit_batch, emit_batch_no_auto};
pub use cfg::{Obstruction, blocks_needing_yield, find_obstruction};
pub use error::EmitError;
pub use options::{EmitterOptions, Quirks};
pub use project::{GeneratedFile, GeneratedProject, ModeDecision, RuntimePaths, decide_mode, emit_single_rom};
pub use write::{write_batch, write_project};

pub mod prelude {
    pub use crate::{
        BatchError, BatchProject, CatalogEntry, EmitError, EmitterOptions, GeneratedFile,
        GeneratedProject, ModeDecision, Obstruction, Quirks, RomMetadata, RuntimePaths,
        blocks_needing_yield, decide_mode, emit_batch, emit_batch_no_auto, emit_single_rom,
        find_obstruction, write_batch, write_project,
    };
}
