//! ROM loading, instruction decoding, and control-flow analysis for the
//! CHIP-8 static recompiler.
//!
//! This crate is the analysis front-end of the pipeline (stages A–C): it
//! never emits code and never executes a ROM. [`chip8rec_codegen`] consumes
//! its [`AnalysisResult`] to produce Rust source.

pub mod analyze;
pub mod block;
pub mod decode;
pub mod function;
pub mod instruction;
pub mod rom;
pub mod stats;

pub use analyze::{AnalysisResult, analyze, analyze_with_prefix};
pub use block::BasicBlock;
pub use decode::{decode_all, decode_one};
pub use function::Function;
pub use instruction::{Instruction, InstructionKind};
pub use rom::{Rom, RomLoadError};
pub use stats::AnalysisStats;

pub mod prelude {
    pub use crate::{
        AnalysisResult, AnalysisStats, BasicBlock, Function, Instruction, InstructionKind, Rom,
        RomLoadError, analyze, analyze_with_prefix, decode_all, decode_one,
    };
}
