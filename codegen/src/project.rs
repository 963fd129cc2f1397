//! Assembles the per-ROM output artifacts: a header (`lib.rs`), a source
//! file of routines, an
//! embedded-data file, a launcher (`main.rs`), and a build file
//! (`Cargo.toml`).

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use chip8rec_core::{AnalysisResult, Rom};

use crate::cfg;
use crate::error::EmitError;
use crate::function_emit;
use crate::options::EmitterOptions;
use crate::single_function_emit;

/// A relative path and its rendered contents, ready to be written under an
/// output directory.
pub struct GeneratedFile {
    pub relative_path: String,
    pub contents: String,
}

pub struct GeneratedProject {
    pub files: Vec<GeneratedFile>,
    /// True if emission fell back to single-function mode for this ROM.
    pub used_single_function_mode: bool,
}

/// Where the generated `Cargo.toml` finds the runtime and (optionally) the
/// SDL2 platform crates. Defaults assume the output directory is written as
/// a sibling of the recompiler's own crates, e.g. `<workspace>/output/<rom>`.
#[derive(Debug, Clone)]
pub struct RuntimePaths {
    pub runtime: String,
    pub platform_headless: String,
    pub platform_sdl2: String,
}

impl Default for RuntimePaths {
    fn default() -> Self {
        RuntimePaths {
            runtime: "../../runtime".to_string(),
            platform_headless: "../../platform-headless".to_string(),
            platform_sdl2: "../../platform-sdl2".to_string(),
        }
    }
}

/// Either per-function mode succeeded, or an obstruction forced a fallback
/// (`--no-auto` turns the latter into a hard error instead, at the CLI
/// layer).
pub enum ModeDecision {
    PerFunction,
    SingleFunction { reason: Option<cfg::Obstruction> },
}

pub fn decide_mode(analysis: &AnalysisResult, opts: &EmitterOptions, needs_yield: &std::collections::HashSet<u16>) -> ModeDecision {
    if opts.single_function_mode {
        return ModeDecision::SingleFunction { reason: None };
    }
    match cfg::find_obstruction(analysis, needs_yield) {
        Some(obstruction) => ModeDecision::SingleFunction { reason: Some(obstruction) },
        None => ModeDecision::PerFunction,
    }
}

/// Render a `TokenStream` as a pretty-printed `.rs` file.
fn render_file(tokens: TokenStream) -> Result<String, EmitError> {
    let file = syn::parse2::<syn::File>(tokens)
        .map_err(|e| EmitError::Internal(format!("generated tokens did not parse as a file: {e}")))?;
    Ok(prettyplease::unparse(&file))
}

/// Emit the complete project for a single ROM. `crate_name` is
/// the generated package's name (hyphenated, e.g. `pong`); `lib_name` is the
/// corresponding Rust identifier (`pong`, underscored if needed).
pub fn emit_single_rom(
    rom: &Rom,
    analysis: &AnalysisResult,
    opts: &EmitterOptions,
    paths: &RuntimePaths,
    with_sdl2_platform: bool,
) -> Result<GeneratedProject, EmitError> {
    let needs_yield = cfg::blocks_needing_yield(analysis);
    let decision = decide_mode(analysis, opts, &needs_yield);

    let (routine_tokens, register_tokens, used_single_function_mode) = match decision {
        ModeDecision::PerFunction => {
            let mut routines = TokenStream::new();
            let mut registers = TokenStream::new();
            for function in analysis.functions.values() {
                routines.extend(function_emit::emit_function(function, analysis, opts, &needs_yield));
                let name = format_ident!("{}", function.name);
                let addr = function.entry;
                registers.extend(quote! { dispatch.register(#addr, #name); });
            }
            (routines, registers, false)
        }
        ModeDecision::SingleFunction { .. } => {
            let routine = single_function_emit::emit_single_function(analysis, opts, &needs_yield);
            let entry = analysis.entry;
            let registers = quote! { dispatch.register(#entry, run); };
            (routine, registers, true)
        }
    };

    let crate_name = rom.identifier.clone();
    let lib_ident = format_ident!("{}", crate_name.replace('-', "_"));
    let entry = analysis.entry;
    let cpu_hz = opts.cpu_hz;

    let routines_file = render_file(quote! {
        //! Recompiled CHIP-8 routines. Generated; do not edit by hand.
        use chip8rec_runtime::prelude::*;
        #routine_tokens
    })?;

    let rom_bytes = rom.bytes.iter().map(|&b| quote! { #b });
    let rom_data_file = render_file(quote! {
        //! The embedded ROM image this project was recompiled from.
        pub static ROM_DATA: &[u8] = &[#(#rom_bytes),*];
    })?;

    let lib_file = render_file(quote! {
        //! Generated by chip8rec. Do not edit by hand.
        pub mod rom_data;
        pub mod routines;
        pub use rom_data::ROM_DATA;
        pub use routines::*;

        pub const ENTRY: u16 = #entry;
        pub const RECOMMENDED_CPU_HZ: u32 = #cpu_hz;

        /// Register every generated routine into `dispatch` (ROM-switch
        /// transaction step 2).
        pub fn register_functions(dispatch: &mut chip8rec_runtime::DispatchTable) {
            #register_tokens
        }
    })?;

    let platform_setup = if with_sdl2_platform {
        quote! {
            chip8rec_runtime::set_platform(Box::new(
                chip8rec_platform_sdl2::Sdl2Platform::new(env!("CARGO_PKG_NAME"), 12)
            ));
        }
    } else {
        quote! {
            chip8rec_runtime::set_platform(Box::new(
                chip8rec_platform_headless::HeadlessPlatform::new(u32::MAX)
            ));
        }
    };

    let main_file = render_file(quote! {
        //! Generated launcher. Generated; do not edit by hand.
        fn main() {
            #platform_setup
            let now = chip8rec_runtime::with_platform(|p| p.now_micros());
            let mut ctx = chip8rec_runtime::Chip8Context::new(now);
            ctx.load_rom(#lib_ident::ROM_DATA);

            chip8rec_runtime::with_dispatch_table(|dispatch| #lib_ident::register_functions(dispatch));
            let entry = chip8rec_runtime::with_dispatch_table(|dispatch| dispatch.lookup(#lib_ident::ENTRY))
                .expect("entry routine must be registered");

            chip8rec_runtime::run_rom(&mut ctx, entry, #lib_ident::RECOMMENDED_CPU_HZ);
        }
    })?;

    let cargo_toml = render_cargo_toml(&crate_name, paths, with_sdl2_platform);

    Ok(GeneratedProject {
        files: vec![
            GeneratedFile { relative_path: "Cargo.toml".to_string(), contents: cargo_toml },
            GeneratedFile { relative_path: "src/lib.rs".to_string(), contents: lib_file },
            GeneratedFile { relative_path: "src/routines.rs".to_string(), contents: routines_file },
            GeneratedFile { relative_path: "src/rom_data.rs".to_string(), contents: rom_data_file },
            GeneratedFile { relative_path: "src/main.rs".to_string(), contents: main_file },
        ],
        used_single_function_mode,
    })
}

fn render_cargo_toml(crate_name: &str, paths: &RuntimePaths, with_sdl2_platform: bool) -> String {
    let platform_dep = if with_sdl2_platform {
        format!("chip8rec-platform-sdl2 = {{ path = \"{}\" }}\n", paths.platform_sdl2)
    } else {
        format!("chip8rec-platform-headless = {{ path = \"{}\" }}\n", paths.platform_headless)
    };
    format!(
        "[package]\nname = \"{crate_name}\"\nversion = \"0.1.0\"\nedition = \"2024\"\n\n[dependencies]\nchip8rec-runtime = {{ path = \"{runtime}\" }}\n{platform_dep}",
        runtime = paths.runtime,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chip8rec_core::{analyze, decode_all};

    #[test]
    fn single_rom_project_contains_every_expected_file() {
        let rom = Rom::from_bytes("test", vec![0x12, 0x00]).unwrap();
        let instructions = decode_all(&rom.bytes);
        let analysis = analyze(&instructions, 0x200);
        let project = emit_single_rom(&rom, &analysis, &EmitterOptions::default(), &RuntimePaths::default(), false).unwrap();
        let paths: Vec<&str> = project.files.iter().map(|f| f.relative_path.as_str()).collect();
        assert!(paths.contains(&"Cargo.toml"));
        assert!(paths.contains(&"src/lib.rs"));
        assert!(paths.contains(&"src/routines.rs"));
        assert!(paths.contains(&"src/rom_data.rs"));
        assert!(paths.contains(&"src/main.rs"));
        assert!(!project.used_single_function_mode);
    }

    #[test]
    fn loop_outside_entry_function_forces_single_function_fallback() {
        let bytes = vec![0x22, 0x04, 0x00, 0xEE, 0x12, 0x04];
        let rom = Rom::from_bytes("test", bytes.clone()).unwrap();
        let instructions = decode_all(&bytes);
        let analysis = analyze(&instructions, 0x200);
        let project = emit_single_rom(&rom, &analysis, &EmitterOptions::default(), &RuntimePaths::default(), false).unwrap();
        assert!(project.used_single_function_mode);
        let routines = project.files.iter().find(|f| f.relative_path == "src/routines.rs").unwrap();
        assert!(routines.contents.contains("fn run("));
    }
}
