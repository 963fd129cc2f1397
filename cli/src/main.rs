//! `chip8rec` binary: drives the load/decode/analyze/generate pipeline once
//! for a single ROM, or the batch orchestrator over a directory of ROMs,
//! and writes the
//! resulting generated project to disk.

mod metadata;

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use chip8rec_codegen::{EmitterOptions, Quirks, cfg, emit_batch, emit_batch_no_auto, emit_single_rom, project, write_batch, write_project};
use chip8rec_core::{Rom, analyze, decode_all};

use metadata::load_metadata_file;

/// Recompile a CHIP-8 ROM (or a directory of them) into a standalone Rust
/// project that runs it without an interpreter.
#[derive(Parser)]
#[command(name = "chip8rec")]
#[command(about = "Static recompiler: CHIP-8 ROM(s) to a native Rust project")]
struct Args {
    /// Path to a single ROM file. Required unless `--batch` is given.
    rom: Option<PathBuf>,

    /// Recompile every `.ch8`/`.chip8` file in this directory instead of a
    /// single ROM.
    #[arg(long, value_name = "DIR")]
    batch: Option<PathBuf>,

    /// Output directory for the generated project.
    #[arg(short = 'o', long, value_name = "DIR", default_value = "output")]
    out: PathBuf,

    /// Override the derived identifier used for the generated package name
    /// (single-ROM mode only).
    #[arg(short = 'n', long, value_name = "NAME")]
    name: Option<String>,

    /// TOML file supplying optional catalog fields (title, description,
    /// authors, release, recommended_cpu_hz).
    #[arg(long, value_name = "FILE")]
    metadata: Option<PathBuf>,

    /// Strip address/comment annotations from the generated source.
    #[arg(long)]
    no_comments: bool,

    /// Force single-function emission mode instead of letting the emitter
    /// decide per ROM.
    #[arg(long)]
    single_function: bool,

    /// Disable the automatic per-function -> single-function fallback; an
    /// obstruction that would trigger it becomes a hard error instead.
    #[arg(long)]
    no_auto: bool,

    /// Print extra diagnostic detail (obstruction reasons, per-function
    /// block/instruction counts) alongside the normal phase summary.
    #[arg(long)]
    debug: bool,

    /// Print a plain-text disassembly of the decoded ROM instead of
    /// generating a project.
    #[arg(long)]
    disasm: bool,

    /// Link the generated project against the SDL2 platform instead of the
    /// headless one. Only meaningful with `--batch`; a single-ROM project
    /// always links the headless platform unless this is set.
    #[arg(long)]
    with_sdl2_platform: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let opts = EmitterOptions {
        emit_address_comments: !args.no_comments,
        emit_comments: !args.no_comments,
        single_function_mode: args.single_function,
        embed_rom_data: true,
        quirks: Quirks::default(),
        jp_v0_table_entries: 16,
        cpu_hz: 700,
    };

    let metadata = match &args.metadata {
        Some(path) => match load_metadata_file(path) {
            Ok(m) => m,
            Err(e) => {
                eprintln!("chip8rec: failed to read metadata file {}: {e}", path.display());
                return ExitCode::from(1);
            }
        },
        None => Default::default(),
    };

    if let Some(dir) = &args.batch {
        run_batch(&args, dir, &opts, &metadata.roms)
    } else {
        match &args.rom {
            Some(rom_path) => run_single(&args, rom_path, &opts, &metadata.default),
            None => {
                eprintln!("chip8rec: a ROM path or --batch <DIR> is required");
                ExitCode::from(1)
            }
        }
    }
}

fn run_single(args: &Args, rom_path: &PathBuf, opts: &EmitterOptions, default_meta: &chip8rec_codegen::RomMetadata) -> ExitCode {
    println!("load: {}", rom_path.display());
    let rom = match Rom::load(rom_path) {
        Ok(rom) => rom,
        Err(e) => {
            eprintln!("chip8rec: load failed: {e}");
            return ExitCode::from(1);
        }
    };
    let rom = match &args.name {
        Some(name) => Rom { identifier: Rom::derive_identifier(name), ..rom },
        None => rom,
    };
    println!("  identifier: {}, {} bytes", rom.identifier, rom.bytes.len());

    println!("decode");
    let instructions = decode_all(&rom.bytes);
    println!("  {} instructions decoded", instructions.len());

    println!("analyze");
    let analysis = analyze(&instructions, 0x200);
    let stats = analysis.stats();
    println!(
        "  {} reachable / {} unreachable, {} blocks, {} functions, {} computed jumps",
        stats.reachable_instructions,
        stats.unreachable_instructions,
        stats.block_count,
        stats.function_count,
        stats.computed_jump_count,
    );

    if args.disasm {
        println!("{}", analysis.disassemble());
        return ExitCode::SUCCESS;
    }

    let mut opts = opts.clone();
    if let Some(hz) = default_meta.recommended_cpu_hz {
        opts.cpu_hz = hz;
    }

    if args.no_auto {
        let needs_yield = cfg::blocks_needing_yield(&analysis);
        if let Some(obstruction) = cfg::find_obstruction(&analysis, &needs_yield) {
            eprintln!("chip8rec: emit failed: --no-auto forbids the single-function fallback, but {obstruction:?} requires it");
            return ExitCode::from(2);
        }
    }

    println!("generate");
    let project = match emit_single_rom(&rom, &analysis, &opts, &project::RuntimePaths::default(), args.with_sdl2_platform) {
        Ok(project) => project,
        Err(e) => {
            eprintln!("chip8rec: emit failed: {e}");
            return ExitCode::from(2);
        }
    };
    if args.debug {
        println!("  single-function mode: {}", project.used_single_function_mode);
    }

    let out_dir = args.out.join(&rom.identifier);
    if let Err(e) = write_project(&project, &out_dir) {
        eprintln!("chip8rec: write failed: {e}");
        return ExitCode::from(2);
    }
    println!("  wrote {}", out_dir.display());

    ExitCode::SUCCESS
}

fn run_batch(args: &Args, dir: &PathBuf, opts: &EmitterOptions, metadata: &HashMap<String, chip8rec_codegen::RomMetadata>) -> ExitCode {
    if args.disasm {
        return disasm_batch(dir);
    }

    println!("load + decode + analyze + generate: {}", dir.display());

    let result = if args.no_auto {
        emit_batch_no_auto(dir, opts, args.with_sdl2_platform, metadata)
    } else {
        emit_batch(dir, opts, args.with_sdl2_platform, metadata)
    };
    let batch = match result {
        Ok(batch) => batch,
        Err(e) => {
            eprintln!("chip8rec: {e}");
            let code = if matches!(e, chip8rec_codegen::BatchError::Load(_)) { 1 } else { 2 };
            return ExitCode::from(code);
        }
    };

    println!("  {} ROM(s) in catalog", batch.catalog.len());
    for entry in &batch.catalog {
        if args.debug {
            println!(
                "  {}: entry {:#06x}, {} Hz, single-function: {}",
                entry.prefix, entry.entry, entry.cpu_hz, entry.used_single_function_mode
            );
        } else {
            println!("  {}", entry.prefix);
        }
    }

    if let Err(e) = write_batch(&batch, &args.out) {
        eprintln!("chip8rec: write failed: {e}");
        return ExitCode::from(2);
    }
    println!("  wrote {}", args.out.display());

    ExitCode::SUCCESS
}

/// `--disasm --batch DIR`: print every ROM's disassembly in turn instead of
/// generating a project. Reuses the same `.ch8`/`.chip8` extension filter
/// `emit_batch`'s directory scan applies, but never writes anything, so it
/// does not need to go through `emit_batch` at all.
fn disasm_batch(dir: &PathBuf) -> ExitCode {
    let mut entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("chip8rec: failed to read {}: {e}", dir.display());
            return ExitCode::from(1);
        }
    };

    let mut rom_paths = Vec::new();
    while let Some(Ok(entry)) = entries.next() {
        let path = entry.path();
        let is_rom = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("ch8") || e.eq_ignore_ascii_case("chip8"))
            .unwrap_or(false);
        if path.is_file() && is_rom {
            rom_paths.push(path);
        }
    }
    rom_paths.sort();

    for path in &rom_paths {
        let rom = match Rom::load(path) {
            Ok(rom) => rom,
            Err(e) => {
                eprintln!("chip8rec: load failed: {e}");
                return ExitCode::from(1);
            }
        };
        let instructions = decode_all(&rom.bytes);
        let analysis = analyze(&instructions, 0x200);
        println!("=== {} ===", rom.identifier);
        println!("{}", analysis.disassemble());
    }

    ExitCode::SUCCESS
}
