//! Batch orchestrator (component F): scans a directory of ROMs, runs
//! analysis and emission per ROM with a unique prefix, and assembles one
//! shared catalog + launcher + build file on top of the per-ROM projects
//! `project.rs` already knows how to emit.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use chip8rec_core::{AnalysisResult, Rom, RomLoadError, analyze_with_prefix, decode_all};

use crate::error::EmitError;
use crate::options::EmitterOptions;
use crate::project::{self, GeneratedFile, RuntimePaths};

/// Optional catalog fields a `--metadata` TOML file can supply for one ROM.
/// Fields beyond `{name, title, data, size, entry, register_hook}` are
/// optional; defaults come from the derived identifier and
/// heuristics"). This crate has no opinion on TOML parsing — the CLI reads
/// the file and hands one of these per matched ROM identifier.
#[derive(Debug, Clone, Default)]
pub struct RomMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub authors: Option<String>,
    pub release: Option<String>,
    pub recommended_cpu_hz: Option<u32>,
}

/// One entry in the generated catalog.
pub struct CatalogEntry {
    pub prefix: String,
    pub title: String,
    pub description: String,
    pub authors: String,
    pub release: String,
    pub entry: u16,
    pub cpu_hz: u32,
    pub size: usize,
    pub used_single_function_mode: bool,
}

pub struct BatchProject {
    pub files: Vec<GeneratedFile>,
    pub catalog: Vec<CatalogEntry>,
}

#[derive(Debug)]
pub enum BatchError {
    NoRomsFound(std::path::PathBuf),
    DuplicatePrefix(String),
    Load(RomLoadError),
    Emit(EmitError),
    /// `--no-auto`: the named ROM would need the single-function fallback.
    ObstructionForbidsFallback { rom: String, obstruction: crate::cfg::Obstruction },
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRomsFound(dir) => write!(f, "no .ch8/.chip8 files found in {}", dir.display()),
            Self::DuplicatePrefix(p) => write!(f, "two ROMs derive the same catalog prefix: {p}"),
            Self::Load(e) => write!(f, "{e}"),
            Self::Emit(e) => write!(f, "{e}"),
            Self::ObstructionForbidsFallback { rom, obstruction } => {
                write!(f, "--no-auto forbids the single-function fallback, but {rom} requires it: {obstruction:?}")
            }
        }
    }
}

impl std::error::Error for BatchError {}

impl From<RomLoadError> for BatchError {
    fn from(e: RomLoadError) -> Self {
        BatchError::Load(e)
    }
}

impl From<EmitError> for BatchError {
    fn from(e: EmitError) -> Self {
        BatchError::Emit(e)
    }
}

/// List every `.ch8`/`.chip8` file directly under `dir`, sorted by file name
/// so the catalog's ordering is stable across runs.
fn scan_roms(dir: &Path) -> Result<Vec<std::path::PathBuf>, BatchError> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| BatchError::Load(RomLoadError::Io(e)))? {
        let entry = entry.map_err(|e| BatchError::Load(RomLoadError::Io(e)))?;
        let path = entry.path();
        let is_rom = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("ch8") || e.eq_ignore_ascii_case("chip8"))
            .unwrap_or(false);
        if path.is_file() && is_rom {
            found.push(path);
        }
    }
    found.sort();
    if found.is_empty() {
        return Err(BatchError::NoRomsFound(dir.to_path_buf()));
    }
    Ok(found)
}

/// Emit a complete multi-ROM project under `output_dir`: one module per ROM
/// plus a shared catalog, launcher, and `Cargo.toml`.
pub fn emit_batch(
    dir: &Path,
    opts: &EmitterOptions,
    with_sdl2_platform: bool,
    metadata: &HashMap<String, RomMetadata>,
) -> Result<BatchProject, BatchError> {
    emit_batch_inner(dir, opts, with_sdl2_platform, metadata, false)
}

/// As [`emit_batch`], but with `--no-auto`'s semantics: an obstruction that
/// would otherwise trigger the per-function -> single-function fallback for
/// any one ROM is a hard error instead, naming which ROM and why.
pub fn emit_batch_no_auto(
    dir: &Path,
    opts: &EmitterOptions,
    with_sdl2_platform: bool,
    metadata: &HashMap<String, RomMetadata>,
) -> Result<BatchProject, BatchError> {
    emit_batch_inner(dir, opts, with_sdl2_platform, metadata, true)
}

fn emit_batch_inner(
    dir: &Path,
    opts: &EmitterOptions,
    with_sdl2_platform: bool,
    metadata: &HashMap<String, RomMetadata>,
    no_auto: bool,
) -> Result<BatchProject, BatchError> {
    let rom_paths = scan_roms(dir)?;

    let mut files = Vec::new();
    let mut catalog = Vec::new();
    let mut seen_prefixes: HashSet<String> = HashSet::new();

    for path in &rom_paths {
        let rom = Rom::load(path)?;
        if !seen_prefixes.insert(rom.identifier.clone()) {
            return Err(BatchError::DuplicatePrefix(rom.identifier));
        }

        let instructions = decode_all(&rom.bytes);
        let analysis: AnalysisResult = analyze_with_prefix(&instructions, 0x200, &rom.identifier);

        let rom_meta = metadata.get(&rom.identifier);
        let mut rom_opts = opts.clone();
        if let Some(cpu_hz) = rom_meta.and_then(|m| m.recommended_cpu_hz) {
            rom_opts.cpu_hz = cpu_hz;
        }

        if no_auto && !rom_opts.single_function_mode {
            let needs_yield = crate::cfg::blocks_needing_yield(&analysis);
            if let Some(obstruction) = crate::cfg::find_obstruction(&analysis, &needs_yield) {
                return Err(BatchError::ObstructionForbidsFallback { rom: rom.identifier, obstruction });
            }
        }

        let project = project::emit_single_rom(
            &rom,
            &analysis,
            &rom_opts,
            &RuntimePaths {
                runtime: "../../runtime".to_string(),
                platform_headless: "../../platform-headless".to_string(),
                platform_sdl2: "../../platform-sdl2".to_string(),
            },
            with_sdl2_platform,
        )?;

        // The per-ROM `main.rs` is only meaningful for a single-ROM project;
        // the batch launcher replaces it with the shared one assembled below.
        for file in project.files {
            if file.relative_path == "src/main.rs" {
                continue;
            }
            files.push(GeneratedFile {
                relative_path: format!("{}/{}", rom.identifier, file.relative_path),
                contents: file.contents,
            });
        }

        catalog.push(CatalogEntry {
            prefix: rom.identifier.clone(),
            title: rom_meta.and_then(|m| m.title.clone()).unwrap_or_else(|| rom.identifier.clone()),
            description: rom_meta.and_then(|m| m.description.clone()).unwrap_or_default(),
            authors: rom_meta.and_then(|m| m.authors.clone()).unwrap_or_default(),
            release: rom_meta.and_then(|m| m.release.clone()).unwrap_or_default(),
            entry: analysis.entry,
            cpu_hz: rom_opts.cpu_hz,
            size: rom.bytes.len(),
            used_single_function_mode: project.used_single_function_mode,
        });
    }

    let catalog_file = render_catalog(&catalog)?;
    let main_file = render_batch_main(&catalog, with_sdl2_platform)?;
    let cargo_toml = render_batch_cargo_toml(&catalog, with_sdl2_platform);

    files.push(GeneratedFile { relative_path: "src/catalog.rs".to_string(), contents: catalog_file });
    files.push(GeneratedFile { relative_path: "src/main.rs".to_string(), contents: main_file });
    files.push(GeneratedFile { relative_path: "Cargo.toml".to_string(), contents: cargo_toml });

    Ok(BatchProject { files, catalog })
}

fn render_catalog(catalog: &[CatalogEntry]) -> Result<String, EmitError> {
    // Each ROM directory (emitted by `project::emit_single_rom`) is its own
    // crate with its own `Cargo.toml`; `render_batch_cargo_toml` lists every
    // one of them as an ordinary path dependency of the batch crate. That
    // makes `<prefix>::ENTRY` etc. resolvable through the 2018+ extern
    // prelude here, with no `#[path]`-based file inclusion (and none of the
    // submodule-directory ambiguity that would come with it) needed.
    let entries = catalog.iter().map(|entry| {
        let krate = format_ident!("{}", entry.prefix);
        let name = &entry.prefix;
        let title = &entry.title;
        let description = &entry.description;
        let authors = &entry.authors;
        let release = &entry.release;
        let cpu_hz = entry.cpu_hz;
        let size = entry.size;
        quote! {
            CatalogEntry {
                name: #name,
                title: #title,
                description: #description,
                authors: #authors,
                release: #release,
                entry: #krate::ENTRY,
                cpu_hz: #cpu_hz,
                size: #size,
                register_functions: #krate::register_functions,
                rom_data: #krate::ROM_DATA,
            }
        }
    });
    let titles = catalog.iter().map(|entry| entry.title.clone());
    let count = catalog.len();

    let tokens = quote! {
        //! Generated catalog of every ROM in this batch. Generated; do not
        //! edit by hand.

        /// `name` and `rom_data`'s owning crate prefix are the same derived
        /// identifier; `size` is `rom_data.len()` at emission time, kept as
        /// its own field rather than recomputed so a launcher can report it
        /// without touching the data slice.
        pub struct CatalogEntry {
            pub name: &'static str,
            pub title: &'static str,
            pub description: &'static str,
            pub authors: &'static str,
            pub release: &'static str,
            pub entry: u16,
            pub cpu_hz: u32,
            pub size: usize,
            pub register_functions: fn(&mut chip8rec_runtime::DispatchTable),
            pub rom_data: &'static [u8],
        }

        pub static CATALOG: [CatalogEntry; #count] = [#(#entries),*];
        pub static TITLES: [&str; #count] = [#(#titles),*];
    };
    render(tokens)
}

fn render_batch_main(catalog: &[CatalogEntry], with_sdl2_platform: bool) -> Result<String, EmitError> {
    let _ = catalog;
    let platform_setup = if with_sdl2_platform {
        quote! {
            chip8rec_runtime::set_platform(Box::new(
                chip8rec_platform_sdl2::Sdl2Platform::new("chip8rec batch", 12)
            ));
        }
    } else {
        quote! {
            chip8rec_runtime::set_platform(Box::new(
                chip8rec_platform_headless::HeadlessPlatform::new(u32::MAX)
            ));
        }
    };

    let tokens = quote! {
        //! Generated batch launcher. Generated; do not edit by hand.
        mod catalog;

        /// The four-step ROM-switch transaction plus entry lookup, run once
        /// per catalog selection. `switch_rom` clears and re-registers the
        /// process-wide dispatch table and resets/reloads `ctx`; the entry
        /// routine is then looked up from that same table.
        fn load_selected(
            ctx: &mut chip8rec_runtime::Chip8Context,
            selected: usize,
        ) -> chip8rec_runtime::EntryFn {
            let rom = &catalog::CATALOG[selected];
            chip8rec_runtime::switch_rom(ctx, rom.register_functions, rom.rom_data);
            chip8rec_runtime::with_dispatch_table(|dispatch| dispatch.lookup(rom.entry))
                .expect("catalog entry routine must be registered")
        }

        fn main() {
            #platform_setup
            let now = chip8rec_runtime::with_platform(|p| p.now_micros());
            let mut ctx = chip8rec_runtime::Chip8Context::new(now);
            let mut selected: usize = 0;

            'catalog: loop {
                chip8rec_runtime::with_platform(|p| p.render_menu_overlay(&catalog::TITLES, selected));
                let entry = load_selected(&mut ctx, selected);
                let cpu_hz = catalog::CATALOG[selected].cpu_hz;

                loop {
                    chip8rec_runtime::run_one_tick(&mut ctx, entry, cpu_hz);
                    if chip8rec_runtime::with_platform(|p| p.should_quit()) {
                        break 'catalog;
                    }
                    match chip8rec_runtime::with_platform(|p| p.poll_menu()) {
                        chip8rec_runtime::MenuCommand::Up => {
                            selected = selected.checked_sub(1).unwrap_or(catalog::CATALOG.len() - 1);
                            chip8rec_runtime::with_platform(|p| p.render_menu_overlay(&catalog::TITLES, selected));
                        }
                        chip8rec_runtime::MenuCommand::Down => {
                            selected = (selected + 1) % catalog::CATALOG.len();
                            chip8rec_runtime::with_platform(|p| p.render_menu_overlay(&catalog::TITLES, selected));
                        }
                        chip8rec_runtime::MenuCommand::Select => continue 'catalog,
                        chip8rec_runtime::MenuCommand::Back | chip8rec_runtime::MenuCommand::None => {}
                    }
                }
            }
        }
    };
    render(tokens)
}

fn render_batch_cargo_toml(catalog: &[CatalogEntry], with_sdl2_platform: bool) -> String {
    // The batch `Cargo.toml` lives directly under the output directory
    // (one level below the workspace root, same depth `project::RuntimePaths`
    // assumes for a single-ROM project's own crate directory), so it reaches
    // the runtime/platform crates with a single `../`. Each per-ROM crate is
    // one level *below* the batch `Cargo.toml` itself (`<output>/<rom>/`), so
    // those are ordinary same-directory path dependencies.
    let platform_dep = if with_sdl2_platform {
        "chip8rec-platform-sdl2 = { path = \"../platform-sdl2\" }\n"
    } else {
        "chip8rec-platform-headless = { path = \"../platform-headless\" }\n"
    };
    let rom_deps: String = catalog
        .iter()
        .map(|entry| format!("{name} = {{ path = \"./{name}\" }}\n", name = entry.prefix))
        .collect();
    format!(
        "[package]\nname = \"chip8rec-batch\"\nversion = \"0.1.0\"\nedition = \"2024\"\n\n\
         [dependencies]\nchip8rec-runtime = {{ path = \"../runtime\" }}\n{platform_dep}{rom_deps}",
    )
}

fn render(tokens: TokenStream) -> Result<String, EmitError> {
    let file = syn::parse2::<syn::File>(tokens)
        .map_err(|e| EmitError::Internal(format!("generated tokens did not parse as a file: {e}")))?;
    Ok(prettyplease::unparse(&file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_rom(dir: &Path, name: &str, bytes: &[u8]) {
        let mut f = fs::File::create(dir.join(name)).unwrap();
        f.write_all(bytes).unwrap();
    }

    #[test]
    fn batch_emits_one_module_per_rom_plus_shared_catalog() {
        let dir = std::env::temp_dir().join(format!("chip8rec-batch-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        write_rom(&dir, "pong.ch8", &[0x12, 0x00]);
        write_rom(&dir, "tetris.chip8", &[0x00, 0xE0, 0x12, 0x02]);

        let project = emit_batch(&dir, &EmitterOptions::default(), false, &HashMap::new()).unwrap();
        assert_eq!(project.catalog.len(), 2);
        let paths: Vec<&str> = project.files.iter().map(|f| f.relative_path.as_str()).collect();
        assert!(paths.iter().any(|p| p.starts_with("pong/")));
        assert!(paths.iter().any(|p| p.starts_with("tetris/")));
        assert!(paths.contains(&"src/catalog.rs"));
        assert!(paths.contains(&"src/main.rs"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn no_auto_rejects_a_rom_that_would_need_the_single_function_fallback() {
        let dir = std::env::temp_dir().join(format!("chip8rec-batch-no-auto-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        write_rom(&dir, "loopy.ch8", &[0x22, 0x04, 0x00, 0xEE, 0x12, 0x04]);

        let result = emit_batch_no_auto(&dir, &EmitterOptions::default(), false, &HashMap::new());
        assert!(matches!(result, Err(BatchError::ObstructionForbidsFallback { .. })));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = std::env::temp_dir().join(format!("chip8rec-batch-empty-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let result = emit_batch(&dir, &EmitterOptions::default(), false, &HashMap::new());
        assert!(matches!(result, Err(BatchError::NoRomsFound(_))));
        fs::remove_dir_all(&dir).ok();
    }
}
