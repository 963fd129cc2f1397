//! End-to-end emission: analyze a tiny ROM, emit a project, write it to
//! disk, and check the artifacts look like what a hand-written project of
//! the same shape would contain.

use std::fs;

use chip8rec_codegen::{EmitterOptions, RuntimePaths, emit_single_rom, write_project};
use chip8rec_core::{Rom, analyze, decode_all};

fn temp_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("chip8rec-codegen-test-{name}-{}", std::process::id()))
}

#[test]
fn straight_line_rom_emits_a_per_function_project_on_disk() {
    // CLS ; LD V0, 0x05 ; JP 0x200 (self-loop so the entry is resumable)
    let bytes = vec![0x00, 0xE0, 0x60, 0x05, 0x12, 0x00];
    let rom = Rom::from_bytes("demo", bytes.clone()).unwrap();
    let instructions = decode_all(&bytes);
    let analysis = analyze(&instructions, 0x200);

    let project = emit_single_rom(&rom, &analysis, &EmitterOptions::default(), &RuntimePaths::default(), false).unwrap();
    assert!(!project.used_single_function_mode);

    let out = temp_dir("straight-line");
    write_project(&project, &out).unwrap();

    let lib_rs = fs::read_to_string(out.join("src/lib.rs")).unwrap();
    assert!(lib_rs.contains("pub const ENTRY"));
    assert!(lib_rs.contains("register_functions"));

    let routines_rs = fs::read_to_string(out.join("src/routines.rs")).unwrap();
    assert!(routines_rs.contains("fn func_0x200"));
    assert!(routines_rs.contains("RESUMABLE_LABELS"));

    let rom_data_rs = fs::read_to_string(out.join("src/rom_data.rs")).unwrap();
    assert!(rom_data_rs.contains("pub static ROM_DATA"));

    let cargo_toml = fs::read_to_string(out.join("Cargo.toml")).unwrap();
    assert!(cargo_toml.contains("chip8rec-runtime"));

    fs::remove_dir_all(&out).ok();
}

#[test]
fn nested_loop_in_a_callee_falls_back_to_single_function_mode_on_disk() {
    // 0x200: CALL 0x204 ; RET
    // 0x204: JP 0x204 (the callee loops forever, which per-function mode
    // cannot resume into)
    let bytes = vec![0x22, 0x04, 0x00, 0xEE, 0x12, 0x04];
    let rom = Rom::from_bytes("looper", bytes.clone()).unwrap();
    let instructions = decode_all(&bytes);
    let analysis = analyze(&instructions, 0x200);

    let project = emit_single_rom(&rom, &analysis, &EmitterOptions::default(), &RuntimePaths::default(), false).unwrap();
    assert!(project.used_single_function_mode);

    let out = temp_dir("nested-loop");
    write_project(&project, &out).unwrap();
    let routines_rs = fs::read_to_string(out.join("src/routines.rs")).unwrap();
    assert!(routines_rs.contains("fn run("));
    assert!(!routines_rs.contains("fn func_0x"));

    fs::remove_dir_all(&out).ok();
}

#[test]
fn forcing_single_function_mode_skips_the_obstruction_check() {
    let bytes = vec![0x00, 0xE0, 0x12, 0x00];
    let rom = Rom::from_bytes("forced", bytes.clone()).unwrap();
    let instructions = decode_all(&bytes);
    let analysis = analyze(&instructions, 0x200);

    let mut opts = EmitterOptions::default();
    opts.single_function_mode = true;
    let project = emit_single_rom(&rom, &analysis, &opts, &RuntimePaths::default(), false).unwrap();
    assert!(project.used_single_function_mode);
}
