//! End-to-end batch emission over a small directory of ROMs.

use std::collections::HashMap;
use std::fs;
use std::io::Write;

use chip8rec_codegen::{EmitterOptions, emit_batch, write_project};
use chip8rec_codegen::project::GeneratedProject;

fn write_rom(dir: &std::path::Path, name: &str, bytes: &[u8]) {
    let mut f = fs::File::create(dir.join(name)).unwrap();
    f.write_all(bytes).unwrap();
}

#[test]
fn batch_directory_produces_one_module_per_rom_and_a_shared_catalog() {
    let dir = std::env::temp_dir().join(format!("chip8rec-codegen-batch-test-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    write_rom(&dir, "alpha.ch8", &[0x12, 0x00]);
    write_rom(&dir, "beta.ch8", &[0x00, 0xE0, 0x12, 0x02]);

    let batch = emit_batch(&dir, &EmitterOptions::default(), false, &HashMap::new()).unwrap();
    assert_eq!(batch.catalog.len(), 2);

    let project = GeneratedProject { files: batch.files, used_single_function_mode: false };
    let out = dir.join("_out");
    write_project(&project, &out).unwrap();

    assert!(out.join("alpha/src/lib.rs").exists());
    assert!(out.join("beta/src/lib.rs").exists());
    let catalog_rs = fs::read_to_string(out.join("src/catalog.rs")).unwrap();
    assert!(catalog_rs.contains("pub static CATALOG"));
    assert!(catalog_rs.contains("alpha"));
    assert!(catalog_rs.contains("beta"));

    let main_rs = fs::read_to_string(out.join("src/main.rs")).unwrap();
    assert!(main_rs.contains("fn main"));
    assert!(main_rs.contains("'catalog"));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn duplicate_rom_identifiers_are_rejected() {
    let dir = std::env::temp_dir().join(format!("chip8rec-codegen-batch-dup-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    // "same.ch8" and "same.chip8" share a derived identifier ("same") even
    // though they are two distinct files.
    write_rom(&dir, "same.ch8", &[0x12, 0x00]);
    write_rom(&dir, "same.chip8", &[0x00, 0xE0, 0x12, 0x02]);

    let result = emit_batch(&dir, &EmitterOptions::default(), false, &HashMap::new());
    assert!(result.is_err());

    fs::remove_dir_all(&dir).ok();
}
