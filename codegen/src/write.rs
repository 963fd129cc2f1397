//! Filesystem writes for a generated project: create the
//! output directory, write each file, and stop at the first failure.
//! Partial output is intentionally left on disk — cleaning it up on error
//! would hide exactly the file whose path a user needs to see to debug a
//! permissions/disk-space problem.

use std::fs;
use std::path::Path;

use crate::batch::BatchProject;
use crate::error::EmitError;
use crate::project::{GeneratedFile, GeneratedProject};

/// Write every generated file under `output_dir`, creating intermediate
/// directories as needed. Shared by the single-ROM and batch write paths
/// below, which differ only in where their file lists come from.
fn write_files(files: &[GeneratedFile], output_dir: &Path) -> Result<(), EmitError> {
    fs::create_dir_all(output_dir).map_err(EmitError::CreateDir)?;

    for file in files {
        let path = output_dir.join(&file.relative_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(EmitError::CreateDir)?;
        }
        fs::write(&path, &file.contents).map_err(|source| EmitError::WriteFile { path: path.clone(), source })?;
    }

    Ok(())
}

/// Write every file in `project` under `output_dir`.
pub fn write_project(project: &GeneratedProject, output_dir: &Path) -> Result<(), EmitError> {
    write_files(&project.files, output_dir)
}

/// Write every file in a batch `project` (per-ROM modules, catalog,
/// launcher, `Cargo.toml`) under `output_dir`.
pub fn write_batch(project: &BatchProject, output_dir: &Path) -> Result<(), EmitError> {
    write_files(&project.files, output_dir)
}
