//! Common utilities for the pipeline stages
//!
//! Filesystem helpers and the parameter sizing shared by the ptau download
//! and zkey generation stages.

use crate::toolchain::Toolchain;
use crate::{CliError, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use zkey_setup::{required_power, ConstraintStats, ProofSystem, PtauFile, PtauTable, PTAU_CACHE_DIR};

/// Common file operations for CLI tools
pub struct FileOps;

impl FileOps {
    /// Writes text to a file, replacing its content
    pub fn write_text(path: &Path, text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        file.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Checks if a file exists
    pub fn file_exists(path: &Path) -> bool {
        path.exists() && path.is_file()
    }

    /// Creates a directory if it doesn't exist
    pub fn ensure_directory(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Fails with `DirectoryNotFound` unless `path` is a directory
    pub fn require_directory(path: &Path) -> Result<()> {
        if path.is_dir() {
            Ok(())
        } else {
            Err(CliError::DirectoryNotFound(path.to_path_buf()))
        }
    }

    /// Removes a file, treating an already missing file as removed
    pub fn remove_file_if_exists(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// Files directly inside `dir` with the given extension, sorted by path
    pub fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Constraint systems currently compiled into `out_dir`
pub fn compiled_constraint_systems(out_dir: &Path) -> Result<Vec<PathBuf>> {
    FileOps::require_directory(out_dir)?;
    FileOps::files_with_extension(out_dir, "r1cs")
}

/// Powers of tau file needed by everything compiled into `out_dir`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtauRequirement {
    pub power: u32,
    pub file: PtauFile,
    /// Where the file lives inside the output directory's cache
    pub path: PathBuf,
}

/// Size the powers of tau file for the constraint systems in `out_dir`.
///
/// Statistics are re-read on every call so the answer always reflects the
/// current directory contents.
pub fn ptau_requirement(
    toolchain: &Toolchain<'_>,
    out_dir: &Path,
    table: &PtauTable,
    proof_system: ProofSystem,
) -> Result<PtauRequirement> {
    let stats = compiled_constraint_systems(out_dir)?
        .iter()
        .map(|r1cs| toolchain.r1cs_info(r1cs))
        .collect::<Result<Vec<ConstraintStats>>>()?;

    let largest = stats.iter().filter_map(ConstraintStats::total).max().unwrap_or(0);
    let power = required_power(&stats, proof_system)?;
    info!(circuits = stats.len(), largest, %proof_system, power, "sized powers of tau");

    let file = table.lookup(power)?.clone();
    let path = out_dir.join(PTAU_CACHE_DIR).join(&file.name);
    Ok(PtauRequirement { power, file, path })
}
