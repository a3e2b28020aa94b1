//! `clean`: empty the output directory, keeping powers of tau files
//!
//! Symlinks are removed as links and never followed, so nothing outside the
//! output directory is touched.

use crate::common::FileOps;
use crate::config::PipelineConfig;
use crate::Result;
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use zkey_setup::PTAU_CACHE_DIR;

/// Clean command configuration
#[derive(Debug, Args)]
pub struct CleanArgs {
    /// The config file that names the output directory
    #[arg(short, long)]
    pub config: PathBuf,
}

fn is_ptau(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name.to_string_lossy().contains(".ptau"))
}

/// Witness calculator files, which go away with their `_js` directory.
fn is_witness_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "js" || ext == "wasm")
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

fn contains_ptau(dir: &Path) -> Result<bool> {
    for path in sorted_entries(dir)? {
        if is_ptau(&path) {
            return Ok(true);
        }
        if fs::symlink_metadata(&path)?.is_dir() && contains_ptau(&path)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn clean_dir(dir: &Path, is_root: bool, removed: &mut Vec<PathBuf>) -> Result<()> {
    for path in sorted_entries(dir)? {
        if is_ptau(&path) {
            continue;
        }
        let metadata = fs::symlink_metadata(&path)?;
        if metadata.is_dir() {
            let is_cache = is_root && path.file_name().is_some_and(|n| n == PTAU_CACHE_DIR);
            if is_cache || contains_ptau(&path)? {
                clean_dir(&path, false, removed)?;
            } else {
                fs::remove_dir_all(&path)?;
                info!("removed '{}'", path.display());
                removed.push(path);
            }
        } else if !is_witness_file(&path) {
            fs::remove_file(&path)?;
            info!("removed '{}'", path.display());
            removed.push(path);
        }
    }
    Ok(())
}

/// Remove everything under `out_dir` except powers of tau files and the
/// cache directory holding them. Returns the removed paths.
pub fn clean_output_dir(out_dir: &Path) -> Result<Vec<PathBuf>> {
    FileOps::require_directory(out_dir)?;
    warn!("'{}' will be cleaned up except for *.ptau", out_dir.display());
    let mut removed = Vec::new();
    clean_dir(out_dir, true, &mut removed)?;
    Ok(removed)
}

pub fn handle_clean_command(args: CleanArgs) -> Result<()> {
    let config = PipelineConfig::load(&args.config)?;
    let removed = clean_output_dir(&config.out_dir)?;
    info!(removed = removed.len(), "clean finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::touch;
    use crate::CliError;
    use tempfile::tempdir;

    #[test]
    fn test_keeps_ptau_files() {
        let dir = tempdir().unwrap();
        let out = dir.path();
        touch(&out.join("a.r1cs"));
        touch(&out.join("x.ptau"));
        touch(&out.join("powersOfTauCache/y.ptau"));
        touch(&out.join("sub_js/b.wasm"));

        let removed = clean_output_dir(out).unwrap();
        assert_eq!(removed, vec![out.join("a.r1cs"), out.join("sub_js")]);
        assert!(!out.join("a.r1cs").exists());
        assert!(!out.join("sub_js").exists());
        assert!(out.join("x.ptau").exists());
        assert!(out.join("powersOfTauCache").is_dir());
        assert!(out.join("powersOfTauCache/y.ptau").exists());
        assert!(out.exists());
    }

    #[test]
    fn test_removes_compiled_artifacts() {
        let dir = tempdir().unwrap();
        let out = dir.path();
        touch(&out.join("Mul_2_test.circom"));
        touch(&out.join("Mul_2_test.sym"));
        touch(&out.join("Mul_2_test_groth16.final.zkey"));
        touch(&out.join("Mul_2_test_js/Mul_2_test.wasm"));
        touch(&out.join("Mul_2_test_js/witness_calculator.js"));
        touch(&out.join("Mul_2_test_cpp/Mul_2_test.cpp"));
        touch(&out.join("Mul_2_test_cpp/Mul_2_test.dat"));
        touch(&out.join("powersOfTauCache/notes.txt"));

        clean_output_dir(out).unwrap();
        let left: Vec<_> = sorted_entries(out).unwrap();
        assert_eq!(left, vec![out.join("powersOfTauCache")]);
        assert!(sorted_entries(&out.join("powersOfTauCache")).unwrap().is_empty());
    }

    #[test]
    fn test_descends_into_directories_holding_ptau() {
        let dir = tempdir().unwrap();
        let out = dir.path();
        touch(&out.join("old/nested/z.ptau"));
        touch(&out.join("old/nested/junk.json"));
        touch(&out.join("old/junk.r1cs"));
        touch(&out.join("old/loader.js"));

        let removed = clean_output_dir(out).unwrap();
        assert_eq!(removed, vec![out.join("old/junk.r1cs"), out.join("old/nested/junk.json")]);
        assert!(out.join("old/nested/z.ptau").exists());
        assert!(out.join("old/loader.js").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_does_not_follow_symlinks() {
        let outside = tempdir().unwrap();
        touch(&outside.path().join("precious.r1cs"));
        let dir = tempdir().unwrap();
        let out = dir.path();
        std::os::unix::fs::symlink(outside.path(), out.join("link")).unwrap();

        let removed = clean_output_dir(out).unwrap();
        assert_eq!(removed, vec![out.join("link")]);
        assert!(outside.path().join("precious.r1cs").exists());
    }

    #[test]
    fn test_missing_output_dir() {
        let dir = tempdir().unwrap();
        let err = clean_output_dir(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, CliError::DirectoryNotFound(_)));
    }
}
