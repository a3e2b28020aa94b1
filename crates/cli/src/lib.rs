//! # zkey-manager
//!
//! Orchestrates circom and snarkjs: compiles configured circuits, downloads
//! the powers of tau file they need, generates zkeys and proofs, and cleans
//! the output directory. Every expensive step runs in an external process
//! behind [`process::ProcessRunner`].

pub mod checksum;
pub mod clean;
pub mod common;
pub mod compile;
pub mod config;
pub mod process;
pub mod prove;
pub mod ptau;
pub mod setup;
pub mod toolchain;

use std::path::PathBuf;
use thiserror::Error;
use zkey_setup::{ChainStep, ChecksumAlgorithm, SetupError};

/// Error types for CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("could not read config {path}")]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("could not locate {0}")]
    DirectoryNotFound(PathBuf),
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error("could not run `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{tool}` could not digest {path}: {stderr}")]
    DigestFailure {
        tool: String,
        path: PathBuf,
        stderr: String,
    },
    #[error("`snarkjs r1cs info` failed for {r1cs} (exit code {code:?}): {stderr}")]
    R1csInfoFailure {
        r1cs: PathBuf,
        code: Option<i32>,
        stderr: String,
    },
    #[error("compiler failed for circuit {circuit}")]
    CompileFailure { circuit: String },
    #[error("native witness build failed for circuit {circuit}")]
    NativeBuildFailure { circuit: String },
    #[error("download of {url} failed")]
    DownloadFailure { url: String },
    #[error("{algorithm} checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        algorithm: ChecksumAlgorithm,
        expected: String,
        actual: String,
    },
    #[error("could not locate powers of tau file {0}")]
    MissingParameterFile(PathBuf),
    #[error("{step:?} failed while generating zkey for {circuit}")]
    KeyGenerationFailure { circuit: String, step: ChainStep },
    #[error("cannot generate proof for {circuit}")]
    ProofGenerationFailure { circuit: String },
    #[error("{stage}: {failed} of {total} circuits failed")]
    BatchFailed {
        stage: &'static str,
        failed: usize,
        total: usize,
    },
}

pub type Result<T> = std::result::Result<T, CliError>;
