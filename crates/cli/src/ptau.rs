//! `downloadPtau`: fetch the powers of tau file sized for the compiled circuits

use crate::checksum::verify_file;
use crate::common::{ptau_requirement, FileOps, PtauRequirement};
use crate::config::PipelineConfig;
use crate::process::ProcessRunner;
use crate::toolchain::Toolchain;
use crate::{CliError, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::{error, info};
use zkey_setup::{ProofSystem, PTAU_CACHE_DIR};

/// Download command configuration
#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// The config file that specifies the ptau files
    #[arg(short, long)]
    pub config: PathBuf,

    /// Skip the download if the file already exists
    #[arg(short, long)]
    pub no_clobber: bool,

    /// Proof system the parameters are sized for
    #[arg(long, default_value_t = ProofSystem::Groth16)]
    pub proof_system: ProofSystem,
}

/// Make sure the required powers of tau file is in the cache, returning
/// where it lives.
pub fn download_ptau(
    config: &PipelineConfig,
    runner: &dyn ProcessRunner,
    no_clobber: bool,
    proof_system: ProofSystem,
) -> Result<PtauRequirement> {
    let toolchain = Toolchain::new(&config.tools, runner);
    let requirement = ptau_requirement(&toolchain, &config.out_dir, &config.ptau_files, proof_system)?;
    FileOps::ensure_directory(&config.out_dir.join(PTAU_CACHE_DIR))?;

    if no_clobber && FileOps::file_exists(&requirement.path) {
        info!("{} exists. Skipping download.", requirement.path.display());
        return Ok(requirement);
    }

    info!("Downloading {} to {}", requirement.file.url, requirement.path.display());
    let output = toolchain.fetch(&requirement.file.url, &requirement.path)?;
    if !output.is_success() {
        error!(url = %requirement.file.url, code = ?output.code, "download failed");
        FileOps::remove_file_if_exists(&requirement.path)?;
        return Err(CliError::DownloadFailure { url: requirement.file.url.clone() });
    }

    if let Some(checksum) = &requirement.file.checksum {
        // An unverified file must not satisfy a later no-clobber run.
        if let Err(err) = verify_file(&toolchain, checksum, &requirement.path) {
            FileOps::remove_file_if_exists(&requirement.path)?;
            return Err(err);
        }
    }
    Ok(requirement)
}

pub fn handle_download_command(args: DownloadArgs, runner: &dyn ProcessRunner) -> Result<()> {
    let config = PipelineConfig::load(&args.config)?;
    download_ptau(&config, runner, args.no_clobber, args.proof_system)?;
    Ok(())
}
