//! `genProofs`: prove and verify every configured circuit against its input

use crate::config::PipelineConfig;
use crate::process::ProcessRunner;
use crate::toolchain::Toolchain;
use crate::{CliError, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::{error, info, warn};
use zkey_setup::{ArtifactRole, ProofArtifacts, ProofSystem, ZkeyChain};

/// Prove command configuration
#[derive(Debug, Args)]
pub struct ProveArgs {
    /// The config file that specifies the circuits and their inputs
    #[arg(short, long)]
    pub config: PathBuf,

    /// Skip circuits whose proof and public signals already exist
    #[arg(short, long)]
    pub no_clobber: bool,

    /// Proof system the zkeys were generated for
    #[arg(long, default_value_t = ProofSystem::Groth16)]
    pub proof_system: ProofSystem,
}

/// Circuits a proving run touched, by name
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ProveReport {
    pub proved: Vec<String>,
    /// Proved, but the exported key did not verify the proof
    pub unverified: Vec<String>,
    pub skipped: Vec<String>,
}

pub fn generate_proofs(
    config: &PipelineConfig,
    runner: &dyn ProcessRunner,
    no_clobber: bool,
    proof_system: ProofSystem,
) -> Result<ProveReport> {
    let toolchain = Toolchain::new(&config.tools, runner);
    let mut report = ProveReport::default();

    for spec in &config.circuits {
        let artifacts = spec.artifacts(&config.out_dir);
        let name = artifacts.name().to_string();
        let Some(input) = &spec.input_json else {
            warn!("{} has no inputJson. Skipping.", spec.label());
            report.skipped.push(name);
            continue;
        };

        let outputs = ProofArtifacts::new(&config.out_dir, &name, proof_system);
        if no_clobber && outputs.proof.is_file() && outputs.public.is_file() {
            info!("{name} public.json & proof.json exist. Skipping.");
            report.skipped.push(name);
            continue;
        }

        let zkey = ZkeyChain::new(&config.out_dir, &name, proof_system).finalized();
        info!("Generating public.json and proof.json of {name}");
        let output = toolchain.fullprove(
            proof_system,
            input,
            &artifacts.path(ArtifactRole::WitnessWasm),
            &zkey,
            &outputs.proof,
            &outputs.public,
        )?;
        if !output.is_success() {
            error!("Cannot generate public.json and proof.json of {name}");
            return Err(CliError::ProofGenerationFailure { circuit: name });
        }
        info!("Saved {}", outputs.public.display());
        info!("Saved {}", outputs.proof.display());

        info!("Exporting verification key of {name}");
        let exported = toolchain.export_verification_key(&zkey, &outputs.verification_key)?;
        let verified = if exported.is_success() {
            toolchain
                .verify(proof_system, &outputs.verification_key, &outputs.public, &outputs.proof)?
                .is_success()
        } else {
            warn!(code = ?exported.code, "could not export verification key of {name}");
            false
        };

        if verified {
            info!("{name}: proof verified");
        } else {
            warn!("{name}: proof did not verify");
            report.unverified.push(name.clone());
        }
        report.proved.push(name);
    }
    Ok(report)
}

pub fn handle_prove_command(args: ProveArgs, runner: &dyn ProcessRunner) -> Result<()> {
    let config = PipelineConfig::load(&args.config)?;
    generate_proofs(&config, runner, args.no_clobber, args.proof_system)?;
    Ok(())
}
