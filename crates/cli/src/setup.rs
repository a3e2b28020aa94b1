//! `genZkeys`: run the trusted setup chain for every compiled circuit
//!
//! groth16 keys go through setup, three random contributions and a beacon.
//! plonk and fflonk are universal setups, so a single `setup` call produces
//! the final key. The first failing link aborts the whole batch.

use crate::common::{compiled_constraint_systems, ptau_requirement, FileOps};
use crate::config::PipelineConfig;
use crate::process::{ProcessOutput, ProcessRunner};
use crate::toolchain::Toolchain;
use crate::{CliError, Result};
use clap::Args;
use rand::rngs::OsRng;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use zkey_setup::{ChainLink, ChainStep, Entropy, ProofSystem, ZkeyChain};

/// Key generation command configuration
#[derive(Debug, Args)]
pub struct ZkeyArgs {
    /// The config file that specifies the circuit parameters
    #[arg(short, long)]
    pub config: PathBuf,

    /// Skip zkey generation if the initial zkey exists
    #[arg(short, long)]
    pub no_clobber: bool,

    /// Proof system to generate keys for
    #[arg(long, default_value_t = ProofSystem::Groth16)]
    pub proof_system: ProofSystem,
}

/// Circuits a key generation run touched, by name
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ZkeyReport {
    pub generated: Vec<String>,
    pub skipped: Vec<String>,
}

/// Generate zkeys for every `.r1cs` in the output directory.
pub fn generate_zkeys(
    config: &PipelineConfig,
    runner: &dyn ProcessRunner,
    no_clobber: bool,
    proof_system: ProofSystem,
) -> Result<ZkeyReport> {
    let toolchain = Toolchain::new(&config.tools, runner);
    let requirement = ptau_requirement(&toolchain, &config.out_dir, &config.ptau_files, proof_system)?;
    if !FileOps::file_exists(&requirement.path) {
        error!("could not locate {}", requirement.path.display());
        return Err(CliError::MissingParameterFile(requirement.path));
    }
    info!("Using {} to generate zkey files", requirement.path.display());

    let mut report = ZkeyReport::default();
    for r1cs in compiled_constraint_systems(&config.out_dir)? {
        let Some(name) = r1cs.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        let chain = ZkeyChain::new(&config.out_dir, &name, proof_system);

        if no_clobber && FileOps::file_exists(&chain.initial()) {
            info!("{} exists. Skipping.", chain.initial().display());
            report.skipped.push(name);
            continue;
        }

        for link in chain.links() {
            run_link(&toolchain, proof_system, &name, &r1cs, &requirement.path, &link)?;
        }
        info!(circuit = %name, "wrote {}", chain.finalized().display());
        report.generated.push(name);
    }
    Ok(report)
}

fn run_link(
    toolchain: &Toolchain<'_>,
    proof_system: ProofSystem,
    circuit: &str,
    r1cs: &Path,
    ptau: &Path,
    link: &ChainLink,
) -> Result<()> {
    let failure = || CliError::KeyGenerationFailure { circuit: circuit.to_string(), step: link.step };

    if let Some(input) = &link.input {
        if !FileOps::file_exists(input) {
            error!(circuit, step = ?link.step, "missing input {}", input.display());
            return Err(failure());
        }
    }

    info!("Generating {}", link.output.display());
    let output: ProcessOutput = match (link.step, &link.input) {
        (ChainStep::Setup, _) => toolchain.setup(proof_system, r1cs, ptau, &link.output)?,
        (ChainStep::Contribution(i), Some(input)) => toolchain.contribute(
            input,
            &link.output,
            &format!("Contribution {i}"),
            &Entropy::new(&mut OsRng),
        )?,
        (ChainStep::Beacon, Some(input)) => {
            toolchain.beacon(input, &link.output, "Final Beacon", &Entropy::new(&mut OsRng))?
        }
        _ => return Err(failure()),
    };

    if !output.is_success() || !FileOps::file_exists(&link.output) {
        error!(circuit, step = ?link.step, code = ?output.code, "zkey generation failed");
        return Err(failure());
    }
    Ok(())
}

pub fn handle_zkey_command(args: ZkeyArgs, runner: &dyn ProcessRunner) -> Result<()> {
    let config = PipelineConfig::load(&args.config)?;
    generate_zkeys(&config, runner, args.no_clobber, args.proof_system)?;
    Ok(())
}
