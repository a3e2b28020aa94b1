//! zkey-manager CLI
//!
//! Compiles circom circuits, downloads the powers of tau file they need, and
//! drives snarkjs through key and proof generation.

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use zkey_cli::clean::{handle_clean_command, CleanArgs};
use zkey_cli::compile::{handle_compile_command, CompileArgs};
use zkey_cli::process::SystemRunner;
use zkey_cli::prove::{handle_prove_command, ProveArgs};
use zkey_cli::ptau::{handle_download_command, DownloadArgs};
use zkey_cli::setup::{handle_zkey_command, ZkeyArgs};

#[derive(Debug, Parser)]
#[command(name = "zkey-manager")]
#[command(about = "Compile circom circuits and manage their zkeys")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile all configured circuits
    #[command(name = "compile")]
    Compile(CompileArgs),
    /// Download the powers of tau file sized for the compiled circuits
    #[command(name = "downloadPtau")]
    DownloadPtau(DownloadArgs),
    /// Generate zkeys for the compiled circuits
    #[command(name = "genZkeys")]
    GenZkeys(ZkeyArgs),
    /// Generate and verify proofs for circuits with an input file
    #[command(name = "genProofs")]
    GenProofs(ProveArgs),
    /// Empty the output directory except for *.ptau files
    #[command(name = "clean")]
    Clean(CleanArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let runner = SystemRunner;
    let result = match cli.command {
        Command::Compile(args) => handle_compile_command(args, &runner),
        Command::DownloadPtau(args) => handle_download_command(args, &runner),
        Command::GenZkeys(args) => handle_zkey_command(args, &runner),
        Command::GenProofs(args) => handle_prove_command(args, &runner),
        Command::Clean(args) => handle_clean_command(args),
    };

    if let Err(e) = result.map_err(anyhow::Error::from) {
        // Alternate formatting prints the whole source chain.
        error!("{e:#}");
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use zkey_setup::ProofSystem;

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        Cli::try_parse_from(std::iter::once("zkey-manager").chain(args.iter().copied())).map(|cli| cli.command)
    }

    #[test]
    fn test_invalid_proof_system_is_rejected() {
        let err = parse(&["genZkeys", "-c", "x.yml", "--proof-system", "marlin"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_proof_system_parses() {
        match parse(&["genZkeys", "-c", "x.yml", "--proof-system", "fflonk"]).unwrap() {
            Command::GenZkeys(args) => {
                assert_eq!(args.config, Path::new("x.yml"));
                assert_eq!(args.proof_system, ProofSystem::Fflonk);
                assert!(!args.no_clobber);
            }
            other => panic!("unexpected command {other:?}"),
        }
        match parse(&["genProofs", "--config", "x.yml"]).unwrap() {
            Command::GenProofs(args) => assert_eq!(args.proof_system, ProofSystem::Groth16),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_camel_case_subcommands() {
        assert!(matches!(
            parse(&["downloadPtau", "-c", "x.yml", "-n", "--proof-system", "plonk"]).unwrap(),
            Command::DownloadPtau(DownloadArgs { no_clobber: true, proof_system: ProofSystem::Plonk, .. })
        ));
        assert!(matches!(parse(&["clean", "-c", "x.yml"]).unwrap(), Command::Clean(_)));
        assert!(parse(&["download-ptau", "-c", "x.yml"]).is_err());
        assert!(parse(&["gen-zkeys", "-c", "x.yml"]).is_err());
    }

    #[test]
    fn test_compile_flags() {
        match parse(&["compile", "-c", "x.yml", "--no-clobber", "--no-native"]).unwrap() {
            Command::Compile(args) => {
                assert!(args.no_clobber);
                assert!(args.no_native);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(parse(&["compile", "-c", "x.yml", "--proof-system", "plonk"]).is_err());
    }

    #[test]
    fn test_config_is_required() {
        let err = parse(&["genProofs"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
