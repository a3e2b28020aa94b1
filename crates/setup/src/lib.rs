//! Trusted setup planning for circom/snarkjs pipelines
//!
//! This crate holds the pure parts of the pipeline: artifact naming, sizing
//! of the powers-of-tau file a batch of circuits needs, the layout of the
//! zkey contribution chain and the entropy fed to each contribution. Nothing
//! in here spawns processes.

#![forbid(unsafe_code)]

pub mod naming;
pub mod powers_of_tau;
pub mod toxic_waste;
pub mod zkey;

pub use naming::*;
pub use powers_of_tau::*;
pub use toxic_waste::*;
pub use zkey::*;

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("could not read `{field}` from constraint system statistics")]
    StatsParse { field: &'static str },
    #[error("circuits need a powers of tau file of power {power}, above the supported maximum of {max}")]
    ParameterTooLarge { power: u32, max: u32 },
    #[error("no compiled constraint systems to size a powers of tau file for")]
    NoConstraintSystems,
    #[error("invalid proof system `{0}`, expected one of groth16, plonk, fflonk")]
    InvalidProofSystem(String),
    #[error("no powers of tau file configured for power {0}")]
    MissingParameterEntry(u32),
}

pub type Result<T> = std::result::Result<T, SetupError>;

/// Proof systems supported by snarkjs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProofSystem {
    #[default]
    Groth16,
    Plonk,
    Fflonk,
}

impl ProofSystem {
    pub const ALL: [ProofSystem; 3] = [ProofSystem::Groth16, ProofSystem::Plonk, ProofSystem::Fflonk];

    /// Factor by which the structured reference string must exceed the
    /// constraint domain.
    pub fn multiplier(self) -> u64 {
        match self {
            ProofSystem::Groth16 => 1,
            ProofSystem::Plonk => 4,
            ProofSystem::Fflonk => 16,
        }
    }

    /// Name used both on the snarkjs command line and in artifact names.
    pub fn as_str(self) -> &'static str {
        match self {
            ProofSystem::Groth16 => "groth16",
            ProofSystem::Plonk => "plonk",
            ProofSystem::Fflonk => "fflonk",
        }
    }
}

impl fmt::Display for ProofSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProofSystem {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self> {
        ProofSystem::ALL
            .into_iter()
            .find(|ps| ps.as_str() == s)
            .ok_or_else(|| SetupError::InvalidProofSystem(s.to_string()))
    }
}
