//! Powers of tau sizing and parameter file descriptors

use crate::{ProofSystem, Result, SetupError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// Largest power of tau a parameter file may be requested for.
pub const MAX_POWER: u32 = 28;

/// Subdirectory of the output directory that caches downloaded parameter files.
pub const PTAU_CACHE_DIR: &str = "powersOfTauCache";

/// Circuit size figures reported by `snarkjs r1cs info`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConstraintStats {
    pub constraints: u64,
    pub public_inputs: u64,
    pub outputs: u64,
}

impl ConstraintStats {
    pub fn new(constraints: u64, public_inputs: u64, outputs: u64) -> Self {
        Self { constraints, public_inputs, outputs }
    }

    /// Parse the textual report of `snarkjs r1cs info`.
    ///
    /// The report is a list of `# of <Field>: <n>` lines, usually behind a
    /// logger prefix. Constraints, public inputs and outputs must all be
    /// present.
    pub fn parse(info: &str) -> Result<Self> {
        Ok(Self {
            constraints: parse_field(info, "Constraints")?,
            public_inputs: parse_field(info, "Public Inputs")?,
            outputs: parse_field(info, "Outputs")?,
        })
    }

    /// Constraint count plus public inputs plus outputs, `None` on overflow.
    pub fn total(&self) -> Option<u64> {
        self.constraints
            .checked_add(self.public_inputs)?
            .checked_add(self.outputs)
    }
}

fn parse_field(info: &str, field: &'static str) -> Result<u64> {
    let marker = format!("# of {field}:");
    info.lines()
        .find_map(|line| {
            let (_, rest) = line.split_once(&marker)?;
            rest.trim().parse::<u64>().ok()
        })
        .ok_or(SetupError::StatsParse { field })
}

/// Domain size one circuit needs under `proof_system`: the next power of two
/// covering its constraints, inputs and outputs, scaled by the proof system's
/// SRS multiplier.
pub fn domain_size(stats: &ConstraintStats, proof_system: ProofSystem) -> Result<u64> {
    let too_large = SetupError::ParameterTooLarge { power: u64::BITS, max: MAX_POWER };
    stats
        .total()
        .and_then(u64::checked_next_power_of_two)
        .and_then(|base| base.checked_mul(proof_system.multiplier()))
        .ok_or(too_large)
}

/// Smallest powers of tau file that covers every circuit in the batch.
///
/// The power is `log2(max domain) + 1`. Anything above [`MAX_POWER`] is an
/// error rather than being clamped.
pub fn required_power(stats: &[ConstraintStats], proof_system: ProofSystem) -> Result<u32> {
    let largest = stats
        .iter()
        .map(|s| domain_size(s, proof_system))
        .try_fold(None, |max: Option<u64>, domain| {
            domain.map(|d| Some(max.map_or(d, |m| m.max(d))))
        })?
        .ok_or(SetupError::NoConstraintSystems)?;

    let power = largest.trailing_zeros() + 1;
    if power > MAX_POWER {
        return Err(SetupError::ParameterTooLarge { power, max: MAX_POWER });
    }
    Ok(power)
}

/// Digest algorithms accepted for parameter file checksums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Crc,
    Md5,
    Blake2b,
}

impl ChecksumAlgorithm {
    /// Coreutils program that prints this digest.
    pub fn coreutils_tool(self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha1 => "sha1sum",
            ChecksumAlgorithm::Sha224 => "sha224sum",
            ChecksumAlgorithm::Sha256 => "sha256sum",
            ChecksumAlgorithm::Sha384 => "sha384sum",
            ChecksumAlgorithm::Sha512 => "sha512sum",
            ChecksumAlgorithm::Crc => "cksum",
            ChecksumAlgorithm::Md5 => "md5sum",
            ChecksumAlgorithm::Blake2b => "b2sum",
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChecksumAlgorithm::Sha1 => "sha1",
            ChecksumAlgorithm::Sha224 => "sha224",
            ChecksumAlgorithm::Sha256 => "sha256",
            ChecksumAlgorithm::Sha384 => "sha384",
            ChecksumAlgorithm::Sha512 => "sha512",
            ChecksumAlgorithm::Crc => "crc",
            ChecksumAlgorithm::Md5 => "md5",
            ChecksumAlgorithm::Blake2b => "blake2b",
        };
        f.write_str(name)
    }
}

/// Expected digest of a parameter file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    pub algorithm: ChecksumAlgorithm,
    pub digest: String,
}

/// A downloadable powers of tau file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtauFile {
    pub name: String,
    pub url: String,
    pub checksum: Option<Checksum>,
}

/// Parameter files available for download, keyed by power
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PtauTable {
    entries: BTreeMap<u32, PtauFile>,
}

impl PtauTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, power: u32, file: PtauFile) -> Option<PtauFile> {
        self.entries.insert(power, file)
    }

    pub fn lookup(&self, power: u32) -> Result<&PtauFile> {
        self.entries
            .get(&power)
            .ok_or(SetupError::MissingParameterEntry(power))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(u32, PtauFile)> for PtauTable {
    fn from_iter<I: IntoIterator<Item = (u32, PtauFile)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}
