//! Layout of zkey files and proof outputs

use crate::ProofSystem;
use std::path::{Path, PathBuf};

/// Random contributions made between the groth16 setup and the beacon.
pub const GROTH16_CONTRIBUTIONS: usize = 3;

/// `numIterationsExp` passed to `snarkjs zkey beacon`.
pub const BEACON_ITERATIONS_EXP: u32 = 10;

/// One step of the key generation chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStep {
    /// `<proof system> setup` from constraint system and powers of tau
    Setup,
    /// Random contribution, numbered from 1
    Contribution(usize),
    /// Final beacon contribution
    Beacon,
}

/// One link of the chain: `input` is the previous zkey, absent for setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLink {
    pub step: ChainStep,
    pub input: Option<PathBuf>,
    pub output: PathBuf,
}

/// zkey files for one circuit under one proof system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZkeyChain {
    prefix: PathBuf,
    proof_system: ProofSystem,
}

impl ZkeyChain {
    pub fn new(out_dir: &Path, circuit_name: &str, proof_system: ProofSystem) -> Self {
        Self {
            prefix: out_dir.join(format!("{circuit_name}_{proof_system}")),
            proof_system,
        }
    }

    pub fn proof_system(&self) -> ProofSystem {
        self.proof_system
    }

    fn with_suffix(&self, suffix: &str) -> PathBuf {
        let mut path = self.prefix.clone().into_os_string();
        path.push(suffix);
        PathBuf::from(path)
    }

    /// Intermediate groth16 zkey `index`, where 0 is the output of setup.
    pub fn stage(&self, index: usize) -> PathBuf {
        self.with_suffix(&format!(".{index}.zkey"))
    }

    /// The only zkey consumed by proving.
    pub fn finalized(&self) -> PathBuf {
        self.with_suffix(".final.zkey")
    }

    /// First file the chain writes; its presence marks the chain as done for no-clobber runs.
    pub fn initial(&self) -> PathBuf {
        match self.proof_system {
            ProofSystem::Groth16 => self.stage(0),
            ProofSystem::Plonk | ProofSystem::Fflonk => self.finalized(),
        }
    }

    /// Links in execution order, each consuming the previous link's output.
    pub fn links(&self) -> Vec<ChainLink> {
        match self.proof_system {
            ProofSystem::Plonk | ProofSystem::Fflonk => vec![ChainLink {
                step: ChainStep::Setup,
                input: None,
                output: self.finalized(),
            }],
            ProofSystem::Groth16 => {
                let mut links = vec![ChainLink {
                    step: ChainStep::Setup,
                    input: None,
                    output: self.stage(0),
                }];
                for i in 1..=GROTH16_CONTRIBUTIONS {
                    links.push(ChainLink {
                        step: ChainStep::Contribution(i),
                        input: Some(self.stage(i - 1)),
                        output: self.stage(i),
                    });
                }
                links.push(ChainLink {
                    step: ChainStep::Beacon,
                    input: Some(self.stage(GROTH16_CONTRIBUTIONS)),
                    output: self.finalized(),
                });
                links
            }
        }
    }
}

/// Proof, public signals and exported verification key of one circuit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofArtifacts {
    pub proof: PathBuf,
    pub public: PathBuf,
    pub verification_key: PathBuf,
}

impl ProofArtifacts {
    pub fn new(out_dir: &Path, circuit_name: &str, proof_system: ProofSystem) -> Self {
        let base = format!("{circuit_name}_{proof_system}");
        Self {
            proof: out_dir.join(format!("{base}.proof.json")),
            public: out_dir.join(format!("{base}.public.json")),
            verification_key: out_dir.join(format!("{base}.verification_key.json")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groth16_chain_is_linked() {
        let chain = ZkeyChain::new(Path::new("/out"), "Mul_3_test", ProofSystem::Groth16);
        let links = chain.links();
        assert_eq!(links.len(), GROTH16_CONTRIBUTIONS + 2);
        assert_eq!(links[0].step, ChainStep::Setup);
        assert_eq!(links[0].input, None);
        assert_eq!(links[0].output, Path::new("/out/Mul_3_test_groth16.0.zkey"));

        for pair in links.windows(2) {
            assert_eq!(pair[1].input.as_ref(), Some(&pair[0].output));
        }

        let last = links.last().unwrap();
        assert_eq!(last.step, ChainStep::Beacon);
        assert_eq!(last.output, Path::new("/out/Mul_3_test_groth16.final.zkey"));
        assert_eq!(chain.initial(), Path::new("/out/Mul_3_test_groth16.0.zkey"));
    }

    #[test]
    fn test_universal_setups_write_final_key_directly() {
        for ps in [ProofSystem::Plonk, ProofSystem::Fflonk] {
            let chain = ZkeyChain::new(Path::new("out"), "Mul_3_test", ps);
            let links = chain.links();
            assert_eq!(links.len(), 1);
            assert_eq!(links[0].output, chain.finalized());
            assert_eq!(chain.initial(), chain.finalized());
            assert_eq!(
                chain.finalized(),
                Path::new("out").join(format!("Mul_3_test_{ps}.final.zkey"))
            );
        }
    }

    #[test]
    fn test_proof_artifacts() {
        let artifacts = ProofArtifacts::new(Path::new("out"), "Mul_3_test", ProofSystem::Plonk);
        assert_eq!(artifacts.proof, Path::new("out/Mul_3_test_plonk.proof.json"));
        assert_eq!(artifacts.public, Path::new("out/Mul_3_test_plonk.public.json"));
        assert_eq!(
            artifacts.verification_key,
            Path::new("out/Mul_3_test_plonk.verification_key.json")
        );
    }
}
