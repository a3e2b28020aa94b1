//! Command lines for circom, snarkjs, make and wget

use crate::config::ToolPaths;
use crate::process::{Invocation, ProcessOutput, ProcessRunner};
use crate::{CliError, Result};
use std::path::Path;
use tracing::debug;
use zkey_setup::{ConstraintStats, Entropy, ProofSystem, BEACON_ITERATIONS_EXP};

/// The external tools of one pipeline run, bound to a process runner
pub struct Toolchain<'a> {
    tools: &'a ToolPaths,
    runner: &'a dyn ProcessRunner,
}

impl<'a> Toolchain<'a> {
    pub fn new(tools: &'a ToolPaths, runner: &'a dyn ProcessRunner) -> Self {
        Self { tools, runner }
    }

    pub fn run(&self, invocation: Invocation) -> Result<ProcessOutput> {
        // Full command lines carry contribution entropy, so only the program is logged.
        debug!(program = %invocation.program_lossy(), "running");
        self.runner.run(&invocation).map_err(|source| CliError::Spawn {
            program: invocation.program_lossy(),
            source,
        })
    }

    /// snarkjs is either an installed binary or a `.js` entry point for node.
    fn snarkjs(&self) -> Invocation {
        let is_script = self
            .tools
            .snarkjs
            .extension()
            .is_some_and(|ext| ext == "js" || ext == "cjs" || ext == "mjs");
        if is_script {
            Invocation::new(&self.tools.node).arg(&self.tools.snarkjs)
        } else {
            Invocation::new(&self.tools.snarkjs)
        }
    }

    /// `circom <source> --r1cs --wasm --sym [--c] -o <out_dir> <flags>`
    pub fn compile(
        &self,
        source: &Path,
        out_dir: &Path,
        native: bool,
        flags: &[String],
    ) -> Result<ProcessOutput> {
        let mut inv = Invocation::new(&self.tools.circom)
            .arg(source)
            .args(["--r1cs", "--wasm", "--sym"]);
        if native {
            inv = inv.arg("--c");
        }
        self.run(inv.arg("-o").arg(out_dir).args(flags))
    }

    /// `make -C <cpp_dir>`, building the native witness calculator.
    pub fn build_native(&self, cpp_dir: &Path) -> Result<ProcessOutput> {
        self.run(Invocation::new(&self.tools.make).arg("-C").arg(cpp_dir).capture())
    }

    /// `snarkjs r1cs info <r1cs>`, parsed into constraint statistics.
    pub fn r1cs_info(&self, r1cs: &Path) -> Result<ConstraintStats> {
        let output = self.run(self.snarkjs().args(["r1cs", "info"]).arg(r1cs).capture())?;
        if !output.is_success() {
            return Err(CliError::R1csInfoFailure {
                r1cs: r1cs.to_path_buf(),
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(ConstraintStats::parse(&output.stdout)?)
    }

    /// Download `url` to `dest`; wget does the retrying.
    pub fn fetch(&self, url: &str, dest: &Path) -> Result<ProcessOutput> {
        let mut document = std::ffi::OsString::from("--output-document=");
        document.push(dest);
        self.run(
            Invocation::new(&self.tools.wget)
                .args([
                    "--quiet",
                    "--show-progress",
                    "--progress=bar:force:noscroll",
                    "--tries=10",
                ])
                .arg(document)
                .arg(url),
        )
    }

    /// Run a coreutils digest tool such as `md5sum` on `file`.
    pub fn digest(&self, tool: &str, file: &Path) -> Result<ProcessOutput> {
        self.run(Invocation::new(tool).arg(file).capture())
    }

    /// `snarkjs <ps> setup <r1cs> <ptau> <zkey>`
    pub fn setup(
        &self,
        proof_system: ProofSystem,
        r1cs: &Path,
        ptau: &Path,
        zkey: &Path,
    ) -> Result<ProcessOutput> {
        self.run(
            self.snarkjs()
                .args([proof_system.as_str(), "setup"])
                .arg(r1cs)
                .arg(ptau)
                .arg(zkey),
        )
    }

    /// `snarkjs zkey contribute <in> <out> --name=<name> -e=<entropy>`
    pub fn contribute(
        &self,
        input: &Path,
        output: &Path,
        name: &str,
        entropy: &Entropy,
    ) -> Result<ProcessOutput> {
        self.run(
            self.snarkjs()
                .args(["zkey", "contribute"])
                .arg(input)
                .arg(output)
                .arg(format!("--name={name}"))
                .arg(format!("-e={}", entropy.as_hex())),
        )
    }

    /// `snarkjs zkey beacon <in> <out> <hash> <iterations exp> -n=<name>`
    pub fn beacon(&self, input: &Path, output: &Path, name: &str, hash: &Entropy) -> Result<ProcessOutput> {
        self.run(
            self.snarkjs()
                .args(["zkey", "beacon"])
                .arg(input)
                .arg(output)
                .arg(hash.as_hex())
                .arg(BEACON_ITERATIONS_EXP.to_string())
                .arg(format!("-n={name}")),
        )
    }

    /// `snarkjs zkey export verificationkey <zkey> <vkey>`
    pub fn export_verification_key(&self, zkey: &Path, vkey: &Path) -> Result<ProcessOutput> {
        self.run(
            self.snarkjs()
                .args(["zkey", "export", "verificationkey"])
                .arg(zkey)
                .arg(vkey),
        )
    }

    /// `snarkjs <ps> fullprove <input> <wasm> <zkey> <proof> <public>`
    pub fn fullprove(
        &self,
        proof_system: ProofSystem,
        input: &Path,
        wasm: &Path,
        zkey: &Path,
        proof: &Path,
        public: &Path,
    ) -> Result<ProcessOutput> {
        self.run(
            self.snarkjs()
                .args([proof_system.as_str(), "fullprove"])
                .arg(input)
                .arg(wasm)
                .arg(zkey)
                .arg(proof)
                .arg(public),
        )
    }

    /// `snarkjs <ps> verify <vkey> <public> <proof>`
    pub fn verify(
        &self,
        proof_system: ProofSystem,
        vkey: &Path,
        public: &Path,
        proof: &Path,
    ) -> Result<ProcessOutput> {
        self.run(
            self.snarkjs()
                .args([proof_system.as_str(), "verify"])
                .arg(vkey)
                .arg(public)
                .arg(proof),
        )
    }
}
