//! Canonical circuit names and the artifact paths derived from them

use std::path::{Path, PathBuf};

/// Canonical base name of a circuit: `{component}_{p1-p2-...}_{kind}`.
pub fn derive_name(kind: &str, component: &str, params: &[u64]) -> String {
    let params = params
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join("-");
    format!("{component}_{params}_{kind}")
}

/// Role of a file produced for a circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactRole {
    /// Generated circom entry point
    Source,
    /// `.r1cs` constraint system
    ConstraintSystem,
    /// `.sym` symbol table
    SymbolTable,
    /// Witness calculator compiled to wasm
    WitnessWasm,
    /// C++ witness calculator source emitted by the compiler
    NativeSource,
    /// Constant data file read by the native witness calculator
    Data,
    /// Native witness calculator executable
    WitnessNative,
}

impl ArtifactRole {
    pub const ALL: [ArtifactRole; 7] = [
        ArtifactRole::Source,
        ArtifactRole::ConstraintSystem,
        ArtifactRole::SymbolTable,
        ArtifactRole::WitnessWasm,
        ArtifactRole::NativeSource,
        ArtifactRole::Data,
        ArtifactRole::WitnessNative,
    ];

    /// Whether the file only exists when native witness generation runs.
    pub fn is_native(self) -> bool {
        matches!(
            self,
            ArtifactRole::NativeSource | ArtifactRole::Data | ArtifactRole::WitnessNative
        )
    }
}

/// Every file path belonging to one circuit inside an output directory.
///
/// The layout mirrors what `circom -o <out>` writes: top-level `.r1cs` and
/// `.sym`, the wasm witness calculator under `<name>_js/` and the C++ one
/// under `<name>_cpp/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    name: String,
    out_dir: PathBuf,
}

impl ArtifactSet {
    pub fn derive(out_dir: &Path, kind: &str, component: &str, params: &[u64]) -> Self {
        Self {
            name: derive_name(kind, component, params),
            out_dir: out_dir.to_path_buf(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Directory holding the wasm witness calculator.
    pub fn js_dir(&self) -> PathBuf {
        self.out_dir.join(format!("{}_js", self.name))
    }

    /// Directory holding the C++ witness calculator and its Makefile.
    pub fn cpp_dir(&self) -> PathBuf {
        self.out_dir.join(format!("{}_cpp", self.name))
    }

    pub fn path(&self, role: ArtifactRole) -> PathBuf {
        let name = &self.name;
        match role {
            ArtifactRole::Source => self.out_dir.join(format!("{name}.circom")),
            ArtifactRole::ConstraintSystem => self.out_dir.join(format!("{name}.r1cs")),
            ArtifactRole::SymbolTable => self.out_dir.join(format!("{name}.sym")),
            ArtifactRole::WitnessWasm => self.js_dir().join(format!("{name}.wasm")),
            ArtifactRole::NativeSource => self.cpp_dir().join(format!("{name}.cpp")),
            ArtifactRole::Data => self.cpp_dir().join(format!("{name}.dat")),
            ArtifactRole::WitnessNative => self.cpp_dir().join(name),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArtifactRole, PathBuf)> + '_ {
        ArtifactRole::ALL.into_iter().map(move |role| (role, self.path(role)))
    }

    /// Artifacts a compile run is expected to leave behind.
    pub fn required(&self, native: bool) -> impl Iterator<Item = (ArtifactRole, PathBuf)> + '_ {
        self.iter().filter(move |(role, _)| native || !role.is_native())
    }
}
