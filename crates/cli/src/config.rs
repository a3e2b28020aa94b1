//! YAML configuration
//!
//! The file is read once per invocation and validated into a
//! [`PipelineConfig`]. Relative paths are resolved against the directory that
//! contains the config file.

use crate::{CliError, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};
use tracing::warn;
use zkey_setup::{ArtifactSet, Checksum, ChecksumAlgorithm, PtauFile, PtauTable};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawConfig {
    out: PathBuf,
    circom_path: PathBuf,
    snarkjs_path: PathBuf,
    #[serde(default)]
    node_path: Option<PathBuf>,
    #[serde(default)]
    make_path: Option<PathBuf>,
    #[serde(default)]
    wget_path: Option<PathBuf>,
    #[serde(default)]
    circom_flags: Vec<String>,
    #[serde(default)]
    native_witness: Option<bool>,
    #[serde(default)]
    circuits: Vec<RawCircuit>,
    #[serde(default)]
    ptau_files: BTreeMap<String, RawPtauFile>,
    // Keys of older configs, no longer used since circom 2 bundles its runtime.
    #[serde(default)]
    circom_runtime_path: Option<serde_yaml::Value>,
    #[serde(default)]
    ffiasm_path: Option<serde_yaml::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawCircuit {
    #[serde(rename = "type")]
    kind: String,
    component: String,
    template: PathBuf,
    #[serde(default)]
    params: Vec<u64>,
    #[serde(default)]
    pub_inputs: Vec<String>,
    #[serde(default)]
    input_json: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPtauFile {
    name: String,
    url: String,
    #[serde(default)]
    method: Option<ChecksumAlgorithm>,
    #[serde(default)]
    checksum: Option<String>,
}

/// Locations of the external tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub circom: PathBuf,
    /// snarkjs binary, or its `cli.js` entry point which is run through node
    pub snarkjs: PathBuf,
    pub node: PathBuf,
    pub make: PathBuf,
    pub wget: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            circom: PathBuf::from("circom"),
            snarkjs: PathBuf::from("snarkjs"),
            node: PathBuf::from("node"),
            make: PathBuf::from("make"),
            wget: PathBuf::from("wget"),
        }
    }
}

/// One circuit to compile, identified by `(kind, component, params)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitSpec {
    pub kind: String,
    pub component: String,
    pub params: Vec<u64>,
    pub template: PathBuf,
    pub public_inputs: Vec<String>,
    pub input_json: Option<PathBuf>,
}

impl CircuitSpec {
    pub fn artifacts(&self, out_dir: &Path) -> ArtifactSet {
        ArtifactSet::derive(out_dir, &self.kind, &self.component, &self.params)
    }

    /// Human readable label used in logs and errors.
    pub fn label(&self) -> String {
        let params: Vec<String> = self.params.iter().map(u64::to_string).collect();
        format!("{} ({}) with params [{}]", self.component, self.kind, params.join(", "))
    }
}

/// Validated configuration shared by every stage
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub out_dir: PathBuf,
    pub tools: ToolPaths,
    pub circom_flags: Vec<String>,
    pub native_witness: bool,
    pub circuits: Vec<CircuitSpec>,
    pub ptau_files: PtauTable,
}

impl PipelineConfig {
    /// Read and validate the YAML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::ConfigUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_yaml(&text, base).map_err(|err| match err {
            CliError::ConfigParse { source, .. } => CliError::ConfigParse { path: path.to_path_buf(), source },
            other => other,
        })
    }

    /// Parse `text`, resolving relative paths against `base`.
    pub fn from_yaml(text: &str, base: &Path) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(text).map_err(|source| CliError::ConfigParse {
            path: PathBuf::new(),
            source,
        })?;
        Self::validate(raw, base)
    }

    fn validate(raw: RawConfig, base: &Path) -> Result<Self> {
        for (key, value) in [("circomRuntimePath", &raw.circom_runtime_path), ("ffiasmPath", &raw.ffiasm_path)] {
            if value.is_some() {
                warn!("ignoring obsolete config key `{key}`");
            }
        }
        let defaults = ToolPaths::default();
        let tools = ToolPaths {
            circom: resolve_tool(base, raw.circom_path),
            snarkjs: resolve_tool(base, raw.snarkjs_path),
            node: raw.node_path.map_or(defaults.node, |p| resolve_tool(base, p)),
            make: raw.make_path.map_or(defaults.make, |p| resolve_tool(base, p)),
            wget: raw.wget_path.map_or(defaults.wget, |p| resolve_tool(base, p)),
        };
        let out_dir = base.join(raw.out);

        let mut circuits = Vec::with_capacity(raw.circuits.len());
        let mut names: HashMap<String, String> = HashMap::new();
        for c in raw.circuits {
            if c.kind.is_empty() || c.component.is_empty() {
                return Err(CliError::InvalidConfig(
                    "every circuit needs a non-empty `type` and `component`".to_string(),
                ));
            }
            let spec = CircuitSpec {
                template: base.join(c.template),
                input_json: c.input_json.map(|p| base.join(p)),
                kind: c.kind,
                component: c.component,
                params: c.params,
                public_inputs: c.pub_inputs,
            };
            let name = spec.artifacts(&out_dir).name().to_string();
            if let Some(previous) = names.insert(name.clone(), spec.label()) {
                return Err(CliError::InvalidConfig(format!(
                    "{} and {} both produce artifacts named {name}",
                    previous,
                    spec.label()
                )));
            }
            circuits.push(spec);
        }

        let mut ptau_files = PtauTable::new();
        for (key, entry) in raw.ptau_files {
            let power: u32 = key.trim().parse().map_err(|_| {
                CliError::InvalidConfig(format!("ptauFiles key `{key}` is not a power of two exponent"))
            })?;
            let checksum = match (entry.method, entry.checksum) {
                (Some(algorithm), Some(digest)) => Some(Checksum { algorithm, digest }),
                (None, None) => None,
                _ => {
                    return Err(CliError::InvalidConfig(format!(
                        "ptauFiles entry {key} needs both `method` and `checksum`, or neither"
                    )))
                }
            };
            ptau_files.insert(power, PtauFile { name: entry.name, url: entry.url, checksum });
        }

        Ok(Self {
            out_dir,
            tools,
            circom_flags: raw.circom_flags,
            native_witness: raw.native_witness.unwrap_or(true),
            circuits,
            ptau_files,
        })
    }
}

/// Bare program names are left for `PATH` lookup; anything with a directory
/// component is resolved against the config directory.
fn resolve_tool(base: &Path, tool: PathBuf) -> PathBuf {
    let is_bare = tool.components().count() == 1
        && matches!(tool.components().next(), Some(Component::Normal(_)));
    if is_bare {
        tool
    } else {
        base.join(tool)
    }
}
