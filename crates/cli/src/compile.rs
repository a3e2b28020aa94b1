//! `compile`: generate circom entry points and compile every configured circuit
//!
//! Compilation is best-effort per circuit: a failing circuit is logged and
//! the batch moves on, and the failures are reported together at the end.

use crate::common::FileOps;
use crate::config::{CircuitSpec, PipelineConfig};
use crate::process::ProcessRunner;
use crate::toolchain::Toolchain;
use crate::{CliError, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::{error, info, warn};
use zkey_setup::ArtifactRole;

/// Compile command configuration
#[derive(Debug, Args)]
pub struct CompileArgs {
    /// The config file that specifies the circuit parameters
    #[arg(short, long)]
    pub config: PathBuf,

    /// Skip compilation if compiled files exist
    #[arg(short, long)]
    pub no_clobber: bool,

    /// Do not build the native (C++) witness calculators
    #[arg(long)]
    pub no_native: bool,
}

/// Options of one compile run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    pub no_clobber: bool,
    pub native: bool,
}

/// Outcome of a compile batch
#[derive(Debug, Default)]
pub struct CompileReport {
    pub compiled: Vec<String>,
    pub skipped: Vec<String>,
    pub failures: Vec<CliError>,
}

impl CompileReport {
    pub fn total(&self) -> usize {
        self.compiled.len() + self.skipped.len() + self.failures.len()
    }
}

/// Circom entry point instantiating `spec`'s template as the main component.
pub fn render_source(spec: &CircuitSpec) -> String {
    let params: Vec<String> = spec.params.iter().map(u64::to_string).collect();
    let public = if spec.public_inputs.is_empty() {
        String::new()
    } else {
        format!(" {{public [{}]}}", spec.public_inputs.join(", "))
    };
    format!(
        "pragma circom 2.0.0;\n\ninclude \"{}\";\n\ncomponent main{} = {}({});\n",
        spec.template.display().to_string().replace('\\', "/"),
        public,
        spec.component,
        params.join(", ")
    )
}

/// Compile every circuit in `config`.
pub fn compile_circuits(
    config: &PipelineConfig,
    runner: &dyn ProcessRunner,
    options: CompileOptions,
) -> Result<CompileReport> {
    let toolchain = Toolchain::new(&config.tools, runner);
    FileOps::ensure_directory(&config.out_dir)?;

    let mut report = CompileReport::default();
    for spec in &config.circuits {
        let artifacts = spec.artifacts(&config.out_dir);
        let name = artifacts.name().to_string();

        let up_to_date = artifacts.required(options.native).all(|(_, path)| path.exists());
        if options.no_clobber && up_to_date {
            info!("Skipping {}", spec.label());
            report.skipped.push(name);
            continue;
        }

        FileOps::write_text(&artifacts.path(ArtifactRole::Source), &render_source(spec))?;

        info!("Compiling {}", spec.label());
        let output = toolchain.compile(
            &artifacts.path(ArtifactRole::Source),
            &config.out_dir,
            options.native,
            &config.circom_flags,
        )?;
        if !output.is_success() {
            error!(circuit = %name, code = ?output.code, "circom failed");
            report.failures.push(CliError::CompileFailure { circuit: name });
            continue;
        }

        if options.native {
            info!(circuit = %name, "building native witness calculator");
            let output = toolchain.build_native(&artifacts.cpp_dir())?;
            if !output.is_success() {
                error!(circuit = %name, code = ?output.code, stderr = %output.stderr.trim(), "native build failed");
                report.failures.push(CliError::NativeBuildFailure { circuit: name });
                continue;
            }
            if !output.stderr.trim().is_empty() {
                warn!(circuit = %name, "native build reported: {}", output.stderr.trim());
            }
        }

        report.compiled.push(name);
    }

    info!(
        compiled = report.compiled.len(),
        skipped = report.skipped.len(),
        failed = report.failures.len(),
        "compile finished"
    );
    Ok(report)
}

/// Main compile command handler
pub fn handle_compile_command(args: CompileArgs, runner: &dyn ProcessRunner) -> Result<()> {
    let config = PipelineConfig::load(&args.config)?;
    let options = CompileOptions {
        no_clobber: args.no_clobber,
        native: config.native_witness && !args.no_native,
    };
    let report = compile_circuits(&config, runner, options)?;
    if report.failures.is_empty() {
        return Ok(());
    }
    for failure in &report.failures {
        error!("{failure}");
    }
    Err(CliError::BatchFailed {
        stage: "compile",
        failed: report.failures.len(),
        total: report.total(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolPaths;
    use crate::process::testing::{touch, FakeRunner};
    use crate::process::{Invocation, ProcessOutput};
    use proptest::prelude::*;
    use std::path::Path;
    use tempfile::tempdir;
    use zkey_setup::{ArtifactSet, PtauTable};

    fn spec(component: &str, params: Vec<u64>) -> CircuitSpec {
        CircuitSpec {
            kind: "test".to_string(),
            component: component.to_string(),
            params,
            template: PathBuf::from("/circuits/mul.circom"),
            public_inputs: Vec::new(),
            input_json: None,
        }
    }

    fn config(out_dir: &Path, circuits: Vec<CircuitSpec>) -> PipelineConfig {
        PipelineConfig {
            out_dir: out_dir.to_path_buf(),
            tools: ToolPaths::default(),
            circom_flags: Vec::new(),
            native_witness: true,
            circuits,
            ptau_files: PtauTable::new(),
        }
    }

    /// Behaves like circom and make: writes every artifact for the compiled source.
    fn fake_toolchain(out_dir: &Path, fail_compile: Option<&'static str>, fail_make: Option<&'static str>) -> FakeRunner {
        let out_dir = out_dir.to_path_buf();
        FakeRunner::new(move |inv: &Invocation| {
            let args = inv.args_lossy();
            match inv.program_lossy().as_str() {
                "circom" => {
                    let source = Path::new(&args[0]);
                    let name = source.file_stem().unwrap().to_str().unwrap().to_string();
                    if fail_compile.is_some_and(|f| name.starts_with(f)) {
                        return ProcessOutput::failure(1);
                    }
                    let set = artifact_set(&out_dir, &name);
                    let native = args.contains(&"--c".to_string());
                    for (role, path) in set.iter() {
                        if role != ArtifactRole::Source && role != ArtifactRole::WitnessNative && (native || !role.is_native()) {
                            touch(&path);
                        }
                    }
                    ProcessOutput::success()
                }
                "make" => {
                    let cpp_dir = Path::new(&args[1]);
                    let dir_name = cpp_dir.file_name().unwrap().to_str().unwrap();
                    let name = dir_name.trim_end_matches("_cpp");
                    if fail_make.is_some_and(|f| name.starts_with(f)) {
                        return ProcessOutput::failure(2).with_stderr("error: gmp.h not found");
                    }
                    touch(&cpp_dir.join(name));
                    ProcessOutput::success().with_stderr("warning: unused variable")
                }
                other => panic!("unexpected program {other}"),
            }
        })
    }

    fn artifact_set(out_dir: &Path, name: &str) -> ArtifactSet {
        // Names in these tests are always `{component}_{params}_test`.
        let mut parts = name.splitn(3, '_');
        let component = parts.next().unwrap();
        let params: Vec<u64> = parts
            .next()
            .unwrap()
            .split('-')
            .filter(|p| !p.is_empty())
            .map(|p| p.parse().unwrap())
            .collect();
        ArtifactSet::derive(out_dir, "test", component, &params)
    }

    #[test]
    fn test_render_source() {
        let mut s = spec("Multiplier", vec![2, 10]);
        assert_eq!(
            render_source(&s),
            "pragma circom 2.0.0;\n\ninclude \"/circuits/mul.circom\";\n\ncomponent main = Multiplier(2, 10);\n"
        );
        s.public_inputs = vec!["a".to_string(), "b".to_string()];
        assert!(render_source(&s).contains("component main {public [a, b]} = Multiplier(2, 10);"));
    }

    proptest! {
        #[test]
        fn test_rendered_main_instantiates_component(
            component in "[A-Z][A-Za-z0-9]{0,10}",
            params in prop::collection::vec(any::<u64>(), 0..5),
        ) {
            let source = render_source(&spec(&component, params.clone()));
            let args: Vec<String> = params.iter().map(u64::to_string).collect();
            let expected_main = format!("component main = {}({});\n", component, args.join(", "));
            prop_assert!(source.starts_with("pragma circom 2.0.0;\n"));
            prop_assert!(source.ends_with(&expected_main));
        }
    }

    #[test]
    fn test_compiles_and_builds_native() {
        let dir = tempdir().unwrap();
        let config = config(dir.path(), vec![spec("Mul", vec![2]), spec("Add", vec![])]);
        let runner = fake_toolchain(dir.path(), None, None);
        let options = CompileOptions { no_clobber: false, native: true };

        let report = compile_circuits(&config, &runner, options).unwrap();
        assert_eq!(report.compiled, vec!["Mul_2_test", "Add__test"]);
        assert!(report.failures.is_empty());

        let programs: Vec<_> = runner.calls().iter().map(Invocation::program_lossy).collect();
        assert_eq!(programs, vec!["circom", "make", "circom", "make"]);

        let source = std::fs::read_to_string(dir.path().join("Mul_2_test.circom")).unwrap();
        assert!(source.contains("component main = Mul(2);"));
        for spec in &config.circuits {
            assert!(spec.artifacts(dir.path()).iter().all(|(_, p)| p.exists()));
        }
    }

    #[tracing_test::traced_test]
    #[test]
    fn test_no_clobber_second_run_is_idempotent() {
        let dir = tempdir().unwrap();
        let config = config(dir.path(), vec![spec("Mul", vec![2]), spec("Mul", vec![3])]);
        let runner = fake_toolchain(dir.path(), None, None);
        let options = CompileOptions { no_clobber: true, native: true };

        compile_circuits(&config, &runner, options).unwrap();
        let calls_after_first = runner.call_count();
        let mtimes: Vec<_> = config
            .circuits
            .iter()
            .flat_map(|s| s.artifacts(dir.path()).iter().collect::<Vec<_>>())
            .map(|(_, p)| std::fs::metadata(p).unwrap().modified().unwrap())
            .collect();

        let report = compile_circuits(&config, &runner, options).unwrap();
        assert_eq!(runner.call_count(), calls_after_first);
        assert_eq!(report.skipped, vec!["Mul_2_test", "Mul_3_test"]);
        assert!(report.compiled.is_empty());

        let mtimes_again: Vec<_> = config
            .circuits
            .iter()
            .flat_map(|s| s.artifacts(dir.path()).iter().collect::<Vec<_>>())
            .map(|(_, p)| std::fs::metadata(p).unwrap().modified().unwrap())
            .collect();
        assert_eq!(mtimes, mtimes_again);
        assert!(logs_contain("Skipping Mul (test) with params [2]"));
    }

    #[test]
    fn test_without_no_clobber_recompiles() {
        let dir = tempdir().unwrap();
        let config = config(dir.path(), vec![spec("Mul", vec![2])]);
        let runner = fake_toolchain(dir.path(), None, None);
        let options = CompileOptions { no_clobber: false, native: false };

        compile_circuits(&config, &runner, options).unwrap();
        compile_circuits(&config, &runner, options).unwrap();
        assert_eq!(runner.call_count(), 2);
    }

    #[test]
    fn test_no_clobber_without_native_ignores_native_artifacts() {
        let dir = tempdir().unwrap();
        let config = config(dir.path(), vec![spec("Mul", vec![2])]);
        let runner = fake_toolchain(dir.path(), None, None);
        let options = CompileOptions { no_clobber: true, native: false };

        compile_circuits(&config, &runner, options).unwrap();
        let report = compile_circuits(&config, &runner, options).unwrap();
        assert_eq!(runner.call_count(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(!dir.path().join("Mul_2_test_cpp").exists());
    }

    #[test]
    fn test_failures_do_not_stop_the_batch() {
        let dir = tempdir().unwrap();
        let config = config(
            dir.path(),
            vec![spec("Broken", vec![1]), spec("NoGmp", vec![1]), spec("Mul", vec![1])],
        );
        let runner = fake_toolchain(dir.path(), Some("Broken"), Some("NoGmp"));
        let options = CompileOptions { no_clobber: false, native: true };

        let report = compile_circuits(&config, &runner, options).unwrap();
        assert_eq!(report.compiled, vec!["Mul_1_test"]);
        assert_eq!(report.failures.len(), 2);
        assert!(matches!(
            &report.failures[0],
            CliError::CompileFailure { circuit } if circuit == "Broken_1_test"
        ));
        assert!(matches!(
            &report.failures[1],
            CliError::NativeBuildFailure { circuit } if circuit == "NoGmp_1_test"
        ));
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn test_handler_reports_batch_failure() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("zkeys.yml");
        std::fs::write(
            &config_path,
            "out: build\ncircomPath: circom\nsnarkjsPath: snarkjs\nnativeWitness: false\n\
             circuits:\n  - { type: test, component: Broken, template: a.circom, params: [1] }\n",
        )
        .unwrap();
        let runner = fake_toolchain(&dir.path().join("build"), Some("Broken"), None);
        let args = CompileArgs { config: config_path, no_clobber: false, no_native: false };

        let err = handle_compile_command(args, &runner).unwrap_err();
        assert!(matches!(err, CliError::BatchFailed { stage: "compile", failed: 1, total: 1 }));
        assert!(dir.path().join("build/Broken_1_test.circom").exists());
    }
}
