//! Process execution boundary
//!
//! Every external tool the pipeline drives goes through [`ProcessRunner`], so
//! stages can be exercised against a scripted runner in tests.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// What happens to a child's stdout and stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Collected into [`ProcessOutput`]
    Capture,
    /// Passed through to the terminal, for long running tools with progress output
    Inherit,
}

/// A fully specified external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub current_dir: Option<PathBuf>,
    pub output: OutputMode,
}

impl Invocation {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            current_dir: None,
            output: OutputMode::Inherit,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    pub fn capture(mut self) -> Self {
        self.output = OutputMode::Capture;
        self
    }

    pub fn program_lossy(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    pub fn args_lossy(&self) -> Vec<String> {
        self.args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Exit status and captured output of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success() -> Self {
        Self { code: Some(0), ..Self::default() }
    }

    pub fn failure(code: i32) -> Self {
        Self { code: Some(code), ..Self::default() }
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external commands synchronously
pub trait ProcessRunner {
    /// Run `invocation` to completion. Only a failure to start the process is
    /// an `Err`; a non-zero exit is reported through [`ProcessOutput::code`].
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput>;
}

/// Runs commands on the host with [`std::process::Command`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(dir) = &invocation.current_dir {
            command.current_dir(dir);
        }

        match invocation.output {
            OutputMode::Capture => {
                let output = command.stdin(Stdio::null()).output()?;
                Ok(ProcessOutput {
                    code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
            OutputMode::Inherit => {
                let status = command.status()?;
                Ok(ProcessOutput { code: status.code(), ..ProcessOutput::default() })
            }
        }
    }
}
