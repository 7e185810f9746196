//! External process invocation and binary discovery.
//!
//! Toolchain invocations are blocking, synchronous calls. Any environment a
//! build needs is passed as an explicit per-invocation map; the shared
//! process environment is never mutated.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{CoreError, CoreResult};

/// A single external command invocation.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory. Defaults to the current directory.
    pub cwd: Option<PathBuf>,
    /// Extra environment variables for this invocation only.
    pub env: BTreeMap<String, String>,
    /// File to append captured stdout to. Inherited when unset.
    pub stdout: Option<PathBuf>,
    /// File to append captured stderr to. Inherited when unset.
    pub stderr: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }
}

fn capture(path: Option<&Path>) -> CoreResult<Stdio> {
    match path {
        Some(path) => {
            let file = File::options().create(true).append(true).open(path)?;
            Ok(Stdio::from(file))
        }
        None => Ok(Stdio::inherit()),
    }
}

/// Run an invocation to completion.
///
/// A non-zero exit status is an error carrying the program name and status
/// code. Signal-terminated processes report status `-1`.
pub fn run(invocation: &Invocation) -> CoreResult<()> {
    debug!(program = %invocation.program, args = ?invocation.args, "spawning");

    let mut command = Command::new(&invocation.program);
    command.args(&invocation.args);

    if let Some(cwd) = &invocation.cwd {
        command.current_dir(cwd);
    }

    command.envs(&invocation.env);
    command.stdout(capture(invocation.stdout.as_deref())?);
    command.stderr(capture(invocation.stderr.as_deref())?);

    let status = command.status()?;

    if !status.success() {
        return Err(CoreError::CommandFailed {
            program: invocation.program.clone(),
            status: status.code().unwrap_or(-1),
        });
    }

    Ok(())
}

/// Find a binary on this system.
///
/// Checks, in order: the value of the environment variable `env_var` (if
/// given), each directory on `PATH`, and finally the hardcoded `guesses`.
pub fn find_binary(name: &str, env_var: Option<&str>, guesses: &[PathBuf]) -> Option<PathBuf> {
    if let Some(var) = env_var {
        if let Ok(value) = std::env::var(var) {
            let path = PathBuf::from(value);
            if path.is_file() {
                return Some(path);
            }
        }
    }

    if let Some(paths) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&paths) {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }

    guesses.iter().find(|path| path.is_file()).cloned()
}
