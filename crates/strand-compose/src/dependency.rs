//! External dependency declarations.
//!
//! Components, transforms, and blueprints may depend on external tools. A
//! dependency knows how to check its own installation status and is consulted
//! before the owning implementation is instantiated. Installation here is
//! limited to pointing the user at what is missing; package-manager
//! integration is deliberately left to the surrounding tooling.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{ComposeError, ComposeResult};

/// A named external requirement.
pub trait Dependency: Send + Sync {
    fn name(&self) -> &str;

    /// Check whether this dependency is already installed.
    fn installed(&self) -> bool;

    /// Install this dependency, or explain how to.
    fn install(&self) -> ComposeResult<()>;
}

/// A binary that must be reachable on `PATH` (or behind an environment
/// variable override).
pub struct BinaryDependency {
    binary: String,
    env_var: Option<String>,
    guesses: Vec<PathBuf>,
    help: Option<String>,
}

impl BinaryDependency {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            env_var: None,
            guesses: Vec::new(),
            help: None,
        }
    }

    pub fn env_var(mut self, var: impl Into<String>) -> Self {
        self.env_var = Some(var.into());
        self
    }

    pub fn guess(mut self, path: impl Into<PathBuf>) -> Self {
        self.guesses.push(path.into());
        self
    }

    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }

    /// Locate the binary, honoring the environment override and guesses.
    pub fn find(&self) -> Option<PathBuf> {
        strand_core::find_binary(&self.binary, self.env_var.as_deref(), &self.guesses)
    }
}

impl Dependency for BinaryDependency {
    fn name(&self) -> &str {
        &self.binary
    }

    fn installed(&self) -> bool {
        self.find().is_some()
    }

    fn install(&self) -> ComposeResult<()> {
        Err(ComposeError::ManualInstall {
            what: self.binary.clone(),
            help: self
                .help
                .as_ref()
                .map(|h| format!(" ({h})"))
                .unwrap_or_default(),
        })
    }
}

/// A dependency that must always be installed by hand.
pub struct ManualDependency {
    name: String,
    help: Option<String>,
}

impl ManualDependency {
    pub fn new(name: impl Into<String>, help: Option<String>) -> Self {
        Self {
            name: name.into(),
            help,
        }
    }
}

impl Dependency for ManualDependency {
    fn name(&self) -> &str {
        &self.name
    }

    fn installed(&self) -> bool {
        false
    }

    fn install(&self) -> ComposeResult<()> {
        Err(ComposeError::ManualInstall {
            what: self.name.clone(),
            help: self
                .help
                .as_ref()
                .map(|h| format!(" ({h})"))
                .unwrap_or_default(),
        })
    }
}

/// Fail unless every dependency of `what` is installed.
pub fn ensure_installed(what: &str, dependencies: &[Arc<dyn Dependency>]) -> ComposeResult<()> {
    let missing: Vec<&str> = dependencies
        .iter()
        .filter(|d| !d.installed())
        .map(|d| d.name())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ComposeError::NotInstalled {
            what: what.to_string(),
            missing: missing.join(", "),
        })
    }
}
