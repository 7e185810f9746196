//! Components: configurable units of source code.
//!
//! A component implementation ([`ComponentSpec`]) describes metadata, an
//! option schema, the blueprints it supports, and how to generate source
//! fragments from a resolved configuration. A [`Component`] is one instance
//! of an implementation and carries the full lifecycle:
//!
//! ```text
//! new -> configure(params) -> generate() -> finalize(rng)
//! ```
//!
//! `configure` may be repeated and always replaces prior configuration
//! wholesale. `finalize` substitutes a fresh, unpredictable suffix for every
//! declared global so that several instances of the same implementation can
//! coexist in one build, then freezes the instance.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::RngCore;
use tracing::debug;

use strand_core::{
    options::{Configuration, Options},
    template::{self, Mode},
    CoreError,
};

use crate::dependency::Dependency;
use crate::error::{ComposeError, ComposeResult};
use crate::metadata::{Metadata, Tag};

/// Output of component generation.
#[derive(Debug, Clone, Default)]
pub struct Generated {
    /// Source fragments, in order.
    pub functions: Vec<String>,
    /// Callsite name to ordered call strings.
    pub calls: BTreeMap<String, Vec<String>>,
    /// Template parameter names that must be globally unique. Every name
    /// listed here must occur as a `${name}` token somewhere in `functions`
    /// or `calls`.
    pub globals: Vec<String>,
    /// System libraries to link against (blueprint-dependent).
    pub libraries: Vec<String>,
    /// Extra preprocessor search paths (blueprint-dependent).
    pub include_dirs: Vec<String>,
}

/// A component implementation.
pub trait ComponentSpec: Send + Sync {
    fn metadata(&self) -> Metadata;

    /// Declared option schema. Implementations without options are
    /// configured by default.
    fn options(&self) -> Options {
        Options::new()
    }

    /// Names of the blueprints this component supports. These must match the
    /// corresponding blueprint metadata names.
    fn blueprints(&self) -> Vec<String>;

    /// Optional validation hook, invoked after option resolution. On error
    /// the instance reverts to unconfigured.
    fn validate(&self, _configuration: &Configuration) -> ComposeResult<()> {
        Ok(())
    }

    /// Generate source fragments from a resolved configuration.
    fn generate(&self, configuration: &Configuration) -> ComposeResult<Generated>;

    fn dependencies(&self) -> Vec<Arc<dyn Dependency>> {
        Vec::new()
    }
}

/// Identity of a single component instance.
///
/// Instance ids are minted once per constructed `Component` and preserved by
/// `Clone`, so a cloned finalized instance is still recognized as the same
/// instance during blueprint sanity checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

impl InstanceId {
    fn mint() -> Self {
        Self(NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed))
    }
}

/// One configurable instance of a component implementation.
#[derive(Clone)]
pub struct Component {
    spec: Arc<dyn ComponentSpec>,
    metadata: Metadata,
    instance: InstanceId,
    configuration: Option<Configuration>,
    generated: Option<Generated>,
    finalized: bool,
}

impl Component {
    pub fn new(spec: Arc<dyn ComponentSpec>) -> Self {
        let metadata = spec.metadata();
        Self {
            spec,
            metadata,
            instance: InstanceId::mint(),
            configuration: None,
            generated: None,
            finalized: false,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn tags(&self) -> &[Tag] {
        &self.metadata.tags
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn blueprints(&self) -> Vec<String> {
        self.spec.blueprints()
    }

    /// An instance with no declared options is configured by default.
    pub fn configured(&self) -> bool {
        self.configuration.is_some() || self.spec.options().is_empty()
    }

    pub fn generated(&self) -> bool {
        self.generated.is_some()
    }

    pub fn finalized(&self) -> bool {
        self.finalized
    }

    /// Parse and store configuration parameters.
    ///
    /// Repeatable; each call replaces the previous configuration wholesale.
    /// If the implementation's validation hook rejects the resolved values,
    /// the instance reverts to unconfigured.
    pub fn configure(&mut self, params: &Configuration) -> ComposeResult<()> {
        let configuration = self.spec.options().resolve(self.name(), params)?;

        if let Err(e) = self.spec.validate(&configuration) {
            self.configuration = None;
            return Err(e);
        }

        self.configuration = Some(configuration);
        Ok(())
    }

    /// The resolved configuration, failing if not yet configured.
    pub fn configuration(&self) -> ComposeResult<Configuration> {
        match &self.configuration {
            Some(configuration) => Ok(configuration.clone()),
            None if self.spec.options().is_empty() => Ok(Configuration::new()),
            None => Err(ComposeError::NotConfigured {
                what: self.metadata.to_string(),
            }),
        }
    }

    /// Generate source fragments for this instance.
    pub fn generate(&mut self) -> ComposeResult<()> {
        if self.finalized {
            return Err(ComposeError::AlreadyFinalized {
                what: self.metadata.to_string(),
            });
        }

        let configuration = self.configuration()?;
        self.generated = Some(self.spec.generate(&configuration)?);
        Ok(())
    }

    /// Make this instance unique.
    ///
    /// Generates one fresh 128-bit suffix per declared global and strictly
    /// substitutes every `${global}` occurrence across every function body
    /// and call string, then freezes the instance. Requires the instance to
    /// be configured and generated, and may run at most once.
    pub fn finalize(&mut self, rng: &mut dyn RngCore) -> ComposeResult<()> {
        if self.finalized {
            return Err(ComposeError::AlreadyFinalized {
                what: self.metadata.to_string(),
            });
        }

        if !self.configured() {
            return Err(ComposeError::NotConfigured {
                what: self.metadata.to_string(),
            });
        }

        let Some(generated) = self.generated.clone() else {
            return Err(ComposeError::NotGenerated {
                what: self.metadata.to_string(),
            });
        };

        let mut suffixes = BTreeMap::new();
        for global in &generated.globals {
            suffixes.insert(global.clone(), format!("{global}_{}", hex128(rng)));
        }

        for global in &generated.globals {
            let in_functions = generated
                .functions
                .iter()
                .any(|f| template::tokens(f).iter().any(|t| t == global));
            let in_calls = generated
                .calls
                .values()
                .flatten()
                .any(|c| template::tokens(c).iter().any(|t| t == global));

            if !in_functions && !in_calls {
                return Err(ComposeError::UnusedGlobal {
                    component: self.metadata.to_string(),
                    global: global.clone(),
                });
            }
        }

        let unresolved = |e: CoreError| match e {
            CoreError::MissingParameter { name } => ComposeError::UnresolvedParameter {
                component: self.metadata.to_string(),
                name,
            },
            other => ComposeError::Core(other),
        };

        let mut finalized = generated;

        for function in &mut finalized.functions {
            *function = template::substitute(function, Mode::Strict, &suffixes)
                .map_err(unresolved)?;
        }

        for calls in finalized.calls.values_mut() {
            for call in calls {
                *call = template::substitute(call, Mode::Strict, &suffixes)
                    .map_err(unresolved)?;
            }
        }

        debug!(component = %self.metadata.name, globals = finalized.globals.len(), "finalized");

        self.generated = Some(finalized);
        self.finalized = true;
        Ok(())
    }

    /// Finalize with an operating-system random source.
    pub fn finalize_random(&mut self) -> ComposeResult<()> {
        self.finalize(&mut rand::thread_rng())
    }

    pub fn functions(&self) -> &[String] {
        self.generated
            .as_ref()
            .map(|g| g.functions.as_slice())
            .unwrap_or(&[])
    }

    pub fn calls(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        self.generated.as_ref().map(|g| &g.calls)
    }

    pub fn libraries(&self) -> &[String] {
        self.generated
            .as_ref()
            .map(|g| g.libraries.as_slice())
            .unwrap_or(&[])
    }

    pub fn include_dirs(&self) -> &[String] {
        self.generated
            .as_ref()
            .map(|g| g.include_dirs.as_slice())
            .unwrap_or(&[])
    }

    pub fn dependencies(&self) -> Vec<Arc<dyn Dependency>> {
        self.spec.dependencies()
    }
}

fn hex128(rng: &mut dyn RngCore) -> String {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
