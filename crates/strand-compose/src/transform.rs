//! Transforms: source-to-source and artifact-to-artifact mutation steps.

use std::path::Path;
use std::sync::Arc;

use strand_core::options::{Configuration, Options};

use crate::dependency::Dependency;
use crate::error::{ComposeError, ComposeResult};
use crate::metadata::{Metadata, Tag};

/// Which stage of the build pipeline a transform applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    /// Fed source files, produces modified source files.
    Source,
    /// Fed built artifacts, produces modified artifacts.
    Artifact,
}

impl std::fmt::Display for TransformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformKind::Source => write!(f, "source"),
            TransformKind::Artifact => write!(f, "artifact"),
        }
    }
}

/// A transform implementation.
pub trait TransformSpec: Send + Sync {
    fn metadata(&self) -> Metadata;

    fn options(&self) -> Options {
        Options::new()
    }

    fn kind(&self) -> TransformKind;

    /// Optional validation hook, invoked after option resolution.
    fn validate(&self, _configuration: &Configuration) -> ComposeResult<()> {
        Ok(())
    }

    /// Check if the given target is supported. Defaults to supporting
    /// everything.
    fn supported(&self, _target: &Path) -> bool {
        true
    }

    /// Apply this transform, reading `source` and writing `destination`.
    fn apply(
        &self,
        configuration: &Configuration,
        source: &Path,
        destination: &Path,
    ) -> ComposeResult<()>;

    fn dependencies(&self) -> Vec<Arc<dyn Dependency>> {
        Vec::new()
    }
}

/// One configured instance of a transform implementation.
#[derive(Clone)]
pub struct Transform {
    spec: Arc<dyn TransformSpec>,
    metadata: Metadata,
    configuration: Option<Configuration>,
}

impl Transform {
    pub fn new(spec: Arc<dyn TransformSpec>) -> Self {
        let metadata = spec.metadata();
        Self {
            spec,
            metadata,
            configuration: None,
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

    pub fn kind(&self) -> TransformKind {
        self.spec.kind()
    }

    pub fn configured(&self) -> bool {
        self.configuration.is_some() || self.spec.options().is_empty()
    }

    /// Parse and store configuration parameters; same semantics as
    /// `Component::configure`.
    pub fn configure(&mut self, params: &Configuration) -> ComposeResult<()> {
        let configuration = self.spec.options().resolve(self.name(), params)?;

        if let Err(e) = self.spec.validate(&configuration) {
            self.configuration = None;
            return Err(e);
        }

        self.configuration = Some(configuration);
        Ok(())
    }

    pub fn supported(&self, target: &Path) -> bool {
        self.spec.supported(target)
    }

    /// Apply this transform to `source`, writing `destination`.
    pub fn apply(&self, source: &Path, destination: &Path) -> ComposeResult<()> {
        let configuration = match &self.configuration {
            Some(configuration) => configuration.clone(),
            None if self.spec.options().is_empty() => Configuration::new(),
            None => {
                return Err(ComposeError::NotConfigured {
                    what: self.metadata.to_string(),
                });
            }
        };

        self.spec.apply(&configuration, source, destination)
    }

    pub fn dependencies(&self) -> Vec<Arc<dyn Dependency>> {
        self.spec.dependencies()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_core::options::OptionSpec;

    struct UppercaseSpec;

    impl TransformSpec for UppercaseSpec {
        fn metadata(&self) -> Metadata {
            Metadata::new("uppercase", "0.1.0").tag("test", "transform-test")
        }

        fn options(&self) -> Options {
            Options::new().declare("suffix", OptionSpec::required())
        }

        fn kind(&self) -> TransformKind {
            TransformKind::Source
        }

        fn apply(
            &self,
            configuration: &Configuration,
            source: &Path,
            destination: &Path,
        ) -> ComposeResult<()> {
            let data = std::fs::read_to_string(source)?;
            std::fs::write(
                destination,
                format!("{}{}", data.to_uppercase(), configuration["suffix"]),
            )?;
            Ok(())
        }
    }

    #[test]
    fn unconfigured_apply_fails() {
        let transform = Transform::new(Arc::new(UppercaseSpec));
        let err = transform
            .apply(Path::new("in"), Path::new("out"))
            .unwrap_err();
        assert!(matches!(err, ComposeError::NotConfigured { .. }));
    }

    #[test]
    fn configured_apply_runs() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("input.txt");
        let destination = dir.path().join("output.txt");
        std::fs::write(&source, "hello").unwrap();

        let mut transform = Transform::new(Arc::new(UppercaseSpec));
        transform
            .configure(&Configuration::from([("suffix".to_string(), "!".to_string())]))
            .unwrap();
        transform.apply(&source, &destination).unwrap();

        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "HELLO!");
    }

    #[test]
    fn kind_display() {
        assert_eq!(TransformKind::Source.to_string(), "source");
        assert_eq!(TransformKind::Artifact.to_string(), "artifact");
    }
}
