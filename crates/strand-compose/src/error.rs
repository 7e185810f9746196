//! Error types for composition and the build pipeline.

use thiserror::Error;

pub type ComposeResult<T> = Result<T, ComposeError>;

#[derive(Error, Debug)]
pub enum ComposeError {
    // Lifecycle errors.
    #[error("{what} has not been configured yet")]
    NotConfigured { what: String },

    #[error("{what} has not been generated yet")]
    NotGenerated { what: String },

    #[error("{what} has already been finalized")]
    AlreadyFinalized { what: String },

    #[error(
        "{component}: global {global:?} does not occur in any function or call \
         (hint: double check your globals list)"
    )]
    UnusedGlobal { component: String, global: String },

    #[error(
        "{component}: unresolved parameter {name:?} \
         (hint: double check your globals list and options parameters)"
    )]
    UnresolvedParameter { component: String, name: String },

    // Composition errors, raised eagerly at Blueprint construction.
    #[error("components must be finalized before incorporating them in a blueprint: {component}")]
    UnfinalizedComponent { component: String },

    #[error("{component} does not support {blueprint} - supported blueprint list: {supported}")]
    UnsupportedBlueprint {
        component: String,
        blueprint: String,
        supported: String,
    },

    #[error("{component} includes an invalid callsite for {blueprint}: {callsite}")]
    InvalidCallsite {
        component: String,
        blueprint: String,
        callsite: String,
    },

    #[error("transforms must be configured before incorporating them in a blueprint: {transform}")]
    UnconfiguredTransform { transform: String },

    #[error("duplicated components are supported but must be uniquely finalized: {component}")]
    DuplicateComponent { component: String },

    #[error("blueprint is not sane: {what}")]
    NotSane { what: String },

    // Pipeline failures.
    #[error("unsupported {kind} transform: {transform}")]
    UnsupportedTransform { transform: String, kind: String },

    #[error("build failure: {what}")]
    BuildFailure { what: String },

    // Registry misses.
    #[error("no {namespace} implementation registered under {name:?}")]
    NotFound {
        namespace: &'static str,
        name: String,
    },

    // Dependency errors.
    #[error("dependencies have not been installed for {what}: {missing} (hint: install them first)")]
    NotInstalled { what: String, missing: String },

    #[error("{what} must be installed manually{help}")]
    ManualInstall { what: String, help: String },

    // Configuration documents.
    #[error("invalid build configuration: {what}")]
    ConfigurationError { what: String },

    #[error(transparent)]
    Core(#[from] strand_core::CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ComposeError::UnusedGlobal {
            component: "demo".into(),
            global: "entry".into(),
        };
        assert!(err.to_string().contains("globals list"));

        let err = ComposeError::NotFound {
            namespace: "components",
            name: "missing".into(),
        };
        assert!(err.to_string().contains("components"));
        assert!(err.to_string().contains("missing"));
    }
}
