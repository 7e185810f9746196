//! Declarative option schemas.
//!
//! An entity declares the options it accepts as a map of option name to
//! [`OptionSpec`]. Resolving a schema against a parameter map produces a
//! complete [`Configuration`]: each declared option takes its supplied
//! parameter, falls back to its declared default, or fails; any parameter
//! outside the schema fails.

use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};

/// A resolved configuration: option name to value.
pub type Configuration = BTreeMap<String, String>;

/// A single declared option.
#[derive(Debug, Clone, Default)]
pub struct OptionSpec {
    /// Default value used when the parameter is not supplied. An option
    /// without a default is required.
    pub default: Option<String>,
}

impl OptionSpec {
    /// A required option.
    pub fn required() -> Self {
        Self { default: None }
    }

    /// An option with a default value.
    pub fn with_default(value: impl Into<String>) -> Self {
        Self {
            default: Some(value.into()),
        }
    }
}

/// An ordered option schema.
#[derive(Debug, Clone, Default)]
pub struct Options {
    specs: BTreeMap<String, OptionSpec>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an option, replacing any previous declaration of the same name.
    pub fn declare(mut self, name: impl Into<String>, spec: OptionSpec) -> Self {
        self.specs.insert(name.into(), spec);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }

    /// Resolve this schema against a parameter map.
    ///
    /// `owner` names the entity being configured and is used in error
    /// messages only. Resolution is wholesale - the result never depends on
    /// any previously resolved configuration.
    pub fn resolve(&self, owner: &str, params: &Configuration) -> CoreResult<Configuration> {
        for key in params.keys() {
            if !self.specs.contains_key(key) {
                return Err(CoreError::UnexpectedOption {
                    owner: owner.to_string(),
                    option: key.clone(),
                });
            }
        }

        let mut configuration = Configuration::new();
        for (name, spec) in &self.specs {
            let value = match params.get(name) {
                Some(value) => value.clone(),
                None => match &spec.default {
                    Some(default) => default.clone(),
                    None => {
                        return Err(CoreError::MissingOption {
                            owner: owner.to_string(),
                            option: name.clone(),
                        });
                    }
                },
            };

            configuration.insert(name.clone(), value);
        }

        Ok(configuration)
    }
}
