//! Example components and transforms.
//!
//! Small, fully working entries that double as documentation for writing
//! real catalog entries.

use std::fs;
use std::path::Path;

use strand_compose::{
    ComponentSpec, ComposeResult, Generated, Metadata, TransformKind, TransformSpec,
};
use strand_core::options::{Configuration, OptionSpec, Options};
use strand_core::{substitute, Mode};

use std::collections::BTreeMap;

const MINIMAL_TEMPLATE: &str = include_str!("../templates/minimal-example.cpp");
const CONFIGURATION_TEMPLATE: &str = include_str!("../templates/configuration-example.cpp");

/// A minimal example component: no options, one templated function, one
/// global.
pub struct MinimalExample;

impl ComponentSpec for MinimalExample {
    fn metadata(&self) -> Metadata {
        Metadata::new("minimal-example", "1.0.0")
            .verbose_name("Minimal Example")
            .description("A minimal example component.")
            .kind("example")
            .date("2019-10-01 17:15:00.000000")
            .tag("family", "example")
            .tag("sample", "minimal-example")
    }

    fn blueprints(&self) -> Vec<String> {
        vec!["cmake-cpp".to_string()]
    }

    fn generate(&self, _configuration: &Configuration) -> ComposeResult<Generated> {
        Ok(Generated {
            functions: vec![MINIMAL_TEMPLATE.to_string()],
            calls: BTreeMap::from([(
                "main".to_string(),
                vec!["${minimal_example}(argc, argv);".to_string()],
            )]),
            globals: vec!["minimal_example".to_string()],
            ..Generated::default()
        })
    }
}

/// An example component with configuration: one defaulted option and one
/// required option, both spliced into the template as C string literals.
pub struct ConfigurationExample;

impl ComponentSpec for ConfigurationExample {
    fn metadata(&self) -> Metadata {
        Metadata::new("configuration-example", "1.0.0")
            .verbose_name("Configuration Example")
            .description("A minimal example component with configuration.")
            .kind("example")
            .date("2019-10-01 17:15:00.000000")
            .tag("family", "example")
            .tag("sample", "configuration-example")
    }

    fn options(&self) -> Options {
        Options::new()
            .declare("first_word", OptionSpec::with_default("hello"))
            .declare("second_word", OptionSpec::required())
    }

    fn blueprints(&self) -> Vec<String> {
        vec!["cmake-cpp".to_string()]
    }

    fn generate(&self, configuration: &Configuration) -> ComposeResult<Generated> {
        let quoted: Configuration = configuration
            .iter()
            .map(|(key, value)| (key.clone(), format!("{value:?}")))
            .collect();

        let source = substitute(CONFIGURATION_TEMPLATE, Mode::Safe, &quoted)?;

        Ok(Generated {
            functions: vec![source],
            calls: BTreeMap::from([(
                "main".to_string(),
                vec!["${configuration_example}(argc, argv);".to_string()],
            )]),
            globals: vec!["configuration_example".to_string()],
            ..Generated::default()
        })
    }
}

/// An example source transform that replaces configured text.
pub struct ReplaceTransform;

impl TransformSpec for ReplaceTransform {
    fn metadata(&self) -> Metadata {
        Metadata::new("replace-example", "1.0.0")
            .verbose_name("Replace Example")
            .description("An example source transform that replaces text")
            .tag("family", "example")
    }

    fn options(&self) -> Options {
        Options::new()
            .declare("old", OptionSpec::required())
            .declare("new", OptionSpec::required())
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
        let data = fs::read_to_string(source)?;
        let data = data.replace(&configuration["old"], &configuration["new"]);
        fs::write(destination, data)?;
        Ok(())
    }
}
