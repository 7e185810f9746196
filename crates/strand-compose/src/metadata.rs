//! Entity metadata.

use std::fmt;

/// A free-form key/value label, aggregated across a build.
///
/// Tags may represent family or sample groupings and are loosely defined,
/// e.g. `("family", "example")`.
pub type Tag = (String, String);

/// Common metadata carried by components, transforms, and blueprints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// A simple name, `[a-z-]` by convention.
    pub name: String,
    /// A pretty-printable name.
    pub verbose_name: String,
    pub description: String,
    /// Semantic version string.
    pub version: String,
    /// A short type descriptor (for blueprints this doubles as the source
    /// file extension, e.g. `cpp`).
    pub kind: String,
    /// A relevant date, e.g. initial publication of the sample. Format
    /// `YYYY-MM-DD HH:MM:SS.ffffff`; informational only.
    pub date: String,
    pub tags: Vec<Tag>,
}

impl Metadata {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            verbose_name: name.clone(),
            name,
            description: String::new(),
            version: version.into(),
            kind: String::new(),
            date: String::new(),
            tags: Vec::new(),
        }
    }

    pub fn verbose_name(mut self, value: impl Into<String>) -> Self {
        self.verbose_name = value.into();
        self
    }

    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = value.into();
        self
    }

    pub fn kind(mut self, value: impl Into<String>) -> Self {
        self.kind = value.into();
        self
    }

    pub fn date(mut self, value: impl Into<String>) -> Self {
        self.date = value.into();
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) [{}]", self.verbose_name, self.version, self.name)
    }
}
