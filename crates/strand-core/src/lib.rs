//! strand-core: template substitution, option schemas, specification
//! parsing, and external process plumbing.
//!
//! Provides:
//! - `${name}` template substitution with safe and strict modes
//! - Declarative option schemas resolved against parameter maps
//! - The `name:key=value,...` specification mini-language
//! - A subprocess runner with an explicit environment map and binary
//!   discovery helpers

pub mod error;
pub mod options;
pub mod process;
pub mod spec;
pub mod template;

pub use error::{CoreError, CoreResult};
pub use options::{Configuration, OptionSpec, Options};
pub use process::{find_binary, run, Invocation};
pub use spec::{parse_spec, Spec};
pub use template::{substitute, Mode};
