//! The `name:key=value,...` specification mini-language.
//!
//! Components and transforms can be specified on a single line with inline
//! configuration:
//!
//! ```text
//! configuration-example:first=something,second="another thing"
//! ```
//!
//! A bare `name` parses to an empty configuration. Values may be quoted with
//! single or double quotes, in which case they may contain commas.

use crate::error::{CoreError, CoreResult};
use crate::options::Configuration;

/// A parsed specification: a name plus inline configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spec {
    pub name: String,
    pub configuration: Configuration,
}

/// Parse a specification string.
pub fn parse_spec(specification: &str) -> CoreResult<Spec> {
    let malformed = |what| CoreError::MalformedSpec {
        spec: specification.to_string(),
        what,
    };

    let (name, rest) = match specification.split_once(':') {
        None => {
            return Ok(Spec {
                name: specification.trim_matches('"').to_string(),
                configuration: Configuration::new(),
            });
        }
        Some((name, rest)) => (name.trim_matches('"').to_string(), rest),
    };

    if name.is_empty() {
        return Err(malformed("empty name"));
    }

    let mut configuration = Configuration::new();

    for pair in split_pairs(rest) {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(malformed("expected key=value"));
        };

        let key = key.trim();
        if key.is_empty() {
            return Err(malformed("empty key"));
        }

        let value = value.trim();
        let value = value
            .strip_prefix('\'')
            .and_then(|v| v.strip_suffix('\''))
            .or_else(|| value.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
            .unwrap_or(value);

        configuration.insert(key.to_string(), value.to_string());
    }

    Ok(Spec {
        name,
        configuration,
    })
}

/// Split a configuration section on commas, honoring quoted values.
fn split_pairs(section: &str) -> Vec<String> {
    let mut pairs = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in section.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => {
                    current.push(c);
                    quote = Some(c);
                }
                ',' => {
                    if !current.trim().is_empty() {
                        pairs.push(std::mem::take(&mut current));
                    } else {
                        current.clear();
                    }
                }
                _ => current.push(c),
            },
        }
    }

    if !current.trim().is_empty() {
        pairs.push(current);
    }

    pairs
}
