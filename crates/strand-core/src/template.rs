//! `${name}` template substitution.
//!
//! Templates are plain strings containing `${name}` tokens. Substitution
//! runs in one of two modes:
//!
//! - [`Mode::Safe`]: unknown tokens are left verbatim in the output.
//! - [`Mode::Strict`]: any unresolved token is an error naming the token.
//!
//! A structurally malformed template (an unterminated `${`) fails in both
//! modes. A `$` that is not followed by `{` is ordinary text.

use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};

/// Substitution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Leave unresolved tokens in place.
    Safe,
    /// Fail on any unresolved token.
    Strict,
}

fn valid_token(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Substitute `${name}` tokens in `template` from `params`.
pub fn substitute(
    template: &str,
    mode: Mode,
    params: &BTreeMap<String, String>,
) -> CoreResult<String> {
    let mut output = String::with_capacity(template.len());
    let bytes = template.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'$' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            let start = i;
            let rest = &template[i + 2..];
            let Some(end) = rest.find('}') else {
                return Err(CoreError::MalformedTemplate { position: start });
            };

            let name = &rest[..end];
            if !valid_token(name) {
                return Err(CoreError::MalformedTemplate { position: start });
            }

            match params.get(name) {
                Some(value) => output.push_str(value),
                None => match mode {
                    Mode::Safe => {
                        output.push_str(&template[start..i + 2 + end + 1]);
                    }
                    Mode::Strict => {
                        return Err(CoreError::MissingParameter {
                            name: name.to_string(),
                        });
                    }
                },
            }

            i += 2 + end + 1;
        } else {
            let ch = template[i..].chars().next().expect("in-bounds char");
            output.push(ch);
            i += ch.len_utf8();
        }
    }

    Ok(output)
}

/// Collect the token names present in `template`, in order of appearance.
///
/// Malformed tokens are skipped; callers that care about structure should
/// substitute first.
pub fn tokens(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let bytes = template.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'$' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            let rest = &template[i + 2..];
            if let Some(end) = rest.find('}') {
                let name = &rest[..end];
                if valid_token(name) {
                    names.push(name.to_string());
                }
                i += 2 + end + 1;
                continue;
            }
        }
        i += 1;
    }

    names
}
