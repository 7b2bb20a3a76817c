//! Parsing of controller model strings and privilege lists

use crate::error::{RedfishError, Result};
use regex::Regex;
use std::str::FromStr;

/// Generation marker reported by iDRAC models that lack custom roles
const LEGACY_GENERATION: &str = r"1[2-6]G";

/// Returns the legacy generation marker (e.g. "14G") found in `model`, if any
pub fn legacy_generation(model: &str) -> Option<String> {
    Regex::new(LEGACY_GENERATION)
        .ok()?
        .find(model)
        .map(|m| m.as_str().to_string())
}

/// Split a comma-separated privilege list into typed privileges.
///
/// A value without a comma yields a single-element list. Tokens are trimmed;
/// empty or unknown tokens are rejected.
pub fn parse_privileges<T>(input: &str) -> Result<Vec<T>>
where
    T: FromStr<Err = RedfishError>,
{
    input
        .split(',')
        .map(str::trim)
        .map(|token| {
            if token.is_empty() {
                Err(RedfishError::InvalidInvocation(format!(
                    "empty privilege in list '{}'",
                    input
                )))
            } else {
                token.parse()
            }
        })
        .collect()
}

/// Role names are restricted to letters, digits, dash and underscore
pub fn is_valid_role_name(name: &str) -> bool {
    Regex::new(r"^[A-Za-z0-9_-]+$")
        .map(|re| re.is_match(name))
        .unwrap_or(false)
}
