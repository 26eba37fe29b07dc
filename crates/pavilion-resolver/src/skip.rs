// crates/pavilion-resolver/src/skip.rs
// ============================================================================
// Module: Skip Condition Evaluation
// Description: Evaluates `only_if`/`not_if` key/pattern conditions against a
//              resolved set of string values.
// Purpose: Decide whether a candidate run should be marked Skipped.
// Dependencies: regex, crate::error
// ============================================================================

//! ## Overview
//! `only_if` is a conjunction: every listed key must have a resolved value
//! that fully matches (implicitly anchored) at least one of its patterns,
//! or the run is skipped. `not_if` is a disjunction: if any listed key's
//! resolved value fully matches any of its patterns, the run is skipped.
//! A key named in either map with no resolved value counts as not matching.

use std::collections::BTreeMap;

use regex::Regex;

use crate::error::ResolverError;

/// Returns `true` if the run should be skipped, given its resolved
/// `only_if`/`not_if` key values.
///
/// # Errors
///
/// Returns [`ResolverError::InvalidRegex`] if any pattern fails to compile.
pub fn should_skip(
    resolved: &BTreeMap<String, String>,
    only_if: &BTreeMap<String, Vec<String>>,
    not_if: &BTreeMap<String, Vec<String>>,
) -> Result<bool, ResolverError> {
    for (key, patterns) in only_if {
        let value = resolved.get(key).map(String::as_str).unwrap_or("");
        if !any_pattern_matches(value, patterns, key)? {
            return Ok(true);
        }
    }

    for (key, patterns) in not_if {
        let value = resolved.get(key).map(String::as_str).unwrap_or("");
        if any_pattern_matches(value, patterns, key)? {
            return Ok(true);
        }
    }

    Ok(false)
}

fn any_pattern_matches(value: &str, patterns: &[String], field: &str) -> Result<bool, ResolverError> {
    for pattern in patterns {
        let anchored = format!("^(?:{pattern})$");
        let regex = Regex::new(&anchored)
            .map_err(|err| ResolverError::InvalidRegex { field: field.to_string(), source: err.to_string() })?;
        if regex.is_match(value) {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_if_conjunction_requires_every_key_to_match() {
        let mut resolved = BTreeMap::new();
        resolved.insert("os".to_string(), "linux".to_string());
        resolved.insert("arch".to_string(), "x86_64".to_string());
        let mut only_if = BTreeMap::new();
        only_if.insert("os".to_string(), vec!["linux".to_string()]);
        only_if.insert("arch".to_string(), vec!["arm.*".to_string()]);
        assert!(should_skip(&resolved, &only_if, &BTreeMap::new()).unwrap());
    }

    #[test]
    fn not_if_disjunction_skips_on_any_match() {
        let mut resolved = BTreeMap::new();
        resolved.insert("os".to_string(), "windows".to_string());
        let mut not_if = BTreeMap::new();
        not_if.insert("os".to_string(), vec!["windows".to_string(), "macos".to_string()]);
        assert!(should_skip(&resolved, &BTreeMap::new(), &not_if).unwrap());
    }

    #[test]
    fn matching_conditions_do_not_skip() {
        let mut resolved = BTreeMap::new();
        resolved.insert("os".to_string(), "linux".to_string());
        let mut only_if = BTreeMap::new();
        only_if.insert("os".to_string(), vec!["linux".to_string()]);
        assert!(!should_skip(&resolved, &only_if, &BTreeMap::new()).unwrap());
    }
}
