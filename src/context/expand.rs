// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shipflow contributors

//! Variable expansion
//!
//! Resolves `${NAME}` references in step fields against the build context
//! variable table. An unresolved name is an explicit error, never a silent
//! empty string.

use regex::Regex;
use std::collections::HashMap;

use crate::errors::ShipflowError;

const REFERENCE_PATTERN: &str = r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}";

/// Expand every `${NAME}` reference in `input`.
///
/// `location` names the field being expanded, for error reporting.
pub fn expand(
    input: &str,
    vars: &HashMap<String, String>,
    location: &str,
) -> Result<String, ShipflowError> {
    let re = Regex::new(REFERENCE_PATTERN).map_err(|e| ShipflowError::ExecutionFailed {
        message: format!("Invalid reference pattern: {e}"),
        help: None,
    })?;

    let mut result = String::with_capacity(input.len());
    let mut last_end = 0;

    for caps in re.captures_iter(input) {
        let whole = caps.get(0).ok_or_else(|| ShipflowError::ExecutionFailed {
            message: "Empty capture during expansion".into(),
            help: None,
        })?;
        let name = &caps[1];

        let value = vars.get(name).ok_or_else(|| ShipflowError::UndefinedVariable {
            name: name.to_string(),
            location: location.to_string(),
        })?;

        result.push_str(&input[last_end..whole.start()]);
        result.push_str(value);
        last_end = whole.end();
    }

    result.push_str(&input[last_end..]);
    Ok(result)
}

/// Detect a `${` with no closing brace, which usually means a typo
pub fn has_unclosed_reference(input: &str) -> bool {
    match input.rfind("${") {
        Some(pos) => !input[pos..].contains('}'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> HashMap<String, String> {
        HashMap::from([
            ("TAG".to_string(), "app.main.prod.ts.abcdef12".to_string()),
            ("REGISTRY_URI".to_string(), "registry.example.com/app".to_string()),
        ])
    }

    #[test]
    fn test_expand_single_reference() {
        let out = expand("docker push ${REGISTRY_URI}", &vars(), "command").unwrap();
        assert_eq!(out, "docker push registry.example.com/app");
    }

    #[test]
    fn test_expand_multiple_references() {
        let out = expand("${REGISTRY_URI}:${TAG}", &vars(), "image").unwrap();
        assert_eq!(out, "registry.example.com/app:app.main.prod.ts.abcdef12");
    }

    #[test]
    fn test_expand_no_references_is_identity() {
        let out = expand("echo hello", &vars(), "command").unwrap();
        assert_eq!(out, "echo hello");
    }

    #[test]
    fn test_undefined_variable_is_an_error() {
        let err = expand("echo ${MISSING}", &vars(), "command").unwrap_err();
        match err {
            ShipflowError::UndefinedVariable { name, location } => {
                assert_eq!(name, "MISSING");
                assert_eq!(location, "command");
            }
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_shell_positional_vars_left_alone() {
        // $1, $? and friends are shell business, not ours
        let out = expand("test $? -eq 0", &vars(), "command").unwrap();
        assert_eq!(out, "test $? -eq 0");
    }

    #[test]
    fn test_unclosed_reference_detection() {
        assert!(has_unclosed_reference("echo ${TAG"));
        assert!(!has_unclosed_reference("echo ${TAG}"));
        assert!(!has_unclosed_reference("echo plain"));
    }
}
