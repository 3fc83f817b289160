// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shipflow contributors

//! Substitute executor
//!
//! Replaces every occurrence of a literal placeholder in a template file,
//! in place. A placeholder that does not occur is an error: silently
//! deploying an un-retagged manifest is exactly the failure this exists
//! to prevent.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::{ExecutionResult, StepExecutor};
use crate::context::expand;
use crate::errors::ShipflowError;
use crate::pipeline::{Action, Step};

/// Substitute executor
pub struct SubstituteExecutor;

impl SubstituteExecutor {
    /// Create a new substitute executor
    pub fn new() -> Self {
        Self
    }
}

impl Default for SubstituteExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepExecutor for SubstituteExecutor {
    async fn execute(
        &self,
        step: &Step,
        working_dir: &Path,
        vars: &HashMap<String, String>,
    ) -> Result<ExecutionResult, ShipflowError> {
        let Action::Substitute {
            template,
            placeholder,
            value,
        } = &step.action
        else {
            return Err(ShipflowError::InvalidStep {
                step: step.name.clone(),
                reason: "Expected substitute action".to_string(),
            });
        };

        let start = Instant::now();

        let resolved_path = expand(
            &template.to_string_lossy(),
            vars,
            &format!("step '{}' template", step.name),
        )?;
        let resolved_value = expand(value, vars, &format!("step '{}' value", step.name))?;

        let path = if Path::new(&resolved_path).is_absolute() {
            PathBuf::from(&resolved_path)
        } else {
            working_dir.join(&resolved_path)
        };

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            ShipflowError::FileReadError {
                path: path.clone(),
                error: e.to_string(),
            }
        })?;

        let occurrences = content.matches(placeholder.as_str()).count();
        if occurrences == 0 {
            return Err(ShipflowError::PlaceholderMissing {
                placeholder: placeholder.clone(),
                template: path,
            });
        }

        let rewritten = content.replace(placeholder.as_str(), &resolved_value);

        tokio::fs::write(&path, &rewritten).await.map_err(|e| {
            ShipflowError::FileWriteError {
                path: path.clone(),
                error: e.to_string(),
            }
        })?;

        tracing::debug!(
            step = %step.name,
            template = %path.display(),
            occurrences,
            "placeholder substituted"
        );

        Ok(ExecutionResult::success(
            format!(
                "replaced {occurrences} occurrence{} of '{placeholder}' in {}",
                if occurrences == 1 { "" } else { "s" },
                path.display()
            ),
            start.elapsed(),
            vec![path],
        ))
    }

    fn validate_step(&self, step: &Step) -> Result<(), ShipflowError> {
        let Action::Substitute { placeholder, .. } = &step.action else {
            return Err(ShipflowError::InvalidStep {
                step: step.name.clone(),
                reason: "Not a substitute step".to_string(),
            });
        };

        if placeholder.is_empty() {
            return Err(ShipflowError::InvalidStep {
                step: step.name.clone(),
                reason: "Placeholder is empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn make_substitute_step(template: &Path, placeholder: &str, value: &str) -> Step {
        Step {
            name: "retag".into(),
            description: None,
            action: Action::Substitute {
                template: template.to_path_buf(),
                placeholder: placeholder.into(),
                value: value.into(),
            },
            env: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_replaces_every_occurrence() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"image: CONTAINER_IMAGE\ninitImage: CONTAINER_IMAGE\n")
            .unwrap();

        let vars = HashMap::from([(
            "IMAGE_URI".to_string(),
            "registry.example.com/app:v1".to_string(),
        )]);
        let step = make_substitute_step(tmp.path(), "CONTAINER_IMAGE", "${IMAGE_URI}");
        let executor = SubstituteExecutor::new();

        let result = executor.execute(&step, Path::new("."), &vars).await.unwrap();
        assert!(result.success);
        assert!(result.stdout.contains("replaced 2 occurrences"));

        let rewritten = std::fs::read_to_string(tmp.path()).unwrap();
        assert_eq!(
            rewritten,
            "image: registry.example.com/app:v1\ninitImage: registry.example.com/app:v1\n"
        );
        assert!(!rewritten.contains("CONTAINER_IMAGE"));
    }

    #[tokio::test]
    async fn test_missing_placeholder_is_an_error() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"image: something-else\n").unwrap();

        let step = make_substitute_step(tmp.path(), "CONTAINER_IMAGE", "x");
        let executor = SubstituteExecutor::new();

        let err = executor
            .execute(&step, Path::new("."), &HashMap::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ShipflowError::PlaceholderMissing { .. }));

        // Template untouched on failure
        let content = std::fs::read_to_string(tmp.path()).unwrap();
        assert_eq!(content, "image: something-else\n");
    }

    #[test]
    fn test_validate_rejects_empty_placeholder() {
        let step = make_substitute_step(Path::new("t.yml"), "", "x");
        let executor = SubstituteExecutor::new();
        assert!(executor.validate_step(&step).is_err());
    }
}
