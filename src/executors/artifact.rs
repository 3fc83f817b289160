// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shipflow contributors

//! Artifact executor
//!
//! Writes the produced image reference as a JSON artifact in the shape the
//! downstream deployment orchestrator consumes:
//! `[{"name": "<container>", "imageUri": "<uri>"}]`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::{ExecutionResult, StepExecutor};
use crate::context::expand;
use crate::errors::ShipflowError;
use crate::pipeline::{Action, Step};

/// One entry of the image definitions artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageDefinition {
    /// Container name
    pub name: String,

    /// Full image URI including tag
    #[serde(rename = "imageUri")]
    pub image_uri: String,
}

/// Artifact executor
pub struct ArtifactExecutor;

impl ArtifactExecutor {
    /// Create a new artifact executor
    pub fn new() -> Self {
        Self
    }
}

impl Default for ArtifactExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepExecutor for ArtifactExecutor {
    async fn execute(
        &self,
        step: &Step,
        working_dir: &Path,
        vars: &HashMap<String, String>,
    ) -> Result<ExecutionResult, ShipflowError> {
        let Action::ImageArtifact {
            path,
            container,
            image,
        } = &step.action
        else {
            return Err(ShipflowError::InvalidStep {
                step: step.name.clone(),
                reason: "Expected image_artifact action".to_string(),
            });
        };

        let start = Instant::now();

        let resolved_path = expand(
            &path.to_string_lossy(),
            vars,
            &format!("step '{}' path", step.name),
        )?;
        let resolved_container =
            expand(container, vars, &format!("step '{}' container", step.name))?;
        let resolved_image = expand(image, vars, &format!("step '{}' image", step.name))?;

        let out_path = if Path::new(&resolved_path).is_absolute() {
            PathBuf::from(&resolved_path)
        } else {
            working_dir.join(&resolved_path)
        };

        let definitions = vec![ImageDefinition {
            name: resolved_container,
            image_uri: resolved_image,
        }];

        let json = serde_json::to_string(&definitions)?;

        if let Some(parent) = out_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ShipflowError::FileWriteError {
                    path: parent.to_path_buf(),
                    error: e.to_string(),
                }
            })?;
        }

        tokio::fs::write(&out_path, &json).await.map_err(|e| {
            ShipflowError::FileWriteError {
                path: out_path.clone(),
                error: e.to_string(),
            }
        })?;

        tracing::debug!(step = %step.name, artifact = %out_path.display(), "image artifact written");

        Ok(ExecutionResult::success(
            format!("wrote {}", out_path.display()),
            start.elapsed(),
            vec![out_path],
        ))
    }

    fn validate_step(&self, step: &Step) -> Result<(), ShipflowError> {
        let Action::ImageArtifact { container, image, .. } = &step.action else {
            return Err(ShipflowError::InvalidStep {
                step: step.name.clone(),
                reason: "Not an image_artifact step".to_string(),
            });
        };

        if container.is_empty() {
            return Err(ShipflowError::InvalidStep {
                step: step.name.clone(),
                reason: "Container name is empty".to_string(),
            });
        }

        if image.is_empty() {
            return Err(ShipflowError::InvalidStep {
                step: step.name.clone(),
                reason: "Image URI is empty".to_string(),
            });
        }

        Ok(())
    }
}
