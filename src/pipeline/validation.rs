// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shipflow contributors

//! Pipeline validation
//!
//! Structural validation of a pipeline before execution.

use std::collections::HashSet;
use std::path::Path;

use crate::context::has_unclosed_reference;
use crate::errors::ShipflowError;
use crate::executors::create_default_executors;
use crate::pipeline::{Action, PhaseName, Pipeline, Step};

/// Pipeline validator
pub struct PipelineValidator;

impl PipelineValidator {
    /// Validate a pipeline configuration
    pub fn validate(pipeline: &Pipeline) -> Result<ValidationResult, ShipflowError> {
        let mut result = ValidationResult::new();

        if pipeline.phases.is_empty() {
            result.add_error("Pipeline has no steps in any phase");
        }

        let executors = create_default_executors();

        for phase in PhaseName::ALL {
            let steps = pipeline.phases.steps(phase);

            // Duplicate step names within a phase
            let mut seen_names = HashSet::new();
            for step in steps {
                if !seen_names.insert(&step.name) {
                    result.add_error(&format!(
                        "Phase '{}': duplicate step name '{}'",
                        phase, step.name
                    ));
                }
            }

            for step in steps {
                if let Some(executor) = executors.get(step.kind()) {
                    if let Err(e) = executor.validate_step(step) {
                        result.add_error(&e.to_string());
                    }
                }

                Self::check_references(phase, step, &mut result);
            }
        }

        Ok(result)
    }

    /// Warn about `${` references that can never resolve
    fn check_references(phase: PhaseName, step: &Step, result: &mut ValidationResult) {
        let fields: Vec<(&str, String)> = match &step.action {
            Action::Shell { command, .. } => vec![("command", command.clone())],
            Action::VerifyChecksum { file, .. } => {
                vec![("file", file.to_string_lossy().into_owned())]
            }
            Action::Substitute { template, value, .. } => vec![
                ("template", template.to_string_lossy().into_owned()),
                ("value", value.clone()),
            ],
            Action::WaitFor { command, .. } => vec![("command", command.clone())],
            Action::ImageArtifact { path, container, image } => vec![
                ("path", path.to_string_lossy().into_owned()),
                ("container", container.clone()),
                ("image", image.clone()),
            ],
        };

        for (field, content) in fields {
            if has_unclosed_reference(&content) {
                result.add_warning(&format!(
                    "Phase '{}', step '{}': unclosed '${{' in {}",
                    phase, step.name, field
                ));
            }
        }
    }

    /// Check that substitute templates exist (runtime validation)
    pub fn validate_files(pipeline: &Pipeline, base_path: &Path) -> Vec<String> {
        let mut missing = Vec::new();

        for phase in PhaseName::ALL {
            for step in pipeline.phases.steps(phase) {
                if let Action::Substitute { template, .. } = &step.action {
                    // Templates with variable references resolve at run time
                    if template.to_string_lossy().contains("${") {
                        continue;
                    }

                    let full_path = if template.is_absolute() {
                        template.clone()
                    } else {
                        base_path.join(template)
                    };

                    if !full_path.exists() {
                        missing.push(format!(
                            "Step '{}': template not found: {}",
                            step.name,
                            template.display()
                        ));
                    }
                }
            }
        }

        missing
    }
}

/// Result of pipeline validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
