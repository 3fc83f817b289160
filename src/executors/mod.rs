// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shipflow contributors

//! Step executors
//!
//! This module provides the executor trait and implementations for each
//! typed step action (shell, verify_checksum, substitute, wait_for,
//! image_artifact).

mod artifact;
mod checksum;
mod shell;
mod substitute;
mod wait;

pub use artifact::{ArtifactExecutor, ImageDefinition};
pub use checksum::ChecksumExecutor;
pub use shell::ShellExecutor;
pub use substitute::SubstituteExecutor;
pub use wait::WaitExecutor;

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ShipflowError;
use crate::pipeline::Step;

/// Result of step execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Whether execution succeeded
    pub success: bool,

    /// Standard output (or a typed-step summary line)
    pub stdout: String,

    /// Standard error
    pub stderr: String,

    /// Exit code
    pub exit_code: i32,

    /// Files produced or mutated by the step
    pub outputs: Vec<PathBuf>,

    /// Execution duration
    pub duration: Duration,
}

impl ExecutionResult {
    /// Create a successful result
    pub fn success(stdout: String, duration: Duration, outputs: Vec<PathBuf>) -> Self {
        Self {
            success: true,
            stdout,
            stderr: String::new(),
            exit_code: 0,
            outputs,
            duration,
        }
    }

    /// Create a failed result
    pub fn failure(stderr: String, exit_code: i32, duration: Duration) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr,
            exit_code,
            outputs: vec![],
            duration,
        }
    }
}

/// Trait for step executors
///
/// A returned `Err` aborts the run with a diagnostic; a returned failed
/// `ExecutionResult` carries the exit status of an external tool. Both halt
/// the pipeline.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    /// Execute a step
    ///
    /// # Arguments
    /// * `step` - The step configuration
    /// * `working_dir` - The working directory for execution
    /// * `vars` - The resolved variable table for `${NAME}` expansion,
    ///   injected into child processes as environment
    async fn execute(
        &self,
        step: &Step,
        working_dir: &Path,
        vars: &HashMap<String, String>,
    ) -> Result<ExecutionResult, ShipflowError>;

    /// Validate step configuration without executing
    fn validate_step(&self, step: &Step) -> Result<(), ShipflowError>;
}

/// Create the standard executor registry, one per step kind
pub fn create_default_executors() -> HashMap<String, Box<dyn StepExecutor>> {
    let mut executors: HashMap<String, Box<dyn StepExecutor>> = HashMap::new();

    executors.insert("shell".to_string(), Box::new(ShellExecutor::new()));
    executors.insert("verify_checksum".to_string(), Box::new(ChecksumExecutor::new()));
    executors.insert("substitute".to_string(), Box::new(SubstituteExecutor::new()));
    executors.insert("wait_for".to_string(), Box::new(WaitExecutor::new()));
    executors.insert("image_artifact".to_string(), Box::new(ArtifactExecutor::new()));

    executors
}
