// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shipflow contributors

//! Shell executor
//!
//! Runs a command via `shell -c` with the variable table injected as
//! process environment. The exit status of the child is the exit status
//! of the step.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tokio::process::Command;

use super::{ExecutionResult, StepExecutor};
use crate::context::expand;
use crate::errors::ShipflowError;
use crate::pipeline::{Action, Step};

/// Shell executor
pub struct ShellExecutor;

impl ShellExecutor {
    /// Create a new shell executor
    pub fn new() -> Self {
        Self
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepExecutor for ShellExecutor {
    async fn execute(
        &self,
        step: &Step,
        working_dir: &Path,
        vars: &HashMap<String, String>,
    ) -> Result<ExecutionResult, ShipflowError> {
        let Action::Shell { command, shell } = &step.action else {
            return Err(ShipflowError::InvalidStep {
                step: step.name.clone(),
                reason: "Expected shell action".to_string(),
            });
        };

        let resolved = expand(command, vars, &format!("step '{}' command", step.name))?;

        let start = Instant::now();

        let mut cmd = Command::new(shell);
        cmd.arg("-c").arg(&resolved);
        cmd.current_dir(working_dir);
        cmd.envs(vars);

        tracing::debug!(step = %step.name, command = %resolved, "running shell step");

        let output = cmd.output().await.map_err(|e| ShipflowError::ToolExecutionFailed {
            tool: shell.clone(),
            error: e.to_string(),
            help: Some(format!("Shell '{}' may not be available", shell)),
        })?;

        let duration = start.elapsed();
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if output.status.success() {
            Ok(ExecutionResult {
                success: true,
                stdout,
                stderr,
                exit_code: 0,
                outputs: vec![],
                duration,
            })
        } else {
            let exit_code = output.status.code().unwrap_or(-1);
            Ok(ExecutionResult::failure(stderr, exit_code, duration))
        }
    }

    fn validate_step(&self, step: &Step) -> Result<(), ShipflowError> {
        let Action::Shell { command, .. } = &step.action else {
            return Err(ShipflowError::InvalidStep {
                step: step.name.clone(),
                reason: "Not a shell step".to_string(),
            });
        };

        if command.is_empty() {
            return Err(ShipflowError::InvalidStep {
                step: step.name.clone(),
                reason: "Shell command is empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_shell_step(name: &str, command: &str) -> Step {
        Step {
            name: name.into(),
            description: None,
            action: Action::Shell {
                command: command.into(),
                shell: "bash".into(),
            },
            env: HashMap::new(),
        }
    }

    #[test]
    fn test_validate_shell_step() {
        let executor = ShellExecutor::new();
        let step = make_shell_step("test", "echo hello");
        assert!(executor.validate_step(&step).is_ok());
    }

    #[test]
    fn test_validate_empty_command_fails() {
        let executor = ShellExecutor::new();
        let step = make_shell_step("test", "");
        assert!(executor.validate_step(&step).is_err());
    }

    #[tokio::test]
    async fn test_execute_simple_command() {
        let executor = ShellExecutor::new();
        let step = make_shell_step("test", "echo hello");

        let result = executor
            .execute(&step, Path::new("."), &HashMap::new())
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.stdout.contains("hello"));
    }

    #[tokio::test]
    async fn test_failing_command_reports_exit_code() {
        let executor = ShellExecutor::new();
        let step = make_shell_step("test", "exit 7");

        let result = executor
            .execute(&step, Path::new("."), &HashMap::new())
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.exit_code, 7);
    }

    #[tokio::test]
    async fn test_variables_expanded_and_injected() {
        let executor = ShellExecutor::new();
        let step = make_shell_step("test", "echo ${TAG} $TAG");
        let vars = HashMap::from([("TAG".to_string(), "v1".to_string())]);

        let result = executor
            .execute(&step, Path::new("."), &vars)
            .await
            .unwrap();

        assert!(result.success);
        // Expanded by shipflow and present in the child environment
        assert!(result.stdout.contains("v1 v1"));
    }

    #[tokio::test]
    async fn test_undefined_variable_aborts() {
        let executor = ShellExecutor::new();
        let step = make_shell_step("test", "echo ${NOPE}");

        let err = executor
            .execute(&step, Path::new("."), &HashMap::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ShipflowError::UndefinedVariable { .. }));
    }
}
