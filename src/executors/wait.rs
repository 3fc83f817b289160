// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shipflow contributors

//! Wait executor
//!
//! Polls a readiness command at a fixed interval until it exits 0 or the
//! window elapses. The only retry semantics in the system.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::process::Command;

use super::{ExecutionResult, StepExecutor};
use crate::context::expand;
use crate::errors::ShipflowError;
use crate::pipeline::{Action, Step};

/// Wait executor
pub struct WaitExecutor;

impl WaitExecutor {
    /// Create a new wait executor
    pub fn new() -> Self {
        Self
    }
}

impl Default for WaitExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepExecutor for WaitExecutor {
    async fn execute(
        &self,
        step: &Step,
        working_dir: &Path,
        vars: &HashMap<String, String>,
    ) -> Result<ExecutionResult, ShipflowError> {
        let Action::WaitFor {
            command,
            interval_secs,
            timeout_secs,
            shell,
        } = &step.action
        else {
            return Err(ShipflowError::InvalidStep {
                step: step.name.clone(),
                reason: "Expected wait_for action".to_string(),
            });
        };

        let resolved = expand(command, vars, &format!("step '{}' command", step.name))?;

        let start = Instant::now();
        let deadline = start + Duration::from_secs(*timeout_secs);
        let interval = Duration::from_secs(*interval_secs);
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            let mut cmd = Command::new(shell);
            cmd.arg("-c").arg(&resolved);
            cmd.current_dir(working_dir);
            cmd.envs(vars);

            let output = cmd.output().await.map_err(|e| ShipflowError::ToolExecutionFailed {
                tool: shell.clone(),
                error: e.to_string(),
                help: Some(format!("Shell '{}' may not be available", shell)),
            })?;

            if output.status.success() {
                tracing::debug!(step = %step.name, attempts, "readiness signal observed");
                return Ok(ExecutionResult::success(
                    format!("ready after {attempts} attempt{}", if attempts == 1 { "" } else { "s" }),
                    start.elapsed(),
                    vec![],
                ));
            }

            if Instant::now() + interval > deadline {
                return Err(ShipflowError::WaitTimeout {
                    step: step.name.clone(),
                    timeout_secs: *timeout_secs,
                });
            }

            tokio::time::sleep(interval).await;
        }
    }

    fn validate_step(&self, step: &Step) -> Result<(), ShipflowError> {
        let Action::WaitFor {
            command,
            interval_secs,
            timeout_secs,
            ..
        } = &step.action
        else {
            return Err(ShipflowError::InvalidStep {
                step: step.name.clone(),
                reason: "Not a wait_for step".to_string(),
            });
        };

        if command.is_empty() {
            return Err(ShipflowError::InvalidStep {
                step: step.name.clone(),
                reason: "Readiness command is empty".to_string(),
            });
        }

        if *interval_secs == 0 {
            return Err(ShipflowError::InvalidStep {
                step: step.name.clone(),
                reason: "interval_secs must be at least 1".to_string(),
            });
        }

        if *timeout_secs < *interval_secs {
            return Err(ShipflowError::InvalidStep {
                step: step.name.clone(),
                reason: "timeout_secs must be at least interval_secs".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_wait_step(command: &str, interval_secs: u64, timeout_secs: u64) -> Step {
        Step {
            name: "rollout".into(),
            description: None,
            action: Action::WaitFor {
                command: command.into(),
                interval_secs,
                timeout_secs,
                shell: "bash".into(),
            },
            env: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_immediate_success() {
        let executor = WaitExecutor::new();
        let step = make_wait_step("true", 1, 15);

        let result = executor
            .execute(&step, Path::new("."), &HashMap::new())
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.stdout.contains("1 attempt"));
    }

    #[tokio::test]
    async fn test_times_out_when_signal_never_observed() {
        let executor = WaitExecutor::new();
        let step = make_wait_step("false", 1, 1);

        let err = executor
            .execute(&step, Path::new("."), &HashMap::new())
            .await
            .unwrap_err();

        match err {
            ShipflowError::WaitTimeout { timeout_secs, .. } => assert_eq!(timeout_secs, 1),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_succeeds_on_later_attempt() {
        let tmp = tempfile::tempdir().unwrap();
        let marker = tmp.path().join("ready");

        // First attempt creates the marker and fails, second sees it
        let command = format!(
            "test -f {m} || {{ touch {m}; exit 1; }}",
            m = marker.display()
        );

        let executor = WaitExecutor::new();
        let step = make_wait_step(&command, 1, 15);

        let result = executor
            .execute(&step, Path::new("."), &HashMap::new())
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.stdout.contains("2 attempts"));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let executor = WaitExecutor::new();
        let step = make_wait_step("true", 0, 15);
        assert!(executor.validate_step(&step).is_err());
    }

    #[test]
    fn test_validate_rejects_timeout_below_interval() {
        let executor = WaitExecutor::new();
        let step = make_wait_step("true", 5, 2);
        assert!(executor.validate_step(&step).is_err());
    }
}
