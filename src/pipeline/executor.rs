// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shipflow contributors

//! Phase sequencer
//!
//! Executes the four phases in fixed order, each phase's steps strictly in
//! sequence, fail-fast. Side effects of completed steps are not rolled back
//! when a later step fails.

use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

use colored::Colorize;

use crate::context::expand;
use crate::errors::ShipflowError;
use crate::executors::{ExecutionResult, StepExecutor};
use crate::pipeline::{Action, PhaseName, Pipeline, Step};
use crate::utils::spinner::create_spinner;

/// Pipeline execution options
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Only show what would be done
    pub dry_run: bool,
    /// Restrict to specific phases (fixed order is preserved)
    pub phases: Vec<PhaseName>,
    /// Verbose output
    pub verbose: bool,
}

/// Outcome of one executed step
#[derive(Debug)]
pub struct StepOutcome {
    /// Phase the step ran in
    pub phase: PhaseName,
    /// Step name
    pub step: String,
    /// Execution result
    pub result: ExecutionResult,
}

/// Result of executing a pipeline
#[derive(Debug)]
pub struct PipelineResult {
    /// Outcomes in execution order
    pub outcomes: Vec<StepOutcome>,
    /// Total execution time
    pub duration: Duration,
    /// Whether every step succeeded
    pub success: bool,
}

impl PipelineResult {
    /// The first failed outcome, if any
    pub fn first_failure(&self) -> Option<&StepOutcome> {
        self.outcomes.iter().find(|o| !o.result.success)
    }
}

/// Pipeline executor
pub struct PipelineExecutor {
    /// Registered executors by step kind
    executors: HashMap<String, Box<dyn StepExecutor>>,
}

impl PipelineExecutor {
    /// Create a new pipeline executor
    pub fn new() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    /// Register an executor for a step kind
    pub fn register_executor(&mut self, kind: &str, executor: Box<dyn StepExecutor>) {
        self.executors.insert(kind.to_string(), executor);
    }

    /// Execute a pipeline.
    ///
    /// `vars` is the resolved build-context variable table; pipeline and
    /// step env entries are layered on top of it, never the other way
    /// around.
    pub async fn execute(
        &self,
        pipeline: &Pipeline,
        working_dir: &Path,
        vars: &HashMap<String, String>,
        options: &ExecutionOptions,
    ) -> Result<PipelineResult, ShipflowError> {
        let start = Instant::now();

        let phases: Vec<PhaseName> = PhaseName::ALL
            .iter()
            .copied()
            .filter(|p| options.phases.is_empty() || options.phases.contains(p))
            .collect();

        print!("{}", self.render_execution_plan(pipeline, &phases, vars));

        if options.dry_run {
            return Ok(PipelineResult {
                outcomes: Vec::new(),
                duration: start.elapsed(),
                success: true,
            });
        }

        let base_env = self.layer_env(vars, &pipeline.env, "pipeline env")?;

        let mut outcomes = Vec::new();
        let mut all_success = true;

        'phases: for phase in phases {
            let steps = pipeline.phases.steps(phase);
            if steps.is_empty() {
                continue;
            }

            println!();
            println!("{} {}", "Phase".bold(), phase.to_string().cyan().bold());

            for step in steps {
                let env = self.layer_env(&base_env, &step.env, &format!("step '{}' env", step.name))?;

                let label = format!("{}/{}", phase, step.name);
                let pb = create_spinner(&label);

                let result = self.execute_step(step, working_dir, &env).await;
                pb.finish_and_clear();

                let result = result?;

                if result.success {
                    println!(
                        "  {} {} ({:.2}s)",
                        "✓".green(),
                        step.name.bold(),
                        result.duration.as_secs_f64()
                    );

                    if options.verbose && !result.stdout.is_empty() {
                        for line in result.stdout.lines() {
                            println!("    {}", line.dimmed());
                        }
                    }

                    outcomes.push(StepOutcome {
                        phase,
                        step: step.name.clone(),
                        result,
                    });
                } else {
                    println!(
                        "  {} {} failed (exit {})",
                        "✗".red(),
                        step.name.bold(),
                        result.exit_code
                    );

                    if !result.stderr.is_empty() {
                        eprintln!("{}", result.stderr.trim_end().dimmed());
                    }

                    tracing::warn!(phase = %phase, step = %step.name, exit_code = result.exit_code, "step failed, halting pipeline");

                    all_success = false;
                    outcomes.push(StepOutcome {
                        phase,
                        step: step.name.clone(),
                        result,
                    });
                    break 'phases;
                }
            }
        }

        let duration = start.elapsed();

        println!();
        if all_success {
            println!(
                "{}",
                format!("Pipeline completed successfully in {:.2}s", duration.as_secs_f64()).green()
            );
        } else {
            println!(
                "{}",
                format!("Pipeline failed after {:.2}s", duration.as_secs_f64()).red()
            );
        }

        Ok(PipelineResult {
            outcomes,
            duration,
            success: all_success,
        })
    }

    /// Execute a single step
    async fn execute_step(
        &self,
        step: &Step,
        working_dir: &Path,
        env: &HashMap<String, String>,
    ) -> Result<ExecutionResult, ShipflowError> {
        let kind = step.kind();

        let executor = self.executors.get(kind).ok_or_else(|| {
            ShipflowError::ExecutorNotFound {
                kind: kind.to_string(),
            }
        })?;

        executor.execute(step, working_dir, env).await
    }

    /// Layer env entries on top of a base table, expanding values against it
    fn layer_env(
        &self,
        base: &HashMap<String, String>,
        overlay: &HashMap<String, String>,
        location: &str,
    ) -> Result<HashMap<String, String>, ShipflowError> {
        let mut merged = base.clone();
        for (key, value) in overlay {
            let expanded = expand(value, base, &format!("{location} '{key}'"))?;
            merged.insert(key.clone(), expanded);
        }
        Ok(merged)
    }

    /// Render the execution plan with `${NAME}` references resolved.
    ///
    /// References that cannot resolve are shown as written; execution will
    /// report them properly.
    fn render_execution_plan(
        &self,
        pipeline: &Pipeline,
        phases: &[PhaseName],
        vars: &HashMap<String, String>,
    ) -> String {
        use std::fmt::Write;

        let shown = |text: &str| {
            expand(text, vars, "plan").unwrap_or_else(|_| text.to_string())
        };

        let mut out = String::new();
        let _ = writeln!(out);
        let _ = writeln!(out, "{}: {}", "Pipeline".bold(), pipeline.name);
        let _ = writeln!(out, "{}", "═".repeat(50));

        let mut n = 0;
        for phase in phases {
            for step in pipeline.phases.steps(*phase) {
                n += 1;
                let _ = writeln!(
                    out,
                    "  {}. {} ({}) {}",
                    n,
                    step.name.bold(),
                    step.kind(),
                    format!("[{}]", phase).dimmed()
                );

                let detail = match &step.action {
                    Action::Shell { command, .. } => shown(command),
                    Action::VerifyChecksum { file, sha256 } => {
                        format!("{} == sha256:{}", shown(&file.to_string_lossy()), sha256)
                    }
                    Action::Substitute { template, placeholder, value } => format!(
                        "{}: {} -> {}",
                        shown(&template.to_string_lossy()),
                        placeholder,
                        shown(value)
                    ),
                    Action::WaitFor { command, interval_secs, timeout_secs, .. } => format!(
                        "{} (every {}s, up to {}s)",
                        shown(command),
                        interval_secs,
                        timeout_secs
                    ),
                    Action::ImageArtifact { path, container, image } => format!(
                        "{}: {} -> {}",
                        shown(&path.to_string_lossy()),
                        shown(container),
                        shown(image)
                    ),
                };
                let _ = writeln!(out, "       {}", detail);
            }
        }

        if n == 0 {
            let _ = writeln!(out, "  {}", "no steps".dimmed());
        }

        let _ = writeln!(out);
        out
    }
}

impl Default for PipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Check that every binary the pipeline declares under `tools` is on PATH
pub fn check_tools(pipeline: &Pipeline) -> Vec<String> {
    pipeline
        .tools
        .iter()
        .filter(|tool| which::which(tool).is_err())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::create_default_executors;
    use crate::pipeline::{Action, Phases};

    fn make_executor() -> PipelineExecutor {
        let mut executor = PipelineExecutor::new();
        for (kind, exec) in create_default_executors() {
            executor.register_executor(&kind, exec);
        }
        executor
    }

    fn shell_step(name: &str, command: &str) -> Step {
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

    fn make_pipeline(phases: Phases) -> Pipeline {
        Pipeline {
            version: "1".into(),
            name: "test".into(),
            description: None,
            tools: vec![],
            env: HashMap::new(),
            phases,
        }
    }

    #[tokio::test]
    async fn test_later_phase_never_starts_after_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let marker = tmp.path().join("post_build_ran");

        let pipeline = make_pipeline(Phases {
            build: vec![shell_step("boom", "exit 3")],
            post_build: vec![shell_step("marker", &format!("touch {}", marker.display()))],
            ..Default::default()
        });

        let executor = make_executor();
        let result = executor
            .execute(&pipeline, tmp.path(), &HashMap::new(), &ExecutionOptions::default())
            .await
            .unwrap();

        assert!(!result.success);
        assert!(!marker.exists(), "post_build ran after a build failure");

        let failure = result.first_failure().unwrap();
        assert_eq!(failure.step, "boom");
        assert_eq!(failure.result.exit_code, 3);
    }

    #[tokio::test]
    async fn test_later_step_never_starts_after_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let marker = tmp.path().join("second_ran");

        let pipeline = make_pipeline(Phases {
            install: vec![
                shell_step("boom", "exit 1"),
                shell_step("marker", &format!("touch {}", marker.display())),
            ],
            ..Default::default()
        });

        let executor = make_executor();
        let result = executor
            .execute(&pipeline, tmp.path(), &HashMap::new(), &ExecutionOptions::default())
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.outcomes.len(), 1);
        assert!(!marker.exists(), "a later step ran after a failure");
    }

    #[tokio::test]
    async fn test_phases_execute_in_fixed_order() {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("order.log");

        let record = |phase: &str| shell_step(phase, &format!("echo {} >> {}", phase, log.display()));

        let pipeline = make_pipeline(Phases {
            // Declared out of order on purpose; execution order is fixed
            post_build: vec![record("post_build")],
            install: vec![record("install")],
            build: vec![record("build")],
            pre_build: vec![record("pre_build")],
        });

        let executor = make_executor();
        let result = executor
            .execute(&pipeline, tmp.path(), &HashMap::new(), &ExecutionOptions::default())
            .await
            .unwrap();

        assert!(result.success);
        let content = std::fs::read_to_string(&log).unwrap();
        assert_eq!(content, "install\npre_build\nbuild\npost_build\n");
    }

    #[tokio::test]
    async fn test_dry_run_executes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let marker = tmp.path().join("ran");

        let pipeline = make_pipeline(Phases {
            build: vec![shell_step("marker", &format!("touch {}", marker.display()))],
            ..Default::default()
        });

        let executor = make_executor();
        let options = ExecutionOptions {
            dry_run: true,
            ..Default::default()
        };

        let result = executor
            .execute(&pipeline, tmp.path(), &HashMap::new(), &options)
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.outcomes.is_empty());
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_phase_filter_preserves_order_and_skips_others() {
        let tmp = tempfile::tempdir().unwrap();
        let log = tmp.path().join("order.log");

        let record = |phase: &str| shell_step(phase, &format!("echo {} >> {}", phase, log.display()));

        let pipeline = make_pipeline(Phases {
            install: vec![record("install")],
            build: vec![record("build")],
            ..Default::default()
        });

        let executor = make_executor();
        let options = ExecutionOptions {
            phases: vec![PhaseName::Build],
            ..Default::default()
        };

        let result = executor
            .execute(&pipeline, tmp.path(), &HashMap::new(), &options)
            .await
            .unwrap();

        assert!(result.success);
        let content = std::fs::read_to_string(&log).unwrap();
        assert_eq!(content, "build\n");
    }

    #[tokio::test]
    async fn test_step_env_overrides_pipeline_env() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("value");

        let mut pipeline = make_pipeline(Phases {
            build: vec![Step {
                name: "write".into(),
                description: None,
                action: Action::Shell {
                    command: format!("echo -n $WHO > {}", out.display()),
                    shell: "bash".into(),
                },
                env: HashMap::from([("WHO".to_string(), "step".to_string())]),
            }],
            ..Default::default()
        });
        pipeline.env.insert("WHO".into(), "pipeline".into());

        let executor = make_executor();
        let result = executor
            .execute(&pipeline, tmp.path(), &HashMap::new(), &ExecutionOptions::default())
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "step");
    }

    #[test]
    fn test_plan_shows_expanded_values() {
        let pipeline = make_pipeline(Phases {
            build: vec![shell_step("push", "docker push ${IMAGE_URI}")],
            ..Default::default()
        });

        let vars = HashMap::from([(
            "IMAGE_URI".to_string(),
            "registry.example.com/app:v1".to_string(),
        )]);

        let executor = make_executor();
        let plan = executor.render_execution_plan(&pipeline, &PhaseName::ALL, &vars);

        assert!(plan.contains("docker push registry.example.com/app:v1"));
    }

    #[test]
    fn test_plan_leaves_unresolved_references_as_written() {
        let pipeline = make_pipeline(Phases {
            build: vec![shell_step("push", "docker push ${NOPE}")],
            ..Default::default()
        });

        let executor = make_executor();
        let plan = executor.render_execution_plan(&pipeline, &PhaseName::ALL, &HashMap::new());

        assert!(plan.contains("docker push ${NOPE}"));
    }

    #[test]
    fn test_check_tools_reports_missing() {
        let mut pipeline = make_pipeline(Phases::default());
        pipeline.tools = vec!["sh".into(), "definitely-not-a-real-binary-42".into()];

        let missing = check_tools(&pipeline);
        assert_eq!(missing, vec!["definitely-not-a-real-binary-42".to_string()]);
    }
}
