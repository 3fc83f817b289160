// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shipflow contributors

//! Run command - execute the pipeline

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use crate::context::BuildContext;
use crate::executors::create_default_executors;
use crate::pipeline::{
    check_tools, ExecutionOptions, PhaseName, Pipeline, PipelineExecutor, PipelineValidator,
};

/// Run the pipeline
pub async fn run(
    pipeline_path: PathBuf,
    context_path: Option<PathBuf>,
    phases: Vec<String>,
    dry_run: bool,
    verbose: bool,
) -> Result<()> {
    if !pipeline_path.exists() {
        return Err(crate::errors::ShipflowError::PipelineNotFound {
            path: pipeline_path,
        }
        .into());
    }

    let pipeline = Pipeline::from_file(&pipeline_path)
        .map_err(|e| miette::miette!("Failed to load pipeline: {}", e))?;

    // Validate pipeline
    let validation = PipelineValidator::validate(&pipeline)
        .map_err(|e| miette::miette!("Validation error: {}", e))?;

    if !validation.is_valid() {
        eprintln!("{}", "Pipeline validation failed:".red().bold());
        for error in &validation.errors {
            eprintln!("  {} {}", "✗".red(), error);
        }
        return Err(crate::errors::ShipflowError::InvalidPipeline {
            reason: format!("{} error(s)", validation.errors.len()),
            help: Some("Run 'shipflow validate' for details".into()),
        }
        .into());
    }

    if validation.has_warnings() && verbose {
        eprintln!("{}", "Pipeline warnings:".yellow().bold());
        for warning in &validation.warnings {
            eprintln!("  {} {}", "⚠".yellow(), warning);
        }
        eprintln!();
    }

    // Parse requested phases
    let phase_names: Vec<PhaseName> = phases
        .iter()
        .map(|p| p.parse())
        .collect::<Result<_, _>>()?;

    // Load the build context and compute the tag, once per run
    let context = load_context(context_path)?;
    let tag = context.build_tag(chrono::Utc::now())?;
    let vars = context.variables(&tag);

    println!("{}: {}", "Build tag".bold(), tag.to_string().cyan());

    // Preflight: every declared tool must be on PATH before the first step
    let missing_tools = check_tools(&pipeline);
    if !missing_tools.is_empty() {
        eprintln!("{}", "Missing required tools:".red().bold());
        for tool in &missing_tools {
            eprintln!("  {} {}", "✗".red(), tool);
        }
        return Err(miette::miette!("Required tools are not installed"));
    }

    // Create executor
    let mut executor = PipelineExecutor::new();
    for (kind, exec) in create_default_executors() {
        executor.register_executor(&kind, exec);
    }

    let working_dir = std::env::current_dir().map_err(crate::errors::ShipflowError::from)?;

    let options = ExecutionOptions {
        dry_run,
        phases: phase_names,
        verbose,
    };

    let result = executor
        .execute(&pipeline, &working_dir, &vars, &options)
        .await?;

    if !result.success {
        // Exit with the failing step's own exit code
        if let Some(failure) = result.first_failure() {
            let error = crate::errors::ShipflowError::step_failed_with_help(
                &format!("{}/{}", failure.phase, failure.step),
                failure.result.exit_code,
                failure.result.stderr.clone(),
            );
            eprintln!();
            eprintln!("{:?}", miette::Report::new(error));

            let code = failure.result.exit_code;
            std::process::exit(if code > 0 { code } else { 1 });
        }
        return Err(miette::miette!("Pipeline execution failed"));
    }

    // Print produced artifacts
    let outputs: Vec<_> = result
        .outcomes
        .iter()
        .flat_map(|o| o.result.outputs.iter())
        .collect();

    if !outputs.is_empty() {
        println!();
        println!("{}:", "Outputs".bold());
        for output in outputs {
            println!("  - {}", output.display());
        }
    }

    Ok(())
}

/// Load the context from a file when given, otherwise from the environment
pub(crate) fn load_context(path: Option<PathBuf>) -> Result<BuildContext> {
    match path {
        Some(p) => {
            if !p.exists() {
                return Err(miette::miette!("Context file not found: {}", p.display()));
            }
            Ok(BuildContext::from_file(&p)?)
        }
        None => Ok(BuildContext::from_env()?),
    }
}
