// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shipflow contributors

//! Error types
//!
//! shipflow surfaces every failure through a single diagnostic type so the
//! CLI can render consistent, actionable reports.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for shipflow operations
pub type ShipflowResult<T> = Result<T, ShipflowError>;

/// Main error type for shipflow
#[derive(Error, Debug, Diagnostic)]
pub enum ShipflowError {
    // ─────────────────────────────────────────────────────────────────────────
    // Tool Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Tool '{tool}' execution failed: {error}")]
    #[diagnostic(code(shipflow::tool_execution_failed))]
    ToolExecutionFailed {
        tool: String,
        error: String,
        #[help]
        help: Option<String>,
    },

    #[error("Executor not found for step kind: {kind}")]
    #[diagnostic(
        code(shipflow::executor_not_found),
        help("Available executors: shell, verify_checksum, substitute, wait_for, image_artifact")
    )]
    ExecutorNotFound { kind: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Pipeline Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Pipeline file not found: {path}")]
    #[diagnostic(
        code(shipflow::pipeline_not_found),
        help("Create a pipeline with 'shipflow init' or create .shipflow.yaml manually")
    )]
    PipelineNotFound { path: PathBuf },

    #[error("Invalid pipeline configuration: {reason}")]
    #[diagnostic(code(shipflow::invalid_pipeline))]
    InvalidPipeline {
        reason: String,
        #[help]
        help: Option<String>,
    },

    #[error("Step '{step}' is invalid: {reason}")]
    #[diagnostic(code(shipflow::invalid_step))]
    InvalidStep { step: String, reason: String },

    #[error("Unknown phase: '{phase}'")]
    #[diagnostic(
        code(shipflow::unknown_phase),
        help("Phases are: install, pre_build, build, post_build")
    )]
    UnknownPhase { phase: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Execution Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Step '{step}' failed with exit code {exit_code}")]
    #[diagnostic(code(shipflow::step_failed))]
    StepFailed {
        step: String,
        exit_code: i32,
        stderr: String,
        #[help]
        help: Option<String>,
    },

    #[error("Execution failed: {message}")]
    #[diagnostic(code(shipflow::execution_failed))]
    ExecutionFailed {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Checksum mismatch for {path}")]
    #[diagnostic(
        code(shipflow::checksum_mismatch),
        help("Expected {expected}, computed {computed}. The file may be corrupt or tampered with.")
    )]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        computed: String,
    },

    #[error("Placeholder '{placeholder}' not found in {template}")]
    #[diagnostic(
        code(shipflow::placeholder_missing),
        help("The manifest would be deployed un-retagged. Check the placeholder spelling in the template.")
    )]
    PlaceholderMissing {
        placeholder: String,
        template: PathBuf,
    },

    #[error("Timed out after {timeout_secs}s waiting for '{step}'")]
    #[diagnostic(
        code(shipflow::wait_timeout),
        help("The readiness command never exited 0 within the window")
    )]
    WaitTimeout { step: String, timeout_secs: u64 },

    // ─────────────────────────────────────────────────────────────────────────
    // Context Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Build context is missing required field '{field}'")]
    #[diagnostic(
        code(shipflow::missing_context_field),
        help("Set {field} in the context file or export SHIPFLOW_{env_name}")
    )]
    MissingContextField { field: String, env_name: String },

    #[error("Source version '{version}' is too short for a build tag")]
    #[diagnostic(
        code(shipflow::short_source_version),
        help("The build tag embeds the first 8 characters of the resolved source version")
    )]
    ShortSourceVersion { version: String },

    #[error("Undefined variable '${{{name}}}' in {location}")]
    #[diagnostic(
        code(shipflow::undefined_variable),
        help("Define '{name}' in the build context vars, pipeline env, or step env")
    )]
    UndefinedVariable { name: String, location: String },

    // ─────────────────────────────────────────────────────────────────────────
    // File Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("File not found: {path}")]
    #[diagnostic(code(shipflow::file_not_found))]
    FileNotFound {
        path: PathBuf,
        #[help]
        help: Option<String>,
    },

    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(shipflow::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(shipflow::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(shipflow::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(shipflow::yaml_error))]
    Yaml { message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(shipflow::json_error))]
    Json { message: String },
}

impl From<std::io::Error> for ShipflowError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for ShipflowError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for ShipflowError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl ShipflowError {
    /// Create a missing-field error with the matching environment variable name
    pub fn missing_context_field(field: &str) -> Self {
        Self::MissingContextField {
            field: field.to_string(),
            env_name: field.to_uppercase(),
        }
    }

    /// Create a step failed error with helpful context derived from the tool output
    pub fn step_failed_with_help(step: &str, exit_code: i32, stderr: String) -> Self {
        let help = Self::generate_help_for_step_error(&stderr);
        Self::StepFailed {
            step: step.to_string(),
            exit_code,
            stderr,
            help,
        }
    }

    /// Generate helpful suggestions based on common tool output
    fn generate_help_for_step_error(stderr: &str) -> Option<String> {
        if stderr.contains("Cannot connect to the Docker daemon") {
            Some("The container daemon is not running or not reachable.".into())
        } else if stderr.contains("denied: ") || stderr.contains("authorization failed") {
            Some("Registry push was denied. Re-authenticate against the registry.".into())
        } else if stderr.contains("Unable to connect to the server") {
            Some("The cluster API server is unreachable. Check the cluster name and credentials.".into())
        } else if stderr.contains("command not found") {
            Some("A binary invoked by this step is missing. Declare it under 'tools' to fail early.".into())
        } else {
            None
        }
    }
}
