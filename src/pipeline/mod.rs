// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shipflow contributors

//! Pipeline definitions and types
//!
//! This module defines the core data structures for shipflow pipelines:
//! the four fixed phases, typed steps, the sequencer, and validation.

mod definition;
mod executor;
mod validation;

pub use definition::*;
pub use executor::{check_tools, ExecutionOptions, PipelineExecutor, PipelineResult, StepOutcome};
pub use validation::{PipelineValidator, ValidationResult};
