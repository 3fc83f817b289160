// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shipflow contributors

//! # shipflow - Container Build-and-Deploy Pipeline Runner
//!
//! `shipflow` executes a linear container build-and-deploy pipeline: four
//! fixed phases (install, pre_build, build, post_build) of typed steps, run
//! strictly in sequence with fail-fast semantics.
//!
//! ## Features
//!
//! - **Fixed phase order** - a later phase never starts after a failure
//! - **Typed steps** - shell, checksum verification, manifest substitution,
//!   bounded readiness waits, image artifacts; all dry-runnable
//! - **Explicit build context** - no ambient environment-variable state
//! - **Build tags** - `<repo>.<branch>.<env>.<timestamp>.<hash8>`, computed
//!   once per run
//!
//! ## Quick Start
//!
//! ```bash
//! # Scaffold a pipeline
//! shipflow init my-service
//!
//! # Check the configuration
//! shipflow validate
//!
//! # Show the computed build tag
//! shipflow tag
//!
//! # Execute
//! shipflow run
//! ```

pub mod cli;
pub mod context;
pub mod errors;
pub mod executors;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use context::{BuildContext, BuildTag};
pub use errors::{ShipflowError, ShipflowResult};
pub use pipeline::{Pipeline, Step};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
