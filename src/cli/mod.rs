// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shipflow contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for shipflow.

pub mod init;
pub mod run;
pub mod tag;
pub mod validate;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Container build-and-deploy pipeline runner
///
/// Executes install, pre_build, build, and post_build phases in fixed
/// order with fail-fast semantics.
#[derive(Parser, Debug)]
#[clap(
    name = "shipflow",
    version,
    about = "Container build-and-deploy pipeline runner",
    long_about = None,
    after_help = "Examples:\n\
        shipflow init                   Scaffold a .shipflow.yaml\n\
        shipflow validate               Check the pipeline configuration\n\
        shipflow tag                    Print the computed build tag\n\
        shipflow run                    Execute the pipeline\n\
        shipflow run --dry-run          Show the plan without executing\n\n\
        See 'shipflow <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline
    Run {
        /// Pipeline file
        #[clap(short, long, default_value = ".shipflow.yaml")]
        pipeline: PathBuf,

        /// Build context file (defaults to SHIPFLOW_* environment variables)
        #[clap(short, long)]
        context: Option<PathBuf>,

        /// Run only specific phases (install, pre_build, build, post_build)
        #[clap(long = "phase", value_name = "PHASE")]
        phases: Vec<String>,

        /// Dry run (show the resolved plan without executing)
        #[clap(long)]
        dry_run: bool,
    },

    /// Validate pipeline configuration
    Validate {
        /// Pipeline file to validate
        #[clap(default_value = ".shipflow.yaml")]
        pipeline: PathBuf,
    },

    /// Compute and print the build tag for the current context
    Tag {
        /// Build context file (defaults to SHIPFLOW_* environment variables)
        #[clap(short, long)]
        context: Option<PathBuf>,

        /// Print the full image URI instead of the bare tag
        #[clap(long)]
        image: bool,
    },

    /// Scaffold a new shipflow pipeline
    Init {
        /// Project name (defaults to current directory name)
        name: Option<String>,
    },
}
