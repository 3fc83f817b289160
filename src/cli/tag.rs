// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shipflow contributors

//! Tag command - compute the build tag for the current context
//!
//! The tag printed here is the same one `run` injects as `${TAG}`.

use miette::Result;
use std::path::PathBuf;

use super::run::load_context;

/// Run the tag command
pub async fn run(context_path: Option<PathBuf>, image: bool, _verbose: bool) -> Result<()> {
    let context = load_context(context_path)?;
    let tag = context.build_tag(chrono::Utc::now())?;

    if image {
        println!("{}", context.image_uri(&tag));
    } else {
        println!("{}", tag);
    }

    Ok(())
}
