// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shipflow contributors

//! Build tag computation
//!
//! A build tag has the form `<repo>.<branch>.<env>.<timestamp>.<hash8>`.
//! Uniqueness is probabilistic (timestamp-based), not guaranteed.

use chrono::{DateTime, Utc};

use crate::errors::ShipflowError;

/// Unique-ish identifier for a produced image, computed once per run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTag(String);

impl BuildTag {
    /// Compose a tag from its parts.
    ///
    /// The final segment is exactly the first 8 characters of the resolved
    /// source version; a shorter version is rejected.
    pub fn new(
        repository: &str,
        branch: &str,
        environment: &str,
        timestamp: &str,
        source_version: &str,
    ) -> Result<Self, ShipflowError> {
        // Character-based, not byte-based: slicing would panic on a
        // multi-byte character spanning the boundary.
        let hash8: String = source_version.chars().take(8).collect();
        if hash8.chars().count() < 8 {
            return Err(ShipflowError::ShortSourceVersion {
                version: source_version.to_string(),
            });
        }
        Ok(Self(format!(
            "{repository}.{branch}.{environment}.{timestamp}.{hash8}"
        )))
    }

    /// The tag as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BuildTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Format an instant the way tags embed it: UTC, dot-separated
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d.%H.%M.%S").to_string()
}
