// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shipflow contributors

//! Checksum executor
//!
//! Verifies the SHA-256 digest of a file against an expected value,
//! aborting the run on mismatch. Used to gate downloaded binaries before
//! they are trusted.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::{ExecutionResult, StepExecutor};
use crate::context::expand;
use crate::errors::ShipflowError;
use crate::pipeline::{Action, Step};

/// Checksum executor
pub struct ChecksumExecutor;

impl ChecksumExecutor {
    /// Create a new checksum executor
    pub fn new() -> Self {
        Self
    }
}

impl Default for ChecksumExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the lowercase hex SHA-256 digest of a file
pub async fn sha256_file(path: &Path) -> Result<String, ShipflowError> {
    let data = tokio::fs::read(path).await.map_err(|e| ShipflowError::FileReadError {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    let digest = Sha256::digest(&data);
    Ok(to_hex(&digest))
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[async_trait]
impl StepExecutor for ChecksumExecutor {
    async fn execute(
        &self,
        step: &Step,
        working_dir: &Path,
        vars: &HashMap<String, String>,
    ) -> Result<ExecutionResult, ShipflowError> {
        let Action::VerifyChecksum { file, sha256 } = &step.action else {
            return Err(ShipflowError::InvalidStep {
                step: step.name.clone(),
                reason: "Expected verify_checksum action".to_string(),
            });
        };

        let start = Instant::now();

        let location = format!("step '{}' file", step.name);
        let resolved = expand(&file.to_string_lossy(), vars, &location)?;
        let path = if Path::new(&resolved).is_absolute() {
            PathBuf::from(&resolved)
        } else {
            working_dir.join(&resolved)
        };

        if !path.exists() {
            return Err(ShipflowError::FileNotFound {
                path,
                help: Some(format!("Required by step '{}'", step.name)),
            });
        }

        let computed = sha256_file(&path).await?;
        let expected = sha256.trim().to_lowercase();

        if computed != expected {
            return Err(ShipflowError::ChecksumMismatch {
                path,
                expected,
                computed,
            });
        }

        tracing::debug!(step = %step.name, file = %path.display(), "checksum verified");

        Ok(ExecutionResult::success(
            format!("sha256 ok: {}", path.display()),
            start.elapsed(),
            vec![],
        ))
    }

    fn validate_step(&self, step: &Step) -> Result<(), ShipflowError> {
        let Action::VerifyChecksum { sha256, .. } = &step.action else {
            return Err(ShipflowError::InvalidStep {
                step: step.name.clone(),
                reason: "Not a verify_checksum step".to_string(),
            });
        };

        let digest = sha256.trim();
        if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ShipflowError::InvalidStep {
                step: step.name.clone(),
                reason: "sha256 must be 64 hex characters".to_string(),
            });
        }

        Ok(())
    }
}
