// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shipflow contributors

//! Build context
//!
//! An explicit configuration structure passed into execution instead of
//! reading ambient environment state at point of use. Every value a step
//! can reference is declared here or derived from here.

mod expand;
mod tag;

pub use expand::{expand, has_unclosed_reference};
pub use tag::{format_timestamp, BuildTag};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::ShipflowError;

/// Runtime configuration for a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildContext {
    /// Repository name, e.g. `simple-jwt-api`
    pub repository: String,

    /// Branch being built
    pub branch: String,

    /// Target environment name, e.g. `prod`
    pub environment: String,

    /// Resolved source version (commit hash)
    pub source_version: String,

    /// Image registry URI the build tag is appended to
    pub registry_uri: String,

    /// Target cluster name
    #[serde(default)]
    pub cluster: Option<String>,

    /// Role identifier assumed for cluster access
    #[serde(default)]
    pub role: Option<String>,

    /// Free-form variables (externally injected secrets land here)
    #[serde(default)]
    pub vars: HashMap<String, String>,
}

impl BuildContext {
    /// Load context from a YAML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ShipflowError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ShipflowError::FileReadError {
                path: path.to_path_buf(),
                error: e.to_string(),
            }
        })?;

        serde_yaml::from_str(&content).map_err(Into::into)
    }

    /// Build context from the process environment.
    ///
    /// Each field reads `SHIPFLOW_<NAME>` first, falling back to the bare
    /// conventional name (`REPOSITORY`, `BRANCH`, ...) a CI system exports.
    pub fn from_env() -> Result<Self, ShipflowError> {
        let mut vars = HashMap::new();
        for (key, value) in std::env::vars() {
            if let Some(name) = key.strip_prefix("SHIPFLOW_VAR_") {
                vars.insert(name.to_string(), value);
            }
        }

        Ok(Self {
            repository: required_env("repository")?,
            branch: required_env("branch")?,
            environment: required_env("environment")?,
            source_version: required_env("source_version")?,
            registry_uri: required_env("registry_uri")?,
            cluster: optional_env("cluster"),
            role: optional_env("role"),
            vars,
        })
    }

    /// Compute the build tag for this run at the given instant
    pub fn build_tag(&self, now: chrono::DateTime<chrono::Utc>) -> Result<BuildTag, ShipflowError> {
        BuildTag::new(
            &self.repository,
            &self.branch,
            &self.environment,
            &format_timestamp(now),
            &self.source_version,
        )
    }

    /// Full image URI for a tag: `<registry-uri>:<build-tag>`
    pub fn image_uri(&self, tag: &BuildTag) -> String {
        format!("{}:{}", self.registry_uri, tag)
    }

    /// The variable table steps resolve `${NAME}` references against.
    ///
    /// Standard names first, then free-form vars. Free-form vars cannot
    /// shadow the standard names.
    pub fn variables(&self, tag: &BuildTag) -> HashMap<String, String> {
        let mut table = self.vars.clone();

        table.insert("REPOSITORY".into(), self.repository.clone());
        table.insert("BRANCH".into(), self.branch.clone());
        table.insert("ENVIRONMENT".into(), self.environment.clone());
        table.insert("SOURCE_VERSION".into(), self.source_version.clone());
        table.insert("REGISTRY_URI".into(), self.registry_uri.clone());
        table.insert("TAG".into(), tag.to_string());
        table.insert("IMAGE_URI".into(), self.image_uri(tag));

        if let Some(ref cluster) = self.cluster {
            table.insert("CLUSTER".into(), cluster.clone());
        }
        if let Some(ref role) = self.role {
            table.insert("ROLE".into(), role.clone());
        }

        table
    }
}

fn required_env(field: &str) -> Result<String, ShipflowError> {
    optional_env(field).ok_or_else(|| ShipflowError::missing_context_field(field))
}

fn optional_env(field: &str) -> Option<String> {
    let name = field.to_uppercase();
    std::env::var(format!("SHIPFLOW_{name}"))
        .or_else(|_| std::env::var(&name))
        .ok()
}
