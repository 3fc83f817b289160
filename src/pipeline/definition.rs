// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shipflow contributors

//! Pipeline definition structures
//!
//! Defines the schema for .shipflow.yaml files: four fixed phases, each an
//! ordered list of typed steps.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Pipeline definition from .shipflow.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    /// Pipeline version (for future compatibility)
    #[serde(default = "default_version")]
    pub version: String,

    /// Pipeline name
    pub name: String,

    /// Pipeline description
    #[serde(default)]
    pub description: Option<String>,

    /// External binaries that must be on PATH before the first step runs
    #[serde(default)]
    pub tools: Vec<String>,

    /// Global environment variables
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// The four fixed phases
    pub phases: Phases,
}

fn default_version() -> String {
    "1".to_string()
}

impl Pipeline {
    /// Load pipeline from a YAML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, crate::ShipflowError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::ShipflowError::FileReadError {
                path: path.to_path_buf(),
                error: e.to_string(),
            }
        })?;

        Self::from_yaml(&content)
    }

    /// Parse pipeline from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, crate::ShipflowError> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Serialize pipeline to YAML
    pub fn to_yaml(&self) -> Result<String, crate::ShipflowError> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Total number of steps across all phases
    pub fn step_count(&self) -> usize {
        PhaseName::ALL
            .iter()
            .map(|p| self.phases.steps(*p).len())
            .sum()
    }
}

/// The four phases, in execution order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Phases {
    #[serde(default)]
    pub install: Vec<Step>,

    #[serde(default)]
    pub pre_build: Vec<Step>,

    #[serde(default)]
    pub build: Vec<Step>,

    #[serde(default)]
    pub post_build: Vec<Step>,
}

impl Phases {
    /// Steps for a phase
    pub fn steps(&self, phase: PhaseName) -> &[Step] {
        match phase {
            PhaseName::Install => &self.install,
            PhaseName::PreBuild => &self.pre_build,
            PhaseName::Build => &self.build,
            PhaseName::PostBuild => &self.post_build,
        }
    }

    /// True if every phase is empty
    pub fn is_empty(&self) -> bool {
        PhaseName::ALL.iter().all(|p| self.steps(*p).is_empty())
    }
}

/// Phase names, ordered
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PhaseName {
    Install,
    PreBuild,
    Build,
    PostBuild,
}

impl PhaseName {
    /// Fixed execution order. A later phase never starts if an earlier one failed.
    pub const ALL: [PhaseName; 4] = [
        PhaseName::Install,
        PhaseName::PreBuild,
        PhaseName::Build,
        PhaseName::PostBuild,
    ];
}

impl std::fmt::Display for PhaseName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Install => write!(f, "install"),
            Self::PreBuild => write!(f, "pre_build"),
            Self::Build => write!(f, "build"),
            Self::PostBuild => write!(f, "post_build"),
        }
    }
}

impl std::str::FromStr for PhaseName {
    type Err = crate::ShipflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "install" => Ok(Self::Install),
            "pre_build" => Ok(Self::PreBuild),
            "build" => Ok(Self::Build),
            "post_build" => Ok(Self::PostBuild),
            _ => Err(crate::ShipflowError::UnknownPhase {
                phase: s.to_string(),
            }),
        }
    }
}

/// A single pipeline step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Step name (must be unique within its phase)
    pub name: String,

    /// Step description
    #[serde(default)]
    pub description: Option<String>,

    /// What the step does
    pub action: Action,

    /// Environment variables for this step (override pipeline env)
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl Step {
    /// Get the action kind for this step
    pub fn kind(&self) -> &'static str {
        match &self.action {
            Action::Shell { .. } => "shell",
            Action::VerifyChecksum { .. } => "verify_checksum",
            Action::Substitute { .. } => "substitute",
            Action::WaitFor { .. } => "wait_for",
            Action::ImageArtifact { .. } => "image_artifact",
        }
    }
}

/// Typed step actions
///
/// String fields may reference `${NAME}` variables, resolved against the
/// build context before execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Run a shell command
    Shell {
        /// Command to run via `shell -c`
        command: String,

        /// Shell to use (bash, sh, etc.)
        #[serde(default = "default_shell")]
        shell: String,
    },

    /// Verify the SHA-256 digest of a file against an expected value
    VerifyChecksum {
        /// File to hash
        file: PathBuf,

        /// Expected digest, 64 lowercase or uppercase hex characters
        sha256: String,
    },

    /// Replace every occurrence of a literal placeholder in a template file,
    /// in place. A placeholder that does not occur is an error.
    Substitute {
        /// Template file, mutated in place
        template: PathBuf,

        /// Literal marker to replace
        placeholder: String,

        /// Replacement value
        value: String,
    },

    /// Poll a command until it exits 0 or the window elapses
    WaitFor {
        /// Readiness command, run via `shell -c`
        command: String,

        /// Seconds between attempts
        #[serde(default = "default_interval")]
        interval_secs: u64,

        /// Total window in seconds
        #[serde(default = "default_timeout")]
        timeout_secs: u64,

        /// Shell to use
        #[serde(default = "default_shell")]
        shell: String,
    },

    /// Write the produced image reference as a JSON artifact:
    /// `[{"name": "<container>", "imageUri": "<image>"}]`
    ImageArtifact {
        /// Output path
        path: PathBuf,

        /// Container name
        container: String,

        /// Full image URI, typically `${IMAGE_URI}`
        image: String,
    },
}

fn default_shell() -> String {
    "bash".to_string()
}

fn default_interval() -> u64 {
    1
}

fn default_timeout() -> u64 {
    15
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_pipeline() {
        let yaml = r#"
version: "1"
name: "simple-jwt-api"
phases:
  build:
    - name: "image"
      action:
        type: shell
        command: "docker build -t ${IMAGE_URI} ."
"#;

        let pipeline = Pipeline::from_yaml(yaml).unwrap();
        assert_eq!(pipeline.name, "simple-jwt-api");
        assert_eq!(pipeline.phases.build.len(), 1);
        assert_eq!(pipeline.phases.build[0].name, "image");
        assert_eq!(pipeline.phases.build[0].kind(), "shell");
        assert!(pipeline.phases.install.is_empty());
    }

    #[test]
    fn test_parse_checksum_step() {
        let yaml = r#"
version: "1"
name: "provision"
phases:
  install:
    - name: "verify-kubectl"
      action:
        type: verify_checksum
        file: /usr/local/bin/kubectl
        sha256: "deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef"
"#;

        let pipeline = Pipeline::from_yaml(yaml).unwrap();
        match &pipeline.phases.install[0].action {
            Action::VerifyChecksum { file, sha256 } => {
                assert_eq!(file, &PathBuf::from("/usr/local/bin/kubectl"));
                assert_eq!(sha256.len(), 64);
            }
            _ => panic!("Expected VerifyChecksum action"),
        }
    }

    #[test]
    fn test_parse_wait_for_defaults() {
        let yaml = r#"
version: "1"
name: "deploy"
phases:
  post_build:
    - name: "rollout"
      action:
        type: wait_for
        command: "kubectl rollout status deployment/app"
"#;

        let pipeline = Pipeline::from_yaml(yaml).unwrap();
        match &pipeline.phases.post_build[0].action {
            Action::WaitFor {
                interval_secs,
                timeout_secs,
                shell,
                ..
            } => {
                assert_eq!(*interval_secs, 1);
                assert_eq!(*timeout_secs, 15);
                assert_eq!(shell, "bash");
            }
            _ => panic!("Expected WaitFor action"),
        }
    }

    #[test]
    fn test_phase_order_is_fixed() {
        let names: Vec<String> = PhaseName::ALL.iter().map(|p| p.to_string()).collect();
        assert_eq!(names, vec!["install", "pre_build", "build", "post_build"]);
    }

    #[test]
    fn test_unknown_phase_name() {
        assert!("deploy".parse::<PhaseName>().is_err());
        assert!("pre_build".parse::<PhaseName>().is_ok());
    }

    #[test]
    fn test_round_trip_yaml() {
        let pipeline = Pipeline {
            version: "1".into(),
            name: "test".into(),
            description: Some("A test pipeline".into()),
            tools: vec!["docker".into()],
            env: HashMap::new(),
            phases: Phases {
                pre_build: vec![Step {
                    name: "retag".into(),
                    description: None,
                    action: Action::Substitute {
                        template: PathBuf::from("deployment.yml"),
                        placeholder: "CONTAINER_IMAGE".into(),
                        value: "${IMAGE_URI}".into(),
                    },
                    env: HashMap::new(),
                }],
                ..Default::default()
            },
        };

        let yaml = pipeline.to_yaml().unwrap();
        let parsed = Pipeline::from_yaml(&yaml).unwrap();

        assert_eq!(parsed.name, pipeline.name);
        assert_eq!(parsed.step_count(), 1);
    }
}
