// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shipflow contributors

//! Init command - scaffold a new shipflow pipeline

use colored::Colorize;
use miette::Result;
use std::path::Path;

/// Run the init command
pub async fn run(name: Option<String>, verbose: bool) -> Result<()> {
    let project_name = name.unwrap_or_else(|| {
        std::env::current_dir()
            .ok()
            .and_then(|p| p.file_name().map(|s| s.to_string_lossy().to_string()))
            .unwrap_or_else(|| "my-service".to_string())
    });

    println!("{}", "Initializing shipflow pipeline...".bold());
    println!();

    if Path::new(".shipflow.yaml").exists() {
        return Err(miette::miette!(".shipflow.yaml already exists."));
    }

    let pipeline_content = generate_default_pipeline(&project_name);

    std::fs::write(".shipflow.yaml", &pipeline_content)
        .map_err(|e| miette::miette!("Failed to write .shipflow.yaml: {}", e))?;

    println!("  {} Created .shipflow.yaml", "✓".green());

    println!();
    println!("{}", "Pipeline initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to match your build", ".shipflow.yaml".cyan());
    println!(
        "  2. Provide a build context: {} or {}",
        "SHIPFLOW_* env vars".cyan(),
        "--context context.yaml".cyan()
    );
    println!("  3. Run {} to check the configuration", "shipflow validate".cyan());
    println!("  4. Run {} to execute", "shipflow run".cyan());
    println!();

    if verbose {
        println!("{}", "Generated pipeline:".dimmed());
        println!("{}", "─".repeat(50).dimmed());
        println!("{}", pipeline_content.dimmed());
    }

    Ok(())
}

fn generate_default_pipeline(name: &str) -> String {
    format!(
        r#"# shipflow pipeline configuration
# Phases execute in fixed order: install, pre_build, build, post_build.
# The first failing step halts the pipeline.

version: "1"
name: "{name}"

tools:
  - docker
  - kubectl
  - aws

phases:
  install:
    - name: "fetch-kubectl"
      description: "Download the cluster CLI"
      action:
        type: shell
        command: "curl -sSLo ./kubectl https://dl.k8s.io/release/v1.29.0/bin/linux/amd64/kubectl && chmod +x ./kubectl"

    - name: "verify-kubectl"
      description: "Reject a corrupt or tampered download"
      action:
        type: verify_checksum
        file: ./kubectl
        sha256: "0000000000000000000000000000000000000000000000000000000000000000"

  pre_build:
    - name: "registry-login"
      action:
        type: shell
        command: "aws ecr get-login-password | docker login --username AWS --password-stdin ${{REGISTRY_URI}}"

    - name: "retag-manifest"
      description: "Point the deployment manifest at this build's image"
      action:
        type: substitute
        template: deployment.yml
        placeholder: CONTAINER_IMAGE
        value: "${{IMAGE_URI}}"

  build:
    - name: "image"
      action:
        type: shell
        command: "docker build -t ${{IMAGE_URI}} ."

    - name: "push"
      action:
        type: shell
        command: "docker push ${{IMAGE_URI}}"

  post_build:
    - name: "apply"
      action:
        type: shell
        command: "kubectl apply -f deployment.yml"

    - name: "rollout"
      description: "Wait for the new pods to become ready"
      action:
        type: wait_for
        command: "kubectl get deployment/{name} -o jsonpath='{{.status.readyReplicas}}' | grep -q '[1-9]'"
        interval_secs: 1
        timeout_secs: 15

    - name: "image-definitions"
      action:
        type: image_artifact
        path: imagedefinitions.json
        container: "{name}"
        image: "${{IMAGE_URI}}"
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;

    #[test]
    fn test_generated_pipeline_parses_and_validates_structurally() {
        let yaml = generate_default_pipeline("simple-jwt-api");
        let pipeline = Pipeline::from_yaml(&yaml).unwrap();

        assert_eq!(pipeline.name, "simple-jwt-api");
        assert_eq!(pipeline.tools, vec!["docker", "kubectl", "aws"]);
        assert_eq!(pipeline.phases.install.len(), 2);
        assert_eq!(pipeline.phases.post_build.len(), 3);
    }
}
