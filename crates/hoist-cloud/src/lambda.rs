use std::collections::BTreeMap;

use hoist_core::{ImageReference, ProbeErrorPolicy, ProbeOutcome, Settings};
use serde::{Deserialize, Serialize};

use crate::args;
use crate::aws::AwsClient;
use crate::cli::CliError;
use crate::error::{DeployError, StatusError};
use crate::executor::CliExecutor;

const FUNCTION_NOT_FOUND: &str = "ResourceNotFoundException";

/// Desired state of a container-image Lambda function.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    pub name: String,
    pub region: String,
    pub image_uri: String,
    pub role_arn: String,
    pub timeout: u32,
    pub memory_size: u32,
    pub environment: BTreeMap<String, String>,
}

impl FunctionSpec {
    pub fn from_settings(settings: &Settings, image: &ImageReference, account_id: &str) -> Self {
        Self {
            name: settings.function_name.clone(),
            region: settings.region.clone(),
            image_uri: image.to_string(),
            role_arn: settings.role_arn(account_id),
            timeout: settings.timeout,
            memory_size: settings.memory_size,
            environment: settings.function_environment(),
        }
    }

    /// `--environment` argument in the JSON shorthand the CLI accepts.
    fn environment_arg(&self) -> String {
        serde_json::json!({ "Variables": self.environment }).to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployAction {
    Created,
    Updated,
}

impl std::fmt::Display for DeployAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Updated => f.write_str("updated"),
        }
    }
}

/// Result of a successful deploy: which branch ran and the version it published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployOutcome {
    pub action: DeployAction,
    pub function_arn: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PublishedVersion {
    function_arn: String,
    version: String,
}

impl<E: CliExecutor> AwsClient<E> {
    pub async fn probe_function(&self, name: &str, region: &str) -> ProbeOutcome<CliError> {
        self.probe(
            &args([
                "lambda",
                "get-function",
                "--function-name",
                name,
                "--region",
                region,
            ]),
            FUNCTION_NOT_FOUND,
        )
        .await
    }

    /// Bring the function in line with `spec`, then publish a version.
    ///
    /// ```text
    /// probe ─┬─ absent  → create-function → wait active ──────────────────┐
    ///        └─ present → update-function-code → wait updated             ├→ publish-version
    ///                     → update-function-configuration → wait updated ─┘
    /// ```
    ///
    /// Nothing is published if any create or update call fails. A failure
    /// between the code and configuration updates is not rolled back.
    pub async fn deploy_function(
        &self,
        spec: &FunctionSpec,
        policy: ProbeErrorPolicy,
    ) -> Result<DeployOutcome, DeployError> {
        let outcome = self.probe_function(&spec.name, &spec.region).await;
        if let ProbeOutcome::Failed(e) = &outcome {
            tracing::warn!(function = %spec.name, error = %e, %policy, "function existence check failed");
        }

        let exists = outcome.exists(policy).map_err(|e| DeployError::Probe {
            function: spec.name.clone(),
            source: e,
        })?;

        let action = if exists {
            self.update_function(spec).await?;
            DeployAction::Updated
        } else {
            self.create_function(spec).await?;
            DeployAction::Created
        };

        let published = self.publish_version(&spec.name, &spec.region).await?;
        tracing::info!(function = %spec.name, %action, version = %published.version, "function deployed");

        Ok(DeployOutcome {
            action,
            function_arn: published.function_arn,
            version: published.version,
        })
    }

    pub async fn create_function(&self, spec: &FunctionSpec) -> Result<(), DeployError> {
        let code = format!("ImageUri={}", spec.image_uri);
        let timeout = spec.timeout.to_string();
        let memory = spec.memory_size.to_string();
        let environment = spec.environment_arg();

        self.executor
            .exec(&args([
                "lambda",
                "create-function",
                "--function-name",
                &spec.name,
                "--package-type",
                "Image",
                "--code",
                &code,
                "--role",
                &spec.role_arn,
                "--timeout",
                &timeout,
                "--memory-size",
                &memory,
                "--environment",
                &environment,
                "--region",
                &spec.region,
            ]))
            .await
            .map_err(|e| DeployError::Create {
                function: spec.name.clone(),
                source: e,
            })?;

        self.wait(spec, "function-active-v2", "create").await
    }

    /// Update code, then configuration, as two separate calls.
    pub async fn update_function(&self, spec: &FunctionSpec) -> Result<(), DeployError> {
        self.executor
            .exec(&args([
                "lambda",
                "update-function-code",
                "--function-name",
                &spec.name,
                "--image-uri",
                &spec.image_uri,
                "--region",
                &spec.region,
            ]))
            .await
            .map_err(|e| DeployError::UpdateCode {
                function: spec.name.clone(),
                source: e,
            })?;
        self.wait(spec, "function-updated-v2", "code update").await?;

        let timeout = spec.timeout.to_string();
        let memory = spec.memory_size.to_string();
        let environment = spec.environment_arg();

        self.executor
            .exec(&args([
                "lambda",
                "update-function-configuration",
                "--function-name",
                &spec.name,
                "--role",
                &spec.role_arn,
                "--timeout",
                &timeout,
                "--memory-size",
                &memory,
                "--environment",
                &environment,
                "--region",
                &spec.region,
            ]))
            .await
            .map_err(|e| DeployError::UpdateConfiguration {
                function: spec.name.clone(),
                source: e,
            })?;
        self.wait(spec, "function-updated-v2", "configuration update")
            .await
    }

    async fn publish_version(
        &self,
        name: &str,
        region: &str,
    ) -> Result<PublishedVersion, DeployError> {
        let output = self
            .executor
            .exec(&args([
                "lambda",
                "publish-version",
                "--function-name",
                name,
                "--region",
                region,
                "--output",
                "json",
            ]))
            .await
            .map_err(|e| DeployError::PublishVersion {
                function: name.to_owned(),
                source: e,
            })?;

        serde_json::from_str(&output).map_err(|e| DeployError::InvalidResponse {
            operation: "publish-version",
            source: e,
        })
    }

    /// Block on the CLI's built-in waiter until the function leaves its pending state.
    async fn wait(
        &self,
        spec: &FunctionSpec,
        waiter: &str,
        stage: &'static str,
    ) -> Result<(), DeployError> {
        self.executor
            .exec(&args([
                "lambda",
                "wait",
                waiter,
                "--function-name",
                &spec.name,
                "--region",
                &spec.region,
            ]))
            .await
            .map_err(|e| DeployError::Wait {
                function: spec.name.clone(),
                stage,
                source: e,
            })?;

        Ok(())
    }

    // ── Status ──

    /// Current function configuration as JSON, or `None` when the function does not exist.
    pub async fn function_configuration(
        &self,
        name: &str,
        region: &str,
    ) -> Result<Option<String>, StatusError> {
        match self
            .executor
            .exec(&args([
                "lambda",
                "get-function-configuration",
                "--function-name",
                name,
                "--region",
                region,
                "--output",
                "json",
            ]))
            .await
        {
            Ok(json) => Ok(Some(json.trim().to_owned())),
            Err(e) if e.stderr_contains(FUNCTION_NOT_FOUND) => Ok(None),
            Err(e) => Err(StatusError::Describe {
                function: name.to_owned(),
                source: e,
            }),
        }
    }
}
