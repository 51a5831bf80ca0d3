use hoist_core::{ProbeErrorPolicy, ProbeOutcome};
use secrecy::SecretString;

use crate::args;
use crate::aws::AwsClient;
use crate::cli::CliError;
use crate::error::PublishError;
use crate::executor::CliExecutor;

const REPOSITORY_NOT_FOUND: &str = "RepositoryNotFoundException";

/// Whether [`AwsClient::ensure_repository`] had to create the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryAction {
    Existing,
    Created,
}

impl<E: CliExecutor> AwsClient<E> {
    pub async fn probe_repository(&self, repository: &str, region: &str) -> ProbeOutcome<CliError> {
        self.probe(
            &args([
                "ecr",
                "describe-repositories",
                "--repository-names",
                repository,
                "--region",
                region,
            ]),
            REPOSITORY_NOT_FOUND,
        )
        .await
    }

    /// Ensure the ECR repository exists, creating it if needed.
    pub async fn ensure_repository(
        &self,
        repository: &str,
        region: &str,
        policy: ProbeErrorPolicy,
    ) -> Result<RepositoryAction, PublishError> {
        let outcome = self.probe_repository(repository, region).await;
        if let ProbeOutcome::Failed(e) = &outcome {
            tracing::warn!(repository, error = %e, %policy, "repository existence check failed");
        }

        let exists = outcome.exists(policy).map_err(|e| PublishError::Probe {
            repository: repository.to_owned(),
            source: e,
        })?;
        if exists {
            return Ok(RepositoryAction::Existing);
        }

        tracing::info!(repository, region, "creating ECR repository");
        self.executor
            .exec(&args([
                "ecr",
                "create-repository",
                "--repository-name",
                repository,
                "--region",
                region,
            ]))
            .await
            .map_err(|e| PublishError::CreateRepository {
                repository: repository.to_owned(),
                source: e,
            })?;

        Ok(RepositoryAction::Created)
    }

    /// Short-lived registry password for `docker login`.
    pub async fn ecr_login_password(&self, region: &str) -> Result<SecretString, PublishError> {
        let output = self
            .executor
            .exec(&args(["ecr", "get-login-password", "--region", region]))
            .await
            .map_err(|e| PublishError::LoginPassword { source: e })?;

        Ok(SecretString::from(output.trim().to_owned()))
    }
}
