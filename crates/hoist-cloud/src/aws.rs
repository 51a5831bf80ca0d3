use hoist_core::{ProbeOutcome, Settings};

use crate::args;
use crate::cli::CliError;
use crate::error::IdentityError;
use crate::executor::{CliExecutor, RealExecutor};

/// AWS operations (STS, ECR, Lambda), parameterized over the executor for testability.
///
/// Registry operations live in [`crate::ecr`], function operations in
/// [`crate::lambda`].
pub struct AwsClient<E: CliExecutor = RealExecutor> {
    pub(crate) executor: E,
}

impl AwsClient<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor::aws(),
        }
    }
}

impl Default for AwsClient<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CliExecutor> AwsClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    pub async fn version(&self) -> Result<String, CliError> {
        self.executor
            .exec(&args(["--version"]))
            .await
            .map(|v| v.trim().to_owned())
    }

    // ── Identity ──

    /// Account ID of the active credentials.
    pub async fn caller_account(&self) -> Result<String, IdentityError> {
        let output = self
            .executor
            .exec(&args([
                "sts",
                "get-caller-identity",
                "--query",
                "Account",
                "--output",
                "text",
            ]))
            .await
            .map_err(|e| IdentityError::Lookup { source: e })?;

        let account = output.trim();
        if account.is_empty() {
            return Err(IdentityError::EmptyAccount);
        }
        Ok(account.to_owned())
    }

    /// The configured account ID, or the caller's account when none is set.
    pub async fn resolve_account(&self, settings: &Settings) -> Result<String, IdentityError> {
        match &settings.account_id {
            Some(id) => Ok(id.clone()),
            None => {
                let id = self.caller_account().await?;
                tracing::debug!(account = %id, "resolved account via sts");
                Ok(id)
            }
        }
    }

    /// Run an existence check and classify its result.
    ///
    /// A failure whose stderr carries `not_found_marker` means the resource is
    /// absent; any other failure is reported as [`ProbeOutcome::Failed`].
    pub(crate) async fn probe(
        &self,
        cmd: &[String],
        not_found_marker: &str,
    ) -> ProbeOutcome<CliError> {
        match self.executor.exec(cmd).await {
            Ok(_) => ProbeOutcome::Found,
            Err(e) if e.stderr_contains(not_found_marker) => ProbeOutcome::NotFound,
            Err(e) => ProbeOutcome::Failed(e),
        }
    }
}
