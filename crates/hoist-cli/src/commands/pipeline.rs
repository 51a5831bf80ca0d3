use std::path::{Path, PathBuf};

use hoist_build::{locate_descriptor, read_last_tag, write_last_tag};
use hoist_cloud::{
    AwsClient, BuildRequest, BuilderContext, CliExecutor, DeployOutcome, DockerClient,
    FunctionSpec, RealExecutor, RepositoryAction,
};
use hoist_core::{ImageReference, Settings};
use serde::Serialize;
use tokio::sync::OnceCell;

/// Steps taken and results produced by one or more phases.
#[derive(Debug, Default, Serialize)]
pub(crate) struct PipelineReport {
    pub image: Option<String>,
    pub steps: Vec<String>,
    pub deploy: Option<DeployOutcome>,
}

impl std::fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for step in &self.steps {
            writeln!(f, "  - {step}")?;
        }
        if let Some(image) = &self.image {
            writeln!(f)?;
            writeln!(f, "Image:    {image}")?;
        }
        if let Some(deploy) = &self.deploy {
            writeln!(f, "Function: {} ({})", deploy.function_arn, deploy.action)?;
            writeln!(f, "Version:  {}", deploy.version)?;
        }
        Ok(())
    }
}

/// Build, push and deploy phases sharing one [`Settings`] and one account ID.
pub(crate) struct Pipeline<A: CliExecutor = RealExecutor, D: CliExecutor = RealExecutor> {
    aws: AwsClient<A>,
    docker: DockerClient<D>,
    settings: Settings,
    project_dir: PathBuf,
    account: OnceCell<String>,
}

impl Pipeline {
    /// Resolve settings for the working directory and use the real CLIs.
    pub fn from_cwd() -> anyhow::Result<Self> {
        let project_dir = PathBuf::from(".");
        let settings = Settings::resolve(&project_dir)?;
        Ok(Self::with_clients(
            AwsClient::new(),
            DockerClient::new(),
            settings,
            project_dir,
        ))
    }
}

impl<A: CliExecutor, D: CliExecutor> Pipeline<A, D> {
    pub fn with_clients(
        aws: AwsClient<A>,
        docker: DockerClient<D>,
        settings: Settings,
        project_dir: PathBuf,
    ) -> Self {
        Self {
            aws,
            docker,
            settings,
            project_dir,
            account: OnceCell::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn aws(&self) -> &AwsClient<A> {
        &self.aws
    }

    /// Account ID, looked up at most once per run.
    async fn account(&self) -> anyhow::Result<&str> {
        let account = self
            .account
            .get_or_try_init(|| self.aws.resolve_account(&self.settings))
            .await?;
        Ok(account.as_str())
    }

    pub async fn image(&self) -> anyhow::Result<ImageReference> {
        let account = self.account().await?;
        Ok(self.settings.image_reference(account))
    }

    /// Build the image, tag it for the registry and record the tag.
    pub async fn build(&self, report: &mut PipelineReport) -> anyhow::Result<()> {
        // Checked before any external call.
        let descriptor = locate_descriptor(&self.project_dir, &self.settings.descriptor)?;
        report
            .steps
            .push(format!("Build descriptor: {}", self.settings.descriptor.display()));

        let buildx = self.docker.buildx_version().await?;
        tracing::debug!(%buildx, "buildx available");

        let image = self.image().await?;
        report.image = Some(image.to_string());

        let builder = &self.settings.builder;
        match self.docker.ensure_builder(builder).await? {
            BuilderContext::Reused => report.steps.push(format!("Using builder '{builder}'")),
            BuilderContext::Created => report.steps.push(format!("Created builder '{builder}'")),
        }

        tracing::info!(platform = %self.settings.platform, image = %image.local_tag(), "building image");
        self.docker
            .build_image(&BuildRequest {
                context: &self.project_dir,
                descriptor: &descriptor,
                platform: &self.settings.platform,
                no_cache: self.settings.no_cache,
                image: &image,
            })
            .await?;
        report.steps.push(format!(
            "Built {} for {}{}",
            image.local_tag(),
            self.settings.platform,
            if self.settings.no_cache { " (no cache)" } else { "" }
        ));

        self.docker.tag_for_registry(&image).await?;
        report.steps.push(format!("Tagged {image}"));

        let tag_file = write_last_tag(&self.project_dir, image.tag())?;
        report
            .steps
            .push(format!("Recorded tag in {}", tag_file.display()));

        Ok(())
    }

    /// Ensure the repository, log in and push the image.
    pub async fn push(&self, report: &mut PipelineReport) -> anyhow::Result<()> {
        let image = self.image().await?;
        report.image = Some(image.to_string());
        self.warn_on_stale_tag();

        self.docker.require_local_image(&image).await?;

        let repository = image.repository();
        match self
            .aws
            .ensure_repository(repository, image.region(), self.settings.probe_policy)
            .await?
        {
            RepositoryAction::Existing => report
                .steps
                .push(format!("ECR repository '{repository}' exists")),
            RepositoryAction::Created => report
                .steps
                .push(format!("Created ECR repository '{repository}'")),
        }

        let password = self.aws.ecr_login_password(image.region()).await?;
        let registry = image.registry_host();
        self.docker.login(&registry, &password).await?;
        report.steps.push(format!("Logged in to {registry}"));

        tracing::info!(%image, "pushing image");
        self.docker.push(&image).await?;
        report.steps.push(format!("Pushed {image}"));

        Ok(())
    }

    /// Create or update the function and publish a version.
    pub async fn deploy(&self, report: &mut PipelineReport) -> anyhow::Result<()> {
        let account = self.account().await?;
        let image = self.settings.image_reference(account);
        report.image = Some(image.to_string());
        self.warn_on_stale_tag();

        let spec = FunctionSpec::from_settings(&self.settings, &image, account);
        let outcome = self
            .aws
            .deploy_function(&spec, self.settings.probe_policy)
            .await?;

        report.steps.push(format!(
            "Function '{}' {}, published version {}",
            spec.name, outcome.action, outcome.version
        ));
        report.deploy = Some(outcome);

        Ok(())
    }

    /// All three phases in order; the first failure stops the run.
    pub async fn release(&self) -> anyhow::Result<PipelineReport> {
        let mut report = PipelineReport::default();
        self.build(&mut report).await?;
        self.push(&mut report).await?;
        self.deploy(&mut report).await?;
        Ok(report)
    }

    /// The tag file is advisory: a mismatch is logged, never enforced.
    fn warn_on_stale_tag(&self) {
        match read_last_tag(&self.project_dir) {
            Ok(Some(last)) if last != self.settings.tag => tracing::warn!(
                last_built = %last,
                requested = %self.settings.tag,
                "requested tag differs from the last built tag"
            ),
            Ok(Some(_)) | Ok(None) => {}
            // arch-lint: allow(no-error-swallowing) reason="tag file is advisory; an unreadable file is logged, never enforced"
            Err(e) => tracing::warn!(error = %e, "could not read last built tag"),
        }
    }
}
