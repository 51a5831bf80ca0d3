use std::path::Path;

use hoist_core::{ImageReference, ProbeOutcome};
use secrecy::{ExposeSecret, SecretString};

use crate::args;
use crate::cli::CliError;
use crate::error::{BuildError, PublishError};
use crate::executor::{CliExecutor, RealExecutor};

/// Marker docker prints when `buildx inspect` is asked about an unknown builder.
const NO_SUCH_BUILDER: &str = "no builder";

/// Marker docker prints when `image inspect` is asked about an unknown image.
const NO_SUCH_IMAGE: &str = "No such image";

/// Docker / buildx operations, parameterized over the executor for testability.
pub struct DockerClient<E: CliExecutor = RealExecutor> {
    executor: E,
}

impl DockerClient<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor::docker(),
        }
    }
}

impl Default for DockerClient<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

/// Inputs of a single `docker buildx build`.
#[derive(Debug, Clone)]
pub struct BuildRequest<'a> {
    /// Build context directory.
    pub context: &'a Path,
    pub descriptor: &'a Path,
    pub platform: &'a str,
    pub no_cache: bool,
    pub image: &'a ImageReference,
}

/// What happened to the buildx builder context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderContext {
    Reused,
    Created,
}

impl<E: CliExecutor> DockerClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    pub async fn version(&self) -> Result<String, CliError> {
        self.executor
            .exec(&args(["version", "--format", "{{.Server.Version}}"]))
            .await
            .map(|v| v.trim().to_owned())
    }

    // ── Build ──

    /// Check that the buildx plugin is installed and return its version line.
    pub async fn buildx_version(&self) -> Result<String, BuildError> {
        self.executor
            .exec(&args(["buildx", "version"]))
            .await
            .map(|v| v.trim().to_owned())
            .map_err(|e| BuildError::BuildxUnavailable { source: e })
    }

    /// Reuse the named buildx builder, creating it first if it does not exist,
    /// and make it the active one.
    pub async fn ensure_builder(&self, name: &str) -> Result<BuilderContext, BuildError> {
        let builder_err = |e: CliError| BuildError::Builder {
            name: name.to_owned(),
            source: e,
        };

        let probe = match self.executor.exec(&args(["buildx", "inspect", name])).await {
            Ok(_) => ProbeOutcome::Found,
            Err(e) if e.stderr_contains(NO_SUCH_BUILDER) => ProbeOutcome::NotFound,
            Err(e) => ProbeOutcome::Failed(e),
        };

        let context = match probe {
            ProbeOutcome::Found => BuilderContext::Reused,
            ProbeOutcome::NotFound => {
                tracing::info!(builder = name, "creating buildx builder");
                self.executor
                    .exec(&args([
                        "buildx",
                        "create",
                        "--name",
                        name,
                        "--driver",
                        "docker-container",
                    ]))
                    .await
                    .map_err(builder_err)?;
                BuilderContext::Created
            }
            ProbeOutcome::Failed(e) => return Err(builder_err(e)),
        };

        self.executor
            .exec(&args(["buildx", "use", name]))
            .await
            .map_err(builder_err)?;

        Ok(context)
    }

    /// Build the image for the target platform and load it under its local tag.
    pub async fn build_image(&self, request: &BuildRequest<'_>) -> Result<(), BuildError> {
        let context = request.context.to_string_lossy().into_owned();
        let descriptor = request.descriptor.to_string_lossy().into_owned();
        let local_tag = request.image.local_tag();

        let mut cmd = vec![
            "buildx",
            "build",
            "--platform",
            request.platform,
            "--provenance=false",
            "-f",
            &descriptor,
            "-t",
            &local_tag,
            "--load",
        ];
        if request.no_cache {
            cmd.push("--no-cache");
        }
        cmd.push(&context);

        let cmd_owned: Vec<String> = cmd.iter().map(|s| (*s).to_owned()).collect();

        self.executor
            .exec_streaming(&cmd_owned)
            .await
            .map_err(|e| BuildError::Build { source: e })
    }

    /// Give the locally built image its remote registry name.
    pub async fn tag_for_registry(&self, image: &ImageReference) -> Result<(), BuildError> {
        let target = image.to_string();
        self.executor
            .exec(&args(["tag", &image.local_tag(), &target]))
            .await
            .map_err(|e| BuildError::Tag { target, source: e })?;

        Ok(())
    }

    // ── Publish ──

    /// Fail unless the remote-tagged image exists in the local engine.
    pub async fn require_local_image(&self, image: &ImageReference) -> Result<(), PublishError> {
        let name = image.to_string();
        match self
            .executor
            .exec(&args(["image", "inspect", "--format", "{{.Id}}", &name]))
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if e.stderr_contains(NO_SUCH_IMAGE) => {
                Err(PublishError::ImageMissing { image: name })
            }
            Err(e) => Err(PublishError::Inspect {
                image: name,
                source: e,
            }),
        }
    }

    /// Authenticate the local engine against `registry`; the password is
    /// piped on stdin and never appears in the argument list.
    pub async fn login(&self, registry: &str, password: &SecretString) -> Result<(), PublishError> {
        self.executor
            .exec_with_stdin(
                &args([
                    "login",
                    "--username",
                    "AWS",
                    "--password-stdin",
                    registry,
                ]),
                password.expose_secret().as_bytes(),
            )
            .await
            .map_err(|e| PublishError::Login {
                registry: registry.to_owned(),
                source: e,
            })?;

        Ok(())
    }

    pub async fn push(&self, image: &ImageReference) -> Result<(), PublishError> {
        let name = image.to_string();
        self.executor
            .exec_streaming(&args(["push", &name]))
            .await
            .map_err(|e| PublishError::Push {
                image: name,
                source: e,
            })
    }
}
