use crate::cli::CliError;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("failed to look up AWS account ID — check credentials with: aws sts get-caller-identity")]
    Lookup { source: CliError },

    #[error("identity lookup returned an empty account ID")]
    EmptyAccount,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("docker buildx is not available — install Docker with the buildx plugin")]
    BuildxUnavailable { source: CliError },

    #[error("failed to prepare buildx builder '{name}'")]
    Builder { name: String, source: CliError },

    #[error("image build failed")]
    Build { source: CliError },

    #[error("failed to tag image as {target}")]
    Tag { target: String, source: CliError },
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("image {image} not built locally — run `hoist build` first")]
    ImageMissing { image: String },

    #[error("failed to inspect local image {image}")]
    Inspect { image: String, source: CliError },

    #[error("could not check whether ECR repository '{repository}' exists")]
    Probe { repository: String, source: CliError },

    #[error("failed to create ECR repository '{repository}'")]
    CreateRepository { repository: String, source: CliError },

    #[error("failed to obtain ECR login password")]
    LoginPassword { source: CliError },

    #[error("docker login to {registry} failed")]
    Login { registry: String, source: CliError },

    #[error("docker push of {image} failed")]
    Push { image: String, source: CliError },
}

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("could not check whether function '{function}' exists")]
    Probe { function: String, source: CliError },

    #[error("failed to create function '{function}'")]
    Create { function: String, source: CliError },

    #[error("failed to update code of function '{function}'")]
    UpdateCode { function: String, source: CliError },

    #[error("failed to update configuration of function '{function}'")]
    UpdateConfiguration { function: String, source: CliError },

    #[error("function '{function}' did not settle after {stage}")]
    Wait {
        function: String,
        stage: &'static str,
        source: CliError,
    },

    #[error("failed to publish a version of function '{function}'")]
    PublishVersion { function: String, source: CliError },

    #[error("unexpected response from {operation}")]
    InvalidResponse {
        operation: &'static str,
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("could not read configuration of function '{function}'")]
    Describe { function: String, source: CliError },
}
