pub mod aws;
pub mod cli;
pub mod docker;
pub mod doctor;
pub mod ecr;
pub mod error;
pub mod executor;
pub mod lambda;

pub use aws::AwsClient;
pub use cli::CliError;
pub use docker::{BuildRequest, BuilderContext, DockerClient};
pub use doctor::{CheckResult, DoctorReport, run_doctor};
pub use ecr::RepositoryAction;
pub use error::{BuildError, DeployError, IdentityError, PublishError, StatusError};
pub use executor::{CliExecutor, RealExecutor};
pub use lambda::{DeployAction, DeployOutcome, FunctionSpec};

// ── Helper ──

pub(crate) fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}
