use std::fmt;

use crate::aws::AwsClient;
use crate::docker::DockerClient;
use crate::executor::CliExecutor;

#[derive(Debug, Default)]
pub struct DoctorReport {
    pub aws_cli: CheckResult,
    pub identity: CheckResult,
    pub docker: CheckResult,
    pub buildx: CheckResult,
    pub descriptor: CheckResult,
    /// Informational: a missing hoist.toml still passes, defaults apply.
    pub config_file: CheckResult,
}

impl DoctorReport {
    pub fn all_passed(&self) -> bool {
        self.rows().iter().all(|(_, r)| r.passed)
    }

    fn rows(&self) -> [(&'static str, &CheckResult); 6] {
        [
            ("aws CLI", &self.aws_cli),
            ("AWS identity", &self.identity),
            ("docker", &self.docker),
            ("docker buildx", &self.buildx),
            ("Build descriptor", &self.descriptor),
            ("hoist.toml", &self.config_file),
        ]
    }
}

impl fmt::Display for DoctorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "hoist doctor")?;
        writeln!(f, "{}", "─".repeat(44))?;
        for (label, result) in self.rows() {
            writeln!(f, "{label:<18} {:<4} {}", result.icon(), result.detail)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn ok(detail: &str) -> Self {
        Self {
            passed: true,
            detail: detail.to_owned(),
        }
    }

    pub fn fail(detail: &str) -> Self {
        Self {
            passed: false,
            detail: detail.to_owned(),
        }
    }

    pub fn icon(&self) -> &'static str {
        if self.passed { "OK" } else { "NG" }
    }
}

/// Run the tool checks without early return.
///
/// Descriptor and config-file checks are local and filled in by the caller.
pub async fn run_doctor<A, D>(aws: &AwsClient<A>, docker: &DockerClient<D>) -> DoctorReport
where
    A: CliExecutor,
    D: CliExecutor,
{
    let mut report = DoctorReport::default();

    // 1. aws CLI
    report.aws_cli = match aws.version().await {
        // "aws-cli/2.15.0 Python/3.11.6 Linux/6.5.0 exe/x86_64"
        Ok(v) => match v.split_whitespace().next() {
            Some(first) => CheckResult::ok(first),
            None => CheckResult::fail("aws --version printed nothing"),
        },
        Err(e) => CheckResult::fail(&e.to_string()),
    };

    // 2. Credentials
    report.identity = match aws.caller_account().await {
        Ok(account) => CheckResult::ok(&format!("account {account}")),
        Err(e) => CheckResult::fail(&e.to_string()),
    };

    // 3. Docker engine
    report.docker = match docker.version().await {
        Ok(v) if !v.is_empty() => CheckResult::ok(&v),
        Ok(_) => CheckResult::fail("docker daemon not reachable"),
        Err(e) => CheckResult::fail(&e.to_string()),
    };

    // 4. buildx plugin
    report.buildx = match docker.buildx_version().await {
        Ok(v) => CheckResult::ok(&v),
        Err(e) => CheckResult::fail(&e.to_string()),
    };

    report
}
