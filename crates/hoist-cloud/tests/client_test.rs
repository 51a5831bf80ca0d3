use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use hoist_cloud::aws::AwsClient;
use hoist_cloud::cli::CliError;
use hoist_cloud::docker::DockerClient;
use hoist_cloud::doctor::{CheckResult, DoctorReport, run_doctor};
use hoist_cloud::ecr::RepositoryAction;
use hoist_cloud::error::{DeployError, IdentityError, PublishError, StatusError};
use hoist_cloud::executor::CliExecutor;
use hoist_cloud::lambda::{DeployAction, FunctionSpec};
use hoist_core::{HoistConfig, ProbeErrorPolicy, Settings};
use mockall::mock;
use secrecy::ExposeSecret;

mock! {
    Executor {}

    impl CliExecutor for Executor {
        async fn exec(&self, args: &[String]) -> Result<String, CliError>;
        async fn exec_streaming(&self, args: &[String]) -> Result<(), CliError>;
        async fn exec_with_stdin(
            &self,
            args: &[String],
            stdin_data: &[u8],
        ) -> Result<String, CliError>;
    }
}

// ── Helpers ──

/// Every command the fake executor saw, joined with spaces.
#[derive(Clone, Default)]
struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    fn record(&self, args: &[String]) -> String {
        let cmd = args.join(" ");
        self.0.lock().unwrap().push(cmd.clone());
        cmd
    }

    fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn count(&self, needle: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(needle)).count()
    }
}

fn failed(stderr: &str) -> CliError {
    CliError::CommandFailed {
        program: "aws".to_owned(),
        args: vec![],
        stderr: stderr.to_owned(),
    }
}

/// AWS client whose `exec` answers through `respond`.
fn scripted_aws(respond: fn(&str) -> Result<String, CliError>) -> (AwsClient<MockExecutor>, CallLog) {
    let log = CallLog::default();
    let recorder = log.clone();
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .returning(move |args| respond(&recorder.record(args)));
    (AwsClient::with_executor(mock), log)
}

const PUBLISHED: &str = r#"{
    "FunctionName": "tableau-export",
    "FunctionArn": "arn:aws:lambda:us-east-1:123456789012:function:tableau-export:7",
    "Version": "7",
    "PackageType": "Image"
}"#;

fn is_probe(cmd: &str) -> bool {
    cmd.starts_with("lambda get-function --function-name")
}

fn spec() -> FunctionSpec {
    let settings = Settings::from_sources(HoistConfig::default(), |_| None).unwrap();
    let image = settings.image_reference("123456789012");
    FunctionSpec::from_settings(&settings, &image, "123456789012")
}

fn index_of(calls: &[String], needle: &str) -> usize {
    calls
        .iter()
        .position(|c| c.contains(needle))
        .unwrap_or_else(|| panic!("no call containing {needle:?} in {calls:#?}"))
}

// ── Identity Tests ──

#[tokio::test]
async fn caller_account_is_trimmed() {
    let (client, log) = scripted_aws(|_| Ok("123456789012\n".to_owned()));

    let account = client.caller_account().await.unwrap();

    assert_eq!(account, "123456789012");
    assert_eq!(
        log.calls(),
        vec!["sts get-caller-identity --query Account --output text"]
    );
}

#[tokio::test]
async fn empty_account_is_an_error() {
    let (client, _) = scripted_aws(|_| Ok("\n".to_owned()));

    let result = client.caller_account().await;
    assert!(matches!(result, Err(IdentityError::EmptyAccount)));
}

#[tokio::test]
async fn configured_account_skips_identity_lookup() {
    let mut mock = MockExecutor::new();
    mock.expect_exec().never();

    let settings = Settings::from_sources(HoistConfig::default(), |k| {
        (k == "AWS_ACCOUNT_ID").then(|| "999988887777".to_owned())
    })
    .unwrap();

    let client = AwsClient::with_executor(mock);
    assert_eq!(client.resolve_account(&settings).await.unwrap(), "999988887777");
}

#[tokio::test]
async fn identity_failure_is_reported() {
    let (client, _) = scripted_aws(|_| Err(failed("ExpiredToken")));

    let settings = Settings::from_sources(HoistConfig::default(), |_| None).unwrap();
    let result = client.resolve_account(&settings).await;

    assert!(matches!(result, Err(IdentityError::Lookup { .. })));
}

// ── ECR Tests ──

#[tokio::test]
async fn existing_repository_is_left_alone() {
    let (client, log) = scripted_aws(|cmd| {
        assert!(cmd.starts_with("ecr describe-repositories"), "unexpected: {cmd}");
        Ok("{}".to_owned())
    });

    let action = client
        .ensure_repository("tableau-export", "us-east-1", ProbeErrorPolicy::Abort)
        .await
        .unwrap();

    assert_eq!(action, RepositoryAction::Existing);
    assert_eq!(log.count("create-repository"), 0);
}

#[tokio::test]
async fn missing_repository_is_created() {
    let (client, log) = scripted_aws(|cmd| {
        if cmd.starts_with("ecr describe-repositories") {
            Err(failed(
                "An error occurred (RepositoryNotFoundException) when calling the DescribeRepositories operation",
            ))
        } else {
            Ok("{}".to_owned())
        }
    });

    let action = client
        .ensure_repository("tableau-export", "eu-west-1", ProbeErrorPolicy::Abort)
        .await
        .unwrap();

    assert_eq!(action, RepositoryAction::Created);
    assert_eq!(
        log.calls()[1],
        "ecr create-repository --repository-name tableau-export --region eu-west-1"
    );
}

#[tokio::test]
async fn repository_probe_error_aborts_by_default() {
    let (client, log) = scripted_aws(|_| Err(failed("Could not connect to the endpoint URL")));

    let result = client
        .ensure_repository("tableau-export", "us-east-1", ProbeErrorPolicy::Abort)
        .await;

    assert!(matches!(result, Err(PublishError::Probe { .. })));
    assert_eq!(log.count("create-repository"), 0);
}

#[tokio::test]
async fn repository_probe_error_creates_when_lenient() {
    let (client, log) = scripted_aws(|cmd| {
        if cmd.starts_with("ecr describe-repositories") {
            Err(failed("Could not connect to the endpoint URL"))
        } else {
            Ok("{}".to_owned())
        }
    });

    let action = client
        .ensure_repository("tableau-export", "us-east-1", ProbeErrorPolicy::AssumeAbsent)
        .await
        .unwrap();

    assert_eq!(action, RepositoryAction::Created);
    assert_eq!(log.count("create-repository"), 1);
}

#[tokio::test]
async fn repository_create_failure_is_fatal() {
    let (client, _) = scripted_aws(|cmd| {
        if cmd.starts_with("ecr describe-repositories") {
            Err(failed("RepositoryNotFoundException"))
        } else {
            Err(failed("AccessDeniedException"))
        }
    });

    let result = client
        .ensure_repository("tableau-export", "us-east-1", ProbeErrorPolicy::AssumeAbsent)
        .await;

    assert!(matches!(result, Err(PublishError::CreateRepository { .. })));
}

#[tokio::test]
async fn login_password_is_wrapped_as_secret() {
    let (client, log) = scripted_aws(|_| Ok("eyJwYXlsb2FkIjoi\n".to_owned()));

    let password = client.ecr_login_password("us-east-1").await.unwrap();

    assert_eq!(password.expose_secret(), "eyJwYXlsb2FkIjoi");
    assert_eq!(log.calls(), vec!["ecr get-login-password --region us-east-1"]);
}

// ── Lambda Deploy Tests ──

#[tokio::test]
async fn deploy_creates_missing_function() {
    let (client, log) = scripted_aws(|cmd| {
        if is_probe(cmd) {
            Err(failed(
                "An error occurred (ResourceNotFoundException) when calling the GetFunction operation",
            ))
        } else if cmd.contains("publish-version") {
            Ok(PUBLISHED.to_owned())
        } else {
            Ok("{}".to_owned())
        }
    });

    let outcome = client
        .deploy_function(&spec(), ProbeErrorPolicy::Abort)
        .await
        .unwrap();

    assert_eq!(outcome.action, DeployAction::Created);
    assert_eq!(outcome.version, "7");
    assert!(outcome.function_arn.ends_with(":tableau-export:7"));

    let calls = log.calls();
    assert_eq!(calls.len(), 4, "{calls:#?}");
    assert!(calls[1].starts_with("lambda create-function"));
    assert!(calls[2].starts_with("lambda wait function-active-v2"));
    assert!(calls[3].starts_with("lambda publish-version"));
    assert_eq!(log.count("update-function"), 0);
}

#[tokio::test]
async fn create_declares_image_role_and_environment() {
    let (client, log) = scripted_aws(|cmd| {
        if is_probe(cmd) {
            Err(failed("ResourceNotFoundException"))
        } else if cmd.contains("publish-version") {
            Ok(PUBLISHED.to_owned())
        } else {
            Ok(String::new())
        }
    });

    client
        .deploy_function(&spec(), ProbeErrorPolicy::Abort)
        .await
        .unwrap();

    let create = &log.calls()[1];
    assert!(create.contains("--package-type Image"));
    assert!(create.contains(
        "--code ImageUri=123456789012.dkr.ecr.us-east-1.amazonaws.com/tableau-export:latest"
    ));
    assert!(create.contains("--role arn:aws:iam::123456789012:role/lambda-execution-role"));
    assert!(create.contains("--timeout 300"));
    assert!(create.contains("--memory-size 512"));
    assert!(create.contains(
        r#"--environment {"Variables":{"S3_SECRET_NAME":"tableau-export/s3","TABLEAU_SECRET_NAME":"tableau-export/tableau"}}"#
    ));
}

#[tokio::test]
async fn deploy_updates_existing_function() {
    let (client, log) = scripted_aws(|cmd| {
        if cmd.contains("publish-version") {
            Ok(PUBLISHED.to_owned())
        } else {
            Ok("{}".to_owned())
        }
    });

    let outcome = client
        .deploy_function(&spec(), ProbeErrorPolicy::Abort)
        .await
        .unwrap();

    assert_eq!(outcome.action, DeployAction::Updated);

    let calls = log.calls();
    assert_eq!(calls.len(), 6, "{calls:#?}");
    let code = index_of(&calls, "update-function-code");
    let config = index_of(&calls, "update-function-configuration");
    let publish = index_of(&calls, "publish-version");
    assert!(code < config && config < publish);
    assert!(calls[code].contains(
        "--image-uri 123456789012.dkr.ecr.us-east-1.amazonaws.com/tableau-export:latest"
    ));
    assert!(calls[config].contains("--memory-size 512"));
    assert!(calls[code + 1].starts_with("lambda wait function-updated-v2"));
    assert!(calls[config + 1].starts_with("lambda wait function-updated-v2"));
    assert_eq!(log.count("create-function"), 0);
}

#[tokio::test]
async fn second_deploy_updates_what_the_first_created() {
    let log = CallLog::default();
    let recorder = log.clone();
    let exists = Arc::new(AtomicBool::new(false));

    let mut mock = MockExecutor::new();
    mock.expect_exec().returning(move |args| {
        let cmd = recorder.record(args);
        if is_probe(&cmd) {
            if exists.load(Ordering::SeqCst) {
                Ok("{}".to_owned())
            } else {
                Err(failed("ResourceNotFoundException"))
            }
        } else if cmd.starts_with("lambda create-function") {
            exists.store(true, Ordering::SeqCst);
            Ok("{}".to_owned())
        } else if cmd.contains("publish-version") {
            Ok(PUBLISHED.to_owned())
        } else {
            Ok("{}".to_owned())
        }
    });
    let client = AwsClient::with_executor(mock);

    let first = client
        .deploy_function(&spec(), ProbeErrorPolicy::Abort)
        .await
        .unwrap();
    let second = client
        .deploy_function(&spec(), ProbeErrorPolicy::Abort)
        .await
        .unwrap();

    assert_eq!(first.action, DeployAction::Created);
    assert_eq!(second.action, DeployAction::Updated);
    assert_eq!(log.count("create-function"), 1);
    assert_eq!(log.count("publish-version"), 2);
}

#[tokio::test]
async fn function_probe_error_aborts_by_default() {
    let (client, log) = scripted_aws(|_| Err(failed("Could not connect to the endpoint URL")));

    let result = client.deploy_function(&spec(), ProbeErrorPolicy::Abort).await;

    assert!(matches!(result, Err(DeployError::Probe { .. })));
    assert_eq!(log.calls().len(), 1);
}

#[tokio::test]
async fn function_probe_error_takes_create_path_when_lenient() {
    let (client, log) = scripted_aws(|cmd| {
        if is_probe(cmd) {
            Err(failed("Could not connect to the endpoint URL"))
        } else if cmd.contains("publish-version") {
            Ok(PUBLISHED.to_owned())
        } else {
            Ok("{}".to_owned())
        }
    });

    let outcome = client
        .deploy_function(&spec(), ProbeErrorPolicy::AssumeAbsent)
        .await
        .unwrap();

    assert_eq!(outcome.action, DeployAction::Created);
    assert_eq!(log.count("create-function"), 1);
}

#[tokio::test]
async fn failed_code_update_publishes_nothing() {
    let (client, log) = scripted_aws(|cmd| {
        if cmd.contains("update-function-code") {
            Err(failed("InvalidParameterValueException"))
        } else {
            Ok("{}".to_owned())
        }
    });

    let result = client.deploy_function(&spec(), ProbeErrorPolicy::Abort).await;

    assert!(matches!(result, Err(DeployError::UpdateCode { .. })));
    assert_eq!(log.count("update-function-configuration"), 0);
    assert_eq!(log.count("publish-version"), 0);
}

#[tokio::test]
async fn failed_configuration_update_leaves_new_code_unpublished() {
    let (client, log) = scripted_aws(|cmd| {
        if cmd.contains("update-function-configuration") {
            Err(failed("ResourceConflictException"))
        } else {
            Ok("{}".to_owned())
        }
    });

    let result = client.deploy_function(&spec(), ProbeErrorPolicy::Abort).await;

    assert!(matches!(result, Err(DeployError::UpdateConfiguration { .. })));
    assert_eq!(log.count("update-function-code"), 1);
    assert_eq!(log.count("publish-version"), 0);
}

#[tokio::test]
async fn failed_create_publishes_nothing() {
    let (client, log) = scripted_aws(|cmd| {
        if is_probe(cmd) {
            Err(failed("ResourceNotFoundException"))
        } else {
            Err(failed("InvalidParameterValueException: role cannot be assumed"))
        }
    });

    let result = client.deploy_function(&spec(), ProbeErrorPolicy::Abort).await;

    assert!(matches!(result, Err(DeployError::Create { .. })));
    assert_eq!(log.count("publish-version"), 0);
}

#[tokio::test]
async fn waiter_failure_is_reported_with_stage() {
    let (client, _) = scripted_aws(|cmd| {
        if cmd.starts_with("lambda wait") {
            Err(failed("Waiter FunctionUpdatedV2 failed"))
        } else {
            Ok("{}".to_owned())
        }
    });

    let result = client.deploy_function(&spec(), ProbeErrorPolicy::Abort).await;

    match result {
        Err(DeployError::Wait { stage, .. }) => assert_eq!(stage, "code update"),
        other => panic!("expected wait error, got {other:?}"),
    }
}

#[tokio::test]
async fn unparseable_publish_response_is_an_error() {
    let (client, _) = scripted_aws(|cmd| {
        if cmd.contains("publish-version") {
            Ok("not json".to_owned())
        } else {
            Ok("{}".to_owned())
        }
    });

    let result = client.deploy_function(&spec(), ProbeErrorPolicy::Abort).await;
    assert!(matches!(result, Err(DeployError::InvalidResponse { .. })));
}

#[test]
fn function_spec_uses_full_role_arn_and_static_environment() {
    let mut config = HoistConfig::default();
    config.function.role = "arn:aws:iam::555566667777:role/exporter".to_owned();
    config.function.environment = BTreeMap::from([("LOG_LEVEL".to_owned(), "debug".to_owned())]);
    let settings = Settings::from_sources(config, |_| None).unwrap();
    let image = settings.image_reference("123456789012");

    let spec = FunctionSpec::from_settings(&settings, &image, "123456789012");

    assert_eq!(spec.role_arn, "arn:aws:iam::555566667777:role/exporter");
    assert_eq!(spec.environment.len(), 3);
    assert_eq!(spec.image_uri, image.to_string());
}

// ── Status Tests ──

#[tokio::test]
async fn status_of_missing_function_is_none() {
    let (client, _) = scripted_aws(|_| Err(failed("ResourceNotFoundException")));

    let config = client
        .function_configuration("tableau-export", "us-east-1")
        .await
        .unwrap();
    assert!(config.is_none());
}

#[tokio::test]
async fn status_error_is_reported() {
    let (client, _) = scripted_aws(|_| Err(failed("AccessDeniedException")));

    let result = client
        .function_configuration("tableau-export", "us-east-1")
        .await;
    assert!(matches!(result, Err(StatusError::Describe { .. })));
}

// ── Doctor Tests ──

/// Docker client whose `exec` answers through `respond`.
fn scripted_docker(
    respond: fn(&str) -> Result<String, CliError>,
) -> (DockerClient<MockExecutor>, CallLog) {
    let log = CallLog::default();
    let recorder = log.clone();
    let mut mock = MockExecutor::new();
    mock.expect_exec()
        .returning(move |args| respond(&recorder.record(args)));
    (DockerClient::with_executor(mock), log)
}

fn healthy_docker(cmd: &str) -> Result<String, CliError> {
    if cmd.starts_with("buildx version") {
        Ok("github.com/docker/buildx v0.17.1 257815a\n".to_owned())
    } else {
        Ok("27.3.1\n".to_owned())
    }
}

#[tokio::test]
async fn doctor_passes_when_every_tool_answers() {
    let (aws, _) = scripted_aws(|cmd| {
        if cmd == "--version" {
            Ok("aws-cli/2.15.0 Python/3.11.6 Linux/6.5.0 exe/x86_64\n".to_owned())
        } else {
            Ok("123456789012\n".to_owned())
        }
    });
    let (docker, _) = scripted_docker(healthy_docker);

    let mut report = run_doctor(&aws, &docker).await;
    report.descriptor = CheckResult::ok("./Dockerfile");
    report.config_file = CheckResult::ok("Found");

    assert!(report.all_passed());
    assert_eq!(report.aws_cli.detail, "aws-cli/2.15.0");
    assert_eq!(report.identity.detail, "account 123456789012");
    assert_eq!(report.docker.detail, "27.3.1");
}

#[tokio::test]
async fn doctor_keeps_checking_after_a_failure() {
    let (aws, aws_log) = scripted_aws(|_| {
        Err(CliError::NotFound {
            program: "aws".to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        })
    });
    let (docker, docker_log) = scripted_docker(healthy_docker);

    let report = run_doctor(&aws, &docker).await;

    assert!(!report.aws_cli.passed);
    assert!(!report.identity.passed);
    assert!(report.docker.passed);
    assert!(report.buildx.passed);
    assert!(!report.all_passed());

    assert_eq!(aws_log.count("--version"), 1);
    assert_eq!(aws_log.count("sts get-caller-identity"), 1);
    assert_eq!(docker_log.count("buildx version"), 1);
    assert_eq!(docker_log.calls().len(), 2);
}

#[tokio::test]
async fn doctor_fails_without_buildx() {
    let (aws, _) = scripted_aws(|_| Ok("123456789012\n".to_owned()));
    let (docker, _) = scripted_docker(|cmd| {
        if cmd.starts_with("buildx") {
            Err(failed("docker: 'buildx' is not a docker command."))
        } else {
            Ok("27.3.1\n".to_owned())
        }
    });

    let report = run_doctor(&aws, &docker).await;

    assert!(report.docker.passed);
    assert!(!report.buildx.passed);
    assert!(!report.all_passed());
}

#[test]
fn doctor_table_marks_each_check() {
    let report = DoctorReport {
        aws_cli: CheckResult::ok("aws-cli/2.15.0"),
        identity: CheckResult::fail("failed to look up AWS account ID"),
        docker: CheckResult::ok("27.3.1"),
        buildx: CheckResult::ok("v0.17.1"),
        descriptor: CheckResult::ok("./Dockerfile"),
        config_file: CheckResult::ok("Not found, using defaults"),
    };

    let table = report.to_string();
    let row = |label: &str| {
        table
            .lines()
            .find(|l| l.starts_with(label))
            .unwrap_or_else(|| panic!("no row {label:?} in {table}"))
            .to_owned()
    };

    assert!(table.starts_with("hoist doctor\n"));
    assert!(row("aws CLI").contains("OK"));
    assert!(row("aws CLI").contains("aws-cli/2.15.0"));
    assert!(row("AWS identity").contains("NG"));
    assert!(row("Build descriptor").contains("./Dockerfile"));
    assert!(row("hoist.toml").contains("OK"));
    assert_eq!(table.lines().count(), 8);
}

#[test]
fn default_report_does_not_pass() {
    assert!(!DoctorReport::default().all_passed());
}
