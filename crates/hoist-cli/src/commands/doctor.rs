use std::path::Path;

use hoist_build::locate_descriptor;
use hoist_cloud::{AwsClient, CheckResult, DockerClient};
use hoist_core::{CONFIG_FILE, HoistConfig, Settings};

pub async fn doctor() -> anyhow::Result<()> {
    let project_dir = Path::new(".");

    let mut report = hoist_cloud::run_doctor(&AwsClient::new(), &DockerClient::new()).await;

    report.config_file = if !project_dir.join(CONFIG_FILE).exists() {
        CheckResult::ok("Not found, using defaults")
    } else {
        match HoistConfig::load(project_dir) {
            Ok(_) => CheckResult::ok("Found"),
            Err(e) => CheckResult::fail(&e.to_string()),
        }
    };

    report.descriptor = match Settings::resolve(project_dir) {
        Ok(settings) => match locate_descriptor(project_dir, &settings.descriptor) {
            Ok(path) => CheckResult::ok(&path.display().to_string()),
            Err(e) => CheckResult::fail(&e.to_string()),
        },
        Err(e) => CheckResult::fail(&e.to_string()),
    };

    println!();
    println!("{report}");

    if !report.all_passed() {
        anyhow::bail!("some checks failed — see above for details");
    }

    Ok(())
}
