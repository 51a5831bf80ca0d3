use super::pipeline::Pipeline;

/// Build, push and deploy in one run.
pub async fn release(json: bool) -> anyhow::Result<()> {
    let pipeline = Pipeline::from_cwd()?;
    let report = pipeline.release().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Release complete:");
        print!("{report}");
    }
    Ok(())
}
