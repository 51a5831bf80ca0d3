use super::pipeline::{Pipeline, PipelineReport};

/// Point the Lambda function at the pushed image and publish a version.
pub async fn deploy() -> anyhow::Result<()> {
    let pipeline = Pipeline::from_cwd()?;
    let mut report = PipelineReport::default();

    println!("Deploying {}...", pipeline.settings().function_name);
    pipeline.deploy(&mut report).await?;

    println!();
    print!("{report}");
    Ok(())
}
