use super::pipeline::{Pipeline, PipelineReport};

/// Publish the locally built image to ECR.
pub async fn push() -> anyhow::Result<()> {
    let pipeline = Pipeline::from_cwd()?;
    let mut report = PipelineReport::default();

    println!("Pushing {}...", pipeline.settings().image_name);
    pipeline.push(&mut report).await?;

    println!();
    print!("{report}");
    println!();
    println!("Next: hoist deploy");
    Ok(())
}
