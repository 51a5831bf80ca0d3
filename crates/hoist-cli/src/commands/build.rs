use super::pipeline::{Pipeline, PipelineReport};

/// Build the image locally and tag it for the registry.
pub async fn build() -> anyhow::Result<()> {
    let pipeline = Pipeline::from_cwd()?;
    let mut report = PipelineReport::default();

    println!("Building {}...", pipeline.settings().image_name);
    pipeline.build(&mut report).await?;

    println!();
    print!("{report}");
    println!();
    println!("Next: hoist push");
    Ok(())
}
