use hoist_build::read_last_tag;

use super::pipeline::Pipeline;

pub async fn status() -> anyhow::Result<()> {
    let pipeline = Pipeline::from_cwd()?;
    let settings = pipeline.settings();

    let image = pipeline.image().await?;
    println!("Image:     {image}");

    match read_last_tag(pipeline.project_dir())? {
        Some(tag) => println!("Last tag:  {tag}"),
        None => println!("Last tag:  none"),
    }

    let configuration = pipeline
        .aws()
        .function_configuration(&settings.function_name, &settings.region)
        .await?;
    match configuration {
        Some(json) => println!("Function:\n{json}"),
        None => println!(
            "Function:  '{}' not deployed in {}",
            settings.function_name, settings.region
        ),
    }

    Ok(())
}
