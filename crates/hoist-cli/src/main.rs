mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "hoist",
    about = "Build, push, and deploy container-image Lambda functions"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the image from the Dockerfile and tag it for ECR
    Build,
    /// Ensure the ECR repository exists, log in, and push the image
    Push,
    /// Create or update the Lambda function and publish a version
    Deploy,
    /// Run build, push, and deploy in order, stopping at the first failure
    Release {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check tools, credentials, and local files
    Doctor,
    /// Show the image reference, last built tag, and function configuration
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loaded before the subscriber so RUST_LOG may come from .env.
    // A missing .env is normal; variables already in the environment win.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                // arch-lint: allow(no-silent-result-drop) reason="unset or unparsable RUST_LOG falls back to the info level"
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dotenv
        && !e.not_found()
    {
        tracing::warn!(error = %e, "ignoring unreadable .env file");
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Build => commands::build().await?,
        Commands::Push => commands::push().await?,
        Commands::Deploy => commands::deploy().await?,
        Commands::Release { json } => commands::release(json).await?,
        Commands::Doctor => commands::doctor().await?,
        Commands::Status => commands::status().await?,
    }

    Ok(())
}
