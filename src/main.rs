use std::sync::Arc;

use clap::{Parser, Subcommand};
use vidcat_recs::{
    services::{await_self_test, RecommendationService},
    Config,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Recommendation service client for the video catalog")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the connectivity self-test and exit non-zero if it fails
    Check,
    /// Report that a user watched a video
    View { user_id: String, video_id: String },
    /// Print recommended video IDs for a user
    Recommend {
        user_id: String,
        /// Print the IDs as a JSON array
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = Config::from_env()?;
    let client = config.transport_client();
    tracing::info!(endpoint = %client.endpoint(), "Using recommendation service");

    let service = RecommendationService::new(Arc::new(client), config.call_settings());

    // `check` runs the self-test in the foreground instead
    let self_test =
        (!matches!(cli.command, Commands::Check)).then(|| service.spawn_self_test());

    let outcome = run(&service, cli.command).await;

    // Bounded by the self-test's own timeout
    if let Some(handle) = self_test {
        await_self_test(handle).await;
    }

    outcome
}

async fn run(service: &RecommendationService, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Check => {
            if !service.self_test().await {
                anyhow::bail!("Recommendation service self-test failed");
            }
        }
        Commands::View { user_id, video_id } => {
            service.notify_view(&user_id, &video_id).await?;
        }
        Commands::Recommend { user_id, json } => {
            let ids = service.query_recommendations(&user_id).await?;
            if json {
                println!("{}", serde_json::to_string(&ids)?);
            } else {
                for id in ids {
                    println!("{}", id);
                }
            }
        }
    }

    Ok(())
}
