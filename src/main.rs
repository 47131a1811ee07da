use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use streak_keeper::{Config, Coordinator, GitHubClient, RunReport};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "streak_keeper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let client = match GitHubClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create platform client: {e}");
            return ExitCode::FAILURE;
        }
    };

    match Coordinator::new(Arc::new(client), config).run().await {
        Ok(RunReport::NotNeeded { count, minimum }) => {
            info!("{count} contribution(s) today, minimum of {minimum} already met");
            ExitCode::SUCCESS
        }
        Ok(RunReport::Mutated {
            count,
            required,
            report,
        }) => {
            info!(
                "{count} contribution(s) today, wrote {} of {required} file(s)",
                report.succeeded()
            );
            for failure in report.failures() {
                if let Err(e) = &failure.result {
                    warn!("Could not write {}: {e}", failure.path);
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Run failed: {e}");
            ExitCode::FAILURE
        }
    }
}
