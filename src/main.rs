use clap::Parser;
use pr_stats::cli::Cli;
use pr_stats::config::AppConfig;
use pr_stats::report;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Requests are awaited one at a time, a single thread is enough.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing (logging)
    let default_filter = if cli.verbose {
        "pr_stats=debug"
    } else {
        "pr_stats=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let options = match cli.resolve(config, || {
        rpassword::prompt_password("Enter public access token: ")
    }) {
        Ok(options) => options,
        Err(e) => {
            tracing::error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        repository = %options.repository,
        pages_path = %options.pages_path.display(),
        weeks = options.weeks,
        "Building pull request statistics"
    );

    match report::run(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Failed to build statistics: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
