//! sponsorchat - AI chat for the sponsor marketplace dashboard
//!
//! Main entry point for the sponsorchat command-line front-end.

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sponsorchat::cli::{Cli, Commands};
use sponsorchat::commands;
use sponsorchat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Chat { surface } => {
            tracing::info!("Starting interactive chat on the {} surface", surface);
            commands::chat::run_chat(config, surface).await?;
            Ok(())
        }
        Commands::Ask { message } => {
            tracing::debug!("Sending quick message");
            commands::ask::run_ask(config, message).await?;
            Ok(())
        }
        Commands::Login { token } => {
            commands::auth::login(&config, &token)?;
            Ok(())
        }
        Commands::Logout => {
            tracing::info!("Logging out");
            commands::auth::logout(&config)?;
            Ok(())
        }
        Commands::Sessions { command } => {
            let store = commands::open_store(&config)?;
            commands::sessions::handle_sessions(&store, command)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so they never interleave with revealed replies.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "sponsorchat=debug"
    } else {
        "sponsorchat=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
