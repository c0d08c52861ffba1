//! Binary entry point — parse, load config, dispatch.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use speakd_cli::{ApiClient, Cli, Commands, bootstrap};
use speakd_core::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = AppConfig::load(&cli.config_path())?;
    let port = cli.port.unwrap_or(config.service.port);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let state = bootstrap(config).await?;
            speakd_axum::serve(state, port).await?;
        }
        Commands::Speak {
            text,
            source,
            voice,
        } => {
            ApiClient::new(port)
                .speak(&text, source.as_deref(), voice.as_deref())
                .await?;
        }
        Commands::Voices => ApiClient::new(port).voices().await?,
        Commands::Status => ApiClient::new(port).status().await?,
        Commands::Stop => ApiClient::new(port).stop().await?,
    }

    Ok(())
}
