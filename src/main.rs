//! Compass CLI entry point.

use clap::Parser;

use compass::cli::{Cli, Commands};
use compass::infrastructure::{config::ConfigLoader, logging};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ConfigLoader::load() {
        Ok(config) => config,
        Err(err) => compass::cli::handle_error(err, cli.json),
    };
    if let Err(err) = logging::init(&config.logging) {
        compass::cli::handle_error(err, cli.json);
    }

    let result = match cli.command {
        Commands::Chat(args) => compass::cli::commands::chat::execute(args, &config).await,
        Commands::Sessions(args) => {
            compass::cli::commands::sessions::execute(args, &config, cli.json).await
        }
        Commands::Init(args) => compass::cli::commands::init::execute(args, cli.json).await,
    };

    if let Err(err) = result {
        compass::cli::handle_error(err, cli.json);
    }
}
