//! Roost CLI entry point.

use clap::Parser;

use roost::cli::{commands, handle_error, Cli};
use roost::infrastructure::{ConfigLoader, LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => handle_error(&err, cli.json),
    };

    let _logger = match LoggerImpl::init(&LogConfig::from(&config.logging)) {
        Ok(logger) => logger,
        Err(err) => handle_error(&err, cli.json),
    };

    if let Err(err) = commands::execute(cli.command, &config, cli.json).await {
        handle_error(&err, cli.json);
    }
}
