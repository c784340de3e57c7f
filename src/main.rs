// src/main.rs
mod cli;
mod codec;
mod config;
mod defaults;
mod error;
mod models;
mod shop;
mod store;

use clap::Parser;

fn main() -> Result<(), error::AppError> {
    env_logger::init();
    log::info!("Starting garage-ledger");

    let cli_args = cli::Cli::parse();
    let config = config::load_config();

    let result = cli::validate(&cli_args).and_then(|()| cli::handle_cli_command(cli_args, config));
    if let Err(e) = result {
        log::error!("Command failed: {:#?}", e);
        eprintln!("Error: {}", e);
        return Err(e);
    }

    log::info!("garage-ledger finished successfully.");
    Ok(())
}
