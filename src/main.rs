//! m365 - command-line administration for Microsoft 365
//!
//! Thin commands over the Graph, SharePoint, Power Platform and Dataverse
//! APIs: validate options, confirm destructive actions, call the API, print.

mod api;
mod cli;
mod config;
mod output;
mod prompt;
mod validation;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Context};
use crate::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    // Load configuration
    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            output::error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };
    if let Some(format) = cli.output {
        config.output_format = format;
    }
    let error_output = config.error_output;

    // Execute command
    let result = match Context::new(config) {
        Ok(ctx) => cli::execute(&ctx, cli.command).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("Command failed: {:?}", e);
            output::report_error(&e.to_string(), error_output);
            ExitCode::FAILURE
        }
    }
}
