//! CLI commands module

pub mod config_cmd;
pub mod entra;
pub mod pp;
pub mod request;
pub mod spo;

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::{Config, OutputFormat};
use crate::output;
use crate::prompt::{self, AutoConfirm, Prompter, TerminalPrompter};

/// m365 - manage Microsoft 365 from the command line
#[derive(Parser, Debug)]
#[command(name = "m365")]
#[command(version)]
#[command(about = "Manage Microsoft 365 directory, SharePoint and Power Platform", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Microsoft Entra ID groups
    Entra(entra::EntraArgs),

    /// SharePoint Online
    Spo(spo::SpoArgs),

    /// Power Platform
    Pp(pp::PpArgs),

    /// Send an authenticated request to any supported API
    Request(request::RequestOptions),

    /// Manage CLI settings
    Config(config_cmd::ConfigArgs),
}

/// Everything a command needs while it runs
pub struct Context {
    pub config: Config,
    pub client: ApiClient,
    pub prompter: Arc<dyn Prompter>,
}

impl Context {
    pub fn new(config: Config) -> Result<Self> {
        let client = ApiClient::new(config.clone())?;
        let prompter: Arc<dyn Prompter> = if config.auto_confirm {
            Arc::new(AutoConfirm)
        } else {
            Arc::new(TerminalPrompter)
        };

        Ok(Self {
            config,
            client,
            prompter,
        })
    }

    /// Ask before a destructive operation unless `force` is set
    pub fn confirm(&self, force: bool, message: &str) -> Result<bool> {
        prompt::confirm_unless_forced(force, self.prompter.as_ref(), message)
    }

    pub fn print<T: Serialize>(&self, data: &T) -> Result<()> {
        output::print_output(data, &self.config.output_format)
    }

    pub fn print_list(&self, items: &[Value], columns: &[&str]) -> Result<()> {
        output::print_list(items, &self.config.output_format, columns)
    }
}

/// Run the selected command
pub async fn execute(ctx: &Context, command: Commands) -> Result<()> {
    match command {
        Commands::Entra(args) => entra::execute(ctx, args).await,
        Commands::Spo(args) => spo::execute(ctx, args).await,
        Commands::Pp(args) => pp::execute(ctx, args).await,
        Commands::Request(args) => request::execute(ctx, args).await,
        Commands::Config(args) => config_cmd::execute(ctx, args).await,
    }
}
