//! Config command

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::{json, Map, Value};

use crate::api::GRAPH_API;
use crate::cli::Context;
use crate::config::settings::{SettingsError, KNOWN_SETTINGS};
use crate::config::{Config, Resource, SettingsStore};
use crate::output;
use crate::validation::{self, Validate, Validator};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the value of a setting
    Get(KeyOptions),

    /// Change a setting
    Set(SetOptions),

    /// List stored settings
    List {
        /// List every available setting instead
        #[arg(long)]
        known: bool,
    },

    /// Reset one setting or all of them
    Reset(ResetOptions),

    /// Show current configuration
    Show,

    /// Test API connection
    Test,

    /// Show config paths
    Paths,
}

#[derive(Args, Debug, Default)]
pub struct KeyOptions {
    /// Setting name
    #[arg(short, long)]
    pub key: String,
}

impl Validate for KeyOptions {
    fn validators(&self) -> Validator {
        Validator::new().check(
            KNOWN_SETTINGS.contains_key(self.key.as_str()),
            SettingsError::UnknownKey(self.key.clone()).to_string(),
        )
    }
}

#[derive(Args, Debug, Default)]
pub struct ResetOptions {
    /// Setting to reset. Resets everything when omitted
    #[arg(short, long)]
    pub key: Option<String>,
}

impl Validate for ResetOptions {
    fn validators(&self) -> Validator {
        match self.key.as_deref() {
            Some(key) => Validator::new().check(
                KNOWN_SETTINGS.contains_key(key),
                format!(
                    "{} is not a valid setting. Allowed values: {}",
                    key,
                    KNOWN_SETTINGS.keys().copied().collect::<Vec<_>>().join(", ")
                ),
            ),
            None => Validator::new(),
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct SetOptions {
    /// Setting name
    #[arg(short, long)]
    pub key: String,

    /// New value
    #[arg(long)]
    pub value: String,
}

fn open_store() -> Result<SettingsStore> {
    Ok(SettingsStore::open(&Config::settings_path()?)?)
}

pub async fn execute(ctx: &Context, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Get(opts) => {
            validation::run(&opts)?;
            let store = open_store()?;
            ctx.print(&store.get(&opts.key).cloned().unwrap_or(Value::Null))?;
        }

        ConfigCommand::Set(opts) => {
            let mut store = open_store()?;
            store.set(&opts.key, &opts.value)?;
            store.save()?;
            output::success(&format!("Set {} to {}", opts.key, opts.value));
        }

        ConfigCommand::List { known } => {
            if known {
                ctx.print(&known_settings())?;
            } else {
                let store = open_store()?;
                let map: Map<String, Value> = store
                    .values()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                ctx.print(&map)?;
            }
        }

        ConfigCommand::Reset(opts) => {
            validation::run(&opts)?;
            let mut store = open_store()?;

            match opts.key {
                Some(key) => {
                    if !store.remove(&key) {
                        output::warning(&format!("Setting {} was not set", key));
                    }
                }
                None => store.clear(),
            }
            store.save()?;
            output::success("Settings reset");
        }

        ConfigCommand::Show => show(&ctx.config),

        ConfigCommand::Test => {
            output::info("Testing API connection...");

            let response = ctx
                .client
                .get(&format!("{}/organization?$select=id,displayName", GRAPH_API))
                .await?;
            let name = response
                .pointer("/value/0/displayName")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            output::success(&format!("Connected to tenant {}", name));
        }

        ConfigCommand::Paths => {
            output::info("Configuration paths:");

            if let Ok(config_dir) = Config::config_dir() {
                println!("  Config directory: {}", config_dir.display());
            }
            println!("  Settings file: {}", Config::settings_path()?.display());
            println!("  Environment file: .env (current directory)");
        }
    }

    Ok(())
}

fn known_settings() -> Vec<Value> {
    KNOWN_SETTINGS
        .values()
        .map(|def| json!({ "key": def.key, "description": def.description }))
        .collect()
}

fn show(config: &Config) {
    output::info("Current configuration:");

    for (label, resource) in [
        ("Graph", Resource::Graph),
        ("SharePoint", Resource::SharePoint),
        ("Power Platform", Resource::PowerPlatform),
        ("Dataverse", Resource::Dataverse),
    ] {
        if config.bearer_token(resource).is_some() {
            println!("  {} token: set", label);
        } else {
            output::warning(&format!("  {} token: not configured!", label));
        }
    }

    match config.spo_url {
        Some(ref url) => println!("  SharePoint URL: {}", url),
        None => println!("  SharePoint URL: (not set)"),
    }

    println!("  Output Format: {:?}", config.output_format);
    println!("  Auto confirm: {}", config.auto_confirm);
}
