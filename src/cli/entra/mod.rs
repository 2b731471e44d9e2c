//! Microsoft Entra ID commands

pub mod group;

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::api::{encode_component, ApiClient, GRAPH_API};
use crate::cli::Context;

#[derive(Args, Debug)]
pub struct EntraArgs {
    #[command(subcommand)]
    pub command: EntraCommand,
}

#[derive(Subcommand, Debug)]
pub enum EntraCommand {
    /// Microsoft 365 groups
    Group(group::GroupArgs),
}

pub async fn execute(ctx: &Context, args: EntraArgs) -> Result<()> {
    match args.command {
        EntraCommand::Group(args) => group::execute(ctx, args).await,
    }
}

/// Resolve a user principal name to the user's object id
pub async fn resolve_user_id(client: &ApiClient, user_name: &str) -> Result<String> {
    let user = client
        .get(&format!(
            "{}/users/{}?$select=id",
            GRAPH_API,
            encode_component(user_name)
        ))
        .await?;

    user.get("id")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("User {} not found", user_name))
}
