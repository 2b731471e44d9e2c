//! Power Platform commands

pub mod managementapp;
pub mod solution;

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::api::{encode_component, ApiClient, BAP_API};
use crate::cli::Context;

#[derive(Args, Debug)]
pub struct PpArgs {
    #[command(subcommand)]
    pub command: PpCommand,
}

#[derive(Subcommand, Debug)]
pub enum PpCommand {
    /// Management applications
    Managementapp(managementapp::ManagementappArgs),

    /// Dataverse solutions
    Solution(solution::SolutionArgs),
}

pub async fn execute(ctx: &Context, args: PpArgs) -> Result<()> {
    match args.command {
        PpCommand::Managementapp(args) => managementapp::execute(ctx, args).await,
        PpCommand::Solution(args) => solution::execute(ctx, args).await,
    }
}

/// Web API URL of the Dataverse database linked to an environment
pub async fn dynamics_api_url(
    client: &ApiClient,
    environment: &str,
    as_admin: bool,
) -> Result<String> {
    let scope = if as_admin { "scopes/admin/" } else { "" };
    let url = format!(
        "{}/providers/Microsoft.BusinessAppPlatform/{}environments/{}?api-version=2020-10-01&$select=properties.linkedEnvironmentMetadata.instanceApiUrl",
        BAP_API,
        scope,
        encode_component(environment)
    );

    let response = client.get(&url).await?;

    response
        .pointer("/properties/linkedEnvironmentMetadata/instanceApiUrl")
        .and_then(|v| v.as_str())
        .map(|u| u.trim_end_matches('/').to_string())
        .ok_or_else(|| anyhow!("No Dataverse database found in environment {}", environment))
}
