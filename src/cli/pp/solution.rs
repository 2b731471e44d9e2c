//! Dataverse solution commands

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde_json::Value;

use crate::api::encode_component;
use crate::api::spo::escape_odata;
use crate::cli::pp::dynamics_api_url;
use crate::cli::Context;
use crate::output;
use crate::validation::{self, OptionSet, Validate, Validator};

#[derive(Args, Debug)]
pub struct SolutionArgs {
    #[command(subcommand)]
    pub command: SolutionCommand,
}

#[derive(Subcommand, Debug)]
pub enum SolutionCommand {
    /// List solutions in an environment
    List(EnvironmentOptions),

    /// Remove a solution from an environment
    Remove(RemoveOptions),
}

#[derive(Args, Debug, Default, Clone)]
pub struct EnvironmentOptions {
    /// Name of the environment
    #[arg(short, long = "environmentName")]
    pub environment_name: String,

    /// Run as administrator for environments you don't own
    #[arg(long = "asAdmin")]
    pub as_admin: bool,
}

impl Validate for EnvironmentOptions {}

#[derive(Args, Debug, Default)]
pub struct RemoveOptions {
    #[command(flatten)]
    pub environment: EnvironmentOptions,

    /// ID of the solution
    #[arg(short, long)]
    pub id: Option<String>,

    /// Unique name of the solution
    #[arg(short, long)]
    pub name: Option<String>,

    /// Don't prompt for confirmation
    #[arg(short, long)]
    pub force: bool,
}

impl Validate for RemoveOptions {
    fn option_sets(&self) -> Vec<OptionSet> {
        vec![OptionSet::exactly_one(&[
            ("id", self.id.is_some()),
            ("name", self.name.is_some()),
        ])]
    }

    fn validators(&self) -> Validator {
        Validator::new().guid("id", self.id.as_deref())
    }
}

pub async fn execute(ctx: &Context, args: SolutionArgs) -> Result<()> {
    match args.command {
        SolutionCommand::List(opts) => list(ctx, opts).await,
        SolutionCommand::Remove(opts) => remove(ctx, opts).await,
    }
}

pub async fn list(ctx: &Context, opts: EnvironmentOptions) -> Result<()> {
    validation::run(&opts)?;

    let api_url = dynamics_api_url(&ctx.client, &opts.environment_name, opts.as_admin).await?;
    let solutions = ctx
        .client
        .get_all_items(&format!(
            "{}/api/data/v9.0/solutions?$filter=isvisible eq true&$expand=publisherid($select=friendlyname)&$select=solutionid,uniquename,version,publisherid,installedon,solutionpackageversion,friendlyname,versionnumber&api-version=9.1",
            api_url
        ))
        .await?;

    let solutions: Vec<Value> = solutions.into_iter().map(flatten_publisher).collect();
    ctx.print_list(&solutions, &["uniquename", "version", "publisher"])
}

/// Lift the expanded publisher name to a top-level `publisher` property
fn flatten_publisher(mut solution: Value) -> Value {
    let publisher = solution
        .pointer("/publisherid/friendlyname")
        .cloned()
        .unwrap_or(Value::Null);
    solution["publisher"] = publisher;
    solution
}

async fn solution_id_by_name(ctx: &Context, api_url: &str, name: &str) -> Result<String> {
    let response = ctx
        .client
        .get(&format!(
            "{}/api/data/v9.0/solutions?$filter=isvisible eq true and uniquename eq '{}'&$select=solutionid",
            api_url,
            encode_component(&escape_odata(name))
        ))
        .await?;

    match response
        .pointer("/value/0/solutionid")
        .and_then(|v| v.as_str())
    {
        Some(id) => Ok(id.to_string()),
        None => bail!("The specified solution '{}' does not exist.", name),
    }
}

pub async fn remove(ctx: &Context, opts: RemoveOptions) -> Result<()> {
    validation::run(&opts)?;

    let label = opts.id.as_deref().or(opts.name.as_deref()).unwrap_or_default();
    let confirmed = ctx.confirm(
        opts.force,
        &format!("Are you sure you want to remove solution '{}'?", label),
    )?;
    if !confirmed {
        output::info("Operation cancelled");
        return Ok(());
    }

    let environment = &opts.environment;
    let api_url =
        dynamics_api_url(&ctx.client, &environment.environment_name, environment.as_admin).await?;

    let solution_id = match opts.id.clone() {
        Some(id) => id,
        None => solution_id_by_name(ctx, &api_url, label).await?,
    };

    ctx.client
        .delete(&format!("{}/api/data/v9.1/solutions({})", api_url, solution_id))
        .await?;

    output::success(&format!("Removed solution {}", label));
    Ok(())
}
