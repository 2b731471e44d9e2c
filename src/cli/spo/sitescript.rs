//! Site script commands

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};

use crate::api::encode_component;
use crate::api::spo::{self, escape_odata};
use crate::cli::Context;
use crate::output;
use crate::validation::{self, Validate, Validator};

const UTILITY: &str =
    "_api/Microsoft.Sharepoint.Utilities.WebTemplateExtensions.SiteScriptUtility";

#[derive(Args, Debug)]
pub struct SitescriptArgs {
    #[command(subcommand)]
    pub command: SitescriptCommand,
}

#[derive(Subcommand, Debug)]
pub enum SitescriptCommand {
    /// Create a site script
    Add(AddOptions),

    /// Show a site script
    Get(IdOptions),

    /// List site scripts
    List,

    /// Update a site script
    #[command(disable_version_flag = true)]
    Set(SetOptions),

    /// Remove a site script
    Remove(RemoveOptions),
}

#[derive(Args, Debug, Default)]
pub struct AddOptions {
    /// Site script title
    #[arg(short, long)]
    pub title: String,

    /// Site script description
    #[arg(short, long)]
    pub description: Option<String>,

    /// JSON script content
    #[arg(short, long)]
    pub content: String,
}

impl Validate for AddOptions {
    fn validators(&self) -> Validator {
        Validator::new().json("content", Some(self.content.as_str()))
    }
}

#[derive(Args, Debug, Default)]
pub struct IdOptions {
    /// Site script ID
    #[arg(short, long)]
    pub id: String,
}

impl Validate for IdOptions {
    fn validators(&self) -> Validator {
        Validator::new().guid("id", Some(self.id.as_str()))
    }
}

#[derive(Args, Debug, Default)]
pub struct SetOptions {
    /// Site script ID
    #[arg(short, long)]
    pub id: String,

    /// New title
    #[arg(short, long)]
    pub title: Option<String>,

    /// New description
    #[arg(short, long)]
    pub description: Option<String>,

    /// New version number
    #[arg(long)]
    pub version: Option<String>,

    /// New JSON script content
    #[arg(short, long)]
    pub content: Option<String>,
}

impl Validate for SetOptions {
    fn validators(&self) -> Validator {
        Validator::new()
            .guid("id", Some(self.id.as_str()))
            .integer("version", self.version.as_deref())
            .json("content", self.content.as_deref())
    }
}

#[derive(Args, Debug, Default)]
pub struct RemoveOptions {
    #[command(flatten)]
    pub site_script: IdOptions,

    /// Don't prompt for confirmation
    #[arg(short, long)]
    pub force: bool,
}

impl Validate for RemoveOptions {
    fn validators(&self) -> Validator {
        self.site_script.validators()
    }
}

/// Payload of `UpdateSiteScript`; unset fields are left unchanged
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
struct SiteScriptUpdate {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

impl SiteScriptUpdate {
    fn from_options(opts: SetOptions) -> Self {
        Self {
            id: opts.id,
            title: opts.title,
            description: opts.description,
            version: opts.version.and_then(|v| v.trim().parse().ok()),
            content: opts.content,
        }
    }
}

pub async fn execute(ctx: &Context, args: SitescriptArgs) -> Result<()> {
    match args.command {
        SitescriptCommand::Add(opts) => add(ctx, opts).await,
        SitescriptCommand::Get(opts) => get(ctx, opts).await,
        SitescriptCommand::List => list(ctx).await,
        SitescriptCommand::Set(opts) => set(ctx, opts).await,
        SitescriptCommand::Remove(opts) => remove(ctx, opts).await,
    }
}

/// POST to a site script utility method with a fresh request digest
async fn call_utility(ctx: &Context, method: &str, body: Value) -> Result<Value> {
    let spo_url = ctx.config.require_spo_url()?;
    let digest = spo::request_digest(&ctx.client, spo_url).await?;

    let response = ctx
        .client
        .post_with_headers(
            &format!("{}/{}.{}", spo_url, UTILITY, method),
            Some(body),
            &[("X-RequestDigest", digest.as_str())],
        )
        .await?;

    Ok(response)
}

pub async fn add(ctx: &Context, opts: AddOptions) -> Result<()> {
    validation::run(&opts)?;

    let content: Value = serde_json::from_str(&opts.content)?;
    let description = opts.description.as_deref().unwrap_or_default();
    let method = format!(
        "CreateSiteScript(Title=@title,Description=@description)?@title='{}'&@description='{}'",
        encode_component(&escape_odata(&opts.title)),
        encode_component(&escape_odata(description))
    );

    let created = call_utility(ctx, &method, content).await?;
    ctx.print(&created)
}

pub async fn get(ctx: &Context, opts: IdOptions) -> Result<()> {
    validation::run(&opts)?;

    let script = call_utility(ctx, "GetSiteScriptMetadata", json!({ "id": opts.id })).await?;
    ctx.print(&script)
}

pub async fn list(ctx: &Context) -> Result<()> {
    let response = call_utility(ctx, "GetSiteScripts", json!({})).await?;
    let scripts = response
        .get("value")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    ctx.print_list(&scripts, &["Id", "Title", "Version"])
}

pub async fn set(ctx: &Context, opts: SetOptions) -> Result<()> {
    validation::run(&opts)?;

    let update = SiteScriptUpdate::from_options(opts);
    let updated = call_utility(ctx, "UpdateSiteScript", json!({ "updateInfo": update })).await?;
    ctx.print(&updated)
}

pub async fn remove(ctx: &Context, opts: RemoveOptions) -> Result<()> {
    validation::run(&opts)?;

    let id = &opts.site_script.id;
    let confirmed = ctx.confirm(
        opts.force,
        &format!("Are you sure you want to remove site script {}?", id),
    )?;
    if !confirmed {
        output::info("Operation cancelled");
        return Ok(());
    }

    call_utility(ctx, "DeleteSiteScript", json!({ "id": id })).await?;
    output::success(&format!("Removed site script {}", id));
    Ok(())
}
