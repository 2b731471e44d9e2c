//! Office 365 CDN commands (tenant client-query API)

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use serde_json::Value;
use tracing::debug;

use crate::api::csom::{self, CsomRequest, Param};
use crate::api::spo;
use crate::cli::Context;
use crate::output;
use crate::validation::{self, Validate, Validator};

const CDN_TYPES: &[&str] = &["Public", "Private"];

#[derive(Args, Debug)]
pub struct CdnArgs {
    #[command(subcommand)]
    pub command: CdnCommand,
}

#[derive(Subcommand, Debug)]
pub enum CdnCommand {
    /// Show whether the CDN is enabled
    Get(CdnTypeOptions),

    /// Enable or disable the CDN
    Set(SetOptions),

    /// CDN origins
    Origin {
        #[command(subcommand)]
        command: OriginCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum OriginCommand {
    /// Add a CDN origin
    Add(OriginOptions),

    /// List CDN origins
    List(CdnTypeOptions),

    /// Remove a CDN origin
    Remove(RemoveOriginOptions),
}

#[derive(Args, Debug, Clone)]
pub struct CdnTypeOptions {
    /// CDN type: Public or Private
    #[arg(short = 't', long = "type", default_value = "Public")]
    pub cdn_type: String,
}

impl Default for CdnTypeOptions {
    fn default() -> Self {
        Self {
            cdn_type: "Public".to_string(),
        }
    }
}

impl CdnTypeOptions {
    fn validator(&self) -> Validator {
        Validator::new().one_of("type", Some(self.cdn_type.as_str()), CDN_TYPES)
    }

    /// Value of the `SPOTenantCdnType` enum
    fn enum_value(&self) -> i32 {
        if self.cdn_type == "Private" {
            1
        } else {
            0
        }
    }
}

impl Validate for CdnTypeOptions {
    fn validators(&self) -> Validator {
        self.validator()
    }
}

#[derive(Args, Debug, Default)]
pub struct SetOptions {
    #[command(flatten)]
    pub cdn: CdnTypeOptions,

    /// true to enable the CDN, false to disable it
    #[arg(short, long)]
    pub enabled: String,
}

impl Validate for SetOptions {
    fn validators(&self) -> Validator {
        self.cdn
            .validator()
            .one_of("enabled", Some(self.enabled.as_str()), &["true", "false"])
    }
}

#[derive(Args, Debug, Default)]
pub struct OriginOptions {
    #[command(flatten)]
    pub cdn: CdnTypeOptions,

    /// Origin to add, e.g. */CDN or sites/site1/library
    #[arg(short = 'r', long)]
    pub origin: String,
}

impl Validate for OriginOptions {
    fn validators(&self) -> Validator {
        self.cdn
            .validator()
            .check(!self.origin.trim().is_empty(), "Specify an origin")
    }
}

#[derive(Args, Debug, Default)]
pub struct RemoveOriginOptions {
    #[command(flatten)]
    pub origin: OriginOptions,

    /// Don't prompt for confirmation
    #[arg(short, long)]
    pub force: bool,
}

impl Validate for RemoveOriginOptions {
    fn validators(&self) -> Validator {
        self.origin.validators()
    }
}

pub async fn execute(ctx: &Context, args: CdnArgs) -> Result<()> {
    match args.command {
        CdnCommand::Get(opts) => get(ctx, opts).await,
        CdnCommand::Set(opts) => set(ctx, opts).await,
        CdnCommand::Origin { command } => match command {
            OriginCommand::Add(opts) => add_origin(ctx, opts).await,
            OriginCommand::List(opts) => list_origins(ctx, opts).await,
            OriginCommand::Remove(opts) => remove_origin(ctx, opts).await,
        },
    }
}

/// Run a single tenant method and return the last element of the response
async fn call_tenant_method(
    ctx: &Context,
    name: &str,
    id: u32,
    object_path_id: u32,
    params: &[Param],
) -> Result<Value> {
    let admin_url = spo::admin_url(ctx.config.require_spo_url()?)?;
    let tenant_id = spo::tenant_id(&ctx.client, &admin_url).await?;
    let digest = spo::request_digest(&ctx.client, &admin_url).await?;

    let xml = CsomRequest::new()
        .method(name, id, object_path_id, params)
        .identity(object_path_id, &tenant_id)
        .to_xml();
    debug!("Calling tenant method {}", name);

    let response = ctx
        .client
        .post_xml(&spo::process_query_url(&admin_url), xml, &digest)
        .await?;
    let items = csom::parse_response(response)?;

    Ok(items.last().cloned().unwrap_or(Value::Null))
}

pub async fn get(ctx: &Context, opts: CdnTypeOptions) -> Result<()> {
    validation::run(&opts)?;

    let enabled = call_tenant_method(
        ctx,
        "GetTenantCdnEnabled",
        7,
        3,
        &[Param::Enum(opts.enum_value())],
    )
    .await?;

    let enabled = enabled
        .as_bool()
        .ok_or_else(|| anyhow!("Unexpected response: {}", enabled))?;
    ctx.print(&serde_json::json!({ "Enabled": enabled }))
}

pub async fn set(ctx: &Context, opts: SetOptions) -> Result<()> {
    validation::run(&opts)?;

    call_tenant_method(
        ctx,
        "SetTenantCdnEnabled",
        7,
        3,
        &[
            Param::Enum(opts.cdn.enum_value()),
            Param::Boolean(opts.enabled == "true"),
        ],
    )
    .await?;

    output::success(&format!(
        "{} CDN {}",
        opts.cdn.cdn_type,
        if opts.enabled == "true" { "enabled" } else { "disabled" }
    ));
    Ok(())
}

pub async fn add_origin(ctx: &Context, opts: OriginOptions) -> Result<()> {
    validation::run(&opts)?;

    call_tenant_method(
        ctx,
        "AddTenantCdnOrigin",
        27,
        23,
        &[
            Param::Enum(opts.cdn.enum_value()),
            Param::String(opts.origin.clone()),
        ],
    )
    .await?;

    output::success(&format!("Added {} CDN origin {}", opts.cdn.cdn_type, opts.origin));
    Ok(())
}

pub async fn list_origins(ctx: &Context, opts: CdnTypeOptions) -> Result<()> {
    validation::run(&opts)?;

    let origins = call_tenant_method(
        ctx,
        "GetTenantCdnOrigins",
        7,
        3,
        &[Param::Enum(opts.enum_value())],
    )
    .await?;

    ctx.print(&origins)
}

pub async fn remove_origin(ctx: &Context, opts: RemoveOriginOptions) -> Result<()> {
    validation::run(&opts)?;

    let origin = &opts.origin;
    let confirmed = ctx.confirm(
        opts.force,
        &format!(
            "Are you sure you want to delete the {} CDN origin {}?",
            origin.cdn.cdn_type, origin.origin
        ),
    )?;
    if !confirmed {
        output::info("Operation cancelled");
        return Ok(());
    }

    call_tenant_method(
        ctx,
        "RemoveTenantCdnOrigin",
        33,
        29,
        &[
            Param::Enum(origin.cdn.enum_value()),
            Param::String(origin.origin.clone()),
        ],
    )
    .await?;

    output::success(&format!("Removed CDN origin {}", origin.origin));
    Ok(())
}
