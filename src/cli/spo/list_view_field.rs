//! List view field commands

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use serde_json::json;
use tracing::debug;

use crate::api::encode_component;
use crate::api::spo::{self, escape_odata};
use crate::cli::Context;
use crate::output;
use crate::validation::{self, OptionSet, Validate, Validator};

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(subcommand)]
    pub command: ListCommand,
}

#[derive(Subcommand, Debug)]
pub enum ListCommand {
    /// List views
    View {
        #[command(subcommand)]
        command: ViewCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ViewCommand {
    /// Fields shown in a list view
    Field {
        #[command(subcommand)]
        command: FieldCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum FieldCommand {
    /// Add a field to a list view
    Add(AddOptions),

    /// Remove a field from a list view
    Remove(RemoveOptions),
}

/// OData string literal content, safe to place in a URL path
fn selector(value: &str) -> String {
    encode_component(&escape_odata(value))
}

/// Field of a list view, each part addressed by id or by title
#[derive(Args, Debug, Default, Clone)]
pub struct ViewFieldTarget {
    /// URL of the site the list is in
    #[arg(short = 'u', long = "webUrl")]
    pub web_url: String,

    /// ID of the list
    #[arg(long = "listId")]
    pub list_id: Option<String>,

    /// Title of the list
    #[arg(long = "listTitle")]
    pub list_title: Option<String>,

    /// Server- or site-relative URL of the list
    #[arg(long = "listUrl")]
    pub list_url: Option<String>,

    /// ID of the view
    #[arg(long = "viewId")]
    pub view_id: Option<String>,

    /// Title of the view
    #[arg(long = "viewTitle")]
    pub view_title: Option<String>,

    /// ID of the field
    #[arg(long)]
    pub id: Option<String>,

    /// Internal name or display name of the field
    #[arg(short, long)]
    pub title: Option<String>,
}

impl ViewFieldTarget {
    fn option_sets(&self) -> Vec<OptionSet> {
        vec![
            OptionSet::exactly_one(&[
                ("listId", self.list_id.is_some()),
                ("listTitle", self.list_title.is_some()),
                ("listUrl", self.list_url.is_some()),
            ]),
            OptionSet::exactly_one(&[
                ("viewId", self.view_id.is_some()),
                ("viewTitle", self.view_title.is_some()),
            ]),
            OptionSet::exactly_one(&[("id", self.id.is_some()), ("title", self.title.is_some())]),
        ]
    }

    fn validators(&self) -> Validator {
        Validator::new()
            .spo_url("webUrl", Some(self.web_url.as_str()))
            .guid("listId", self.list_id.as_deref())
            .guid("viewId", self.view_id.as_deref())
            .guid("id", self.id.as_deref())
    }

    fn web_url(&self) -> &str {
        self.web_url.trim_end_matches('/')
    }

    /// `web/lists(...)` part of the REST path
    fn list_path(&self) -> String {
        if let Some(ref id) = self.list_id {
            format!("web/lists(guid'{}')", selector(id))
        } else if let Some(ref title) = self.list_title {
            format!("web/lists/getByTitle('{}')", selector(title))
        } else {
            let url = spo::server_relative_path(
                self.web_url(),
                self.list_url.as_deref().unwrap_or_default(),
            );
            format!("web/GetList('{}')", selector(&url))
        }
    }

    fn view_path(&self) -> String {
        match (&self.view_id, &self.view_title) {
            (Some(id), _) => format!("views('{}')", selector(id)),
            (None, title) => format!(
                "views/getByTitle('{}')",
                selector(title.as_deref().unwrap_or_default())
            ),
        }
    }

    fn field_path(&self) -> String {
        match (&self.id, &self.title) {
            (Some(id), _) => format!("fields/getbyid('{}')", selector(id)),
            (None, title) => format!(
                "fields/getbyinternalnameortitle('{}')",
                selector(title.as_deref().unwrap_or_default())
            ),
        }
    }

    fn field_label(&self) -> &str {
        self.id
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or_default()
    }

    fn view_label(&self) -> &str {
        self.view_id
            .as_deref()
            .or(self.view_title.as_deref())
            .unwrap_or_default()
    }

    fn view_fields_url(&self) -> String {
        format!(
            "{}/_api/{}/{}/viewfields",
            self.web_url(),
            self.list_path(),
            self.view_path()
        )
    }
}

#[derive(Args, Debug, Default)]
pub struct AddOptions {
    #[command(flatten)]
    pub target: ViewFieldTarget,

    /// Zero-based position of the field in the view
    #[arg(short, long)]
    pub position: Option<String>,
}

impl Validate for AddOptions {
    fn option_sets(&self) -> Vec<OptionSet> {
        self.target.option_sets()
    }

    fn validators(&self) -> Validator {
        self.target
            .validators()
            .integer("position", self.position.as_deref())
    }
}

#[derive(Args, Debug, Default)]
pub struct RemoveOptions {
    #[command(flatten)]
    pub target: ViewFieldTarget,

    /// Don't prompt for confirmation
    #[arg(short, long)]
    pub force: bool,
}

impl Validate for RemoveOptions {
    fn option_sets(&self) -> Vec<OptionSet> {
        self.target.option_sets()
    }

    fn validators(&self) -> Validator {
        self.target.validators()
    }
}

pub async fn execute(ctx: &Context, args: ListArgs) -> Result<()> {
    match args.command {
        ListCommand::View { command } => match command {
            ViewCommand::Field { command } => match command {
                FieldCommand::Add(opts) => add(ctx, opts).await,
                FieldCommand::Remove(opts) => remove(ctx, opts).await,
            },
        },
    }
}

/// Internal name of the field the target points at
async fn field_internal_name(ctx: &Context, target: &ViewFieldTarget) -> Result<String> {
    let field = ctx
        .client
        .get(&format!(
            "{}/_api/{}/{}?$select=InternalName",
            target.web_url(),
            target.list_path(),
            target.field_path()
        ))
        .await?;

    let name = field
        .get("InternalName")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow!("Field {} not found", target.field_label()))?;

    debug!("Resolved field {} to {}", target.field_label(), name);
    Ok(name.to_string())
}

pub async fn add(ctx: &Context, opts: AddOptions) -> Result<()> {
    validation::run(&opts)?;

    let target = &opts.target;
    let internal_name = field_internal_name(ctx, target).await?;
    let digest = spo::request_digest(&ctx.client, target.web_url()).await?;
    let headers = [("X-RequestDigest", digest.as_str())];

    ctx.client
        .post_with_headers(
            &format!(
                "{}/addviewfield('{}')",
                target.view_fields_url(),
                escape_odata(&internal_name)
            ),
            None,
            &headers,
        )
        .await?;

    if let Some(position) = opts.position.as_deref() {
        let index: i64 = position.trim().parse()?;
        ctx.client
            .post_with_headers(
                &format!("{}/moveviewfieldto", target.view_fields_url()),
                Some(json!({ "field": internal_name, "index": index })),
                &headers,
            )
            .await?;
    }

    output::success(&format!(
        "Added field {} to view {}",
        internal_name,
        target.view_label()
    ));
    Ok(())
}

pub async fn remove(ctx: &Context, opts: RemoveOptions) -> Result<()> {
    validation::run(&opts)?;

    let target = &opts.target;
    let confirmed = ctx.confirm(
        opts.force,
        &format!(
            "Are you sure you want to remove the field {} from the view {}?",
            target.field_label(),
            target.view_label()
        ),
    )?;
    if !confirmed {
        output::info("Operation cancelled");
        return Ok(());
    }

    let internal_name = field_internal_name(ctx, target).await?;
    let digest = spo::request_digest(&ctx.client, target.web_url()).await?;

    ctx.client
        .post_with_headers(
            &format!(
                "{}/removeviewfield('{}')",
                target.view_fields_url(),
                escape_odata(&internal_name)
            ),
            None,
            &[("X-RequestDigest", digest.as_str())],
        )
        .await?;

    output::success(&format!(
        "Removed field {} from view {}",
        internal_name,
        target.view_label()
    ));
    Ok(())
}
