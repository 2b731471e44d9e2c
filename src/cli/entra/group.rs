//! Group membership commands

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::debug;

use crate::api::GRAPH_API;
use crate::cli::entra::resolve_user_id;
use crate::cli::Context;
use crate::output;
use crate::validation::{self, OptionSet, Validate, Validator};

const ROLES: &[&str] = &["Owner", "Member"];

#[derive(Args, Debug)]
pub struct GroupArgs {
    #[command(subcommand)]
    pub command: GroupCommand,
}

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    /// Manage group owners and members
    User {
        #[command(subcommand)]
        command: GroupUserCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum GroupUserCommand {
    /// Add a user to a group or team
    Add(AddOptions),

    /// List owners and members of a group or team
    List(ListOptions),

    /// Remove a user from a group or team
    Remove(RemoveOptions),
}

/// Group addressed either directly or through its team
#[derive(Args, Debug, Default, Clone)]
pub struct GroupTarget {
    /// ID of the Microsoft 365 group
    #[arg(long = "groupId")]
    pub group_id: Option<String>,

    /// ID of the team (same as the ID of its group)
    #[arg(long = "teamId")]
    pub team_id: Option<String>,
}

impl GroupTarget {
    fn id(&self) -> &str {
        self.group_id
            .as_deref()
            .or(self.team_id.as_deref())
            .unwrap_or_default()
    }

    fn option_set(&self) -> OptionSet {
        OptionSet::exactly_one(&[
            ("groupId", self.group_id.is_some()),
            ("teamId", self.team_id.is_some()),
        ])
    }

    fn validators(&self, validator: Validator) -> Validator {
        validator
            .guid("groupId", self.group_id.as_deref())
            .guid("teamId", self.team_id.as_deref())
    }
}

#[derive(Args, Debug, Default)]
pub struct AddOptions {
    #[command(flatten)]
    pub target: GroupTarget,

    /// User principal name of the user to add
    #[arg(long = "userName")]
    pub user_name: String,

    /// Role to assign: Owner or Member
    #[arg(short, long, default_value = "Member")]
    pub role: String,
}

impl Validate for AddOptions {
    fn option_sets(&self) -> Vec<OptionSet> {
        vec![self.target.option_set()]
    }

    fn validators(&self) -> Validator {
        self.target
            .validators(Validator::new())
            .one_of("role", Some(self.role.as_str()), ROLES)
    }
}

#[derive(Args, Debug, Default)]
pub struct ListOptions {
    #[command(flatten)]
    pub target: GroupTarget,

    /// Only list users with this role: Owner or Member
    #[arg(short, long)]
    pub role: Option<String>,
}

impl Validate for ListOptions {
    fn option_sets(&self) -> Vec<OptionSet> {
        vec![self.target.option_set()]
    }

    fn validators(&self) -> Validator {
        self.target
            .validators(Validator::new())
            .one_of("role", self.role.as_deref(), ROLES)
    }
}

#[derive(Args, Debug, Default)]
pub struct RemoveOptions {
    #[command(flatten)]
    pub target: GroupTarget,

    /// User principal name of the user to remove
    #[arg(long = "userName")]
    pub user_name: String,

    /// Don't prompt for confirmation
    #[arg(short, long)]
    pub force: bool,
}

impl Validate for RemoveOptions {
    fn option_sets(&self) -> Vec<OptionSet> {
        vec![self.target.option_set()]
    }

    fn validators(&self) -> Validator {
        self.target.validators(Validator::new())
    }
}

pub async fn execute(ctx: &Context, args: GroupArgs) -> Result<()> {
    match args.command {
        GroupCommand::User { command } => match command {
            GroupUserCommand::Add(opts) => add(ctx, opts).await,
            GroupUserCommand::List(opts) => list(ctx, opts).await,
            GroupUserCommand::Remove(opts) => remove(ctx, opts).await,
        },
    }
}

/// Fail unless the group is a Microsoft 365 (unified) group
async fn ensure_unified_group(ctx: &Context, group_id: &str) -> Result<()> {
    let group = ctx
        .client
        .get(&format!("{}/groups/{}?$select=groupTypes", GRAPH_API, group_id))
        .await?;

    let unified = group
        .get("groupTypes")
        .and_then(|v| v.as_array())
        .is_some_and(|types| types.iter().any(|t| t.as_str() == Some("Unified")));

    if !unified {
        bail!(
            "Specified group with id '{}' is not a Microsoft 365 group.",
            group_id
        );
    }

    Ok(())
}

pub async fn add(ctx: &Context, opts: AddOptions) -> Result<()> {
    validation::run(&opts)?;

    let group_id = opts.target.id();
    ensure_unified_group(ctx, group_id).await?;

    let user_id = resolve_user_id(&ctx.client, &opts.user_name).await?;
    let collection = if opts.role == "Owner" { "owners" } else { "members" };

    ctx.client
        .post(
            &format!("{}/groups/{}/{}/$ref", GRAPH_API, group_id, collection),
            json!({ "@odata.id": format!("{}/directoryObjects/{}", GRAPH_API, user_id) }),
        )
        .await?;

    output::success(&format!(
        "Added {} to group {} as {}",
        opts.user_name, group_id, opts.role
    ));
    Ok(())
}

pub async fn list(ctx: &Context, opts: ListOptions) -> Result<()> {
    validation::run(&opts)?;

    let group_id = opts.target.id();
    let select = "$select=id,displayName,userPrincipalName,userType";

    let owners = ctx
        .client
        .get_all_items(&format!("{}/groups/{}/owners?{}", GRAPH_API, group_id, select))
        .await?;
    let members = ctx
        .client
        .get_all_items(&format!("{}/groups/{}/members?{}", GRAPH_API, group_id, select))
        .await?;

    let users = merge_roles(owners, members);
    let users: Vec<Value> = match opts.role.as_deref() {
        Some(role) => users
            .into_iter()
            .filter(|u| u.get("roles").and_then(|r| r.as_str()) == Some(role))
            .collect(),
        None => users,
    };

    ctx.print_list(&users, &["id", "displayName", "userPrincipalName", "roles"])
}

/// One entry per user; owners that are also members are reported as owners
fn merge_roles(owners: Vec<Value>, members: Vec<Value>) -> Vec<Value> {
    let mut users: BTreeMap<String, Value> = BTreeMap::new();

    for (role, list) in [("Member", members), ("Owner", owners)] {
        for mut user in list {
            let Some(id) = user.get("id").and_then(|v| v.as_str()).map(str::to_string) else {
                continue;
            };
            user["roles"] = json!(role);
            users.insert(id, user);
        }
    }

    users.into_values().collect()
}

pub async fn remove(ctx: &Context, opts: RemoveOptions) -> Result<()> {
    validation::run(&opts)?;

    let group_id = opts.target.id();
    let confirmed = ctx.confirm(
        opts.force,
        &format!(
            "Are you sure you want to remove {} from group {}?",
            opts.user_name, group_id
        ),
    )?;
    if !confirmed {
        output::info("Operation cancelled");
        return Ok(());
    }

    let user_id = resolve_user_id(&ctx.client, &opts.user_name).await?;
    let mut removed = false;

    for collection in ["owners", "members"] {
        let url = format!(
            "{}/groups/{}/{}/{}/$ref",
            GRAPH_API, group_id, collection, user_id
        );

        match ctx.client.delete(&url).await {
            Ok(_) => removed = true,
            Err(e) if e.status() == Some(404) => {
                debug!("{} is not in {} of {}", opts.user_name, collection, group_id);
            }
            Err(e) => return Err(e.into()),
        }
    }

    if !removed {
        bail!(
            "{} is not an owner or member of group {}",
            opts.user_name,
            group_id
        );
    }

    output::success(&format!("Removed {} from group {}", opts.user_name, group_id));
    Ok(())
}
