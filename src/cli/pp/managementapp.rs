//! Power Platform management application commands

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use tracing::debug;

use crate::api::spo::escape_odata;
use crate::api::{encode_component, BAP_API, GRAPH_API};
use crate::cli::Context;
use crate::validation::{self, OptionSet, Validate, Validator};

#[derive(Args, Debug)]
pub struct ManagementappArgs {
    #[command(subcommand)]
    pub command: ManagementappCommand,
}

#[derive(Subcommand, Debug)]
pub enum ManagementappCommand {
    /// Register an app registration as a Power Platform management application
    Add(AddOptions),
}

#[derive(Args, Debug, Default)]
pub struct AddOptions {
    /// Application (client) ID of the app registration
    #[arg(long = "appId")]
    pub app_id: Option<String>,

    /// Object ID of the app registration
    #[arg(long = "objectId")]
    pub object_id: Option<String>,

    /// Display name of the app registration
    #[arg(long)]
    pub name: Option<String>,
}

impl Validate for AddOptions {
    fn option_sets(&self) -> Vec<OptionSet> {
        vec![OptionSet::exactly_one(&[
            ("appId", self.app_id.is_some()),
            ("objectId", self.object_id.is_some()),
            ("name", self.name.is_some()),
        ])]
    }

    fn validators(&self) -> Validator {
        Validator::new()
            .guid("appId", self.app_id.as_deref())
            .guid("objectId", self.object_id.as_deref())
    }
}

pub async fn execute(ctx: &Context, args: ManagementappArgs) -> Result<()> {
    match args.command {
        ManagementappCommand::Add(opts) => add(ctx, opts).await,
    }
}

/// Application ID from the options, looked up in the directory when needed
async fn resolve_app_id(ctx: &Context, opts: &AddOptions) -> Result<String> {
    if let Some(ref app_id) = opts.app_id {
        return Ok(app_id.clone());
    }

    let (filter, label) = match (&opts.object_id, &opts.name) {
        (Some(id), _) => (
            format!("id eq '{}'", encode_component(&escape_odata(id))),
            format!("ID {}", id),
        ),
        (None, name) => {
            let name = name.as_deref().unwrap_or_default();
            (
                format!("displayName eq '{}'", encode_component(&escape_odata(name))),
                format!("name {}", name),
            )
        }
    };

    let apps = ctx
        .client
        .get(&format!(
            "{}/myorganization/applications?$filter={}&$select=appId",
            GRAPH_API, filter
        ))
        .await?;

    let app_ids: Vec<&str> = apps
        .get("value")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|app| app.get("appId").and_then(|v| v.as_str()))
                .collect()
        })
        .unwrap_or_default();

    match app_ids.as_slice() {
        [] => bail!("No Azure AD application registration with {} found", label),
        [app_id] => {
            debug!("Resolved {} to application {}", label, app_id);
            Ok(app_id.to_string())
        }
        many => bail!(
            "Multiple Azure AD application registration with name '{}' found. Found: {}.",
            opts.name.as_deref().unwrap_or_default(),
            many.join(", ")
        ),
    }
}

pub async fn add(ctx: &Context, opts: AddOptions) -> Result<()> {
    validation::run(&opts)?;

    let app_id = resolve_app_id(ctx, &opts).await?;
    let response = ctx
        .client
        .put(
            &format!(
                "{}/providers/Microsoft.BusinessAppPlatform/adminApplications/{}?api-version=2020-06-01",
                BAP_API, app_id
            ),
            None,
        )
        .await?;

    ctx.print(&response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::testing::context;
    use reqwest::Method;
    use serde_json::json;

    const APP_ID: &str = "9b1b1e42-794b-4c71-93ac-5ed92488b67f";
    const OBJECT_ID: &str = "340a4aa3-1af6-43ac-87d8-189819003952";

    fn admin_app_url() -> String {
        format!(
            "https://api.bap.microsoft.com/providers/Microsoft.BusinessAppPlatform/adminApplications/{}?api-version=2020-06-01",
            APP_ID
        )
    }

    #[test]
    fn exactly_one_identifier_is_required() {
        assert_eq!(
            validation::run(&AddOptions::default()).unwrap_err().to_string(),
            "Specify one of the following options: appId, objectId, name"
        );

        let both = AddOptions {
            app_id: Some(APP_ID.into()),
            name: Some("Contoso Admin".into()),
            ..AddOptions::default()
        };
        assert_eq!(
            validation::run(&both).unwrap_err().to_string(),
            "Specify only one of the following options: appId, objectId, name"
        );
    }

    #[test]
    fn ids_must_be_guids() {
        let opts = AddOptions {
            object_id: Some("123".into()),
            ..AddOptions::default()
        };
        assert_eq!(
            validation::run(&opts).unwrap_err().to_string(),
            "'123' is not a valid GUID for option objectId"
        );
    }

    #[tokio::test]
    async fn app_id_is_registered_without_lookup() {
        let (ctx, mock, _) = context(true);
        mock.respond_json(200, json!({ "applicationId": APP_ID }));

        add(
            &ctx,
            AddOptions {
                app_id: Some(APP_ID.into()),
                ..AddOptions::default()
            },
        )
        .await
        .unwrap();

        let sent = mock.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::PUT);
        assert_eq!(sent[0].url, admin_app_url());
        assert!(sent[0].body.is_none());
    }

    #[tokio::test]
    async fn object_id_is_resolved_through_graph() {
        let (ctx, mock, _) = context(true);
        mock.respond_json(200, json!({ "value": [{ "appId": APP_ID }] }));
        mock.respond_json(200, json!({ "applicationId": APP_ID }));

        add(
            &ctx,
            AddOptions {
                object_id: Some(OBJECT_ID.into()),
                ..AddOptions::default()
            },
        )
        .await
        .unwrap();

        let sent = mock.requests();
        assert_eq!(
            sent[0].url,
            format!(
                "https://graph.microsoft.com/v1.0/myorganization/applications?$filter=id eq '{}'&$select=appId",
                OBJECT_ID
            )
        );
        assert_eq!(sent[1].method, Method::PUT);
        assert_eq!(sent[1].url, admin_app_url());
    }

    #[tokio::test]
    async fn name_is_escaped_in_filter() {
        let (ctx, mock, _) = context(true);
        mock.respond_json(200, json!({ "value": [{ "appId": APP_ID }] }));
        mock.respond_json(200, json!({}));

        add(
            &ctx,
            AddOptions {
                name: Some("Bob's admin & co".into()),
                ..AddOptions::default()
            },
        )
        .await
        .unwrap();

        assert!(mock.requests()[0]
            .url
            .contains("$filter=displayName eq 'Bob''s%20admin%20%26%20co'&$select=appId"));
    }

    #[tokio::test]
    async fn missing_app_fails_without_put() {
        let (ctx, mock, _) = context(true);
        mock.respond_json(200, json!({ "value": [] }));

        let err = add(
            &ctx,
            AddOptions {
                name: Some("Contoso Admin".into()),
                ..AddOptions::default()
            },
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "No Azure AD application registration with name Contoso Admin found"
        );
        assert!(mock.requests_with_method("PUT").is_empty());
    }

    #[tokio::test]
    async fn ambiguous_name_fails_without_put() {
        let (ctx, mock, _) = context(true);
        mock.respond_json(
            200,
            json!({ "value": [{ "appId": APP_ID }, { "appId": OBJECT_ID }] }),
        );

        let err = add(
            &ctx,
            AddOptions {
                name: Some("Contoso Admin".into()),
                ..AddOptions::default()
            },
        )
        .await
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            format!(
                "Multiple Azure AD application registration with name 'Contoso Admin' found. Found: {}, {}.",
                APP_ID, OBJECT_ID
            )
        );
        assert!(mock.requests_with_method("PUT").is_empty());
    }
}
