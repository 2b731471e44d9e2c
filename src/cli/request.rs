//! Raw API request command

use anyhow::Result;
use clap::Args;
use reqwest::Method;
use serde_json::Value;

use crate::api::GRAPH_API;
use crate::cli::Context;
use crate::validation::{self, Validate, Validator};

const METHODS: &[&str] = &["get", "post", "put", "patch", "delete"];

#[derive(Args, Debug, Default)]
pub struct RequestOptions {
    /// URL to call. May start with @graph, @graphbeta or @spo
    #[arg(short, long)]
    pub url: String,

    /// HTTP method
    #[arg(short, long, default_value = "get")]
    pub method: String,

    /// Request body (JSON)
    #[arg(short, long)]
    pub body: Option<String>,

    /// Extra header as 'Name: value' (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,
}

impl Validate for RequestOptions {
    fn validators(&self) -> Validator {
        let method = self.method.to_lowercase();

        self.headers
            .iter()
            .fold(Validator::new(), |v, h| {
                v.check(
                    h.split_once(':').is_some(),
                    format!("Header '{}' must have the form 'Name: value'", h),
                )
            })
            .one_of("method", Some(method.as_str()), METHODS)
            .json("body", self.body.as_deref())
            .check(
                self.body.is_none() || !matches!(method.as_str(), "get" | "delete"),
                "Option body is not allowed for GET and DELETE requests",
            )
    }
}

/// Expand the @graph, @graphbeta and @spo shortcuts
fn resolve_url(ctx: &Context, url: &str) -> Result<String> {
    if let Some(rest) = url.strip_prefix("@graphbeta") {
        return Ok(format!("https://graph.microsoft.com/beta{}", rest));
    }
    if let Some(rest) = url.strip_prefix("@graph") {
        return Ok(format!("{}{}", GRAPH_API, rest));
    }
    if let Some(rest) = url.strip_prefix("@spo") {
        return Ok(format!("{}{}", ctx.config.require_spo_url()?, rest));
    }

    Ok(url.to_string())
}

pub async fn execute(ctx: &Context, args: RequestOptions) -> Result<()> {
    validation::run(&args)?;

    let url = resolve_url(ctx, &args.url)?;
    let method = Method::from_bytes(args.method.to_uppercase().as_bytes())?;
    let body: Option<Value> = args.body.as_deref().map(serde_json::from_str::<Value>).transpose()?;

    let headers: Vec<(&str, &str)> = args
        .headers
        .iter()
        .filter_map(|h| h.split_once(':'))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect();

    let response = ctx.client.request(method, &url, body, &headers).await?;

    if !response.is_null() {
        ctx.print(&response)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::json_body;
    use crate::cli::testing::{context, SPO_URL};
    use serde_json::json;

    #[test]
    fn validates_method_body_and_headers() {
        let bad_method = RequestOptions {
            url: "@graph/me".into(),
            method: "head".into(),
            ..RequestOptions::default()
        };
        assert!(validation::run(&bad_method).is_err());

        let body_on_get = RequestOptions {
            url: "@graph/me".into(),
            method: "GET".into(),
            body: Some("{}".into()),
            ..RequestOptions::default()
        };
        assert!(validation::run(&body_on_get).is_err());

        let bad_header = RequestOptions {
            url: "@graph/me".into(),
            method: "get".into(),
            headers: vec!["ConsistencyLevel eventual".into()],
            ..RequestOptions::default()
        };
        assert!(validation::run(&bad_header).is_err());
    }

    #[test]
    fn expands_url_shortcuts() {
        let (ctx, _, _) = context(true);
        assert_eq!(
            resolve_url(&ctx, "@graph/me").unwrap(),
            "https://graph.microsoft.com/v1.0/me"
        );
        assert_eq!(
            resolve_url(&ctx, "@graphbeta/me").unwrap(),
            "https://graph.microsoft.com/beta/me"
        );
        assert_eq!(
            resolve_url(&ctx, "@spo/_api/web").unwrap(),
            format!("{}/_api/web", SPO_URL)
        );
    }

    #[tokio::test]
    async fn sends_method_body_and_headers() {
        let (ctx, mock, _) = context(true);
        mock.respond_json(200, json!({ "id": "1" }));

        execute(
            &ctx,
            RequestOptions {
                url: "@graph/groups".into(),
                method: "post".into(),
                body: Some(r#"{"displayName":"Finance"}"#.into()),
                headers: vec!["ConsistencyLevel: eventual".into()],
            },
        )
        .await
        .unwrap();

        let sent = mock.requests();
        assert_eq!(sent[0].method, Method::POST);
        assert_eq!(sent[0].url, "https://graph.microsoft.com/v1.0/groups");
        assert_eq!(sent[0].header_value("ConsistencyLevel"), Some("eventual"));
        assert_eq!(json_body(&sent[0]).unwrap()["displayName"], "Finance");
    }

    #[tokio::test]
    async fn foreign_host_is_refused_without_sending() {
        let (ctx, mock, _) = context(true);

        let err = execute(
            &ctx,
            RequestOptions {
                url: "https://attacker.example.com/x".into(),
                method: "get".into(),
                ..RequestOptions::default()
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<crate::api::ApiError>(),
            Some(crate::api::ApiError::UnsupportedHost(_))
        ));
        assert!(mock.requests().is_empty());
    }
}
