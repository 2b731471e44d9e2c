//! SharePoint Online helpers shared by `spo` commands

use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use crate::api::csom::{self, CsomRequest, TENANT_TYPE_ID};
use crate::api::response::ApiError;
use crate::api::ApiClient;

/// Fetch a form digest for write operations against `web_url`
pub async fn request_digest(client: &ApiClient, web_url: &str) -> Result<String, ApiError> {
    let response = client
        .post_with_headers(&format!("{}/_api/contextinfo", web_url), None, &[])
        .await?;

    response
        .get("FormDigestValue")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| ApiError::remote("Response did not contain a form digest"))
}

/// `https://contoso.sharepoint.com` -> `https://contoso-admin.sharepoint.com`
pub fn admin_url(spo_url: &str) -> Result<String, ApiError> {
    let url = Url::parse(spo_url)
        .map_err(|e| ApiError::remote(format!("Invalid SharePoint URL {}: {}", spo_url, e)))?;
    let host = url.host_str().unwrap_or_default();

    let (tenant, rest) = host
        .split_once('.')
        .ok_or_else(|| ApiError::remote(format!("Invalid SharePoint URL {}", spo_url)))?;

    if tenant.ends_with("-admin") {
        return Ok(format!("https://{}", host));
    }

    Ok(format!("https://{}-admin.{}", tenant, rest))
}

/// Client query endpoint of a site
pub fn process_query_url(site_url: &str) -> String {
    format!("{}/_vti_bin/client.svc/ProcessQuery", site_url)
}

/// Resolve the tenant object identity used by tenant-level client queries
pub async fn tenant_id(client: &ApiClient, admin_url: &str) -> Result<String, ApiError> {
    let digest = request_digest(client, admin_url).await?;

    let xml = CsomRequest::new()
        .object_path(1, 0)
        .query_all(3, 0)
        .constructor(0, TENANT_TYPE_ID)
        .to_xml();

    let response = client
        .post_xml(&process_query_url(admin_url), xml, &digest)
        .await?;
    let items = csom::parse_response(response)?;

    let identity = items
        .last()
        .and_then(|item| item.get("_ObjectIdentity_"))
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::remote("Could not determine the tenant identity"))?;

    debug!("Tenant identity: {}", identity);
    Ok(identity.replace('\n', "&#xA;"))
}

/// Double single quotes for use inside an OData string literal
pub fn escape_odata(value: &str) -> String {
    value.replace('\'', "''")
}

/// Server-relative path of `url`, which may be absolute, server-relative or
/// relative to `web_url`
pub fn server_relative_path(web_url: &str, url: &str) -> String {
    let path = if let Ok(absolute) = Url::parse(url) {
        absolute.path().to_string()
    } else if url.starts_with('/') {
        url.to_string()
    } else {
        let web_path = Url::parse(web_url)
            .map(|u| u.path().trim_end_matches('/').to_string())
            .unwrap_or_default();
        format!("{}/{}", web_path, url)
    };

    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
