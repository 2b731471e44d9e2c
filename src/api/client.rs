//! Authenticated API client shared by all commands

use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::api::response::ApiError;
use crate::api::transport::{HttpRequest, HttpTransport, RequestBody, Transport};
use crate::config::{Config, Resource};

pub const GRAPH_API: &str = "https://graph.microsoft.com/v1.0";
pub const BAP_API: &str = "https://api.bap.microsoft.com";

const ACCEPT_JSON: &str = "application/json;odata=nometadata";

/// Client for Graph, SharePoint, Power Platform and Dataverse endpoints
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    config: Config,
}

impl ApiClient {
    /// Create a client over HTTPS
    pub fn new(config: Config) -> Result<Self, ApiError> {
        Ok(Self::with_transport(config, Arc::new(HttpTransport::new()?)))
    }

    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        Self { transport, config }
    }

    /// Build request with authentication headers
    fn build_request(&self, method: Method, url: &str) -> Result<HttpRequest, ApiError> {
        let resource = Resource::from_url(url);
        if resource == Resource::Other {
            return Err(ApiError::UnsupportedHost(url.to_string()));
        }

        let headers = self.config.auth_headers(resource);

        if headers.is_empty() {
            return Err(ApiError::Auth(format!("{:?}", resource)));
        }

        let mut request = HttpRequest::new(method, url).header("Accept", ACCEPT_JSON);
        for (key, value) in headers {
            request = request.header(key, value);
        }

        Ok(request)
    }

    /// Send a request and turn the response into JSON or an unwrapped error
    async fn execute(&self, request: HttpRequest) -> Result<Value, ApiError> {
        debug!("{} {}", request.method, request.url);
        if let Some(ref body) = request.body {
            trace!("Request body: {:?}", body);
        }

        let response = self.transport.send(request).await?;
        trace!("Response ({}): {}", response.status, response.body);

        if !response.is_success() {
            return Err(ApiError::from_response(
                response.status,
                &response.reason,
                &response.body,
            ));
        }

        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&response.body).unwrap_or(Value::String(response.body)))
    }

    /// Make a request with an optional JSON body and extra headers
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        let mut request = self.build_request(method, url)?;
        for (key, value) in headers {
            request = request.header(*key, *value);
        }
        request.body = body.map(RequestBody::Json);

        self.execute(request).await
    }

    /// Make a GET request
    pub async fn get(&self, url: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, url, None, &[]).await
    }

    /// Make a POST request with a JSON body
    pub async fn post(&self, url: &str, body: Value) -> Result<Value, ApiError> {
        self.request(Method::POST, url, Some(body), &[]).await
    }

    /// Make a POST request with extra headers (e.g. a SharePoint request digest)
    pub async fn post_with_headers(
        &self,
        url: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        self.request(Method::POST, url, body, headers).await
    }

    /// Make a PUT request
    pub async fn put(&self, url: &str, body: Option<Value>) -> Result<Value, ApiError> {
        self.request(Method::PUT, url, body, &[]).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, url, None, &[]).await
    }

    /// POST a client-query XML envelope
    pub async fn post_xml(&self, url: &str, xml: String, digest: &str) -> Result<Value, ApiError> {
        let mut request = self
            .build_request(Method::POST, url)?
            .header("X-RequestDigest", digest);
        request.body = Some(RequestBody::Xml(xml));

        self.execute(request).await
    }

    /// GET a collection, following `@odata.nextLink` until exhausted
    pub async fn get_all_items(&self, url: &str) -> Result<Vec<Value>, ApiError> {
        let mut items = Vec::new();
        let mut next = Some(url.to_string());

        while let Some(page_url) = next.take() {
            let page = self.get(&page_url).await?;

            if let Some(values) = page.get("value").and_then(|v| v.as_array()) {
                items.extend(values.iter().cloned());
            }

            next = page
                .get("@odata.nextLink")
                .and_then(|v| v.as_str())
                .map(str::to_string);
        }

        Ok(items)
    }
}

/// Percent-encode a value for a URL path segment or query parameter
/// (same unreserved set as JavaScript's `encodeURIComponent`)
pub fn encode_component(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => encoded.push(byte as char),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use serde_json::json;

    fn client(mock: &Arc<MockTransport>) -> ApiClient {
        let config = Config {
            access_token: Some("abc".into()),
            ..Config::default()
        };
        ApiClient::with_transport(config, mock.clone())
    }

    #[tokio::test]
    async fn adds_bearer_and_accept_headers() {
        let mock = Arc::new(MockTransport::new());
        mock.respond_json(200, json!({"id": "1"}));

        let value = client(&mock).get(&format!("{}/me", GRAPH_API)).await.unwrap();
        assert_eq!(value["id"], "1");

        let sent = mock.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].header_value("authorization"), Some("Bearer abc"));
        assert_eq!(sent[0].header_value("accept"), Some(ACCEPT_JSON));
    }

    #[tokio::test]
    async fn missing_token_is_reported_before_sending() {
        let mock = Arc::new(MockTransport::new());
        let client = ApiClient::with_transport(Config::default(), mock.clone());

        let err = client.get(&format!("{}/me", GRAPH_API)).await.unwrap_err();
        assert!(matches!(err, ApiError::Auth(_)));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn next_link_to_foreign_host_is_not_followed() {
        let mock = Arc::new(MockTransport::new());
        mock.respond_json(
            200,
            json!({
                "value": [{"id": "1"}],
                "@odata.nextLink": "https://attacker.example.com/page2"
            }),
        );

        let err = client(&mock)
            .get_all_items(&format!("{}/groups", GRAPH_API))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedHost(_)));
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn failed_response_is_unwrapped() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(
            403,
            r#"{"odata.error":{"code":"-2147024891, System.UnauthorizedAccessException","message":{"lang":"en-US","value":"Access denied."}}}"#,
        );

        let err = client(&mock)
            .post("https://contoso.sharepoint.com/_api/contextinfo", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Access denied.");
        assert_eq!(err.status(), Some(403));
    }

    #[tokio::test]
    async fn empty_and_text_bodies() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(204, "");
        mock.respond(200, "plain text");

        let client = client(&mock);
        assert_eq!(
            client.delete(&format!("{}/groups/1", GRAPH_API)).await.unwrap(),
            Value::Null
        );
        assert_eq!(
            client.get(&format!("{}/groups/1", GRAPH_API)).await.unwrap(),
            json!("plain text")
        );
    }

    #[tokio::test]
    async fn follows_next_links() {
        let mock = Arc::new(MockTransport::new());
        mock.respond_json(
            200,
            json!({
                "value": [{"id": "1"}],
                "@odata.nextLink": format!("{}/groups?$skiptoken=x", GRAPH_API)
            }),
        );
        mock.respond_json(200, json!({"value": [{"id": "2"}]}));

        let items = client(&mock)
            .get_all_items(&format!("{}/groups", GRAPH_API))
            .await
            .unwrap();
        assert_eq!(items.len(), 2);

        let sent = mock.requests();
        assert_eq!(sent[1].url, format!("{}/groups?$skiptoken=x", GRAPH_API));
    }

    #[test]
    fn encodes_components() {
        assert_eq!(encode_component("john@contoso.com"), "john%40contoso.com");
        assert_eq!(
            encode_component("guest_fabrikam.com#EXT#@contoso.onmicrosoft.com"),
            "guest_fabrikam.com%23EXT%23%40contoso.onmicrosoft.com"
        );
        assert_eq!(encode_component("a b/ü"), "a%20b%2F%C3%BC");
    }

    #[tokio::test]
    async fn xml_body_carries_digest() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(200, r#"[{"SchemaVersion":"15.0.0.0","ErrorInfo":null}]"#);

        client(&mock)
            .post_xml(
                "https://contoso-admin.sharepoint.com/_vti_bin/client.svc/ProcessQuery",
                "<Request />".to_string(),
                "0x01",
            )
            .await
            .unwrap();

        let sent = mock.requests();
        assert_eq!(sent[0].header_value("X-RequestDigest"), Some("0x01"));
        assert_eq!(sent[0].body, Some(RequestBody::Xml("<Request />".into())));
    }
}
