//! API response and error envelope handling

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while talking to a remote API
#[derive(Debug, Error)]
pub enum ApiError {
    /// Failure reported by the service. Displays the service's message as-is.
    #[error("{message}")]
    Remote {
        status: Option<u16>,
        message: String,
    },

    #[error("No access token available for {0}. Set M365_ACCESS_TOKEN or a resource specific token")]
    Auth(String),

    #[error("{0} is not a supported Microsoft 365 API host")]
    UnsupportedHost(String),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid JSON in response: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    pub fn remote(message: impl Into<String>) -> Self {
        ApiError::Remote {
            status: None,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Remote { status, .. } => *status,
            _ => None,
        }
    }

    /// Build the error for a failed HTTP response
    pub fn from_response(status: u16, reason: &str, body: &str) -> Self {
        let message = error_message(body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                reason.to_string()
            } else {
                body.to_string()
            }
        });

        ApiError::Remote {
            status: Some(status),
            message,
        }
    }
}

/// SharePoint verbose OData error: `{"odata.error": {"message": {"value": ...}}}`
#[derive(Debug, Deserialize)]
struct ODataErrorEnvelope {
    #[serde(rename = "odata.error")]
    error: ODataError,
}

#[derive(Debug, Deserialize)]
struct ODataError {
    message: ODataMessage,
}

#[derive(Debug, Deserialize)]
struct ODataMessage {
    value: String,
}

/// Pull a flat message out of any of the known error shapes
pub fn error_message(body: &str) -> Option<String> {
    if let Ok(envelope) = serde_json::from_str::<ODataErrorEnvelope>(body) {
        return Some(envelope.error.message.value);
    }

    let value: Value = serde_json::from_str(body).ok()?;

    if let Some(error) = value.get("error") {
        if let Some(message) = error.as_str() {
            return Some(message.to_string());
        }

        match error.get("message") {
            Some(Value::String(message)) => return Some(message.clone()),
            Some(message) => {
                if let Some(inner) = message.get("value").and_then(|v| v.as_str()) {
                    return Some(inner.to_string());
                }
            }
            None => {}
        }
    }

    for key in ["error_description", "message", "Message"] {
        if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
            return Some(message.to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sharepoint_odata_error() {
        let body = r#"{"odata.error":{"code":"-1, Microsoft.SharePoint.Client.InvalidClientQueryException","message":{"lang":"en-US","value":"The expression \"web/lists\" is not valid."}}}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("The expression \"web/lists\" is not valid.")
        );
    }

    #[test]
    fn graph_error() {
        let body = r#"{"error":{"code":"Request_ResourceNotFound","message":"Resource 'john@contoso.com' does not exist or one of its queried reference-property objects are not present.","innerError":{}}}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("Resource 'john@contoso.com' does not exist or one of its queried reference-property objects are not present.")
        );
    }

    #[test]
    fn nested_message_value() {
        let body = r#"{"error":{"code":"0x80040217","message":{"value":"solution With Id = abc Does Not Exist"}}}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("solution With Id = abc Does Not Exist")
        );
    }

    #[test]
    fn plain_shapes() {
        assert_eq!(error_message(r#"{"error":"Boom"}"#).as_deref(), Some("Boom"));
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"AADSTS70000"}"#)
                .as_deref(),
            Some("invalid_grant")
        );
        assert_eq!(
            error_message(r#"{"error_description":"AADSTS70000"}"#).as_deref(),
            Some("AADSTS70000")
        );
        assert_eq!(error_message("<html>oops</html>"), None);
    }

    #[test]
    fn unknown_body_falls_back_to_text() {
        let err = ApiError::from_response(502, "Bad Gateway", "upstream timed out");
        assert_eq!(err.to_string(), "upstream timed out");
        assert_eq!(err.status(), Some(502));

        let err = ApiError::from_response(404, "Not Found", "");
        assert_eq!(err.to_string(), "Not Found");
    }
}
