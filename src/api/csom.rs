//! Client-query XML envelope used by the legacy SharePoint endpoints

use serde_json::Value;

use crate::api::response::ApiError;

const SCHEMA_NS: &str = "http://schemas.microsoft.com/sharepoint/clientquery/2009";
const APPLICATION_NAME: &str = "m365";

/// Type id of the tenant administration object
pub const TENANT_TYPE_ID: &str = "{268004ae-ef6b-4e9b-8425-127220d84719}";

/// Escape a value for use inside XML text or attributes
pub fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Method parameter
#[derive(Debug, Clone)]
pub enum Param {
    Enum(i32),
    String(String),
    Boolean(bool),
}

impl Param {
    fn to_xml(&self) -> String {
        match self {
            Param::Enum(v) => format!(r#"<Parameter Type="Enum">{}</Parameter>"#, v),
            Param::String(v) => {
                format!(r#"<Parameter Type="String">{}</Parameter>"#, escape_xml(v))
            }
            Param::Boolean(v) => format!(r#"<Parameter Type="Boolean">{}</Parameter>"#, v),
        }
    }
}

/// Builder for a `<Request>` envelope
#[derive(Debug, Default)]
pub struct CsomRequest {
    actions: Vec<String>,
    object_paths: Vec<String>,
}

impl CsomRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, name: &str, id: u32, object_path_id: u32, params: &[Param]) -> Self {
        let params: String = params.iter().map(Param::to_xml).collect();
        self.actions.push(format!(
            r#"<Method Name="{}" Id="{}" ObjectPathId="{}"><Parameters>{}</Parameters></Method>"#,
            name, id, object_path_id, params
        ));
        self
    }

    pub fn object_path(mut self, id: u32, object_path_id: u32) -> Self {
        self.actions.push(format!(
            r#"<ObjectPath Id="{}" ObjectPathId="{}" />"#,
            id, object_path_id
        ));
        self
    }

    /// Query selecting every scalar property of an object path
    pub fn query_all(mut self, id: u32, object_path_id: u32) -> Self {
        self.actions.push(format!(
            r#"<Query Id="{}" ObjectPathId="{}"><Query SelectAllProperties="true"><Properties /></Query></Query>"#,
            id, object_path_id
        ));
        self
    }

    /// Object path addressed by its server identity. The identity is
    /// server-provided and already escaped.
    pub fn identity(mut self, id: u32, name: &str) -> Self {
        self.object_paths
            .push(format!(r#"<Identity Id="{}" Name="{}" />"#, id, name));
        self
    }

    pub fn constructor(mut self, id: u32, type_id: &str) -> Self {
        self.object_paths
            .push(format!(r#"<Constructor Id="{}" TypeId="{}" />"#, id, type_id));
        self
    }

    pub fn to_xml(&self) -> String {
        format!(
            r#"<Request AddExpandoFieldTypeSuffix="true" SchemaVersion="15.0.0.0" LibraryVersion="16.0.0.0" ApplicationName="{}" xmlns="{}"><Actions>{}</Actions><ObjectPaths>{}</ObjectPaths></Request>"#,
            APPLICATION_NAME,
            SCHEMA_NS,
            self.actions.concat(),
            self.object_paths.concat()
        )
    }
}

/// Check a client-query response for an error and return its elements
pub fn parse_response(value: Value) -> Result<Vec<Value>, ApiError> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(ApiError::remote(format!(
                "Unexpected client query response: {}",
                other
            )))
        }
    };

    if let Some(error) = items
        .first()
        .and_then(|header| header.get("ErrorInfo"))
        .filter(|info| !info.is_null())
    {
        let message = error
            .get("ErrorMessage")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown client query error");
        return Err(ApiError::remote(message));
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_xml(r#"*/<script>&"x"'y'"#),
            "*/&lt;script&gt;&amp;&quot;x&quot;&apos;y&apos;"
        );
        assert_eq!(escape_xml("*/CDN"), "*/CDN");
    }

    #[test]
    fn builds_method_envelope() {
        let xml = CsomRequest::new()
            .method(
                "AddTenantCdnOrigin",
                27,
                23,
                &[Param::Enum(1), Param::String("sites/a&b".into())],
            )
            .identity(23, "tenant-id")
            .to_xml();

        assert!(xml.starts_with(r#"<Request AddExpandoFieldTypeSuffix="true""#));
        assert!(xml.contains(
            r#"<Actions><Method Name="AddTenantCdnOrigin" Id="27" ObjectPathId="23"><Parameters><Parameter Type="Enum">1</Parameter><Parameter Type="String">sites/a&amp;b</Parameter></Parameters></Method></Actions>"#
        ));
        assert!(xml.ends_with(
            r#"<ObjectPaths><Identity Id="23" Name="tenant-id" /></ObjectPaths></Request>"#
        ));
    }

    #[test]
    fn error_info_becomes_remote_error() {
        let response = json!([{
            "SchemaVersion": "15.0.0.0",
            "ErrorInfo": {"ErrorMessage": "The origin already exists.", "ErrorCode": -1}
        }]);
        assert_eq!(
            parse_response(response).unwrap_err().to_string(),
            "The origin already exists."
        );
    }

    #[test]
    fn successful_response_returns_items() {
        let response = json!([{"ErrorInfo": null}, 7, {"IsNull": false}]);
        assert_eq!(parse_response(response).unwrap().len(), 3);
    }

    #[test]
    fn non_array_response_is_rejected() {
        assert!(parse_response(json!({"d": 1})).is_err());
    }
}
