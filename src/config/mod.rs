//! Configuration management

pub mod settings;

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub use settings::SettingsStore;

/// Main configuration structure
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Bearer token used for every resource without a dedicated token
    pub access_token: Option<String>,

    /// Token for Microsoft Graph
    pub graph_token: Option<String>,

    /// Token for SharePoint Online
    pub spo_token: Option<String>,

    /// Token for the Power Platform admin API
    pub pp_token: Option<String>,

    /// Token for Dataverse environments
    pub dataverse_token: Option<String>,

    /// Root SharePoint URL of the tenant (https://contoso.sharepoint.com)
    pub spo_url: Option<String>,

    /// Output format
    pub output_format: OutputFormat,

    /// Stream errors are written to
    pub error_output: ErrorOutput,

    /// Accept every confirmation prompt
    pub auto_confirm: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
    Compact,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "text" => Some(Self::Text),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorOutput {
    #[default]
    Stderr,
    Stdout,
}

/// Service a request is addressed to. Each one takes its own bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Graph,
    SharePoint,
    PowerPlatform,
    Dataverse,
    Other,
}

impl Resource {
    /// Derive the resource from the host of an absolute URL
    pub fn from_url(url: &str) -> Self {
        let host = match Url::parse(url) {
            Ok(parsed) => parsed.host_str().unwrap_or_default().to_lowercase(),
            Err(_) => return Resource::Other,
        };

        if host == "graph.microsoft.com" {
            Resource::Graph
        } else if host.ends_with(".sharepoint.com") {
            Resource::SharePoint
        } else if host == "api.bap.microsoft.com" || host == "api.powerapps.com" {
            Resource::PowerPlatform
        } else if host.ends_with(".dynamics.com") {
            Resource::Dataverse
        } else {
            Resource::Other
        }
    }
}

impl Config {
    /// Load configuration from environment variables and the settings store
    pub fn load() -> Result<Self> {
        let store = SettingsStore::open(&Self::settings_path()?)?;
        Ok(Self::from_sources(|key| env::var(key).ok(), &store))
    }

    /// Merge environment lookups over stored settings
    pub fn from_sources<F>(env_var: F, store: &SettingsStore) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let output_format = env_var("M365_OUTPUT")
            .as_deref()
            .and_then(OutputFormat::parse)
            .or_else(|| store.get_str(settings::OUTPUT).and_then(OutputFormat::parse))
            .unwrap_or_default();

        let error_output = match store.get_str(settings::ERROR_OUTPUT) {
            Some("stdout") => ErrorOutput::Stdout,
            _ => ErrorOutput::Stderr,
        };

        let spo_url = env_var("M365_SPO_URL")
            .or_else(|| store.get_str(settings::SPO_URL).map(str::to_string))
            .map(|url| url.trim_end_matches('/').to_string());

        Self {
            access_token: env_var("M365_ACCESS_TOKEN"),
            graph_token: env_var("M365_GRAPH_TOKEN"),
            spo_token: env_var("M365_SPO_TOKEN"),
            pp_token: env_var("M365_PP_TOKEN"),
            dataverse_token: env_var("M365_DATAVERSE_TOKEN"),
            spo_url,
            output_format,
            error_output,
            auto_confirm: store.get_bool(settings::AUTO_CONFIRM).unwrap_or(false),
        }
    }

    /// Token for the given resource, falling back to the shared access token.
    /// Hosts outside the known services never get a token.
    pub fn bearer_token(&self, resource: Resource) -> Option<&str> {
        let dedicated = match resource {
            Resource::Graph => self.graph_token.as_deref(),
            Resource::SharePoint => self.spo_token.as_deref(),
            Resource::PowerPlatform => self.pp_token.as_deref(),
            Resource::Dataverse => self.dataverse_token.as_deref(),
            Resource::Other => return None,
        };

        dedicated.or(self.access_token.as_deref())
    }

    /// Get the authentication headers for API requests
    pub fn auth_headers(&self, resource: Resource) -> Vec<(&'static str, String)> {
        match self.bearer_token(resource) {
            Some(token) => vec![("Authorization", format!("Bearer {}", token))],
            None => vec![],
        }
    }

    /// SharePoint root URL, required by every `spo` command
    pub fn require_spo_url(&self) -> Result<&str> {
        self.spo_url.as_deref().ok_or_else(|| {
            anyhow!("SharePoint URL not set. Use 'm365 config set --key spoUrl --value <url>' or set M365_SPO_URL")
        })
    }

    /// Get config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Cannot determine config directory"))?
            .join("m365");

        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
        }

        Ok(dir)
    }

    /// Path of the persisted settings file
    pub fn settings_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("settings.json"))
    }
}
