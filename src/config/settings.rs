//! Persisted CLI settings (default values for options)

use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::validation;

pub const OUTPUT: &str = "output";
pub const ERROR_OUTPUT: &str = "errorOutput";
pub const SPO_URL: &str = "spoUrl";
pub const AUTO_CONFIRM: &str = "autoConfirm";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Unknown setting '{0}'. Run 'm365 config list --known' to see available settings")]
    UnknownKey(String),

    #[error("'{value}' is not a valid value for setting {key}. {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },

    #[error("Failed to access settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy)]
pub enum SettingKind {
    Choice(&'static [&'static str]),
    Bool,
    SpoUrl,
}

#[derive(Debug)]
pub struct SettingDef {
    pub key: &'static str,
    pub description: &'static str,
    pub kind: SettingKind,
}

/// Settings the CLI understands
pub static KNOWN_SETTINGS: Lazy<BTreeMap<&'static str, SettingDef>> = Lazy::new(|| {
    [
        SettingDef {
            key: OUTPUT,
            description: "Default output format",
            kind: SettingKind::Choice(&["json", "text", "compact"]),
        },
        SettingDef {
            key: ERROR_OUTPUT,
            description: "Stream errors are written to",
            kind: SettingKind::Choice(&["stderr", "stdout"]),
        },
        SettingDef {
            key: SPO_URL,
            description: "Root SharePoint URL used by spo commands",
            kind: SettingKind::SpoUrl,
        },
        SettingDef {
            key: AUTO_CONFIRM,
            description: "Answer yes to every confirmation prompt",
            kind: SettingKind::Bool,
        },
    ]
    .into_iter()
    .map(|def| (def.key, def))
    .collect()
});

/// JSON-file backed key/value store
#[derive(Debug, Default)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    values: BTreeMap<String, Value>,
}

impl SettingsStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self, SettingsError> {
        let values = if path.exists() {
            let content = fs::read_to_string(path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                let map: Map<String, Value> = serde_json::from_str(&content)?;
                map.into_iter().collect()
            }
        } else {
            BTreeMap::new()
        };

        debug!("Loaded {} settings from {:?}", values.len(), path);

        Ok(Self {
            path: Some(path.to_path_buf()),
            values,
        })
    }

    /// Store that is never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(|v| v.as_bool())
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Validate and store a raw command-line value
    pub fn set(&mut self, key: &str, raw: &str) -> Result<(), SettingsError> {
        let def = KNOWN_SETTINGS
            .get(key)
            .ok_or_else(|| SettingsError::UnknownKey(key.to_string()))?;

        let invalid = |expected: String| SettingsError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            expected,
        };

        let value = match def.kind {
            SettingKind::Choice(allowed) => {
                if !allowed.contains(&raw) {
                    return Err(invalid(format!("Allowed values are {}", allowed.join(", "))));
                }
                Value::String(raw.to_string())
            }
            SettingKind::Bool => match raw {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => return Err(invalid("Allowed values are true, false".to_string())),
            },
            SettingKind::SpoUrl => {
                if !validation::is_spo_url(raw) {
                    return Err(invalid(
                        "Expected an absolute SharePoint URL such as https://contoso.sharepoint.com"
                            .to_string(),
                    ));
                }
                Value::String(raw.trim_end_matches('/').to_string())
            }
        };

        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Remove one setting; returns whether it was present
    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Write the store back to its file
    pub fn save(&self) -> Result<(), SettingsError> {
        let Some(ref path) = self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let map: Map<String, Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        fs::write(path, serde_json::to_string_pretty(&map)?)?;
        debug!("Saved settings to {:?}", path);

        Ok(())
    }
}
