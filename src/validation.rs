//! Option validation pipeline
//!
//! Every command's options implement [`Validate`]. [`run`] checks the option
//! sets first, then the validator chain, and reports the first failure.

use reqwest::Url;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// Group of options of which exactly one must be specified
#[derive(Debug, Clone)]
pub struct OptionSet {
    options: Vec<(&'static str, bool)>,
}

impl OptionSet {
    pub fn exactly_one(options: &[(&'static str, bool)]) -> Self {
        Self {
            options: options.to_vec(),
        }
    }

    fn check(&self) -> Result<(), ValidationError> {
        let names: Vec<&str> = self.options.iter().map(|(name, _)| *name).collect();
        let specified = self.options.iter().filter(|(_, present)| *present).count();

        match specified {
            0 => Err(ValidationError(format!(
                "Specify one of the following options: {}",
                names.join(", ")
            ))),
            1 => Ok(()),
            _ => Err(ValidationError(format!(
                "Specify only one of the following options: {}",
                names.join(", ")
            ))),
        }
    }
}

/// Validator chain. Keeps only the first failure.
#[derive(Debug, Default)]
#[must_use]
pub struct Validator {
    error: Option<ValidationError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    fn step<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> Option<String>,
    {
        if self.error.is_none() {
            self.error = f().map(ValidationError);
        }
        self
    }

    /// Fails with `message` when `ok` is false
    pub fn check(self, ok: bool, message: impl Into<String>) -> Self {
        let message = message.into();
        self.step(|| (!ok).then_some(message))
    }

    pub fn guid(self, name: &str, value: Option<&str>) -> Self {
        self.step(|| match value {
            Some(v) if !is_guid(v) => {
                Some(format!("'{}' is not a valid GUID for option {}", v, name))
            }
            _ => None,
        })
    }

    pub fn integer(self, name: &str, value: Option<&str>) -> Self {
        self.step(|| match value {
            Some(v) if v.trim().parse::<i64>().is_err() => {
                Some(format!("'{}' is not a valid number for option {}", v, name))
            }
            _ => None,
        })
    }

    pub fn json(self, name: &str, value: Option<&str>) -> Self {
        self.step(|| match value {
            Some(v) => serde_json::from_str::<serde_json::Value>(v)
                .err()
                .map(|e| format!("Specified {} is not a valid JSON string. Error: {}", name, e)),
            None => None,
        })
    }

    pub fn spo_url(self, name: &str, value: Option<&str>) -> Self {
        self.step(|| match value {
            Some(v) if !is_spo_url(v) => Some(format!(
                "'{}' is not a valid SharePoint Online site URL for option {}",
                v, name
            )),
            _ => None,
        })
    }

    pub fn one_of(self, name: &str, value: Option<&str>, allowed: &[&str]) -> Self {
        self.step(|| match value {
            Some(v) if !allowed.contains(&v) => Some(format!(
                "'{}' is not a valid value for option {}. Allowed values are {}",
                v,
                name,
                allowed.join(", ")
            )),
            _ => None,
        })
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Implemented by every command's options
pub trait Validate {
    fn option_sets(&self) -> Vec<OptionSet> {
        Vec::new()
    }

    fn validators(&self) -> Validator {
        Validator::new()
    }
}

/// Run option sets then validators
pub fn run<T: Validate + ?Sized>(options: &T) -> Result<(), ValidationError> {
    for set in options.option_sets() {
        set.check()?;
    }

    options.validators().finish()
}

/// `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`, hex digits in either case
pub fn is_guid(value: &str) -> bool {
    value.len() == 36
        && value.as_bytes()[8] == b'-'
        && Uuid::try_parse(value).is_ok()
}

/// Absolute https URL on a SharePoint Online host
pub fn is_spo_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => {
            url.scheme() == "https"
                && url
                    .host_str()
                    .map(|h| h.to_lowercase().ends_with(".sharepoint.com"))
                    .unwrap_or(false)
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct GroupOptions {
        group_id: Option<String>,
        team_id: Option<String>,
    }

    impl Validate for GroupOptions {
        fn option_sets(&self) -> Vec<OptionSet> {
            vec![OptionSet::exactly_one(&[
                ("groupId", self.group_id.is_some()),
                ("teamId", self.team_id.is_some()),
            ])]
        }

        fn validators(&self) -> Validator {
            Validator::new()
                .guid("groupId", self.group_id.as_deref())
                .guid("teamId", self.team_id.as_deref())
        }
    }

    const GUID: &str = "2c1ba4c4-cd9b-4417-832f-92a34bc34b2a";

    #[test]
    fn guid_shapes() {
        assert!(is_guid(GUID));
        assert!(is_guid(&GUID.to_uppercase()));
        assert!(!is_guid("2c1ba4c4cd9b4417832f92a34bc34b2a"));
        assert!(!is_guid("{2c1ba4c4-cd9b-4417-832f-92a34bc34b2a}"));
        assert!(!is_guid("2c1ba4c4-cd9b-4417-832f-92a34bc34b2g"));
        assert!(!is_guid("abc"));
    }

    #[test]
    fn mutually_exclusive_pair_fails() {
        let opts = GroupOptions {
            group_id: Some(GUID.into()),
            team_id: Some(GUID.into()),
        };
        assert_eq!(
            run(&opts).unwrap_err().to_string(),
            "Specify only one of the following options: groupId, teamId"
        );
    }

    #[test]
    fn neither_option_fails() {
        let opts = GroupOptions {
            group_id: None,
            team_id: None,
        };
        assert_eq!(
            run(&opts).unwrap_err().to_string(),
            "Specify one of the following options: groupId, teamId"
        );
    }

    #[test]
    fn non_guid_fails_and_guid_passes() {
        let bad = GroupOptions {
            group_id: Some("foo".into()),
            team_id: None,
        };
        assert_eq!(
            run(&bad).unwrap_err().to_string(),
            "'foo' is not a valid GUID for option groupId"
        );

        let good = GroupOptions {
            group_id: Some(GUID.into()),
            team_id: None,
        };
        assert!(run(&good).is_ok());
    }

    #[test]
    fn first_failure_wins() {
        let err = Validator::new()
            .integer("version", Some("1.5"))
            .json("content", Some("{"))
            .finish()
            .unwrap_err();
        assert_eq!(err.0, "'1.5' is not a valid number for option version");
    }

    #[test]
    fn json_and_integer_checks() {
        assert!(Validator::new()
            .integer("version", Some("3"))
            .json("content", Some(r#"{"actions":[]}"#))
            .finish()
            .is_ok());
        assert!(Validator::new()
            .json("content", Some("not json"))
            .finish()
            .unwrap_err()
            .0
            .starts_with("Specified content is not a valid JSON string"));
    }

    #[test]
    fn spo_url_check() {
        assert!(is_spo_url("https://contoso.sharepoint.com/sites/team"));
        assert!(!is_spo_url("http://contoso.sharepoint.com"));
        assert!(!is_spo_url("https://contoso.example.com"));
        assert!(!is_spo_url("/sites/team"));
    }

    #[test]
    fn one_of_checks_allowed_values() {
        assert_eq!(
            Validator::new()
                .one_of("role", Some("Guest"), &["Owner", "Member"])
                .finish()
                .unwrap_err()
                .to_string(),
            "'Guest' is not a valid value for option role. Allowed values are Owner, Member"
        );
        assert!(Validator::new()
            .one_of("role", None, &["Owner", "Member"])
            .finish()
            .is_ok());
    }
}
