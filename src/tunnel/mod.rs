//! Split-tunnel rule sets
//!
//! A rule set is an ordered list of `(description, host)` entries owned by
//! one account under one mode. An account may route either by `include`
//! (only listed hosts go through the tunnel) or by `exclude` (listed hosts
//! bypass it), never both at once.

pub mod host;
pub mod service;
pub mod store;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use host::{validate_host, ValidationError};
pub use service::{RuleSetService, ServiceError};
pub use store::{RuleSetStore, StoreError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid mode: {0:?} (expected \"include\" or \"exclude\")")]
pub struct InvalidMode(pub String);

/// Split-tunnel addressing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Only listed hosts are routed through the tunnel
    Include,
    /// Listed hosts bypass the tunnel
    Exclude,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Include => "include",
            Mode::Exclude => "exclude",
        }
    }

    /// The mode this one excludes
    pub fn opposite(&self) -> Mode {
        match self {
            Mode::Include => Mode::Exclude,
            Mode::Exclude => Mode::Include,
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = InvalidMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "include" => Ok(Mode::Include),
            "exclude" => Ok(Mode::Exclude),
            _ => Err(InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single split-tunnel entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub description: String,
    pub host: String,
}

impl Rule {
    pub fn new(description: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            host: host.into(),
        }
    }

    /// Check that both fields are present and the host is well formed
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        validate_host(&self.host)
    }
}

/// Ordered rules for one (account, mode) pair
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self::new(rules)
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parse() {
        assert_eq!("include".parse::<Mode>().unwrap(), Mode::Include);
        assert_eq!("exclude".parse::<Mode>().unwrap(), Mode::Exclude);
        assert!("invalid".parse::<Mode>().is_err());
        assert!("Include".parse::<Mode>().is_err());
        assert!("".parse::<Mode>().is_err());
    }

    #[test]
    fn test_mode_display_and_opposite() {
        assert_eq!(Mode::Include.to_string(), "include");
        assert_eq!(Mode::Exclude.to_string(), "exclude");
        assert_eq!(Mode::Include.opposite(), Mode::Exclude);
        assert_eq!(Mode::Exclude.opposite(), Mode::Include);
    }

    #[test]
    fn test_invalid_mode_display() {
        let err = "sideways".parse::<Mode>().unwrap_err();
        assert!(err.to_string().contains("sideways"));
    }

    #[test]
    fn test_rule_validate() {
        assert!(Rule::new("example domain", "*.example.com").validate().is_ok());
        assert_eq!(
            Rule::new("", "example.com").validate(),
            Err(ValidationError::EmptyDescription)
        );
        assert_eq!(
            Rule::new("   ", "example.com").validate(),
            Err(ValidationError::EmptyDescription)
        );
        assert_eq!(
            Rule::new("blank host", "").validate(),
            Err(ValidationError::EmptyHost)
        );
    }

    #[test]
    fn test_mode_serde_lowercase() {
        let json = serde_json::to_string(&Mode::Exclude).unwrap();
        assert_eq!(json, "\"exclude\"");
        let mode: Mode = serde_json::from_str("\"include\"").unwrap();
        assert_eq!(mode, Mode::Include);
    }
}
