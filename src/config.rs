//! Configuration handling for split-tunnel rule sets

use crate::resource::SplitTunnelResource;
use crate::tunnel::{Mode, Rule, ValidationError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_CONFIG_FILE: &str = "split-tunnel.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(#[source] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub account: AccountConfig,
    #[serde(default, rename = "split_tunnel")]
    pub split_tunnels: Vec<SplitTunnelBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub id: String,
}

/// One `[[split_tunnel]]` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitTunnelBlock {
    pub mode: Mode,
    #[serde(default)]
    pub tunnels: Vec<Rule>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account: AccountConfig {
                id: "example-account".to_string(),
            },
            split_tunnels: vec![SplitTunnelBlock {
                mode: Mode::Include,
                tunnels: vec![Rule::new("example domain", "*.example.com")],
            }],
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Resources declared by this config, owned by `account_id`
    pub fn resources(&self, account_id: &str) -> Vec<SplitTunnelResource> {
        self.split_tunnels
            .iter()
            .map(|block| SplitTunnelResource::new(account_id, block.mode, block.tunnels.clone()))
            .collect()
    }

    /// Everything that would make `apply` fail locally, one line per problem
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (i, block) in self.split_tunnels.iter().enumerate() {
            if block.tunnels.is_empty() {
                problems.push(format!(
                    "split_tunnel[{}] ({}): {}",
                    i,
                    block.mode,
                    ValidationError::NoTunnels
                ));
            }
            for (j, rule) in block.tunnels.iter().enumerate() {
                if let Err(e) = rule.validate() {
                    problems.push(format!(
                        "split_tunnel[{}] ({}) tunnels[{}]: {}",
                        i, block.mode, j, e
                    ));
                }
            }
        }

        let mut modes = self.split_tunnels.iter().map(|block| block.mode);
        if let Some(first) = modes.next() {
            if modes.any(|mode| mode != first) {
                problems.push("Both include and exclude rules are declared for one account".to_string());
            }
        }
        problems
    }

    /// Load from an explicit path, or search the default locations
    ///
    /// Order: `explicit`, `./split-tunnel.toml`, `~/.split-tunnel/config.toml`,
    /// then built-in defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let local_config = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local_config.exists() {
            return Self::load(&local_config);
        }

        if let Some(home_config) = home_config_path() {
            if home_config.exists() {
                return Self::load(&home_config);
            }
        }

        info!("No config file found, using defaults");
        Ok(Config::default())
    }
}

fn home_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".split-tunnel").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.account.id, "example-account");
        assert_eq!(config.split_tunnels.len(), 1);
        assert_eq!(config.split_tunnels[0].mode, Mode::Include);
    }

    #[test]
    fn test_parse_config() {
        let content = r#"
            [account]
            id = "acct1"

            [[split_tunnel]]
            mode = "exclude"

            [[split_tunnel.tunnels]]
            description = "example domain"
            host = "*.example.com"

            [[split_tunnel.tunnels]]
            description = "intranet"
            host = "intranet.example.com"
        "#;
        let config: Config = toml::from_str(content).unwrap();

        assert_eq!(config.account.id, "acct1");
        assert_eq!(config.split_tunnels.len(), 1);
        let block = &config.split_tunnels[0];
        assert_eq!(block.mode, Mode::Exclude);
        assert_eq!(block.tunnels[1].host, "intranet.example.com");
    }

    #[test]
    fn test_parse_rejects_unknown_mode() {
        let content = r#"
            [account]
            id = "acct1"

            [[split_tunnel]]
            mode = "invalid"
        "#;
        assert!(toml::from_str::<Config>(content).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("split-tunnel.toml");

        let config = Config::default();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::load(&temp_dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError(_))));
    }

    #[test]
    fn test_discover_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        std::fs::write(&path, "[account]\nid = \"custom\"\n").unwrap();

        let config = Config::discover(Some(&path)).unwrap();
        assert_eq!(config.account.id, "custom");
        assert!(config.split_tunnels.is_empty());
    }

    #[test]
    fn test_save_reports_write_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing-dir").join("split-tunnel.toml");

        let err = Config::default().save(&path).unwrap_err();
        assert!(matches!(err, ConfigError::WriteError(_)));
        assert!(err.to_string().starts_with("Failed to write config file"));
    }

    #[test]
    fn test_problems_default_is_clean() {
        assert!(Config::default().problems().is_empty());
    }

    #[test]
    fn test_problems_flags_empty_block() {
        let content = r#"
            [account]
            id = "acct1"

            [[split_tunnel]]
            mode = "include"
        "#;
        let config: Config = toml::from_str(content).unwrap();

        let problems = config.problems();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("split_tunnel[0] (include)"));
        assert!(problems[0].contains("At least one tunnel entry is required"));
    }

    #[test]
    fn test_problems_flags_bad_rules_and_mixed_modes() {
        let mut config = Config::default();
        config.split_tunnels.push(SplitTunnelBlock {
            mode: Mode::Exclude,
            tunnels: vec![Rule::new("", "ok.example.com")],
        });

        let problems = config.problems();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("split_tunnel[1] (exclude) tunnels[0]"));
        assert!(problems[1].contains("Both include and exclude"));
    }

    #[test]
    fn test_resources_use_account() {
        let config = Config::default();
        let resources = config.resources("acct9");
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].account_id, "acct9");
        assert_eq!(resources[0].id(), "acct9/include");
    }
}
