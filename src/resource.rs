//! Declarative `split_tunnel` resource
//!
//! A resource block names an account, a mode and a repeated `tunnels`
//! sub-block. Applying it replaces the remote rule set; the resulting state
//! is exposed as flat attributes (`tunnels.0.host`, ...), the shape used by
//! acceptance checks.

use crate::client::{ClientError, SplitTunnelApi};
use crate::tunnel::{Mode, Rule, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("API error: {0}")]
    Client(#[from] ClientError),
    #[error("Invalid split tunnel: {0}")]
    Validation(#[from] ValidationError),
    #[error("Split tunnel {id} still exists")]
    StillExists { id: String },
    #[error("Split tunnel {id} vanished after apply")]
    Missing { id: String },
    #[error("Attribute {key}: expected {expected:?}, got {actual:?}")]
    AttributeMismatch {
        key: String,
        expected: String,
        actual: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitTunnelResource {
    pub account_id: String,
    pub mode: Mode,
    #[serde(default)]
    pub tunnels: Vec<Rule>,
}

impl SplitTunnelResource {
    pub fn new(account_id: impl Into<String>, mode: Mode, tunnels: Vec<Rule>) -> Self {
        Self {
            account_id: account_id.into(),
            mode,
            tunnels,
        }
    }

    /// Resource identity: `<account_id>/<mode>`
    pub fn id(&self) -> String {
        format!("{}/{}", self.account_id, self.mode)
    }

    /// Check the block locally; an empty `tunnels` list is rejected
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tunnels.is_empty() {
            return Err(ValidationError::NoTunnels);
        }
        self.tunnels.iter().try_for_each(Rule::validate)
    }

    /// Create or replace the remote rule set and read it back
    ///
    /// Nothing is sent to the API unless the block validates.
    pub async fn apply<C: SplitTunnelApi>(&self, client: &C) -> Result<ResourceState, ResourceError> {
        self.validate()?;
        info!("Applying split tunnel {} ({} tunnels)", self.id(), self.tunnels.len());
        client
            .create(&self.account_id, self.mode.as_str(), self.tunnels.clone())
            .await?;

        self.read(client)
            .await?
            .ok_or_else(|| ResourceError::Missing { id: self.id() })
    }

    /// Current remote state, `None` if the API has no rules for it
    pub async fn read<C: SplitTunnelApi>(
        &self,
        client: &C,
    ) -> Result<Option<ResourceState>, ResourceError> {
        match client.list(&self.account_id, self.mode.as_str()).await {
            Ok(tunnels) => Ok(Some(ResourceState {
                account_id: self.account_id.clone(),
                mode: self.mode,
                tunnels,
            })),
            Err(e) if e.is_not_found() => {
                debug!("Split tunnel {} not found", self.id());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn destroy<C: SplitTunnelApi>(&self, client: &C) -> Result<(), ResourceError> {
        info!("Destroying split tunnel {}", self.id());
        client
            .delete(&self.account_id, self.mode.as_str())
            .await?;
        Ok(())
    }

    /// Succeeds only when the API reports the rule set as not found
    pub async fn check_destroyed<C: SplitTunnelApi>(&self, client: &C) -> Result<(), ResourceError> {
        match client.list(&self.account_id, self.mode.as_str()).await {
            Ok(_) => Err(ResourceError::StillExists { id: self.id() }),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// State of an applied resource as reported by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceState {
    pub account_id: String,
    pub mode: Mode,
    pub tunnels: Vec<Rule>,
}

impl ResourceState {
    pub fn id(&self) -> String {
        format!("{}/{}", self.account_id, self.mode)
    }

    /// Flattened attributes, e.g. `tunnels.0.description`
    pub fn attributes(&self) -> BTreeMap<String, String> {
        let mut attrs = BTreeMap::new();
        attrs.insert("id".to_string(), self.id());
        attrs.insert("account_id".to_string(), self.account_id.clone());
        attrs.insert("mode".to_string(), self.mode.to_string());
        attrs.insert("tunnels.#".to_string(), self.tunnels.len().to_string());
        for (i, tunnel) in self.tunnels.iter().enumerate() {
            attrs.insert(format!("tunnels.{}.description", i), tunnel.description.clone());
            attrs.insert(format!("tunnels.{}.host", i), tunnel.host.clone());
        }
        attrs
    }

    /// Compare one flattened attribute against an expected value
    pub fn check_attr(&self, key: &str, expected: &str) -> Result<(), ResourceError> {
        let actual = self.attributes().remove(key);
        if actual.as_deref() == Some(expected) {
            Ok(())
        } else {
            Err(ResourceError::AttributeMismatch {
                key: key.to_string(),
                expected: expected.to_string(),
                actual,
            })
        }
    }
}
