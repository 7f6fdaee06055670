//! In-process client backed by [`RuleSetService`]

use super::{ClientError, SplitTunnelApi};
use crate::tunnel::{Rule, RuleSetService};
use std::sync::Arc;
use tracing::debug;

/// Passthrough client; every call goes straight to the service
#[derive(Debug, Clone, Default)]
pub struct LocalClient {
    service: Arc<RuleSetService>,
}

impl LocalClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share an existing service, e.g. between several clients in a test
    pub fn with_service(service: Arc<RuleSetService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &Arc<RuleSetService> {
        &self.service
    }
}

impl SplitTunnelApi for LocalClient {
    async fn create(
        &self,
        account_id: &str,
        mode: &str,
        rules: Vec<Rule>,
    ) -> Result<Vec<Rule>, ClientError> {
        debug!("create {} {} ({} rules)", account_id, mode, rules.len());
        let set = self.service.create_or_update(account_id, mode, rules)?;
        Ok(set.into_rules())
    }

    async fn list(&self, account_id: &str, mode: &str) -> Result<Vec<Rule>, ClientError> {
        debug!("list {} {}", account_id, mode);
        let set = self.service.list(account_id, mode)?;
        if set.is_empty() {
            return Err(ClientError::NotFound {
                account: account_id.to_string(),
                mode: mode.to_string(),
            });
        }
        Ok(set.into_rules())
    }

    async fn delete(&self, account_id: &str, mode: &str) -> Result<(), ClientError> {
        debug!("delete {} {}", account_id, mode);
        self.service.destroy(account_id, mode)?;
        Ok(())
    }
}
