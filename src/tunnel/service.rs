//! Business rules on top of [`RuleSetStore`]
//!
//! Every request is validated in full before the store is touched, so a
//! failed call never leaves a partial write behind.

use super::{InvalidMode, Mode, Rule, RuleSet, RuleSetStore, StoreError, ValidationError};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    InvalidMode(#[from] InvalidMode),
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("Conflict: {0}")]
    Conflict(#[from] StoreError),
    #[error("No rule at index {index} in {mode} rules for {account}")]
    RuleNotFound {
        account: String,
        mode: Mode,
        index: usize,
    },
}

#[derive(Debug, Default)]
pub struct RuleSetService {
    store: RuleSetStore,
}

impl RuleSetService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: RuleSetStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RuleSetStore {
        &self.store
    }

    /// Replace the rule set for `(account, mode)` after validating every rule
    pub fn create_or_update(
        &self,
        account: &str,
        mode: &str,
        rules: Vec<Rule>,
    ) -> Result<RuleSet, ServiceError> {
        let mode = parse_mode(mode)?;
        validate_account(account)?;
        for (index, rule) in rules.iter().enumerate() {
            rule.validate().inspect_err(|e| {
                warn!("Rejecting {} rule #{} for {}: {}", mode, index, account, e);
            })?;
        }

        info!("Setting {} {} rules for {}", rules.len(), mode, account);
        let stored = self.store.put(account, mode, rules).inspect_err(|e| {
            warn!("{}", e);
        })?;

        Ok(stored)
    }

    /// Current rule set for `(account, mode)`; empty if none exists
    pub fn list(&self, account: &str, mode: &str) -> Result<RuleSet, ServiceError> {
        let mode = parse_mode(mode)?;
        let set = self.store.get(account, mode);
        debug!("Listed {} {} rules for {}", set.len(), mode, account);
        Ok(set)
    }

    /// Remove the rule set for `(account, mode)`; succeeds if nothing exists
    pub fn destroy(&self, account: &str, mode: &str) -> Result<(), ServiceError> {
        let mode = parse_mode(mode)?;
        info!("Destroying {} rules for {}", mode, account);
        self.store.delete(account, mode);
        Ok(())
    }

    /// Append a single rule
    pub fn add_rule(&self, account: &str, mode: &str, rule: Rule) -> Result<RuleSet, ServiceError> {
        let mode = parse_mode(mode)?;
        validate_account(account)?;
        rule.validate()?;

        let set = self.store.push(account, mode, rule)?;
        info!("Added {} rule for {} ({} total)", mode, account, set.len());
        Ok(set)
    }

    /// Remove the rule at `index`; the set is dropped when it empties
    pub fn remove_rule(
        &self,
        account: &str,
        mode: &str,
        index: usize,
    ) -> Result<RuleSet, ServiceError> {
        let mode = parse_mode(mode)?;
        let (removed, remaining) = self
            .store
            .remove_at(account, mode, index)
            .ok_or_else(|| ServiceError::RuleNotFound {
                account: account.to_string(),
                mode,
                index,
            })?;

        info!("Removed {} rule {} for {}", mode, removed.host, account);
        Ok(remaining)
    }
}

fn parse_mode(mode: &str) -> Result<Mode, ServiceError> {
    Ok(mode.parse::<Mode>()?)
}

fn validate_account(account: &str) -> Result<(), ValidationError> {
    if account.trim().is_empty() {
        return Err(ValidationError::EmptyAccount);
    }
    if account.trim() != account {
        return Err(ValidationError::PaddedAccount(account.to_string()));
    }
    Ok(())
}
