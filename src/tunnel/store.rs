//! In-memory rule set storage
//!
//! Both modes of an account live in one map entry so the mutual-exclusion
//! check and the write happen under the same shard lock.

use super::{Mode, Rule, RuleSet};
use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Account {account} already has active {active} rules")]
    Conflict { account: String, active: Mode },
}

#[derive(Debug, Default)]
struct AccountRules {
    include: Vec<Rule>,
    exclude: Vec<Rule>,
}

impl AccountRules {
    fn rules(&self, mode: Mode) -> &Vec<Rule> {
        match mode {
            Mode::Include => &self.include,
            Mode::Exclude => &self.exclude,
        }
    }

    fn rules_mut(&mut self, mode: Mode) -> &mut Vec<Rule> {
        match mode {
            Mode::Include => &mut self.include,
            Mode::Exclude => &mut self.exclude,
        }
    }

    fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    fn check_exclusive(&self, account: &str, mode: Mode) -> Result<(), StoreError> {
        let other = mode.opposite();
        if self.rules(other).is_empty() {
            Ok(())
        } else {
            Err(StoreError::Conflict {
                account: account.to_string(),
                active: other,
            })
        }
    }
}

/// Source of truth for rule sets, keyed by account
#[derive(Debug, Default)]
pub struct RuleSetStore {
    accounts: DashMap<String, AccountRules>,
}

impl RuleSetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rule set for `(account, mode)`, empty if none exists
    pub fn get(&self, account: &str, mode: Mode) -> RuleSet {
        self.accounts
            .get(account)
            .map(|entry| RuleSet::new(entry.rules(mode).clone()))
            .unwrap_or_default()
    }

    /// Replace the rule set for `(account, mode)` and return what was stored
    ///
    /// Fails without writing if the opposite mode holds rules. An empty
    /// `rules` removes the set.
    pub fn put(&self, account: &str, mode: Mode, rules: Vec<Rule>) -> Result<RuleSet, StoreError> {
        if rules.is_empty() {
            self.delete(account, mode);
            return Ok(RuleSet::default());
        }

        let mut entry = self.accounts.entry(account.to_string()).or_default();
        entry.check_exclusive(account, mode)?;
        debug!("Storing {} {} rules for {}", rules.len(), mode, account);
        let stored = entry.rules_mut(mode);
        *stored = rules;
        Ok(RuleSet::new(stored.clone()))
    }

    /// Append one rule to `(account, mode)`, creating the set if needed
    pub fn push(&self, account: &str, mode: Mode, rule: Rule) -> Result<RuleSet, StoreError> {
        let mut entry = self.accounts.entry(account.to_string()).or_default();
        entry.check_exclusive(account, mode)?;
        let rules = entry.rules_mut(mode);
        rules.push(rule);
        Ok(RuleSet::new(rules.clone()))
    }

    /// Remove the rule at `index`, dropping the set when it empties
    ///
    /// Returns the removed rule and the remaining set.
    pub fn remove_at(&self, account: &str, mode: Mode, index: usize) -> Option<(Rule, RuleSet)> {
        let (removed, remaining) = {
            let mut entry = self.accounts.get_mut(account)?;
            let rules = entry.rules_mut(mode);
            if index >= rules.len() {
                return None;
            }
            let removed = rules.remove(index);
            (removed, RuleSet::new(rules.clone()))
        };
        self.prune(account);
        Some((removed, remaining))
    }

    /// Remove the rule set for `(account, mode)`; absent sets are fine
    pub fn delete(&self, account: &str, mode: Mode) {
        if let Some(mut entry) = self.accounts.get_mut(account) {
            entry.rules_mut(mode).clear();
        }
        self.prune(account);
    }

    /// Accounts that currently hold at least one rule
    pub fn accounts(&self) -> Vec<String> {
        let mut accounts: Vec<String> = self
            .accounts
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        accounts.sort();
        accounts
    }

    /// Mode with active rules for `account`, if any
    pub fn active_mode(&self, account: &str) -> Option<Mode> {
        let entry = self.accounts.get(account)?;
        [Mode::Include, Mode::Exclude]
            .into_iter()
            .find(|mode| !entry.rules(*mode).is_empty())
    }

    fn prune(&self, account: &str) {
        self.accounts.remove_if(account, |_, rules| rules.is_empty());
    }
}
