//! Environment lookups with scoped overrides
//!
//! [`EnvOverlay`] resolves a variable from explicit overrides first and the
//! process environment second. Overrides are taken through
//! [`EnvOverlay::override_var`] and last as long as the returned guard.
//! Dropping a guard withdraws only that guard's value, on every exit path and
//! in any drop order.
//!
//! # Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `SPLIT_TUNNEL_ACCOUNT_ID` | Account that owns the rule sets |
//! | `SPLIT_TUNNEL_API_TOKEN` | API token for a remote backend |

use std::collections::HashMap;
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

pub const ACCOUNT_ID_VAR: &str = "SPLIT_TUNNEL_ACCOUNT_ID";
pub const API_TOKEN_VAR: &str = "SPLIT_TUNNEL_API_TOKEN";

type Getter = Box<dyn Fn(&str) -> Result<String, env::VarError> + Send + Sync>;

/// Live overrides per key, newest last; each entry is tagged with its guard id
type Overrides = HashMap<String, Vec<(u64, String)>>;

pub struct EnvOverlay {
    base: Getter,
    overrides: Mutex<Overrides>,
    next_id: AtomicU64,
}

impl EnvOverlay {
    /// Overlay on top of the current process environment
    pub fn from_env() -> Self {
        Self::from_env_fn(|key| env::var(key))
    }

    /// Overlay on top of a custom getter (for testing)
    pub fn from_env_fn<F>(get_var: F) -> Self
    where
        F: Fn(&str) -> Result<String, env::VarError> + Send + Sync + 'static,
    {
        Self {
            base: Box::new(get_var),
            overrides: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Resolve `key`; empty values count as unset
    ///
    /// The most recent live override wins over the base environment.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match self.overrides().get(key).and_then(|stack| stack.last()) {
            Some((_, value)) => Some(value.clone()),
            None => (self.base)(key).ok(),
        };
        value.filter(|v| !v.is_empty())
    }

    /// Override `key` until the returned guard is dropped
    ///
    /// Passing an empty value blanks the variable. Guards may be dropped in
    /// any order; each one withdraws only its own value.
    pub fn override_var(&self, key: &str, value: impl Into<String>) -> OverrideGuard<'_> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.overrides()
            .entry(key.to_string())
            .or_default()
            .push((id, value.into()));
        debug!("Overriding {}", key);
        OverrideGuard {
            overlay: self,
            key: key.to_string(),
            id,
        }
    }

    fn overrides(&self) -> MutexGuard<'_, Overrides> {
        self.overrides.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for EnvOverlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<String> = self.overrides().keys().cloned().collect();
        f.debug_struct("EnvOverlay")
            .field("overridden", &keys)
            .finish_non_exhaustive()
    }
}

/// Withdraws one override on drop
#[must_use = "the override is undone as soon as the guard is dropped"]
pub struct OverrideGuard<'a> {
    overlay: &'a EnvOverlay,
    key: String,
    id: u64,
}

impl Drop for OverrideGuard<'_> {
    fn drop(&mut self) {
        let mut overrides = self.overlay.overrides();
        if let Some(stack) = overrides.get_mut(&self.key) {
            stack.retain(|(id, _)| *id != self.id);
            if stack.is_empty() {
                overrides.remove(&self.key);
            }
        }
        debug!("Restored {}", self.key);
    }
}

/// Credentials resolved from the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub account_id: Option<String>,
    pub api_token: Option<String>,
}

impl Credentials {
    pub fn from_overlay(overlay: &EnvOverlay) -> Self {
        Self {
            account_id: overlay.get(ACCOUNT_ID_VAR),
            api_token: overlay.get(API_TOKEN_VAR),
        }
    }
}
