//! Split-tunnel API clients
//!
//! [`SplitTunnelApi`] is the surface a remote split-tunnel service offers:
//! create, list and delete the rule set of one `(account, mode)` pair.
//! [`LocalClient`] implements it on top of an in-process [`RuleSetService`].
//!
//! [`RuleSetService`]: crate::tunnel::RuleSetService

pub mod local;

use crate::tunnel::{Rule, ServiceError};
use std::future::Future;
use thiserror::Error;

pub use local::LocalClient;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Conflicting split tunnel mode: {0}")]
    Conflict(String),
    #[error("No {mode} split tunnel rules found for account {account}")]
    NotFound { account: String, mode: String },
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }
}

impl From<ServiceError> for ClientError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidMode(e) => ClientError::Validation(e.to_string()),
            ServiceError::Validation(e) => ClientError::Validation(e.to_string()),
            ServiceError::Conflict(e) => ClientError::Conflict(e.to_string()),
            ServiceError::RuleNotFound { account, mode, .. } => ClientError::NotFound {
                account,
                mode: mode.to_string(),
            },
        }
    }
}

/// Remote split-tunnel API surface
pub trait SplitTunnelApi {
    /// Replace the rules for `(account_id, mode)` and return what was stored
    fn create(
        &self,
        account_id: &str,
        mode: &str,
        rules: Vec<Rule>,
    ) -> impl Future<Output = Result<Vec<Rule>, ClientError>> + Send;

    /// Rules for `(account_id, mode)`
    ///
    /// Returns [`ClientError::NotFound`] when no rules exist.
    fn list(
        &self,
        account_id: &str,
        mode: &str,
    ) -> impl Future<Output = Result<Vec<Rule>, ClientError>> + Send;

    /// Remove every rule for `(account_id, mode)`
    fn delete(
        &self,
        account_id: &str,
        mode: &str,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tunnel::{InvalidMode, Mode, StoreError, ValidationError};

    #[test]
    fn test_client_error_display() {
        let err = ClientError::NotFound {
            account: "acct1".to_string(),
            mode: "include".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No include split tunnel rules found for account acct1"
        );
        assert!(err.is_not_found());

        let err = ClientError::Validation("bad".to_string());
        assert!(err.to_string().contains("Invalid request"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_from_service_error() {
        let err: ClientError = ServiceError::InvalidMode(InvalidMode("x".into())).into();
        assert!(matches!(err, ClientError::Validation(_)));

        let err: ClientError = ServiceError::Validation(ValidationError::EmptyHost).into();
        assert_eq!(
            err,
            ClientError::Validation("Rule host must not be empty".to_string())
        );

        let err: ClientError = ServiceError::Conflict(StoreError::Conflict {
            account: "acct1".into(),
            active: Mode::Exclude,
        })
        .into();
        match err {
            ClientError::Conflict(msg) => assert!(msg.contains("exclude")),
            other => panic!("Expected Conflict, got {:?}", other),
        }
    }
}
