//! Host pattern validation for split-tunnel entries
//!
//! Accepts plain hostnames (`vpn.example.com`), IPv4 literals and a single
//! leading wildcard label (`*.example.com`).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Account id must not be empty")]
    EmptyAccount,
    #[error("Account id {0:?} has leading or trailing whitespace")]
    PaddedAccount(String),
    #[error("At least one tunnel entry is required")]
    NoTunnels,
    #[error("Rule description must not be empty")]
    EmptyDescription,
    #[error("Rule host must not be empty")]
    EmptyHost,
    #[error("Invalid host {host:?}: {reason}")]
    InvalidHost { host: String, reason: String },
}

const MAX_HOST_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Validate a hostname or wildcard host pattern
pub fn validate_host(host: &str) -> Result<(), ValidationError> {
    if host.is_empty() {
        return Err(ValidationError::EmptyHost);
    }

    let invalid = |reason: &str| ValidationError::InvalidHost {
        host: host.to_string(),
        reason: reason.to_string(),
    };

    // FQDN notation
    let name = host.strip_suffix('.').unwrap_or(host);

    if name.is_empty() {
        return Err(invalid("no labels"));
    }
    if name.len() > MAX_HOST_LEN {
        return Err(invalid("longer than 253 characters"));
    }

    let rest = name.strip_prefix("*.").unwrap_or(name);
    if rest.is_empty() {
        return Err(invalid("wildcard without a domain"));
    }

    for label in rest.split('.') {
        validate_label(label).map_err(|reason| invalid(reason))?;
    }

    Ok(())
}

fn validate_label(label: &str) -> Result<(), &'static str> {
    if label.is_empty() {
        return Err("empty label");
    }
    if label.len() > MAX_LABEL_LEN {
        return Err("label longer than 63 characters");
    }
    if label == "*" {
        return Err("wildcard is only allowed as the leftmost label");
    }
    if !label
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-')
    {
        return Err("label contains characters other than letters, digits and '-'");
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err("label starts or ends with '-'");
    }
    Ok(())
}
