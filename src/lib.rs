//! Split Tunnel - include/exclude rule sets for Zero Trust tunnels
//!
//! Each account routes by exactly one mode at a time: `include` sends only
//! the listed hosts through the tunnel, `exclude` lets the listed hosts
//! bypass it. This crate keeps those rule sets, enforces the mode exclusion
//! and exposes them through a client interface that mirrors the remote API.
//!
//! # Architecture
//!
//! - `tunnel`: rule types, host validation, the store and the service
//! - `client`: API client trait and the in-process implementation
//! - `resource`: declarative `split_tunnel` resource (apply/read/destroy)
//! - `config`: configuration file handling (TOML)
//! - `env`: environment lookups with scoped overrides
//!
//! # Usage
//!
//! ```no_run
//! use split_tunnel::{LocalClient, Mode, Rule, SplitTunnelResource};
//!
//! # async fn run() -> Result<(), split_tunnel::resource::ResourceError> {
//! let client = LocalClient::new();
//! let resource = SplitTunnelResource::new(
//!     "acct1",
//!     Mode::Include,
//!     vec![Rule::new("example domain", "*.example.com")],
//! );
//! let state = resource.apply(&client).await?;
//! assert_eq!(state.attributes()["tunnels.0.host"], "*.example.com");
//! resource.destroy(&client).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod env;
pub mod resource;
pub mod tunnel;

pub use client::{ClientError, LocalClient, SplitTunnelApi};
pub use config::Config;
pub use resource::{ResourceState, SplitTunnelResource};
pub use tunnel::{Mode, Rule, RuleSet, RuleSetService, RuleSetStore};
