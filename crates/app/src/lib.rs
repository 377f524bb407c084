//! # accessgen-app
//!
//! Application layer: the request path of a simulated access-control device
//! and the loop that drives it.
//!
//! ## Responsibilities
//! - Define the **transport port** ([`ports::Transport`]) that adapters implement
//! - Sign outbound requests with the device's shared key ([`signer`])
//! - Bound every send in time and refuse new ones while too many are stuck ([`guard`])
//! - Stamp identity headers and route through signer and guard ([`dispatcher`])
//! - Resolve request URI templates against the boot configuration ([`uri`])
//! - Generate `Read` / `PortalEntryUsed` event pairs per device ([`simulator`])
//! - Run one simulator per configured device until shutdown ([`fleet`])
//!
//! ## Dependency rule
//! Depends on `accessgen-domain` only, plus tokio for timers and tasks.
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod dispatcher;
pub mod error;
pub mod fleet;
pub mod guard;
pub mod ports;
pub mod signer;
pub mod simulator;
pub mod uri;
