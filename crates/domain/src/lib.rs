//! # accessgen-domain
//!
//! Pure domain model for the accessgen field-hardware simulator.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Devices** (simulated controllers) and their **Portals** and readers
//! - Define **Users** (credential holders drawn at random by every device)
//! - Define **Events** (the telemetry records sent to the remote API)
//! - Define **Settings** (boot and pacing configuration consumed by the app layer)
//! - Contain all invariant enforcement
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod device;
pub mod event;
pub mod settings;
pub mod user;
