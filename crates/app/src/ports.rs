//! Port definitions: traits that adapters implement.

pub mod transport;

pub use transport::{Transport, TransportError};
