//! Shared protocol types for Ficecal tool calls.
//!
//! Holds the request context carried by every tool envelope and the
//! capabilities descriptor advertised to clients.

pub mod capabilities;
pub mod context;
pub mod errors;

pub use errors::{ContextError, Result};
