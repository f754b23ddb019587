//! # consentflow Domain
//!
//! Domain types for the Logic Apps connection consent handshake.
//!
//! This crate contains:
//! - Consent request/response payloads exchanged with Azure Resource Manager
//! - Popup handshake values (options, identifiers, login results)
//! - The shared error type and `Result` alias
//! - Configuration structures and defaults
//!
//! ## Architecture
//! - No dependencies on other consentflow crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
