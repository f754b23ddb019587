//! # consentflow Infrastructure
//!
//! Infrastructure implementations of the `consentflow-core` ports.
//!
//! This crate contains:
//! - The reqwest-backed HTTP client and the ARM `HttpPost` adapter
//! - Bearer token sources
//! - The loopback popup host (system browser + local redirect listener)
//! - Configuration loading and tracing initialisation
//!
//! ## Architecture
//! - Implements traits defined in `consentflow-core`
//! - Contains all "impure" code (network, environment, processes)

pub mod arm;
pub mod auth;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
pub mod popup;

// Re-export commonly used items
pub use arm::ArmClient;
pub use auth::{EnvTokenSource, StaticTokenSource};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use popup::{loopback_origin, BrowserLauncher, LoopbackPopupHost, SystemBrowser};
