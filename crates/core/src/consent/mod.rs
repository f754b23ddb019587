//! Connection consent: ARM facade and end-to-end flow

pub mod flow;
pub mod ports;
pub mod service;

pub use flow::ConsentFlow;
pub use service::OAuthService;
