//! Per-service client factory.
//!
//! `ClientManager` turns `(service, version, region)` requests into
//! ready-to-use `ServiceClient`s constructed from the authenticated
//! session. The registry of known services is the `ServiceType` enum.

pub mod error;
pub mod manager;
pub mod service;

pub use error::ClientError;
pub use manager::{ClientManager, ServiceType};
pub use service::ServiceClient;
