//! Authentication against the Keystone identity service.
//!
//! This module provides:
//! - `Credentials`: the merged flag/environment credential set
//! - `Session`: the immutable authenticated handle shared by all clients
//!
//! Tokens are fetched lazily and re-issued shortly before expiry.

pub mod catalog;
pub mod credentials;
pub mod error;
pub mod session;

pub use catalog::ServiceCatalog;
pub use credentials::{AuthMethod, Credentials};
pub use error::AuthError;
pub use session::{Session, TokenData};
