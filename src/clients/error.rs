use thiserror::Error;

use crate::auth::error::truncate_body;
use crate::auth::AuthError;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The requested service identifier is not in the registry.
    #[error("service not found: {0}")]
    ServiceNotFound(String),

    #[error("no public endpoint for {service}{}", region_suffix(.region))]
    EndpointNotFound {
        service: &'static str,
        region: Option<String>,
    },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("request failed ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

fn region_suffix(region: &Option<String>) -> String {
    match region {
        Some(r) => format!(" in region {}", r),
        None => String::new(),
    }
}

impl ClientError {
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        ClientError::Api {
            status: status.as_u16(),
            body: truncate_body(body),
        }
    }
}
