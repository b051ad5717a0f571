//! A constructed per-service client.
//!
//! Most clients make their calls through the shared session, which owns
//! token refresh. The object-store client instead carries its own HTTP
//! client with the token pinned at construction time, because its backend
//! cannot ride the session; the request surface is identical either way.

use std::sync::Arc;

use reqwest::{header, Client, Method};
use serde_json::Value;
use tracing::debug;

use super::manager::{ClientSpec, ServiceType};
use super::ClientError;
use crate::auth::session::AUTH_TOKEN_HEADER;
use crate::auth::Session;

enum Backend {
    /// Calls go through the session; the token header is injected per
    /// request and refreshed as needed.
    Session(Arc<Session>),
    /// Standalone connection with the token fixed at construction.
    Direct { http: Client, token: String },
}

pub struct ServiceClient {
    spec: ClientSpec,
    endpoint: String,
    backend: Backend,
}

impl ServiceClient {
    pub(super) fn via_session(session: Arc<Session>, spec: ClientSpec, catalog_url: &str) -> Self {
        let endpoint = versioned_url(catalog_url, &spec.version);
        ServiceClient {
            spec,
            endpoint,
            backend: Backend::Session(session),
        }
    }

    /// Build the standalone variant, deriving the token and TLS settings
    /// from the session.
    pub(super) async fn direct(
        session: &Session,
        spec: ClientSpec,
        catalog_url: &str,
    ) -> Result<Self, ClientError> {
        let token = session.token().await?;
        let http = session.isolated_client()?;
        let endpoint = versioned_url(catalog_url, &spec.version);
        Ok(ServiceClient {
            spec,
            endpoint,
            backend: Backend::Direct { http, token },
        })
    }

    pub fn service(&self) -> ServiceType {
        self.spec.service
    }

    pub fn version(&self) -> &str {
        &self.spec.version
    }

    pub fn region(&self) -> Option<&str> {
        self.spec.region.as_deref()
    }

    /// The versioned base URL requests are issued against.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url_for(&self, path: &str) -> String {
        if path.is_empty() {
            self.endpoint.clone()
        } else {
            format!(
                "{}/{}",
                self.endpoint.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        }
    }

    async fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, ClientError> {
        let url = self.url_for(path);
        debug!(service = %self.spec.service, method = %method, url = %url, "Service request");
        match self.backend {
            Backend::Session(ref session) => Ok(session.request(method, &url).await?),
            Backend::Direct { ref http, ref token } => Ok(http
                .request(method, &url)
                .header(AUTH_TOKEN_HEADER, token.clone())
                .header(header::ACCEPT, "application/json")),
        }
    }

    async fn execute(&self, builder: reqwest::RequestBuilder) -> Result<Value, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::from_status(status, &body));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// GET `path` relative to the service endpoint, returning parsed JSON.
    pub async fn get(&self, path: &str) -> Result<Value, ClientError> {
        let builder = self.request(Method::GET, path).await?;
        self.execute(builder).await
    }

    /// POST a JSON body to `path`.
    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        let builder = self.request(Method::POST, path).await?.json(body);
        self.execute(builder).await
    }

    /// DELETE `path`. Returns `Value::Null` for empty responses.
    pub async fn delete(&self, path: &str) -> Result<Value, ClientError> {
        let builder = self.request(Method::DELETE, path).await?;
        self.execute(builder).await
    }
}

impl std::fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient")
            .field("service", &self.spec.service)
            .field("version", &self.spec.version)
            .field("region", &self.spec.region)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Append `v{version}` to a catalog URL that does not already carry a
/// version segment. Nova publishes `.../v2.1`, swift `.../v1/AUTH_x`;
/// heat and friends publish bare hosts.
fn versioned_url(catalog_url: &str, version: &str) -> String {
    let trimmed = catalog_url.trim_end_matches('/');
    let has_version = trimmed
        .split('/')
        .skip(3) // scheme, empty, host
        .any(|segment| {
            let mut chars = segment.chars();
            chars.next() == Some('v') && chars.next().is_some_and(|c| c.is_ascii_digit())
        });
    if has_version {
        trimmed.to_string()
    } else {
        format!("{}/v{}", trimmed, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versioned_url_keeps_existing_version_segments() {
        assert_eq!(
            versioned_url("http://nova.example.com:8774/v2.1", "2"),
            "http://nova.example.com:8774/v2.1"
        );
        assert_eq!(
            versioned_url("http://swift.example.com/v1/AUTH_abc", "1"),
            "http://swift.example.com/v1/AUTH_abc"
        );
    }

    #[test]
    fn versioned_url_appends_default_version() {
        assert_eq!(
            versioned_url("http://heat.example.com:8004", "1"),
            "http://heat.example.com:8004/v1"
        );
        assert_eq!(
            versioned_url("http://glance.example.com:9292/", "2"),
            "http://glance.example.com:9292/v2"
        );
    }

    #[test]
    fn versioned_url_ignores_v_in_hostname() {
        assert_eq!(
            versioned_url("http://v2cloud.example.com:9292", "2"),
            "http://v2cloud.example.com:9292/v2"
        );
    }
}
