//! Authenticated Keystone session.
//!
//! A `Session` is built exactly once at startup from the merged credential
//! set and is immutable for the life of the process. Building performs no
//! network I/O; the token (and the service catalog that rides along with
//! it) is fetched lazily on first use and re-issued when it gets close to
//! expiry. Every service client makes its calls through the session, which
//! injects the `X-Auth-Token` header.

use std::fs;
use std::path::Path;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use reqwest::{header, Certificate, Client, Identity, Method, RequestBuilder};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use super::catalog::{CatalogEntry, ServiceCatalog};
use super::{AuthError, Credentials};

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Re-issue the token this many minutes before Keystone expires it
const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;

/// Keystone header carrying the issued token
const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// Header service requests authenticate with
pub(crate) const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// A token issued by Keystone, with whatever the cloud published next to it.
#[derive(Debug, Clone)]
pub struct TokenData {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub catalog: ServiceCatalog,
    pub project_name: Option<String>,
    pub user_name: Option<String>,
}

impl TokenData {
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expiry) => Utc::now() > expiry,
            None => false,
        }
    }

    /// True once the token is within the refresh buffer of its expiry.
    pub fn needs_refresh(&self) -> bool {
        match self.expires_at {
            Some(expiry) => Utc::now() > expiry - Duration::minutes(TOKEN_REFRESH_BUFFER_MINUTES),
            None => false,
        }
    }

    pub fn minutes_until_expiry(&self) -> Option<i64> {
        self.expires_at
            .map(|expiry| (expiry - Utc::now()).num_minutes().max(0))
    }
}

/// TLS material resolved from the credential set, kept so a second HTTP
/// client can be derived for constructors that cannot share the session.
#[derive(Debug, Clone, Default)]
struct TlsSettings {
    insecure: bool,
    cacert_pem: Option<Vec<u8>>,
    identity_pem: Option<Vec<u8>>,
}

impl TlsSettings {
    fn resolve(credentials: &Credentials) -> Result<Self, AuthError> {
        let cacert_pem = match credentials.cacert {
            Some(ref path) if !credentials.insecure => Some(read_pem(path)?),
            _ => None,
        };

        // A client certificate is only present when both halves are given.
        let identity_pem = match (&credentials.cert, &credentials.key) {
            (Some(cert), Some(key)) => {
                let mut pem = read_pem(cert)?;
                pem.extend_from_slice(&read_pem(key)?);
                Some(pem)
            }
            _ => None,
        };

        Ok(TlsSettings {
            insecure: credentials.insecure,
            cacert_pem,
            identity_pem,
        })
    }

    fn build_client(&self) -> Result<Client, AuthError> {
        let mut builder = Client::builder().timeout(StdDuration::from_secs(REQUEST_TIMEOUT_SECS));

        if self.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(ref pem) = self.cacert_pem {
            let cert = Certificate::from_pem(pem).map_err(|source| AuthError::TlsMaterial {
                path: "CA bundle".to_string(),
                source,
            })?;
            builder = builder.add_root_certificate(cert);
        }
        if let Some(ref pem) = self.identity_pem {
            let identity = Identity::from_pem(pem).map_err(|source| AuthError::TlsMaterial {
                path: "client certificate".to_string(),
                source,
            })?;
            builder = builder.identity(identity);
        }

        builder.build().map_err(AuthError::Network)
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>, AuthError> {
    fs::read(path).map_err(|source| AuthError::TlsFile {
        path: path.display().to_string(),
        source,
    })
}

pub struct Session {
    credentials: Credentials,
    auth_endpoint: String,
    tls: TlsSettings,
    http: Client,
    token: RwLock<Option<TokenData>>,
}

impl Session {
    /// Build a session from the resolved credential set.
    ///
    /// Fails when no auth method is resolvable (neither token nor
    /// username/password plus auth URL) or when TLS files cannot be read.
    /// Does not talk to the network.
    pub fn build(credentials: Credentials) -> Result<Self, AuthError> {
        // Surface unusable credential sets now rather than on first call.
        let _ = credentials.auth_method()?;
        let auth_endpoint = credentials.auth_endpoint()?;

        let tls = TlsSettings::resolve(&credentials)?;
        let http = tls.build_client()?;

        Ok(Session {
            credentials,
            auth_endpoint,
            tls,
            http,
            token: RwLock::new(None),
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn auth_endpoint(&self) -> &str {
        &self.auth_endpoint
    }

    /// Derive a standalone HTTP client with this session's TLS settings.
    /// Used for client constructors that cannot ride the shared session.
    pub fn isolated_client(&self) -> Result<Client, AuthError> {
        self.tls.build_client()
    }

    /// The current subject token, issuing or re-issuing one as needed.
    pub async fn token(&self) -> Result<String, AuthError> {
        Ok(self.ensure_token().await?.token)
    }

    /// The current token with its metadata, for display.
    pub async fn token_data(&self) -> Result<TokenData, AuthError> {
        self.ensure_token().await
    }

    /// The service catalog published with the current token.
    pub async fn catalog(&self) -> Result<ServiceCatalog, AuthError> {
        Ok(self.ensure_token().await?.catalog)
    }

    /// A request builder for `url` with the auth token header set.
    ///
    /// Service clients funnel every call through here so token refresh
    /// stays in one place.
    pub async fn request(&self, method: Method, url: &str) -> Result<RequestBuilder, AuthError> {
        let token = self.token().await?;
        Ok(self
            .http
            .request(method, url)
            .header(AUTH_TOKEN_HEADER, token)
            .header(header::ACCEPT, "application/json"))
    }

    async fn ensure_token(&self) -> Result<TokenData, AuthError> {
        {
            let guard = self.token.read().await;
            if let Some(ref data) = *guard {
                if !data.needs_refresh() {
                    return Ok(data.clone());
                }
                debug!(
                    expired = data.is_expired(),
                    minutes_left = ?data.minutes_until_expiry(),
                    "Token close to expiry, re-authenticating"
                );
            }
        }

        let data = self.authenticate().await?;
        let mut guard = self.token.write().await;
        *guard = Some(data.clone());
        Ok(data)
    }

    /// Issue a token from Keystone v3.
    async fn authenticate(&self) -> Result<TokenData, AuthError> {
        let url = format!("{}/auth/tokens", self.auth_endpoint);
        let body = self.credentials.auth_request_body()?;

        debug!(url = %url, "Requesting token");
        let response = self.http.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::from_status(&url, status, &body));
        }

        let token = response
            .headers()
            .get(SUBJECT_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(AuthError::MissingSubjectToken)?;

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        debug!(
            expires_at = ?parsed.token.expires_at,
            services = parsed.token.catalog.len(),
            "Token issued"
        );

        Ok(TokenData {
            token,
            expires_at: parsed.token.expires_at,
            catalog: ServiceCatalog::new(parsed.token.catalog),
            project_name: parsed.token.project.and_then(|p| p.name),
            user_name: parsed.token.user.and_then(|u| u.name),
        })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("auth_endpoint", &self.auth_endpoint)
            .field("insecure", &self.tls.insecure)
            .finish_non_exhaustive()
    }
}

// Token response body, minus the parts we never read

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
    #[serde(default)]
    project: Option<NamedRef>,
    #[serde(default)]
    user: Option<NamedRef>,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    #[serde(default)]
    name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    use crate::cli::Cli;

    fn credentials(args: &[&str]) -> Credentials {
        let mut argv = vec!["osconsole"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).expect("failed to parse test args");
        Credentials::resolve(&cli, &|_| None)
    }

    #[test]
    fn build_fails_without_any_auth_method() {
        let err = Session::build(credentials(&[])).unwrap_err();
        assert!(err.is_missing_credentials());
    }

    #[test]
    fn build_succeeds_with_token_and_auth_url() {
        let session = Session::build(credentials(&[
            "--os-token", "abc123",
            "--os-auth-url", "http://x",
        ]))
        .expect("token session should build");
        assert_eq!(session.auth_endpoint(), "http://x/v3");
    }

    #[test]
    fn build_fails_on_unreadable_cacert() {
        let err = Session::build(credentials(&[
            "--os-token", "abc123",
            "--os-auth-url", "http://x",
            "--os-cacert", "/nonexistent/ca.pem",
        ]))
        .unwrap_err();
        assert!(matches!(err, AuthError::TlsFile { .. }));
    }

    #[test]
    fn insecure_skips_the_ca_bundle() {
        // The path is bogus, but insecure mode must never try to read it.
        let session = Session::build(credentials(&[
            "-k",
            "--os-token", "abc123",
            "--os-auth-url", "http://x",
            "--os-cacert", "/nonexistent/ca.pem",
        ]))
        .expect("insecure session should build");
        assert!(session.tls.insecure);
        assert!(session.tls.cacert_pem.is_none());
    }

    #[test]
    fn client_cert_requires_both_halves() {
        let session = Session::build(credentials(&[
            "--os-token", "abc123",
            "--os-auth-url", "http://x",
            "--os-cert", "/nonexistent/cert.pem",
        ]))
        .expect("cert without key is simply absent");
        assert!(session.tls.identity_pem.is_none());
    }

    #[test]
    fn cacert_file_is_loaded_when_present() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        // Not a valid certificate; we only assert the file is read at
        // build time. Certificate parsing happens in build_client and is
        // reqwest's problem to report.
        file.write_all(b"-----BEGIN CERTIFICATE-----\n")
            .expect("write");

        let result = Session::build(credentials(&[
            "--os-token", "abc123",
            "--os-auth-url", "http://x",
            "--os-cacert", file.path().to_str().unwrap(),
        ]));
        // Either outcome proves the file was read; garbage PEM may be
        // rejected by the TLS backend.
        match result {
            Ok(session) => assert!(session.tls.cacert_pem.is_some()),
            Err(err) => assert!(matches!(err, AuthError::TlsMaterial { .. })),
        }
    }

    #[test]
    fn token_without_expiry_never_needs_refresh() {
        let data = TokenData {
            token: "t".to_string(),
            expires_at: None,
            catalog: ServiceCatalog::default(),
            project_name: None,
            user_name: None,
        };
        assert!(!data.is_expired());
        assert!(!data.needs_refresh());
    }

    #[test]
    fn token_near_expiry_needs_refresh() {
        let data = TokenData {
            token: "t".to_string(),
            expires_at: Some(Utc::now() + Duration::minutes(2)),
            catalog: ServiceCatalog::default(),
            project_name: None,
            user_name: None,
        };
        assert!(!data.is_expired());
        assert!(data.needs_refresh());
    }

    #[test]
    fn parses_keystone_token_body() {
        let json = r#"{
            "token": {
                "expires_at": "2030-01-01T00:00:00.000000Z",
                "project": {"id": "p1", "name": "demo"},
                "user": {"id": "u1", "name": "operator"},
                "catalog": [
                    {"type": "identity", "name": "keystone", "endpoints": [
                        {"interface": "public", "region": "RegionOne", "url": "http://keystone:5000/v3"}
                    ]}
                ]
            }
        }"#;

        let parsed: TokenResponse = serde_json::from_str(json).expect("parse token body");
        assert_eq!(parsed.token.catalog.len(), 1);
        assert_eq!(parsed.token.project.unwrap().name.as_deref(), Some("demo"));
        assert!(parsed.token.expires_at.is_some());
    }
}
