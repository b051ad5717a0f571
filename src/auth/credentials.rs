//! Merged credential set for Keystone authentication.
//!
//! A `Credentials` value is the resolved view of explicit flags and
//! `OS_*` environment defaults. No field is required at the type level;
//! validity is checked when an auth method is selected. If a token is
//! present it always wins over username/password.

use std::path::PathBuf;

use serde_json::{json, Value};

use super::AuthError;
use crate::cli::Cli;

/// How we will authenticate against Keystone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMethod {
    Token { token: String },
    Password { username: String, password: String },
}

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    pub project_domain_id: Option<String>,
    pub project_domain_name: Option<String>,
    pub user_domain_id: Option<String>,
    pub user_domain_name: Option<String>,
    pub auth_url: Option<String>,
    pub region_name: Option<String>,
    pub insecure: bool,
    pub cacert: Option<PathBuf>,
    pub cert: Option<PathBuf>,
    pub key: Option<PathBuf>,
}

/// Resolve one credential field: the explicit value wins, otherwise the
/// first set fallback variable. Empty strings count as unset, which is
/// what you want when a login script exports `OS_TOKEN=""`.
fn first_set<E>(explicit: Option<String>, fallbacks: &[&str], env: &E) -> Option<String>
where
    E: Fn(&str) -> Option<String>,
{
    explicit
        .filter(|v| !v.is_empty())
        .or_else(|| fallbacks.iter().find_map(|var| env(var).filter(|v| !v.is_empty())))
}

impl Credentials {
    /// Build the credential set from parsed CLI arguments.
    ///
    /// clap has already applied the primary `OS_*` fallbacks; only the
    /// legacy tenant aliases still need resolving against the process
    /// environment here.
    pub fn from_cli(cli: &Cli) -> Self {
        let env = |var: &str| std::env::var(var).ok();
        Self::resolve(cli, &env)
    }

    /// Same as [`from_cli`](Self::from_cli) but with an injectable
    /// environment lookup.
    pub fn resolve<E>(cli: &Cli, env: &E) -> Self
    where
        E: Fn(&str) -> Option<String>,
    {
        Credentials {
            username: cli.os_username.clone().filter(|v| !v.is_empty()),
            password: cli.os_password.clone().filter(|v| !v.is_empty()),
            token: cli.os_token.clone().filter(|v| !v.is_empty()),
            project_id: first_set(cli.os_project_id.clone(), &["OS_TENANT_ID"], env),
            project_name: first_set(cli.os_project_name.clone(), &["OS_TENANT_NAME"], env),
            project_domain_id: cli.os_project_domain_id.clone().filter(|v| !v.is_empty()),
            project_domain_name: cli.os_project_domain_name.clone().filter(|v| !v.is_empty()),
            user_domain_id: cli.os_user_domain_id.clone().filter(|v| !v.is_empty()),
            user_domain_name: cli.os_user_domain_name.clone().filter(|v| !v.is_empty()),
            auth_url: cli.os_auth_url.clone().filter(|v| !v.is_empty()),
            region_name: cli.os_region_name.clone().filter(|v| !v.is_empty()),
            insecure: cli.insecure,
            cacert: cli.os_cacert.clone().map(PathBuf::from),
            cert: cli.os_cert.clone().map(PathBuf::from),
            key: cli.os_key.clone().map(PathBuf::from),
        }
    }

    /// Select the auth method. Token auth takes precedence; otherwise a
    /// username/password pair plus auth URL is required.
    pub fn auth_method(&self) -> Result<AuthMethod, AuthError> {
        if let Some(ref token) = self.token {
            return Ok(AuthMethod::Token {
                token: token.clone(),
            });
        }

        let mut missing = Vec::new();
        if self.username.is_none() {
            missing.push("username");
        }
        if self.password.is_none() {
            missing.push("password");
        }
        if self.auth_url.is_none() {
            missing.push("auth URL");
        }
        if !missing.is_empty() {
            return Err(AuthError::MissingCredentials(missing.join(", ")));
        }

        Ok(AuthMethod::Password {
            username: self.username.clone().unwrap_or_default(),
            password: self.password.clone().unwrap_or_default(),
        })
    }

    /// The Keystone v3 endpoint to authenticate against. Unversioned URLs
    /// get `/v3` appended; already-versioned URLs pass through untouched.
    pub fn auth_endpoint(&self) -> Result<String, AuthError> {
        let url = self
            .auth_url
            .as_deref()
            .ok_or_else(|| AuthError::MissingCredentials("auth URL".to_string()))?;
        let trimmed = url.trim_end_matches('/');
        if trimmed.ends_with("/v3") || trimmed.ends_with("/v2.0") {
            Ok(trimmed.to_string())
        } else {
            Ok(format!("{}/v3", trimmed))
        }
    }

    /// Keystone v3 `POST /auth/tokens` request body for this credential set.
    pub fn auth_request_body(&self) -> Result<Value, AuthError> {
        let identity = match self.auth_method()? {
            AuthMethod::Token { token } => json!({
                "methods": ["token"],
                "token": { "id": token },
            }),
            AuthMethod::Password { username, password } => {
                let mut user = json!({
                    "name": username,
                    "password": password,
                });
                if let Some(domain) = domain_ref(&self.user_domain_id, &self.user_domain_name) {
                    user["domain"] = domain;
                }
                json!({
                    "methods": ["password"],
                    "password": { "user": user },
                })
            }
        };

        let mut auth = json!({ "identity": identity });
        if let Some(scope) = self.scope() {
            auth["scope"] = scope;
        }
        Ok(json!({ "auth": auth }))
    }

    /// Project scope for the token request, or `None` for an unscoped token.
    fn scope(&self) -> Option<Value> {
        if let Some(ref id) = self.project_id {
            return Some(json!({ "project": { "id": id } }));
        }
        if let Some(ref name) = self.project_name {
            let mut project = json!({ "name": name });
            if let Some(domain) = domain_ref(&self.project_domain_id, &self.project_domain_name) {
                project["domain"] = domain;
            }
            return Some(json!({ "project": project }));
        }
        None
    }
}

/// Domain reference by id (preferred) or name.
fn domain_ref(id: &Option<String>, name: &Option<String>) -> Option<Value> {
    if let Some(id) = id {
        Some(json!({ "id": id }))
    } else {
        name.as_ref().map(|name| json!({ "name": name }))
    }
}
