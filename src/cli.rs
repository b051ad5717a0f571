//! Command-line arguments for the console.
//!
//! Every credential flag falls back to its `OS_*` environment variable,
//! matching the conventions of the standard OpenStack clients. The legacy
//! `OS_TENANT_ID`/`OS_TENANT_NAME` aliases are resolved later, in
//! [`crate::auth::Credentials`], because clap only supports one env var
//! per flag.

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "osconsole",
    about = "Interactive console for OpenStack clouds",
    version
)]
pub struct Cli {
    /// Explicitly allow "insecure" SSL (https) requests. The server's
    /// certificate will not be verified against any certificate authority.
    /// Use with caution.
    #[arg(short = 'k', long)]
    pub insecure: bool,

    /// Path of certificate file to use in SSL connection
    #[arg(long = "os-cert", env = "OS_CERT", value_name = "certificate-file")]
    pub os_cert: Option<String>,

    /// Path of client key to use in SSL connection
    #[arg(long = "os-key", env = "OS_KEY", value_name = "key-file")]
    pub os_key: Option<String>,

    /// Path of CA TLS certificate(s) used to verify the remote server's
    /// certificate. Without this option the default system CA certificates
    /// are used.
    #[arg(long = "os-cacert", env = "OS_CACERT", value_name = "ca-certificate-file")]
    pub os_cacert: Option<String>,

    /// Defaults to env[OS_USERNAME]
    #[arg(long = "os-username", env = "OS_USERNAME")]
    pub os_username: Option<String>,

    /// Defaults to env[OS_PASSWORD]
    #[arg(long = "os-password", env = "OS_PASSWORD")]
    pub os_password: Option<String>,

    /// Defaults to env[OS_PROJECT_ID], then env[OS_TENANT_ID]
    #[arg(long = "os-project-id", env = "OS_PROJECT_ID")]
    pub os_project_id: Option<String>,

    /// Defaults to env[OS_PROJECT_NAME], then env[OS_TENANT_NAME]
    #[arg(long = "os-project-name", env = "OS_PROJECT_NAME")]
    pub os_project_name: Option<String>,

    /// Defaults to env[OS_PROJECT_DOMAIN_ID]
    #[arg(long = "os-project-domain-id", env = "OS_PROJECT_DOMAIN_ID")]
    pub os_project_domain_id: Option<String>,

    /// Defaults to env[OS_PROJECT_DOMAIN_NAME]
    #[arg(long = "os-project-domain-name", env = "OS_PROJECT_DOMAIN_NAME")]
    pub os_project_domain_name: Option<String>,

    /// Defaults to env[OS_USER_DOMAIN_ID]
    #[arg(long = "os-user-domain-id", env = "OS_USER_DOMAIN_ID")]
    pub os_user_domain_id: Option<String>,

    /// Defaults to env[OS_USER_DOMAIN_NAME]
    #[arg(long = "os-user-domain-name", env = "OS_USER_DOMAIN_NAME")]
    pub os_user_domain_name: Option<String>,

    /// Defaults to env[OS_AUTH_URL]
    #[arg(long = "os-auth-url", env = "OS_AUTH_URL")]
    pub os_auth_url: Option<String>,

    /// Defaults to env[OS_REGION_NAME]
    #[arg(long = "os-region-name", env = "OS_REGION_NAME")]
    pub os_region_name: Option<String>,

    /// Defaults to env[OS_TOKEN]
    #[arg(long = "os-token", env = "OS_TOKEN")]
    pub os_token: Option<String>,
}
