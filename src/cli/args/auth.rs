//! Credential and cloud environment arguments

use std::path::PathBuf;

use clap::Args;

use crate::azure::auth::AuthOptions;

/// How to authenticate against Azure.
///
/// With no credential flags the Azure CLI login is used.
#[derive(Args, Debug, Clone, Default)]
pub struct AuthArgs {
    /// Azure cloud (global, china, usgovernment)
    #[arg(long, env = "AZURE_ENVIRONMENT", default_value = "global", hide_env = true)]
    pub environment: String,

    /// Application (client) id of the service principal or user-assigned identity
    #[arg(long, env = "AZURE_CLIENT_ID", hide_env = true)]
    pub client_id: Option<String>,

    /// Client secret of the service principal
    #[arg(long, env = "AZURE_CLIENT_SECRET", hide_env = true)]
    pub client_secret: Option<String>,

    /// PEM file with the client certificate and its private key
    #[arg(long, env = "AZURE_CLIENT_CERTIFICATE_FILE", hide_env = true)]
    pub client_certificate_file: Option<PathBuf>,

    /// File holding a federated token (workload identity)
    #[arg(long, env = "AZURE_FEDERATED_TOKEN_FILE", hide_env = true)]
    pub client_federated_token_file: Option<PathBuf>,

    /// Authenticate with the managed identity of the host
    #[arg(long)]
    pub use_managed_identity: bool,

    /// Pre-acquired ARM access token
    #[arg(long, env = "AZURE_ACCESS_TOKEN", hide_env = true)]
    pub access_token: Option<String>,

    #[arg(long, env = "AZURE_NUKE_ARM_ENDPOINT", hide = true)]
    pub arm_endpoint: Option<String>,

    #[arg(long, env = "AZURE_NUKE_LOGIN_ENDPOINT", hide = true)]
    pub login_endpoint: Option<String>,
}

impl AuthArgs {
    pub fn options(&self, tenant_id: &str) -> AuthOptions {
        AuthOptions {
            environment: self.environment.clone(),
            tenant_id: tenant_id.to_string(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            federated_token_file: self.client_federated_token_file.clone(),
            certificate_file: self.client_certificate_file.clone(),
            use_managed_identity: self.use_managed_identity,
            access_token: self.access_token.clone(),
            arm_endpoint: self.arm_endpoint.clone(),
            login_endpoint: self.login_endpoint.clone(),
        }
    }
}
