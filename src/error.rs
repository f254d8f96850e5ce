//! Error types for azure-nuke

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for azure-nuke operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Composition(#[from] CompositionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Interactive prompt error: {0}")]
    Dialoguer(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Aborted: {0}")]
    Aborted(String),

    #[error(
        "Run finished with errors: {failed} failed, {blocked} blocked, {unit_failures} listing failures"
    )]
    RunFailed {
        failed: usize,
        blocked: usize,
        unit_failures: usize,
    },

    #[error("Operation failed: {0}")]
    Other(String),
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        Error::Dialoguer(err.to_string())
    }
}

/// Azure Resource Manager API errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed. Check the configured credentials for this tenant.")]
    Unauthorized,

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded. Retry after {0:?}")]
    RateLimit(Duration),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Long-running operation ended with status {status}: {url}")]
    OperationFailed { status: String, url: String },
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Network("Failed to connect to API".to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Tenant {0} is on the blocklist and will not be nuked")]
    Blocklisted(String),

    #[error("Tenant {0} is not configured under `accounts` in the config file")]
    TenantNotConfigured(String),

    #[error("Conflicting credential options: {0}")]
    ConflictingCredentials(String),

    #[error(
        "--client-id is required when using --client-secret, --client-certificate-file \
         or --client-federated-token-file"
    )]
    MissingClientId,

    #[error("Invalid filter for {resource_type}: {reason}")]
    InvalidFilter {
        resource_type: String,
        reason: String,
    },
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Errors raised while walking the tenant / subscription / resource group hierarchy
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    #[error("Tenant ids do not match: requested {expected}, credential resolved {found}")]
    TenantMismatch { expected: String, found: String },

    #[error("Failed to list {level}: {source}")]
    Paging {
        level: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("Discovery did not finish within {0:?}")]
    Timeout(Duration),
}

/// Errors raised while turning the registry and filters into scanner units
#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("Resource type {resource_type} depends on unregistered type {dependency}")]
    UnknownDependency {
        resource_type: String,
        dependency: String,
    },

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Resource type {0} has no lister and cannot be scanned")]
    MissingLister(String),

    #[error("Dependency cycle between resource types: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),
}
