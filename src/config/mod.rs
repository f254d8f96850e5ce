//! Configuration file for azure-nuke
//!
//! ```yaml
//! regions: [global, eastus]
//! blocklist: [00000000-0000-0000-0000-000000000000]
//! resource-types:
//!   excludes: [SecurityPricing]
//! accounts:
//!   <tenant-id>:
//!     filters:
//!       __global__:
//!         - property: tag:keep
//!           value: "true"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::registry::Registry;

pub mod filter;

pub use filter::{Filter, FilterSpec, Filters, GLOBAL_FILTER_KEY};

/// File name looked up in the working directory and the user config directory
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Parsed configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NukeConfig {
    /// Regions to scan; `global` enables tenant and subscription scoped types, `all` disables region filtering
    #[serde(default)]
    pub regions: Vec<String>,

    /// Tenants that must never be nuked
    #[serde(default)]
    pub blocklist: Vec<String>,

    /// Resource type selection applied to every tenant
    #[serde(default)]
    pub resource_types: TypeLists,

    /// Per-tenant settings
    #[serde(default)]
    pub accounts: BTreeMap<String, AccountConfig>,
}

/// Include / exclude lists of resource type names (aliases allowed)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TypeLists {
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
}

/// Settings for one tenant
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AccountConfig {
    #[serde(default)]
    pub resource_types: TypeLists,

    /// Resource type (or `__global__`) -> filters
    #[serde(default)]
    pub filters: BTreeMap<String, Vec<FilterSpec>>,
}

impl NukeConfig {
    /// Default config file: `./config.yaml`, then the user config directory.
    pub fn default_path() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|dir| dir.join("azure-nuke").join(CONFIG_FILE_NAME))
            .filter(|path| path.exists())
    }

    /// Load the config from `path`, or from the default location when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()
                .ok_or_else(|| ConfigError::NotFound(PathBuf::from(CONFIG_FILE_NAME)))?,
        };
        Self::load_from(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()).into());
        }

        debug!("loading config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: NukeConfig = serde_yaml::from_str(contents).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// The tenant's account settings, refusing blocklisted or unconfigured tenants.
    pub fn account(&self, tenant_id: &str) -> Result<&AccountConfig> {
        if self.blocklist.iter().any(|t| t == tenant_id) {
            return Err(ConfigError::Blocklisted(tenant_id.to_string()).into());
        }
        self.accounts
            .get(tenant_id)
            .ok_or_else(|| ConfigError::TenantNotConfigured(tenant_id.to_string()).into())
    }

    /// Compiled filters for a tenant, keyed by canonical resource type.
    pub fn filters(&self, tenant_id: &str, registry: &Registry) -> Result<Filters> {
        let account = self.account(tenant_id)?;
        let mut filters = Filters::new();

        for (key, specs) in &account.filters {
            let canonical = if key == GLOBAL_FILTER_KEY {
                GLOBAL_FILTER_KEY.to_string()
            } else {
                registry
                    .resolve_name(key)
                    .ok_or_else(|| ConfigError::InvalidFilter {
                        resource_type: key.clone(),
                        reason: "unknown resource type".to_string(),
                    })?
                    .to_string()
            };

            let compiled = specs
                .iter()
                .map(|spec| Filter::compile(spec, &canonical))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            filters.entry(canonical).or_default().extend(compiled);
        }

        Ok(filters)
    }
}
