//! Azure account model: authorization context, hierarchy discovery and lister options

use std::sync::Arc;

pub mod auth;
pub mod tenant;

pub use auth::Authorizers;
pub use tenant::Tenant;

/// Everything a lister needs to enumerate one scope.
///
/// `subscription_id` is empty at tenant scope and `resource_group` is empty above
/// resource group scope.
#[derive(Debug, Clone)]
pub struct ListerOpts {
    pub authorizers: Arc<Authorizers>,
    pub tenant_id: String,
    pub subscription_id: String,
    pub resource_group: String,
    pub regions: Vec<String>,
}
