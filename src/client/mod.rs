//! Azure Resource Manager API client

use serde::{Deserialize, Serialize};

pub mod arm;
#[cfg(test)]
pub mod mock;
pub mod pagination;
pub mod poller;

pub use arm::ArmClient;
pub use pagination::{Pager, collect_all};

/// Read access to the tenant / subscription / resource group hierarchy.
///
/// Each call returns a fresh cursor; nothing is fetched until the cursor is advanced.
pub trait HierarchyApi: Send + Sync {
    /// Tenants visible to the current credential
    fn tenants(&self) -> Pager<TenantInfo>;

    /// Subscriptions visible to the current credential
    fn subscriptions(&self) -> Pager<SubscriptionInfo>;

    /// Resource groups of one subscription
    fn resource_groups(&self, subscription_id: &str) -> Pager<ResourceGroupInfo>;
}

/// Tenant entry from `GET /tenants`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantInfo {
    /// Tenant ID
    pub tenant_id: String,

    /// Display name (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Subscription entry from `GET /subscriptions`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionInfo {
    /// Subscription ID
    pub subscription_id: String,

    /// Display name (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Subscription state (Enabled, Disabled, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Resource group entry from `GET /subscriptions/{id}/resourcegroups`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceGroupInfo {
    /// Resource group name
    pub name: String,

    /// Azure region the group lives in
    pub location: String,

    /// Full ARM id (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}
