//! Tenant discovery
//!
//! Walks tenant -> subscription -> resource group once at startup and produces an
//! immutable [`Tenant`] snapshot used to compose scanner units.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use super::Authorizers;
use crate::client::{HierarchyApi, collect_all};
use crate::error::{DiscoveryError, Error, Result};

/// Upper bound on the whole discovery walk
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(15);

/// Snapshot of the hierarchy visible to the credential.
#[derive(Debug)]
pub struct Tenant {
    /// Requested tenant id
    pub id: String,
    /// Retained subscriptions, in listing order
    pub subscription_ids: Vec<String>,
    /// Every tenant visible to the credential, in listing order
    pub tenant_ids: Vec<String>,
    /// Resource groups kept per subscription, in listing order
    pub resource_groups: BTreeMap<String, Vec<String>>,
    pub authorizers: Arc<Authorizers>,
}

impl Tenant {
    /// Discover the hierarchy under `tenant_id`.
    ///
    /// `subscription_ids` restricts discovery when non-empty. A resource group is kept
    /// when `regions` contains `all` or its location.
    pub async fn discover(
        api: &dyn HierarchyApi,
        authorizers: Arc<Authorizers>,
        tenant_id: &str,
        subscription_ids: &[String],
        regions: &[String],
    ) -> Result<Self> {
        let tenant_ids: Vec<String> = collect_all(api.tenants())
            .await
            .map_err(|e| paging_error("tenants", e))?
            .into_iter()
            .map(|t| t.tenant_id)
            .collect();

        check_tenant(tenant_id, &tenant_ids)?;
        debug!("tenant {} visible among {} tenants", tenant_id, tenant_ids.len());

        let all_regions = regions.iter().any(|r| r == "all");
        let mut retained = Vec::new();
        let mut resource_groups = BTreeMap::new();

        let mut subscriptions = api.subscriptions();
        while subscriptions.has_more() {
            let page = subscriptions
                .next_page()
                .await
                .map_err(|e| paging_error("subscriptions", e))?;

            for subscription in page {
                let id = subscription.subscription_id;
                if !subscription_ids.is_empty() && !subscription_ids.contains(&id) {
                    warn!("skipping subscription id: {} (reason: not requested)", id);
                    continue;
                }

                let groups: Vec<String> = collect_all(api.resource_groups(&id))
                    .await
                    .map_err(|e| paging_error("resource groups", e))?
                    .into_iter()
                    .filter(|group| all_regions || regions.contains(&group.location))
                    .map(|group| group.name)
                    .collect();

                debug!("s={} kept {} resource groups", id, groups.len());
                resource_groups.insert(id.clone(), groups);
                retained.push(id);
            }
        }

        info!(
            "discovered {} subscriptions and {} resource groups in tenant {}",
            retained.len(),
            resource_groups.values().map(Vec::len).sum::<usize>(),
            tenant_id
        );

        Ok(Self {
            id: tenant_id.to_string(),
            subscription_ids: retained,
            tenant_ids,
            resource_groups,
            authorizers,
        })
    }

    /// [`Tenant::discover`] bounded by [`DISCOVERY_TIMEOUT`].
    pub async fn discover_with_deadline(
        api: &dyn HierarchyApi,
        authorizers: Arc<Authorizers>,
        tenant_id: &str,
        subscription_ids: &[String],
        regions: &[String],
    ) -> Result<Self> {
        within(
            DISCOVERY_TIMEOUT,
            Self::discover(api, authorizers, tenant_id, subscription_ids, regions),
        )
        .await
    }

    /// Resource groups of one subscription (empty if none were kept).
    pub fn groups_of(&self, subscription_id: &str) -> &[String] {
        self.resource_groups
            .get(subscription_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// The requested tenant must be visible and must be the credential's home tenant.
fn check_tenant(tenant_id: &str, tenant_ids: &[String]) -> Result<()> {
    if tenant_ids.is_empty() || !tenant_ids.iter().any(|t| t == tenant_id) {
        return Err(DiscoveryError::TenantNotFound(tenant_id.to_string()).into());
    }
    if tenant_ids[0] != tenant_id {
        return Err(DiscoveryError::TenantMismatch {
            expected: tenant_id.to_string(),
            found: tenant_ids[0].clone(),
        }
        .into());
    }
    Ok(())
}

fn paging_error(level: &'static str, source: Error) -> Error {
    DiscoveryError::Paging {
        level,
        source: Box::new(source),
    }
    .into()
}

async fn within<T>(deadline: Duration, discovery: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(deadline, discovery)
        .await
        .map_err(|_| DiscoveryError::Timeout(deadline))?
}
