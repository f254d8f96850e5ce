//! Mock hierarchy API for testing
//!
//! Provides an in-memory implementation of [`HierarchyApi`] so discovery and
//! composition can be exercised without calling Azure.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::pagination::{Pager, StaticPager};
use super::{HierarchyApi, ResourceGroupInfo, SubscriptionInfo, TenantInfo};
use crate::error::{ApiError, Result};

/// Which listing should fail, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Tenants,
    Subscriptions,
    ResourceGroups,
}

/// Mock hierarchy client.
///
/// # Example
/// ```ignore
/// let mock = MockHierarchy::new()
///     .with_tenants(&["t1"])
///     .with_subscription("s1", &[("rg-a", "eastus")]);
/// ```
#[derive(Default)]
pub struct MockHierarchy {
    tenants: Vec<String>,
    subscriptions: Vec<String>,
    resource_groups: HashMap<String, Vec<ResourceGroupInfo>>,
    page_size: Option<usize>,
    fail_at: Option<FailAt>,
    calls: Arc<Mutex<CallCounts>>,
}

/// Tracks listing calls for test verification
#[derive(Default, Debug, Clone)]
pub struct CallCounts {
    pub tenants: usize,
    pub subscriptions: usize,
    pub resource_groups: usize,
}

impl MockHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visible tenants, in the order the API returns them.
    pub fn with_tenants(mut self, tenants: &[&str]) -> Self {
        self.tenants = tenants.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Add a subscription with its `(name, location)` resource groups.
    pub fn with_subscription(mut self, subscription_id: &str, groups: &[(&str, &str)]) -> Self {
        self.subscriptions.push(subscription_id.to_string());
        self.resource_groups.insert(
            subscription_id.to_string(),
            groups
                .iter()
                .map(|(name, location)| ResourceGroupInfo {
                    name: name.to_string(),
                    location: location.to_string(),
                    id: None,
                })
                .collect(),
        );
        self
    }

    /// Split every listing into pages of this size.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Make one listing level fail on its last page.
    pub fn failing_at(mut self, level: FailAt) -> Self {
        self.fail_at = Some(level);
        self
    }

    /// Snapshot of listing calls made so far.
    pub fn calls(&self) -> CallCounts {
        self.calls.lock().unwrap().clone()
    }

    fn pages<T: Send + Clone + 'static>(&self, items: Vec<T>, level: FailAt) -> Pager<T> {
        let size = self.page_size.unwrap_or(usize::MAX).max(1);
        let mut pages: Vec<Result<Vec<T>>> = items.chunks(size).map(|c| Ok(c.to_vec())).collect();
        if pages.is_empty() {
            pages.push(Ok(Vec::new()));
        }
        if self.fail_at == Some(level) {
            pages.push(Err(ApiError::ServerError(format!("{:?} listing failed", level)).into()));
        }
        Box::new(StaticPager::new(pages))
    }
}

impl HierarchyApi for MockHierarchy {
    fn tenants(&self) -> Pager<TenantInfo> {
        self.calls.lock().unwrap().tenants += 1;
        let items = self
            .tenants
            .iter()
            .map(|id| TenantInfo {
                tenant_id: id.clone(),
                display_name: None,
            })
            .collect();
        self.pages(items, FailAt::Tenants)
    }

    fn subscriptions(&self) -> Pager<SubscriptionInfo> {
        self.calls.lock().unwrap().subscriptions += 1;
        let items = self
            .subscriptions
            .iter()
            .map(|id| SubscriptionInfo {
                subscription_id: id.clone(),
                display_name: None,
                state: Some("Enabled".to_string()),
            })
            .collect();
        self.pages(items, FailAt::Subscriptions)
    }

    fn resource_groups(&self, subscription_id: &str) -> Pager<ResourceGroupInfo> {
        self.calls.lock().unwrap().resource_groups += 1;
        let items = self
            .resource_groups
            .get(subscription_id)
            .cloned()
            .unwrap_or_default();
        self.pages(items, FailAt::ResourceGroups)
    }
}
