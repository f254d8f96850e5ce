//! Scanner composition
//!
//! Turns the discovered [`Tenant`] and the registry into the list of scanner units the
//! engine runs: one per tenant, subscription and resource group, each carrying the
//! resource types resolved for its scope.

use std::collections::BTreeSet;

use log::debug;

use crate::azure::{ListerOpts, Tenant};
use crate::config::Filter;
use crate::error::{CompositionError, Result};
use crate::registry::{Registry, Scope};

/// Region sentinel enabling tenant and subscription scoped types
pub const GLOBAL_REGION: &str = "global";

/// Region sentinel disabling region filtering
pub const ALL_REGIONS: &str = "all";

/// One enumeration job: a scope instance and the types to list in it.
#[derive(Debug, Clone)]
pub struct ScannerUnit {
    pub scope: Scope,
    /// Display identity (`tenant`, `sub/<id prefix>`, `sub/<id>/rg/<name>`)
    pub owner: String,
    pub resource_types: Vec<String>,
    pub opts: ListerOpts,
}

/// Include / exclude layers, highest precedence first (command line, global config,
/// tenant config).
#[derive(Debug, Clone, Default)]
pub struct TypeSelection {
    pub includes: Vec<Vec<String>>,
    pub excludes: Vec<Vec<String>>,
}

impl TypeSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one precedence layer.
    pub fn layer(mut self, includes: &[String], excludes: &[String]) -> Self {
        self.includes.push(includes.to_vec());
        self.excludes.push(excludes.to_vec());
        self
    }
}

/// Resolve the types to scan at `scope`.
///
/// Each non-empty include layer narrows the set; every exclude layer is subtracted.
/// Names may be deprecated aliases; a name the registry does not know is an error.
pub fn resolve_resource_types(
    registry: &Registry,
    scope: Scope,
    includes: &[Vec<String>],
    excludes: &[Vec<String>],
) -> std::result::Result<Vec<String>, CompositionError> {
    let canonical = |names: &[String]| -> std::result::Result<BTreeSet<String>, CompositionError> {
        names
            .iter()
            .map(|name| {
                registry
                    .resolve_name(name)
                    .map(str::to_string)
                    .ok_or_else(|| CompositionError::UnknownResourceType(name.clone()))
            })
            .collect()
    };

    let mut selected: BTreeSet<String> = registry.names_for_scope(scope).into_iter().collect();

    for layer in includes.iter().filter(|layer| !layer.is_empty()) {
        let layer = canonical(layer.as_slice())?;
        selected.retain(|name| layer.contains(name));
    }
    for layer in excludes {
        let layer = canonical(layer.as_slice())?;
        selected.retain(|name| !layer.contains(name));
    }

    Ok(selected.into_iter().collect())
}

/// Whether tenant and subscription units are created for these regions.
pub fn includes_global(regions: &[String]) -> bool {
    regions.iter().any(|r| r == GLOBAL_REGION || r == ALL_REGIONS)
}

/// Global rule dropping instances outside `regions`, unless `regions` contains `all`.
pub fn region_filter(regions: &[String]) -> Option<Filter> {
    if regions.iter().any(|r| r == ALL_REGIONS) {
        None
    } else {
        Some(Filter::not_in("Region", regions))
    }
}

/// Build the scanner units for a discovered tenant.
///
/// Order: tenant, then subscriptions, then resource groups (subscription order, then
/// group order). Tenant and subscription units only exist when `regions` includes
/// `global` or `all`.
pub fn compose(
    tenant: &Tenant,
    registry: &Registry,
    selection: &TypeSelection,
    regions: &[String],
) -> Result<Vec<ScannerUnit>> {
    registry.validate()?;

    let resolve = |scope| {
        resolve_resource_types(registry, scope, &selection.includes, &selection.excludes)
    };
    let tenant_types = resolve(Scope::Tenant)?;
    let subscription_types = resolve(Scope::Subscription)?;
    let group_types = resolve(Scope::ResourceGroup)?;

    let opts = |subscription_id: &str, resource_group: &str| ListerOpts {
        authorizers: tenant.authorizers.clone(),
        tenant_id: tenant.id.clone(),
        subscription_id: subscription_id.to_string(),
        resource_group: resource_group.to_string(),
        regions: regions.to_vec(),
    };

    let mut units = Vec::new();

    if includes_global(regions) {
        debug!("scope=tenant registering scanner");
        units.push(ScannerUnit {
            scope: Scope::Tenant,
            owner: "tenant".to_string(),
            resource_types: tenant_types,
            opts: opts("", ""),
        });

        for subscription_id in &tenant.subscription_ids {
            debug!("scope=subscription s={} registering scanner", subscription_id);
            let short_id = subscription_id.split('-').next().unwrap_or(subscription_id);
            units.push(ScannerUnit {
                scope: Scope::Subscription,
                owner: format!("sub/{}", short_id),
                resource_types: subscription_types.clone(),
                opts: opts(subscription_id, ""),
            });
        }
    }

    for subscription_id in &tenant.subscription_ids {
        for group in tenant.groups_of(subscription_id) {
            debug!(
                "scope=resource-group s={} rg={} registering scanner",
                subscription_id, group
            );
            units.push(ScannerUnit {
                scope: Scope::ResourceGroup,
                owner: format!("sub/{}/rg/{}", subscription_id, group),
                resource_types: group_types.clone(),
                opts: opts(subscription_id, group),
            });
        }
    }

    Ok(units)
}
