//! Management groups, resource groups, locks, budgets and diagnostic settings

use super::generic::{ArmLister, RegionSource};
use crate::registry::{Registration, Registry, Scope};
use crate::resource::Properties;

pub const MANAGEMENT_GROUP: &str = "ManagementGroup";
pub const MANAGEMENT_LOCK: &str = "ManagementLock";
pub const RESOURCE_GROUP: &str = "ResourceGroup";
pub const BUDGET: &str = "Budget";
pub const MONITOR_DIAGNOSTIC_SETTING: &str = "MonitorDiagnosticSetting";

pub(super) fn register(registry: &mut Registry) {
    registry.register(
        Registration::new(
            MANAGEMENT_GROUP,
            Scope::Tenant,
            ArmLister::new(
                MANAGEMENT_GROUP,
                "/providers/Microsoft.Management/managementGroups",
                "2021-04-01",
            )
            .region(RegionSource::Global)
            .describe(|obj, props| {
                props.set_non_empty("DisplayName", obj.prop("displayName").unwrap_or_default());
                props.set_non_empty("TenantID", obj.prop("tenantId").unwrap_or_default());
            }),
        )
        .pre_filter(root_group_filter),
    );

    registry.register(Registration::new(
        RESOURCE_GROUP,
        Scope::Subscription,
        ArmLister::new(
            RESOURCE_GROUP,
            "/subscriptions/{subscription}/resourcegroups",
            "2021-04-01",
        ),
    ));

    registry.register(Registration::new(
        MANAGEMENT_LOCK,
        Scope::ResourceGroup,
        ArmLister::new(
            MANAGEMENT_LOCK,
            "/subscriptions/{subscription}/resourceGroups/{resourceGroup}/providers/Microsoft.Authorization/locks",
            "2020-05-01",
        )
        .region(RegionSource::Global)
        .describe(|obj, props| {
            props.set_non_empty("LockLevel", obj.prop("level").unwrap_or_default());
        }),
    ));

    registry.register(Registration::new(
        BUDGET,
        Scope::Subscription,
        ArmLister::new(
            BUDGET,
            "/subscriptions/{subscription}/providers/Microsoft.Consumption/budgets",
            "2023-05-01",
        )
        .region(RegionSource::Global),
    ));

    registry.register(Registration::new(
        MONITOR_DIAGNOSTIC_SETTING,
        Scope::Subscription,
        ArmLister::new(
            MONITOR_DIAGNOSTIC_SETTING,
            "/subscriptions/{subscription}/providers/Microsoft.Insights/diagnosticSettings",
            "2021-05-01-preview",
        )
        .region(RegionSource::Global),
    ));
}

/// The tenant root group shares its name with the tenant and cannot be deleted.
fn root_group_filter(props: &Properties) -> Result<(), String> {
    match (props.get("Name"), props.get("TenantID")) {
        (Some(name), Some(tenant)) if name == tenant => {
            Err("tenant root management group".to_string())
        }
        _ => Ok(()),
    }
}
