//! Azure Policy assignments and definitions

use super::generic::{ArmLister, ArmObject, RegionSource};
use crate::registry::{Registration, Registry, Scope};
use crate::resource::Properties;

pub const POLICY_ASSIGNMENT: &str = "PolicyAssignment";
pub const POLICY_DEFINITION: &str = "PolicyDefinition";

pub(super) fn register(registry: &mut Registry) {
    registry.register(
        Registration::new(
            POLICY_ASSIGNMENT,
            Scope::Subscription,
            ArmLister::new(
                POLICY_ASSIGNMENT,
                "/subscriptions/{subscription}/providers/Microsoft.Authorization/policyAssignments",
                "2022-06-01",
            )
            .region(RegionSource::Global)
            .describe(|obj, props| {
                props.set_non_empty("Scope", obj.prop("scope").unwrap_or_default());
                props.set_non_empty(
                    "EnforcementMode",
                    obj.prop("enforcementMode").unwrap_or_default(),
                );
            }),
        )
        .pre_filter(assignment_filter),
    );

    registry.register(Registration::new(
        POLICY_DEFINITION,
        Scope::Subscription,
        ArmLister::new(
            POLICY_DEFINITION,
            "/subscriptions/{subscription}/providers/Microsoft.Authorization/policyDefinitions",
            "2021-06-01",
        )
        .region(RegionSource::Global)
        .skip_if(is_builtin_definition)
        .describe(|obj, props| {
            props.set_non_empty("DisplayName", obj.prop("displayName").unwrap_or_default());
            props.set_non_empty("Type", obj.prop("policyType").unwrap_or_default());
        }),
    ));
}

fn assignment_filter(props: &Properties) -> Result<(), String> {
    if props.get("Name").is_some_and(|name| name.starts_with("sys.")) {
        return Err("cannot remove built-in policy".to_string());
    }
    Ok(())
}

fn is_builtin_definition(obj: &ArmObject) -> bool {
    matches!(obj.prop("policyType"), Some("BuiltIn") | Some("Static"))
}
