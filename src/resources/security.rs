//! Defender for Cloud settings and alerts
//!
//! None of these can be deleted outright: alerts are dismissed and pricings are
//! reset to their default tier.

use serde_json::json;

use super::generic::{ArmLister, ArmObject, RegionSource, Removal};
use crate::registry::{Registration, Registry, Scope};
use crate::resource::Properties;

pub const SECURITY_ALERT: &str = "SecurityAlert";
pub const SECURITY_PRICING: &str = "SecurityPricing";
pub const SECURITY_WORKSPACE: &str = "SecurityWorkspace";

/// Plans whose default tier is Standard rather than Free
const STANDARD_BY_DEFAULT: [&str; 2] = ["Discovery", "FoundationalCspm"];

pub(super) fn register(registry: &mut Registry) {
    registry.register(
        Registration::new(
            SECURITY_ALERT,
            Scope::Subscription,
            ArmLister::new(
                SECURITY_ALERT,
                "/subscriptions/{subscription}/providers/Microsoft.Security/alerts",
                "2022-01-01",
            )
            .region(RegionSource::IdLocation)
            .describe(|obj, props| {
                props.set_non_empty("DisplayName", obj.prop("alertDisplayName").unwrap_or_default());
                props.set_non_empty("Status", obj.prop("status").unwrap_or_default());
            })
            .removal(|_| Removal::Action("dismiss")),
        )
        .pre_filter(alert_filter),
    );

    registry.register(
        Registration::new(
            SECURITY_PRICING,
            Scope::Subscription,
            ArmLister::new(
                SECURITY_PRICING,
                "/subscriptions/{subscription}/providers/Microsoft.Security/pricings",
                "2024-01-01",
            )
            .region(RegionSource::Global)
            .describe(|obj, props| {
                props.set_non_empty("PricingTier", obj.prop("pricingTier").unwrap_or_default());
            })
            .removal(reset_pricing),
        )
        .depends_on(&[SECURITY_ALERT])
        .pre_filter(pricing_filter),
    );

    registry.register(Registration::new(
        SECURITY_WORKSPACE,
        Scope::Subscription,
        ArmLister::new(
            SECURITY_WORKSPACE,
            "/subscriptions/{subscription}/providers/Microsoft.Security/workspaceSettings",
            "2017-08-01-preview",
        )
        .region(RegionSource::Global)
        .describe(|obj, props| {
            props.set_non_empty("Scope", obj.prop("scope").unwrap_or_default());
        }),
    ));
}

fn default_tier(plan: &str) -> &'static str {
    if STANDARD_BY_DEFAULT.contains(&plan) {
        "Standard"
    } else {
        "Free"
    }
}

fn alert_filter(props: &Properties) -> Result<(), String> {
    match props.get("Status") {
        Some("Dismissed") => Err("alert already dismissed".to_string()),
        _ => Ok(()),
    }
}

fn pricing_filter(props: &Properties) -> Result<(), String> {
    let plan = props.get("Name").unwrap_or_default();
    match props.get("PricingTier") {
        Some("Free") => Err("already set to default, free tier".to_string()),
        Some("Standard") if default_tier(plan) == "Standard" => {
            Err("already set to default, standard tier".to_string())
        }
        _ => Ok(()),
    }
}

fn reset_pricing(obj: &ArmObject) -> Removal {
    Removal::Replace(json!({
        "properties": { "pricingTier": default_tier(&obj.name) }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> Properties {
        let mut props = Properties::new();
        for (key, value) in pairs {
            props.set(*key, *value);
        }
        props
    }

    #[test]
    fn test_dismissed_alerts_are_skipped() {
        assert!(alert_filter(&props(&[("Status", "Dismissed")])).is_err());
        assert!(alert_filter(&props(&[("Status", "Active")])).is_ok());
    }

    #[test]
    fn test_pricing_filter_skips_default_tiers() {
        assert!(pricing_filter(&props(&[("Name", "VirtualMachines"), ("PricingTier", "Free")])).is_err());
        assert!(pricing_filter(&props(&[("Name", "Discovery"), ("PricingTier", "Standard")])).is_err());
        assert!(
            pricing_filter(&props(&[("Name", "VirtualMachines"), ("PricingTier", "Standard")])).is_ok()
        );
    }

    #[test]
    fn test_pricing_reset_targets_default_tier() {
        let obj: ArmObject = serde_json::from_value(json!({
            "id": "/subscriptions/s1/providers/Microsoft.Security/pricings/FoundationalCspm",
            "name": "FoundationalCspm"
        }))
        .unwrap();

        assert_eq!(
            reset_pricing(&obj),
            Removal::Replace(json!({ "properties": { "pricingTier": "Standard" } }))
        );
    }
}
