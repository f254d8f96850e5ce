//! Dependency layering of resource types
//!
//! Removal proceeds layer by layer: every type in a layer depends only on types in
//! earlier layers. Dependencies on types outside the selected set are ignored.

use std::collections::{BTreeMap, BTreeSet};

use super::Registry;
use crate::error::CompositionError;

/// Kahn layering of `names`; each layer is sorted.
pub fn layers(registry: &Registry, names: &[String]) -> Result<Vec<Vec<String>>, CompositionError> {
    let selected: BTreeSet<&str> = names.iter().map(String::as_str).collect();

    // type -> dependencies inside the selection
    let mut pending: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for &name in &selected {
        let deps = registry
            .lookup(name)
            .map(|r| {
                r.depends_on
                    .iter()
                    .copied()
                    .filter(|d| selected.contains(d) && *d != name)
                    .collect::<BTreeSet<&str>>()
            })
            .unwrap_or_default();
        pending.insert(name, deps);
    }

    let mut result = Vec::new();
    while !pending.is_empty() {
        let ready: Vec<&str> = pending
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(name, _)| *name)
            .collect();

        if ready.is_empty() {
            return Err(CompositionError::DependencyCycle(
                pending.keys().map(|k| k.to_string()).collect(),
            ));
        }

        for name in &ready {
            pending.remove(name);
        }
        for deps in pending.values_mut() {
            for name in &ready {
                deps.remove(name);
            }
        }
        result.push(ready.into_iter().map(str::to_string).collect());
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::{EmptyLister, sample_registry};
    use crate::registry::{Registration, Scope};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_layers_follow_dependencies() {
        let registry = sample_registry();
        let names = strings(&["PublicIPAddress", "NetworkInterface", "VirtualMachine"]);

        let layers = layers(&registry, &names).unwrap();
        assert_eq!(
            layers,
            vec![
                strings(&["VirtualMachine"]),
                strings(&["NetworkInterface"]),
                strings(&["PublicIPAddress"]),
            ]
        );
    }

    #[test]
    fn test_dependencies_outside_selection_are_ignored() {
        let registry = sample_registry();
        let names = strings(&["PublicIPAddress", "KeyVault"]);

        let layers = layers(&registry, &names).unwrap();
        assert_eq!(layers, vec![strings(&["KeyVault", "PublicIPAddress"])]);
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut registry = Registry::new();
        registry.register(
            Registration::new("A", Scope::ResourceGroup, EmptyLister).depends_on(&["B"]),
        );
        registry.register(
            Registration::new("B", Scope::ResourceGroup, EmptyLister).depends_on(&["A"]),
        );
        registry.register(Registration::new("C", Scope::ResourceGroup, EmptyLister));

        match layers(&registry, &strings(&["A", "B", "C"])) {
            Err(CompositionError::DependencyCycle(types)) => {
                assert_eq!(types, strings(&["A", "B"]))
            }
            other => panic!("Expected DependencyCycle, got {:?}", other),
        }
    }
}
