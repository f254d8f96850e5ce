//! Resource type registry
//!
//! Every resource type the tool knows about is described by a [`Registration`]: its
//! scope, lister, dependencies and deprecated aliases. The registry is built once at
//! startup and shared read-only afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::CompositionError;
use crate::resource::{Lister, PreFilter};

pub mod dependency;

/// Hierarchy level at which a resource type is enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    Tenant,
    Subscription,
    ResourceGroup,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Tenant => "tenant",
            Scope::Subscription => "subscription",
            Scope::ResourceGroup => "resource-group",
        };
        f.write_str(name)
    }
}

/// Static metadata about one resource type.
#[derive(Clone)]
pub struct Registration {
    pub name: &'static str,
    pub scope: Scope,
    /// Absent only for types superseded by an alternative
    pub lister: Option<Arc<dyn Lister>>,
    pub depends_on: Vec<&'static str>,
    pub deprecated_aliases: Vec<&'static str>,
    pub alternative_resource: Option<&'static str>,
    pub pre_filter: Option<PreFilter>,
}

impl Registration {
    pub fn new(name: &'static str, scope: Scope, lister: impl Lister + 'static) -> Self {
        Self {
            name,
            scope,
            lister: Some(Arc::new(lister)),
            depends_on: Vec::new(),
            deprecated_aliases: Vec::new(),
            alternative_resource: None,
            pre_filter: None,
        }
    }

    /// A type that is never listed itself because `alternative` covers it.
    pub fn superseded(name: &'static str, scope: Scope, alternative: &'static str) -> Self {
        Self {
            name,
            scope,
            lister: None,
            depends_on: Vec::new(),
            deprecated_aliases: Vec::new(),
            alternative_resource: Some(alternative),
            pre_filter: None,
        }
    }

    pub fn depends_on(mut self, types: &[&'static str]) -> Self {
        self.depends_on.extend_from_slice(types);
        self
    }

    pub fn aliases(mut self, aliases: &[&'static str]) -> Self {
        self.deprecated_aliases.extend_from_slice(aliases);
        self
    }

    pub fn pre_filter(mut self, filter: PreFilter) -> Self {
        self.pre_filter = Some(filter);
        self
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("has_lister", &self.lister.is_some())
            .field("depends_on", &self.depends_on)
            .field("deprecated_aliases", &self.deprecated_aliases)
            .field("alternative_resource", &self.alternative_resource)
            .field("has_pre_filter", &self.pre_filter.is_some())
            .finish()
    }
}

/// Name-indexed collection of registrations.
#[derive(Debug, Default)]
pub struct Registry {
    registrations: BTreeMap<&'static str, Registration>,
    aliases: BTreeMap<&'static str, &'static str>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a registration.
    ///
    /// # Panics
    ///
    /// On a duplicate name, or an alias that collides with a registered name or alias.
    pub fn register(&mut self, registration: Registration) {
        let name = registration.name;
        if self.registrations.contains_key(name) || self.aliases.contains_key(name) {
            panic!("resource type {} registered twice", name);
        }
        for alias in &registration.deprecated_aliases {
            if self.registrations.contains_key(alias) || self.aliases.contains_key(alias) {
                panic!("alias {} of {} is already registered", alias, name);
            }
            self.aliases.insert(*alias, name);
        }
        self.registrations.insert(name, registration);
    }

    /// Look up a registration by canonical name or deprecated alias.
    pub fn lookup(&self, name: &str) -> Option<&Registration> {
        self.registrations.get(name).or_else(|| {
            self.aliases
                .get(name)
                .and_then(|canonical| self.registrations.get(canonical))
        })
    }

    /// Canonical name for a name or alias.
    pub fn resolve_name(&self, name: &str) -> Option<&'static str> {
        self.lookup(name).map(|r| r.name)
    }

    /// Sorted names of listable types at `scope` (superseded types excluded).
    pub fn names_for_scope(&self, scope: Scope) -> Vec<String> {
        self.registrations
            .values()
            .filter(|r| r.scope == scope && r.alternative_resource.is_none())
            .map(|r| r.name.to_string())
            .collect()
    }

    /// All canonical names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.registrations.keys().map(|k| k.to_string()).collect()
    }

    /// Registrations in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.values()
    }

    /// Deprecated alias -> canonical name.
    pub fn deprecated_mapping(&self) -> BTreeMap<String, String> {
        self.aliases
            .iter()
            .map(|(alias, name)| (alias.to_string(), name.to_string()))
            .collect()
    }

    /// Check that every dependency names a registered type.
    pub fn validate(&self) -> Result<(), CompositionError> {
        for registration in self.registrations.values() {
            for dependency in &registration.depends_on {
                if !self.registrations.contains_key(dependency) {
                    return Err(CompositionError::UnknownDependency {
                        resource_type: registration.name.to_string(),
                        dependency: dependency.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
