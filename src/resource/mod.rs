//! Resource plugin contract
//!
//! A resource type is a [`Lister`] that enumerates live instances within one scope;
//! each instance is a [`Resource`] that can describe itself and delete itself.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::azure::ListerOpts;
use crate::error::Result;

/// Location fields shared by every resource instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Base {
    /// Azure region, or `global` for region-less resources
    pub region: String,
    /// Owning subscription (empty for tenant-level resources)
    pub subscription_id: String,
    /// Owning resource group (empty above resource group scope)
    pub resource_group: String,
}

impl Base {
    /// Base for a resource found while listing `opts`.
    pub fn new(region: impl Into<String>, opts: &ListerOpts) -> Self {
        Self {
            region: region.into(),
            subscription_id: opts.subscription_id.clone(),
            resource_group: opts.resource_group.clone(),
        }
    }

    /// `Region`, `SubscriptionID` and `ResourceGroup` properties (empty values are left out).
    pub fn properties(&self) -> Properties {
        let mut props = Properties::new();
        props.set_non_empty("Region", &self.region);
        props.set_non_empty("SubscriptionID", &self.subscription_id);
        props.set_non_empty("ResourceGroup", &self.resource_group);
        props
    }
}

/// Ordered key/value snapshot used for filtering and display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, String>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn set_non_empty(&mut self, key: impl Into<String>, value: &str) -> &mut Self {
        if !value.is_empty() {
            self.0.insert(key.into(), value.to_string());
        }
        self
    }

    /// Store a tag as `tag:<key>`.
    pub fn set_tag(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.0.insert(format!("tag:{}", key), value.into());
        self
    }

    pub fn set_tags<'a, I>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (key, value) in tags {
            self.set_tag(key, value.clone());
        }
        self
    }

    /// Merge `other` into this set, overwriting existing keys.
    pub fn extend(&mut self, other: Properties) -> &mut Self {
        self.0.extend(other.0);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: \"{}\"", key, value)?;
        }
        write!(f, "]")
    }
}

/// One live resource instance.
///
/// `Display` renders the short label shown in run output and matched by bare-string filters.
#[async_trait]
pub trait Resource: fmt::Display + Send + Sync {
    /// Full ARM resource id
    fn id(&self) -> &str;

    fn base(&self) -> &Base;

    fn properties(&self) -> Properties;

    /// Delete the instance, waiting for asynchronous operations to finish.
    async fn remove(&self) -> Result<()>;
}

/// Enumerates all instances of one resource type within a scope.
#[async_trait]
pub trait Lister: Send + Sync {
    /// Page to exhaustion; any paging error fails the whole listing.
    async fn list(&self, opts: &ListerOpts) -> Result<Vec<Box<dyn Resource>>>;
}

/// Type-specific skip rule; `Err(reason)` means the instance must be left alone.
pub type PreFilter = fn(&Properties) -> std::result::Result<(), String>;
