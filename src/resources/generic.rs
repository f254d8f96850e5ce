//! Declarative lister for plain ARM collections
//!
//! Most resource types are a `GET` on a collection URL and a `DELETE` on the item id.
//! [`ArmLister`] captures that shape; per-type differences (region source, extra
//! properties, skip rules, non-delete removal) are plugged in as plain functions.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use log::trace;
use serde::Deserialize;
use serde_json::Value;

use crate::azure::ListerOpts;
use crate::client::{ArmClient, collect_all};
use crate::error::Result;
use crate::resource::{Base, Lister, Properties, Resource};

/// Item of an ARM collection response.
#[derive(Debug, Clone, Deserialize)]
pub struct ArmObject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub tags: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub properties: Value,
}

impl ArmObject {
    /// String value under `properties`, addressed as `a/b/c`.
    pub fn prop(&self, path: &str) -> Option<&str> {
        self.properties
            .pointer(&format!("/{}", path))
            .and_then(Value::as_str)
    }

    /// Id segment following `key` (matched case-insensitively).
    pub fn id_segment(&self, key: &str) -> Option<&str> {
        let mut segments = self.id.split('/');
        while let Some(segment) = segments.next() {
            if segment.eq_ignore_ascii_case(key) {
                return segments.next().filter(|s| !s.is_empty());
            }
        }
        None
    }
}

/// Where an instance's region comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSource {
    /// The item's `location`, falling back to the parent's, then `global`
    Location,
    /// Always `global`
    Global,
    /// The `locations/<region>` segment of the id
    IdLocation,
}

/// How an instance is removed
#[derive(Debug, Clone, PartialEq)]
pub enum Removal {
    /// `DELETE` the id, with optional extra query parameters
    Delete(Option<&'static str>),
    /// `POST` to an action below the id
    Action(&'static str),
    /// `PUT` a replacement body on the id
    Replace(Value),
}

fn plain_delete(_: &ArmObject) -> Removal {
    Removal::Delete(None)
}

/// Collection that must be listed once per item of a parent collection.
#[derive(Debug, Clone, Copy)]
struct Parent {
    path: &'static str,
    api_version: &'static str,
    property: &'static str,
}

/// Lister for one ARM collection.
///
/// Path templates may use `{subscription}`, `{resourceGroup}` and, for child
/// collections, `{parent}` (the parent's full id).
#[derive(Clone)]
pub struct ArmLister {
    resource_type: &'static str,
    path: &'static str,
    api_version: &'static str,
    region: RegionSource,
    parent: Option<Parent>,
    skip: Option<fn(&ArmObject) -> bool>,
    describe: Option<fn(&ArmObject, &mut Properties)>,
    removal: fn(&ArmObject) -> Removal,
}

impl ArmLister {
    pub fn new(resource_type: &'static str, path: &'static str, api_version: &'static str) -> Self {
        Self {
            resource_type,
            path,
            api_version,
            region: RegionSource::Location,
            parent: None,
            skip: None,
            describe: None,
            removal: plain_delete,
        }
    }

    pub fn region(mut self, region: RegionSource) -> Self {
        self.region = region;
        self
    }

    /// List the collection below every item of `path`, recording the parent name as `property`.
    pub fn within(
        mut self,
        path: &'static str,
        api_version: &'static str,
        property: &'static str,
    ) -> Self {
        self.parent = Some(Parent {
            path,
            api_version,
            property,
        });
        self
    }

    /// Drop items for which `skip` returns true while listing.
    pub fn skip_if(mut self, skip: fn(&ArmObject) -> bool) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Add type-specific properties.
    pub fn describe(mut self, describe: fn(&ArmObject, &mut Properties)) -> Self {
        self.describe = Some(describe);
        self
    }

    pub fn removal(mut self, removal: fn(&ArmObject) -> Removal) -> Self {
        self.removal = removal;
        self
    }

    fn expand(template: &str, opts: &ListerOpts) -> String {
        template
            .replace("{subscription}", &opts.subscription_id)
            .replace("{resourceGroup}", &opts.resource_group)
    }

    async fn parents(&self, client: &ArmClient, opts: &ListerOpts) -> Result<Vec<Option<ArmObject>>> {
        match self.parent {
            None => Ok(vec![None]),
            Some(parent) => {
                let url = client.url(&Self::expand(parent.path, opts), parent.api_version);
                let items: Vec<ArmObject> = collect_all(client.pager(url)).await?;
                Ok(items.into_iter().map(Some).collect())
            }
        }
    }

    fn build(
        &self,
        client: &ArmClient,
        opts: &ListerOpts,
        parent: Option<&ArmObject>,
        object: ArmObject,
    ) -> ArmResource {
        let region = match self.region {
            RegionSource::Global => None,
            RegionSource::Location => object
                .location
                .clone()
                .or_else(|| parent.and_then(|p| p.location.clone())),
            RegionSource::IdLocation => object.id_segment("locations").map(str::to_string),
        }
        .unwrap_or_else(|| "global".to_string());

        let resource_group = if opts.resource_group.is_empty() {
            object.id_segment("resourceGroups").unwrap_or_default().to_string()
        } else {
            opts.resource_group.clone()
        };

        let base = Base {
            region,
            subscription_id: opts.subscription_id.clone(),
            resource_group,
        };

        let mut props = base.properties();
        props.set("Name", object.name.clone());
        if let Some(tags) = &object.tags {
            props.set_tags(tags);
        }
        if let (Some(parent), Some(meta)) = (parent, self.parent) {
            props.set(meta.property, parent.name.clone());
        }
        if let Some(describe) = self.describe {
            describe(&object, &mut props);
        }

        ArmResource {
            client: client.clone(),
            api_version: self.api_version,
            removal: (self.removal)(&object),
            base,
            id: object.id,
            name: object.name,
            props,
        }
    }
}

#[async_trait]
impl Lister for ArmLister {
    async fn list(&self, opts: &ListerOpts) -> Result<Vec<Box<dyn Resource>>> {
        trace!(
            "r={} s={} rg={} listing",
            self.resource_type, opts.subscription_id, opts.resource_group
        );

        let client = opts.authorizers.arm_client();
        let mut resources: Vec<Box<dyn Resource>> = Vec::new();

        for parent in self.parents(&client, opts).await? {
            let mut path = Self::expand(self.path, opts);
            if let Some(parent) = &parent {
                path = path.replace("{parent}", &parent.id);
            }

            let url = client.url(&path, self.api_version);
            let objects: Vec<ArmObject> = collect_all(client.pager(url)).await?;
            for object in objects {
                if self.skip.is_some_and(|skip| skip(&object)) {
                    trace!("r={} skipping {} while listing", self.resource_type, object.name);
                    continue;
                }
                resources.push(Box::new(self.build(&client, opts, parent.as_ref(), object)));
            }
        }

        trace!("r={} found {}", self.resource_type, resources.len());
        Ok(resources)
    }
}

/// Instance produced by [`ArmLister`].
pub struct ArmResource {
    client: ArmClient,
    api_version: &'static str,
    removal: Removal,
    base: Base,
    id: String,
    name: String,
    props: Properties,
}

impl fmt::Display for ArmResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[async_trait]
impl Resource for ArmResource {
    fn id(&self) -> &str {
        &self.id
    }

    fn base(&self) -> &Base {
        &self.base
    }

    fn properties(&self) -> Properties {
        self.props.clone()
    }

    async fn remove(&self) -> Result<()> {
        match &self.removal {
            Removal::Delete(query) => {
                let path = match query {
                    Some(query) => format!("{}?{}", self.id, query),
                    None => self.id.clone(),
                };
                self.client.delete(&self.client.url(&path, self.api_version)).await
            }
            Removal::Action(action) => {
                let path = format!("{}/{}", self.id, action);
                self.client
                    .post(&self.client.url(&path, self.api_version), None)
                    .await
            }
            Removal::Replace(body) => {
                self.client
                    .put(&self.client.url(&self.id, self.api_version), body)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure::auth::test_authorizers;
    use mockito::Matcher;
    use serde_json::json;

    fn opts(endpoint: &str, resource_group: &str) -> ListerOpts {
        ListerOpts {
            authorizers: test_authorizers(endpoint),
            tenant_id: "t1".to_string(),
            subscription_id: "s1".to_string(),
            resource_group: resource_group.to_string(),
            regions: vec!["eastus".to_string()],
        }
    }

    fn object(id: &str) -> ArmObject {
        serde_json::from_value(json!({ "id": id, "name": "x" })).unwrap()
    }

    #[test]
    fn test_id_segment() {
        let obj = object("/subscriptions/s1/resourceGroups/rg-1/providers/Microsoft.Security/locations/centralus/alerts/a1");
        assert_eq!(obj.id_segment("resourcegroups"), Some("rg-1"));
        assert_eq!(obj.id_segment("locations"), Some("centralus"));
        assert_eq!(obj.id_segment("vaults"), None);
    }

    #[tokio::test]
    async fn test_lists_and_describes_items() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/subscriptions/s1/resourceGroups/rg-1/providers/Microsoft.Compute/disks")
            .match_query(Matcher::UrlEncoded("api-version".into(), "2023-10-02".into()))
            .with_status(200)
            .with_body(
                json!({
                    "value": [
                        {
                            "id": "/subscriptions/s1/resourceGroups/rg-1/providers/Microsoft.Compute/disks/d1",
                            "name": "d1",
                            "location": "eastus",
                            "tags": { "owner": "ops" },
                            "properties": { "timeCreated": "2024-01-02T03:04:05Z" }
                        }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let lister = ArmLister::new(
            "Disk",
            "/subscriptions/{subscription}/resourceGroups/{resourceGroup}/providers/Microsoft.Compute/disks",
            "2023-10-02",
        )
        .describe(|obj, props| {
            props.set_non_empty("CreationDate", obj.prop("timeCreated").unwrap_or_default());
        });

        let items = lister.list(&opts(&server.url(), "rg-1")).await.unwrap();
        assert_eq!(items.len(), 1);

        let disk = &items[0];
        assert_eq!(disk.to_string(), "d1");
        assert_eq!(disk.base().region, "eastus");

        let props = disk.properties();
        assert_eq!(props.get("Name"), Some("d1"));
        assert_eq!(props.get("ResourceGroup"), Some("rg-1"));
        assert_eq!(props.get("tag:owner"), Some("ops"));
        assert_eq!(props.get("CreationDate"), Some("2024-01-02T03:04:05Z"));
    }

    #[tokio::test]
    async fn test_children_are_listed_per_parent() {
        let mut server = mockito::Server::new_async().await;
        let _vaults = server
            .mock("GET", "/subscriptions/s1/resourceGroups/rg-1/providers/Microsoft.RecoveryServices/vaults")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({ "value": [{
                    "id": "/subscriptions/s1/resourceGroups/rg-1/providers/Microsoft.RecoveryServices/vaults/v1",
                    "name": "v1",
                    "location": "eastus"
                }]})
                .to_string(),
            )
            .create_async()
            .await;
        let _policies = server
            .mock("GET", "/subscriptions/s1/resourceGroups/rg-1/providers/Microsoft.RecoveryServices/vaults/v1/backupPolicies")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({ "value": [{
                    "id": "/subscriptions/s1/resourceGroups/rg-1/providers/Microsoft.RecoveryServices/vaults/v1/backupPolicies/p1",
                    "name": "p1"
                }]})
                .to_string(),
            )
            .create_async()
            .await;

        let lister = ArmLister::new("BackupPolicy", "{parent}/backupPolicies", "2024-04-01").within(
            "/subscriptions/{subscription}/resourceGroups/{resourceGroup}/providers/Microsoft.RecoveryServices/vaults",
            "2024-04-01",
            "VaultName",
        );

        let items = lister.list(&opts(&server.url(), "rg-1")).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].base().region, "eastus");
        assert_eq!(items[0].properties().get("VaultName"), Some("v1"));
    }

    #[tokio::test]
    async fn test_skip_rule_and_global_region() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/subscriptions/s1/providers/Microsoft.Authorization/policyDefinitions")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({ "value": [
                    { "id": "/subscriptions/s1/providers/Microsoft.Authorization/policyDefinitions/a", "name": "a",
                      "properties": { "policyType": "BuiltIn" } },
                    { "id": "/subscriptions/s1/providers/Microsoft.Authorization/policyDefinitions/b", "name": "b",
                      "properties": { "policyType": "Custom" } }
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let lister = ArmLister::new(
            "PolicyDefinition",
            "/subscriptions/{subscription}/providers/Microsoft.Authorization/policyDefinitions",
            "2021-06-01",
        )
        .region(RegionSource::Global)
        .skip_if(|obj| obj.prop("policyType") == Some("BuiltIn"));

        let items = lister.list(&opts(&server.url(), "")).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].to_string(), "b");
        assert_eq!(items[0].base().region, "global");
        assert_eq!(items[0].properties().get("ResourceGroup"), None);
    }

    #[tokio::test]
    async fn test_listing_fails_on_bad_page() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/subscriptions/s1/providers/Microsoft.KeyVault/vaults")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let lister = ArmLister::new(
            "KeyVault",
            "/subscriptions/{subscription}/providers/Microsoft.KeyVault/vaults",
            "2023-07-01",
        );
        assert!(lister.list(&opts(&server.url(), "")).await.is_err());
    }

    #[tokio::test]
    async fn test_removal_variants() {
        let mut server = mockito::Server::new_async().await;
        let delete = server
            .mock("DELETE", "/subscriptions/s1/resourceGroups/rg-1/providers/Microsoft.Compute/virtualMachines/vm1")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("forceDeletion".into(), "true".into()),
                Matcher::UrlEncoded("api-version".into(), "2024-03-01".into()),
            ]))
            .with_status(200)
            .create_async()
            .await;

        let client = opts(&server.url(), "rg-1").authorizers.arm_client();
        let vm = ArmResource {
            client: client.clone(),
            api_version: "2024-03-01",
            removal: Removal::Delete(Some("forceDeletion=true")),
            base: Base::default(),
            id: "/subscriptions/s1/resourceGroups/rg-1/providers/Microsoft.Compute/virtualMachines/vm1".to_string(),
            name: "vm1".to_string(),
            props: Properties::new(),
        };
        vm.remove().await.unwrap();
        delete.assert_async().await;

        let put = server
            .mock("PUT", "/subscriptions/s1/providers/Microsoft.Security/pricings/VirtualMachines")
            .match_query(Matcher::Any)
            .match_body(Matcher::Json(json!({ "properties": { "pricingTier": "Free" } })))
            .with_status(200)
            .create_async()
            .await;

        let pricing = ArmResource {
            client,
            api_version: "2024-01-01",
            removal: Removal::Replace(json!({ "properties": { "pricingTier": "Free" } })),
            base: Base::default(),
            id: "/subscriptions/s1/providers/Microsoft.Security/pricings/VirtualMachines".to_string(),
            name: "VirtualMachines".to_string(),
            props: Properties::new(),
        };
        pricing.remove().await.unwrap();
        put.assert_async().await;
    }
}
