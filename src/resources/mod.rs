//! Built-in resource types
//!
//! Each family module registers its types into the registry built by [`registry`].

use crate::registry::Registry;

pub mod compute;
pub mod generic;
pub mod management;
pub mod network;
pub mod policy;
pub mod recovery;
pub mod security;
pub mod storage;

/// Registry holding every built-in resource type.
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    compute::register(&mut registry);
    management::register(&mut registry);
    network::register(&mut registry);
    policy::register(&mut registry);
    recovery::register(&mut registry);
    security::register(&mut registry);
    storage::register(&mut registry);
    registry
}

/// `CreationDate` from the common `properties.timeCreated` field.
fn creation_date(obj: &generic::ArmObject, props: &mut crate::resource::Properties) {
    props.set_non_empty("CreationDate", obj.prop("timeCreated").unwrap_or_default());
}
