//! Resource type display models

use serde::Serialize;
use tabled::Tabled;

use crate::registry::{Registration, Scope};

/// Resource type record for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceTypeInfo {
    pub name: String,
    pub scope: Scope,
    /// Types removed before this one
    pub depends_on: Vec<String>,
    pub deprecated_aliases: Vec<String>,
    /// Type that lists and removes instances of this one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative_resource: Option<String>,
}

impl From<&Registration> for ResourceTypeInfo {
    fn from(registration: &Registration) -> Self {
        let names =
            |names: &[&str]| -> Vec<String> { names.iter().map(|n| n.to_string()).collect() };
        Self {
            name: registration.name.to_string(),
            scope: registration.scope,
            depends_on: names(&registration.depends_on),
            deprecated_aliases: names(&registration.deprecated_aliases),
            alternative_resource: registration.alternative_resource.map(str::to_string),
        }
    }
}

/// Resource type row for table output.
#[derive(Debug, Clone, Tabled)]
pub struct ResourceTypeDisplay {
    #[tabled(rename = "NAME")]
    pub name: String,

    #[tabled(rename = "SCOPE")]
    pub scope: String,

    #[tabled(rename = "DEPENDS ON")]
    pub depends_on: String,

    #[tabled(rename = "DEPRECATED ALIASES")]
    pub deprecated_aliases: String,

    #[tabled(rename = "ALTERNATIVE")]
    pub alternative_resource: String,
}

impl From<ResourceTypeInfo> for ResourceTypeDisplay {
    fn from(info: ResourceTypeInfo) -> Self {
        Self {
            name: info.name,
            scope: info.scope.to_string(),
            depends_on: join_names(&info.depends_on),
            deprecated_aliases: join_names(&info.deprecated_aliases),
            alternative_resource: info.alternative_resource.unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn join_names(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}
