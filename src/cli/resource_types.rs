//! `resource-types` command

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::models::{ResourceTypeDisplay, ResourceTypeInfo};
use crate::output;
use crate::registry::Registry;

/// Print every registered type, ordered by scope then name.
pub fn run(registry: &Registry, format: OutputFormat) -> Result<()> {
    println!("{}", render(registry, format)?);
    Ok(())
}

pub fn render(registry: &Registry, format: OutputFormat) -> Result<String> {
    let mut records: Vec<ResourceTypeInfo> =
        registry.iter().map(ResourceTypeInfo::from).collect();
    records.sort_by(|a, b| a.scope.cmp(&b.scope).then_with(|| a.name.cmp(&b.name)));

    let mut rendered = output::render::<_, ResourceTypeDisplay>(records, format)?;
    if format == OutputFormat::Table {
        for (alias, name) in registry.deprecated_mapping() {
            rendered.push_str(&format!("\n{} is deprecated, use {}", alias, name));
        }
    }
    Ok(rendered)
}
