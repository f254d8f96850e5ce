//! Listed resource instances and their lifecycle state

use std::fmt;

use colored::Colorize;

use crate::resource::{Properties, Resource};

/// Where an instance stands in the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemState {
    /// Listed and eligible for removal
    New,
    /// Protected by a pre-filter or config filter
    Filtered(String),
    Removed,
    Failed(String),
    /// Not attempted because a dependency did not finish
    Blocked(String),
}

impl ItemState {
    pub fn is_pending(&self) -> bool {
        matches!(self, ItemState::New)
    }

    /// Whether dependents of this instance must be held back.
    pub fn is_unfinished(&self) -> bool {
        matches!(self, ItemState::Failed(_) | ItemState::Blocked(_))
    }
}

/// One listed instance.
pub struct Item {
    /// Index of the scanner unit that listed it
    pub unit: usize,
    pub resource_type: String,
    pub owner: String,
    pub resource: Box<dyn Resource>,
    pub properties: Properties,
    pub state: ItemState,
}

impl Item {
    pub fn new(unit: usize, resource_type: &str, owner: &str, resource: Box<dyn Resource>) -> Self {
        let mut properties = resource.base().properties();
        properties.extend(resource.properties());
        Self {
            unit,
            resource_type: resource_type.to_string(),
            owner: owner.to_string(),
            resource,
            properties,
            state: ItemState::New,
        }
    }

    /// Status line; `dry_run` only changes how pending items read.
    pub fn line(&self, dry_run: bool) -> String {
        let status = match &self.state {
            ItemState::New if dry_run => "would remove".green().to_string(),
            ItemState::New => "pending".cyan().to_string(),
            ItemState::Filtered(reason) => format!("filtered: {}", reason).yellow().to_string(),
            ItemState::Removed => "removed".green().bold().to_string(),
            ItemState::Failed(reason) => format!("failed: {}", reason).red().to_string(),
            ItemState::Blocked(reason) => format!("blocked: {}", reason).red().to_string(),
        };
        format!("{} - {}", self, status)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {} - {}",
            self.owner,
            self.resource_type,
            self.resource,
            self.properties
        )
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("unit", &self.unit)
            .field("resource_type", &self.resource_type)
            .field("id", &self.resource.id())
            .field("state", &self.state)
            .finish()
    }
}

/// Per-state totals for the run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub total: usize,
    pub pending: usize,
    pub filtered: usize,
    pub removed: usize,
    pub failed: usize,
    pub blocked: usize,
}

impl Tally {
    pub fn of(items: &[Item]) -> Self {
        let mut tally = Self {
            total: items.len(),
            ..Self::default()
        };
        for item in items {
            match item.state {
                ItemState::New => tally.pending += 1,
                ItemState::Filtered(_) => tally.filtered += 1,
                ItemState::Removed => tally.removed += 1,
                ItemState::Failed(_) => tally.failed += 1,
                ItemState::Blocked(_) => tally.blocked += 1,
            }
        }
        tally
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scan complete: {} total, {} nukeable, {} filtered, {} removed, {} failed, {} blocked.",
            self.total, self.pending, self.filtered, self.removed, self.failed, self.blocked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::resource::Base;
    use async_trait::async_trait;

    struct Named(Base);

    impl fmt::Display for Named {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("vm-1")
        }
    }

    #[async_trait]
    impl Resource for Named {
        fn id(&self) -> &str {
            "/subscriptions/s1/resourceGroups/rg/providers/Microsoft.Compute/virtualMachines/vm-1"
        }

        fn base(&self) -> &Base {
            &self.0
        }

        fn properties(&self) -> Properties {
            let mut props = Properties::new();
            props.set("Name", "vm-1");
            props
        }

        async fn remove(&self) -> Result<()> {
            Ok(())
        }
    }

    fn item() -> Item {
        let base = Base {
            region: "eastus".to_string(),
            subscription_id: "s1".to_string(),
            resource_group: "rg".to_string(),
        };
        Item::new(0, "VirtualMachine", "sub/s1/rg/rg", Box::new(Named(base)))
    }

    #[test]
    fn test_item_merges_base_properties() {
        let item = item();
        assert_eq!(item.properties.get("Region"), Some("eastus"));
        assert_eq!(item.properties.get("ResourceGroup"), Some("rg"));
        assert_eq!(item.properties.get("Name"), Some("vm-1"));
        assert!(item.state.is_pending());
    }

    #[test]
    fn test_item_display() {
        colored::control::set_override(false);
        let item = item();
        let line = item.line(true);
        assert!(line.starts_with("sub/s1/rg/rg - VirtualMachine - vm-1 - ["));
        assert!(line.ends_with("would remove"));
    }

    #[test]
    fn test_tally_counts_states() {
        let mut items = vec![item(), item(), item()];
        items[1].state = ItemState::Filtered("keep".to_string());
        items[2].state = ItemState::Blocked("dep".to_string());

        let tally = Tally::of(&items);
        assert_eq!(tally.total, 3);
        assert_eq!(tally.pending, 1);
        assert_eq!(tally.filtered, 1);
        assert_eq!(tally.blocked, 1);
        assert!(ItemState::Failed(String::new()).is_unfinished());
    }
}
