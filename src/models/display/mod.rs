//! Display model implementations for table and JSON output

mod resource_type;

pub use resource_type::{ResourceTypeDisplay, ResourceTypeInfo};
