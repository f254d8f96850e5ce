//! Display models for CLI output
//!
//! Display models turn registry and engine types into table rows and JSON records.

pub mod display;

pub use display::{ResourceTypeDisplay, ResourceTypeInfo};
