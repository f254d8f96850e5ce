//! Shared CLI argument types
//!
//! Argument groups are flattened into commands with `#[command(flatten)]`.

mod auth;
mod common;
mod run;

pub use auth::AuthArgs;
pub use common::OutputFormat;
pub use run::RunArgs;
