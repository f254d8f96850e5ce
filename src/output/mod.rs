//! Output formatting for CLI results

use serde::Serialize;
use tabled::Tabled;

use crate::cli::OutputFormat;
use crate::error::Result;

pub mod json;
pub mod table;

/// Render `records` as JSON, or as a table of `rows` built from them.
pub fn render<T, R>(records: Vec<T>, format: OutputFormat) -> Result<String>
where
    T: Serialize,
    R: Tabled + From<T>,
{
    match format {
        OutputFormat::Json => Ok(json::format_json(&records)?),
        OutputFormat::Table => {
            let rows: Vec<R> = records.into_iter().map(R::from).collect();
            Ok(table::format_table(&rows))
        }
    }
}
