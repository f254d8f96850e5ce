//! Table output formatting

use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Rows},
};

/// Rounded table with a centred header row.
pub fn format_table<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        return "No results found.".to_string();
    }

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "NAME")]
        name: &'static str,
        #[tabled(rename = "SCOPE")]
        scope: &'static str,
    }

    #[test]
    fn test_empty_rows() {
        let rows: Vec<Row> = Vec::new();
        assert_eq!(format_table(&rows), "No results found.");
    }

    #[test]
    fn test_rows_and_headers() {
        let rows = vec![
            Row {
                name: "ManagementGroup",
                scope: "tenant",
            },
            Row {
                name: "KeyVault",
                scope: "subscription",
            },
        ];

        let output = format_table(&rows);
        assert!(output.contains("NAME"));
        assert!(output.contains("ManagementGroup"));
        assert!(output.contains("subscription"));
        assert!(output.contains("╭"));
    }
}
