use std::borrow::Cow;

use comfy_table::{Table, presets::ASCII_BORDERS_ONLY_CONDENSED};

use super::DiscoveryResult;

/// Maximum width of the targets column
const MAX_TARGETS_WIDTH: usize = 60;

const COLUMNS: [&str; 4] = ["source", "dns_name", "targets", "resource"];

/// Truncate a string to max_len chars, adding "..." if truncated
fn truncate_value(s: &str, max_len: usize) -> Cow<'_, str> {
    if s.chars().count() <= max_len {
        Cow::Borrowed(s)
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        Cow::Owned(format!("{}...", truncated))
    }
}

pub struct TableFormatter;

impl TableFormatter {
    pub fn format(result: &DiscoveryResult, no_headers: bool) -> String {
        let count = result.endpoint_count();
        if count == 0 {
            return "(0 endpoints)".to_string();
        }

        let mut table = Table::new();
        table.load_preset(ASCII_BORDERS_ONLY_CONDENSED);

        if !no_headers {
            table.set_header(COLUMNS);
        }

        for group in &result.sources {
            for endpoint in &group.endpoints {
                let targets = endpoint.targets.join(",");
                table.add_row(vec![
                    Cow::Borrowed(group.source.as_str()),
                    Cow::Borrowed(endpoint.dns_name.as_str()),
                    truncate_value(&targets, MAX_TARGETS_WIDTH),
                    Cow::Borrowed(endpoint.resource.as_str()),
                ]);
            }
        }

        format!("{}\n({} endpoints)", table, count)
    }
}
