use super::DiscoveryResult;

pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format(result: &DiscoveryResult) -> String {
        serde_json::to_string_pretty(&result.sources).unwrap_or_else(|_| "[]".to_string())
    }
}
