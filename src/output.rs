//! Output rendering for command results

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Render any serializable response object
pub fn render<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).context("Failed to render JSON output")
        }
        OutputFormat::Yaml => serde_yaml::to_string(value).context("Failed to render YAML output"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_json_and_yaml() {
        let value = json!({ "name": "vmss", "sku": { "capacity": 2 } });

        let rendered = render(&value, OutputFormat::Json).unwrap();
        assert!(rendered.contains("\"capacity\": 2"));

        let rendered = render(&value, OutputFormat::Yaml).unwrap();
        assert!(rendered.contains("name: vmss"));
        assert!(rendered.contains("capacity: 2"));
    }
}
