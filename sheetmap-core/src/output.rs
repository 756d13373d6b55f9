use crate::types::*;
use anyhow::{anyhow, Result};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Indented JSON
    #[default]
    Pretty,
    /// Single-line JSON
    Compact,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pretty" => Ok(OutputFormat::Pretty),
            "compact" => Ok(OutputFormat::Compact),
            other => Err(anyhow!(
                "Unknown output format '{other}' (expected 'pretty' or 'compact')"
            )),
        }
    }
}

impl ExtractionOutput {
    pub fn to_json_string(&self, format: OutputFormat) -> Result<String> {
        let json = match format {
            OutputFormat::Pretty => serde_json::to_string_pretty(self)?,
            OutputFormat::Compact => serde_json::to_string(self)?,
        };
        Ok(json)
    }

    pub fn save_with_format(&self, path: &Path, format: OutputFormat) -> Result<()> {
        let json = self.to_json_string(format)?;
        std::fs::write(path, json)
            .map_err(|e| anyhow!("Failed to write output to {}: {}", path.display(), e))?;
        Ok(())
    }
}
