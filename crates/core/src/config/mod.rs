use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Version string emitted in the metadata block unless configured otherwise.
pub const DEFAULT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub export: ExportConfig,
    pub analysis: AnalysisConfig,
}

impl AppConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

/// Document flavour produced by the exporter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = crate::PoolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(crate::PoolError::Config(format!(
                "unknown output format `{other}`"
            ))),
        }
    }
}

/// Configuration specific to the exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub version: String,
    pub format: OutputFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            format: OutputFormat::Yaml,
        }
    }
}

/// Configuration for the reference frame analyser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub sample_rate: u32,
    pub frame_size: usize,
    pub hop_size: usize,
    /// Key prefix every descriptor is stored under.
    pub namespace: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            frame_size: 1024,
            hop_size: 512,
            namespace: "lowlevel".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.export.version, DEFAULT_VERSION);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [export]
            version = "2.1-beta"
            format = "json"

            [analysis]
            hop_size = 256
            "#,
        )
        .unwrap();

        assert_eq!(config.export.version, "2.1-beta");
        assert_eq!(config.export.format, OutputFormat::Json);
        assert_eq!(config.analysis.hop_size, 256);
        assert_eq!(config.analysis.frame_size, 1024);
        assert_eq!(config.analysis.namespace, "lowlevel");
    }

    #[test]
    fn malformed_document_is_a_config_error() {
        let err = AppConfig::from_toml_str("[export\nversion = 1").unwrap_err();
        assert!(matches!(err, crate::PoolError::Config(_)));
    }

    #[test]
    fn parses_format_names() {
        assert_eq!("YAML".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
