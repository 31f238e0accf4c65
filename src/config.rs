//! Extractor configuration schema.
//!
//! A `surfacer.yaml` file describes how to extract one package: the entry
//! point, the package name used in canonical references, the artifact
//! paths, and the release tags the package allows.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::metadata::ReleaseTag;

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ExtractorConfig {
    #[serde(default)]
    pub version: String,
    /// Package name used in canonical references. Defaults to the entry
    /// file's stem.
    #[serde(default)]
    pub package_name: Option<String>,
    /// Entry module path, relative to the config file's directory.
    #[serde(default)]
    pub entry_point: Option<PathBuf>,
    /// Review file output path (default: `<package>.api.ts`).
    #[serde(default)]
    pub review_file: Option<PathBuf>,
    /// API model output path (default: `<package>.api.json`).
    #[serde(default)]
    pub model_file: Option<PathBuf>,
    /// Release tags allowed for this package, e.g. `["@public", "@beta"]`.
    /// Empty means all tags are allowed.
    #[serde(default)]
    pub allowed_release_tags: Vec<String>,
}

impl ExtractorConfig {
    /// Parse a configuration from a YAML file. Relative paths inside the
    /// file are resolved against the file's directory.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut config: ExtractorConfig = serde_yaml::from_str(&content)?;

        let base = path.parent().unwrap_or(Path::new(""));
        if let Some(entry) = &config.entry_point {
            if entry.is_relative() {
                config.entry_point = Some(base.join(entry));
            }
        }
        Ok(config)
    }

    /// The allowed tag set, parsed. Empty when unrestricted.
    pub fn allowed_tags(&self) -> Vec<ReleaseTag> {
        self.allowed_release_tags
            .iter()
            .filter_map(|t| ReleaseTag::from_tag_name(t))
            .collect()
    }
}

/// Validate a configuration for correctness.
pub fn validate(config: &ExtractorConfig) -> anyhow::Result<()> {
    for tag in &config.allowed_release_tags {
        if ReleaseTag::from_tag_name(tag).is_none() {
            anyhow::bail!(
                "invalid release tag {:?}, must be one of @public, @beta, @alpha, @internal",
                tag
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
version: "1.0"
package_name: "widgets"
entry_point: "src/index.ts"
allowed_release_tags:
  - "@public"
  - "@beta"
"#;
        let config: ExtractorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.package_name.as_deref(), Some("widgets"));
        assert_eq!(
            config.allowed_tags(),
            vec![ReleaseTag::Public, ReleaseTag::Beta]
        );
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_tag_rejected() {
        let config = ExtractorConfig {
            allowed_release_tags: vec!["@experimental".to_string()],
            ..Default::default()
        };
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config: ExtractorConfig = serde_yaml::from_str("{}").unwrap();
        assert!(validate(&config).is_ok());
        assert!(config.allowed_tags().is_empty());
    }
}
