//! Dev server and transform settings derived from the host configuration.
//!
//! # Responsibilities
//! - Validate the `[esm]` options
//! - Split them into what the dev server needs and what the transform
//!   pipeline needs
//!
//! # Design Decisions
//! - Pure function of the configuration; no I/O
//! - Coverage implies transforms, since instrumentation is a babel plugin

use serde::{Deserialize, Serialize};

use crate::config::{validate_config, ConfigError, HostConfig};

/// Babel plugin used to instrument sources for coverage.
pub const COVERAGE_PLUGIN: &str = "babel-plugin-istanbul";

/// Globs never instrumented for coverage.
pub const DEFAULT_COVERAGE_EXCLUDE: &[&str] =
    &["**/node_modules/**", "**/*.test.*", "**/*.spec.*"];

/// Settings for the external dev server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevServerSettings {
    pub root_dir: String,
    pub hostname: String,
    pub node_resolve: bool,
    pub compatibility: String,
    pub module_dirs: Vec<String>,
    pub preserve_symlinks: bool,
    pub file_extensions: Vec<String>,
    pub polyfills: bool,
    /// Whether the dev server should run the transform pipeline.
    pub babel: bool,
}

/// A babel plugin with its options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

/// Settings for the source transform pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformSettings {
    pub enabled: bool,
    pub plugins: Vec<PluginSpec>,
}

impl TransformSettings {
    /// JSON form handed to the dev server process.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Derive dev server and transform settings from the run configuration.
pub fn create_esm_config(
    config: &HostConfig,
) -> Result<(DevServerSettings, TransformSettings), ConfigError> {
    validate_config(config).map_err(ConfigError::Validation)?;

    let esm = &config.esm;
    let transform = if esm.coverage {
        let exclude = DEFAULT_COVERAGE_EXCLUDE
            .iter()
            .map(|s| (*s).to_string())
            .chain(esm.exclude_from_coverage.iter().cloned())
            .collect();
        TransformSettings {
            enabled: true,
            plugins: vec![PluginSpec {
                name: COVERAGE_PLUGIN.to_string(),
                exclude,
            }],
        }
    } else {
        TransformSettings {
            enabled: esm.babel,
            plugins: Vec::new(),
        }
    };

    let dev_server = DevServerSettings {
        root_dir: config.base_path.clone(),
        hostname: config.dev_server.hostname.clone(),
        node_resolve: esm.node_resolve,
        compatibility: esm.compatibility.clone(),
        module_dirs: esm.module_dirs.clone(),
        preserve_symlinks: esm.preserve_symlinks,
        file_extensions: esm.file_extensions.clone(),
        polyfills: esm.polyfills,
        babel: transform.enabled,
    };

    tracing::debug!(
        root_dir = %dev_server.root_dir,
        compatibility = %dev_server.compatibility,
        transforms = transform.enabled,
        plugins = transform.plugins.len(),
        "Derived dev server settings"
    );

    Ok((dev_server, transform))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_disable_transforms() {
        let (server, transform) = create_esm_config(&HostConfig::default()).unwrap();
        assert_eq!(server.root_dir, ".");
        assert!(server.node_resolve);
        assert!(!server.babel);
        assert!(!transform.enabled);
        assert!(transform.plugins.is_empty());
    }

    #[test]
    fn test_coverage_adds_instrumentation() {
        let mut config = HostConfig::default();
        config.esm.coverage = true;
        config.esm.exclude_from_coverage = vec!["demo/**".into()];

        let (server, transform) = create_esm_config(&config).unwrap();
        assert!(server.babel);
        assert!(transform.enabled);
        assert_eq!(transform.plugins.len(), 1);
        let plugin = &transform.plugins[0];
        assert_eq!(plugin.name, COVERAGE_PLUGIN);
        assert_eq!(plugin.exclude.first().map(String::as_str), Some("**/node_modules/**"));
        assert_eq!(plugin.exclude.last().map(String::as_str), Some("demo/**"));
    }

    #[test]
    fn test_babel_without_coverage() {
        let mut config = HostConfig::default();
        config.esm.babel = true;
        let (server, transform) = create_esm_config(&config).unwrap();
        assert!(server.babel);
        assert!(transform.enabled);
        assert!(transform.plugins.is_empty());
    }

    #[test]
    fn test_invalid_options_rejected() {
        let mut config = HostConfig::default();
        config.esm.compatibility = "sometimes".into();
        assert!(matches!(
            create_esm_config(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_transform_json() {
        let mut config = HostConfig::default();
        config.esm.coverage = true;
        let (_, transform) = create_esm_config(&config).unwrap();
        let json: serde_json::Value = serde_json::from_str(&transform.to_json().unwrap()).unwrap();
        assert_eq!(json["enabled"], true);
        assert_eq!(json["plugins"][0]["name"], COVERAGE_PLUGIN);
    }
}
