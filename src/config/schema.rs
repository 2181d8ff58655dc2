//! Configuration schema definitions.
//!
//! This module defines the host run configuration consumed by the middleware.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Resolves the snapshot file for a test suite: `(base, suite) -> path`.
pub type SnapshotPathResolver = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

/// Root configuration of a test run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HostConfig {
    /// Directory served under `/base` and used as the dev server root.
    pub base_path: String,

    /// Re-run tests when files change. Also puts the dev server in watch mode.
    pub auto_watch: bool,

    /// Module resolution and transform options.
    pub esm: EsmOptions,

    /// Snapshot file layout.
    pub snapshot: SnapshotConfig,

    /// External dev server process.
    pub dev_server: DevServerConfig,

    /// Host listener (harness binary only).
    pub listener: ListenerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            base_path: ".".to_string(),
            auto_watch: false,
            esm: EsmOptions::default(),
            snapshot: SnapshotConfig::default(),
            dev_server: DevServerConfig::default(),
            listener: ListenerConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Options forwarded to the dev server and the transform pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EsmOptions {
    /// Resolve bare module imports.
    pub node_resolve: bool,

    /// Compatibility mode (none, auto, min, max, always, esm).
    pub compatibility: String,

    /// Instrument sources for coverage.
    pub coverage: bool,

    /// Run babel on served sources.
    pub babel: bool,

    /// Load polyfills for older browsers.
    pub polyfills: bool,

    /// Extra file extensions to resolve and transform.
    pub file_extensions: Vec<String>,

    /// Directories searched for bare imports.
    pub module_dirs: Vec<String>,

    /// Keep symlinked paths instead of their targets.
    pub preserve_symlinks: bool,

    /// Globs excluded from coverage instrumentation.
    pub exclude_from_coverage: Vec<String>,
}

impl Default for EsmOptions {
    fn default() -> Self {
        Self {
            node_resolve: true,
            compatibility: "none".to_string(),
            coverage: false,
            babel: false,
            polyfills: false,
            file_extensions: Vec::new(),
            module_dirs: vec!["node_modules".to_string()],
            preserve_symlinks: false,
            exclude_from_coverage: Vec::new(),
        }
    }
}

/// Snapshot configuration.
///
/// The resolver can be set programmatically or built from `path_template`,
/// where `{base}` and `{suite}` are substituted.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Template such as `{base}/__snapshots__/{suite}.md`.
    pub path_template: Option<String>,

    #[serde(skip)]
    pub path_resolver: Option<SnapshotPathResolver>,
}

impl SnapshotConfig {
    /// Use a custom resolver function.
    pub fn with_resolver<F>(resolver: F) -> Self
    where
        F: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        Self {
            path_template: None,
            path_resolver: Some(Arc::new(resolver)),
        }
    }

    /// The effective resolver: an explicit function wins over the template.
    pub fn resolver(&self) -> Option<SnapshotPathResolver> {
        if let Some(resolver) = &self.path_resolver {
            return Some(resolver.clone());
        }
        self.path_template.clone().map(|template| {
            Arc::new(move |base: &str, suite: &str| {
                template.replace("{base}", base).replace("{suite}", suite)
            }) as SnapshotPathResolver
        })
    }
}

impl fmt::Debug for SnapshotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotConfig")
            .field("path_template", &self.path_template)
            .field("path_resolver", &self.path_resolver.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// How to run the external dev server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DevServerConfig {
    /// Executable to spawn.
    pub command: String,

    /// Arguments placed before the generated flags.
    pub args: Vec<String>,

    /// Hostname the dev server listens on.
    pub hostname: String,

    /// Base delay between readiness checks in milliseconds.
    pub poll_base_delay_ms: u64,

    /// Maximum delay between readiness checks in milliseconds.
    pub poll_max_delay_ms: u64,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            command: "npx".to_string(),
            args: vec!["es-dev-server".to_string()],
            hostname: "localhost".to_string(),
            poll_base_delay_ms: 50,
            poll_max_delay_ms: 1000,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:9876").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:9876".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
