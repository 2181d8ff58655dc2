//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → HostConfig (validated, immutable)
//!     → handed to the middleware factory once
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The snapshot resolver is a function; files can only express it as a template

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    DevServerConfig, EsmOptions, HostConfig, ListenerConfig, ObservabilityConfig,
    SnapshotConfig, SnapshotPathResolver,
};
pub use validation::{validate_config, ValidationError};
