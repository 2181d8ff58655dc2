//! Routing shim between a browser test runner and an ES module dev server.
//!
//! The test runner keeps serving its own entrypoints and snapshot files,
//! while module sources are handed to a dev server that resolves imports and
//! applies transforms.

pub mod config;
pub mod dev_server;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod transform;

pub use config::schema::HostConfig;
pub use http::{esm_middleware, EsmRouter, HostServer};
pub use lifecycle::{Emitter, HostEvent};
