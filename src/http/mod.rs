//! HTTP handling subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → middleware.rs (await dev server, classify)
//!         → forward.rs (stream to dev server and back)
//!         → next handler (host routes, server.rs)
//!     → Send to client
//! ```

pub mod forward;
pub mod middleware;
pub mod server;

pub use middleware::{esm_middleware, EsmRouter, RouteError};
pub use server::HostServer;
