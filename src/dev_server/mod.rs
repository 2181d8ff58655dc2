//! External dev server subsystem.
//!
//! # Data Flow
//! ```text
//! Middleware construction:
//!     LaunchRequest (config, settings, watch, transforms, emitter)
//!     → launcher.rs (DevServerLauncher contract)
//!     → process.rs (spawn child, wait for port)
//!     → handle.rs (Pending → Ready | Failed, exactly once)
//!
//! Per request:
//!     handle.rs resolve() → ServerHandle (base address)
//! ```
//!
//! # Design Decisions
//! - Startup is spawned eagerly; the middleware is usable immediately
//! - Exactly one startup attempt per middleware, no retries
//! - The launcher is a trait so hosts and tests can supply their own

pub mod handle;
pub mod launcher;
pub mod process;

pub use handle::{DevServerCell, Phase, SetupError};
pub use launcher::{DevServerLauncher, LaunchError, LaunchRequest, ServerHandle};
pub use process::ProcessLauncher;
