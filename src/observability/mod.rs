//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields)
//!     → diagnostics.rs (setup / routing failures, injectable)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, text or JSON)
//!     → tests (CapturedDiagnostics)
//! ```
//!
//! # Design Decisions
//! - Proxy transport errors are never reported anywhere
//! - Failures reported to diagnostics are still returned to the caller

pub mod diagnostics;
pub mod logging;

pub use diagnostics::{CapturedDiagnostics, Diagnostics, TracingDiagnostics};
