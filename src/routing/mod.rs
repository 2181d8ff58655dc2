//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request target (path, query)
//!     → matcher.rs (split target, evaluate prefix/marker conditions)
//!     → rules.rs (forward candidates, bypass marker, reserved snapshots)
//!     → Return: Decision::Forward or Decision::Local
//! ```
//!
//! # Design Decisions
//! - Rules compiled once, immutable at runtime
//! - No regex (prefix and substring matching only)
//! - Deterministic: same target always yields the same decision
//! - Independent of dev server state

pub mod matcher;
pub mod rules;

pub use rules::{Decision, RoutingRules};
