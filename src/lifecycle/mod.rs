//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Host (emitter.rs):
//!     RunStart / RunComplete / FileChanged / RefreshFiles / Exit
//!     → broadcast to plugins (dev server launcher)
//!
//! Signals (signals.rs):
//!     SIGINT → Exit event → dev server killed → host server drains
//! ```
//!
//! # Design Decisions
//! - One broadcast channel for all host events
//! - Exit is the only event that ends anything

pub mod emitter;
pub mod signals;

pub use emitter::{Emitter, HostEvent};
