//! Resilience helpers.
//!
//! # Design Decisions
//! - No retries: startup and forwarding are attempted once
//! - Backoff only paces readiness checks against a process that is still
//!   booting; it never re-runs a failed operation

pub mod backoff;
