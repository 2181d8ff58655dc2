//! Forward-or-local decision for a request.
//!
//! # Responsibilities
//! - Hold the compiled forward, bypass and reserved matchers
//! - Compute the reserved snapshot directory from the configuration
//! - Decide whether a request goes to the dev server or stays local
//!
//! # Design Decisions
//! - Compiled once at construction, immutable afterwards
//! - Forward candidates are checked first, then the bypass marker, then the
//!   reserved snapshot prefix; there is no longest-match rule

use crate::config::SnapshotPathResolver;
use crate::routing::matcher::{
    AnyMatcher, Matcher, PathPrefixMatcher, QueryMarkerMatcher, RequestTarget,
};

/// Query marker that forces local handling.
pub const BYPASS_MARKER: &str = "bypass-es-dev-server";

/// Prefix of files generated in memory by the dev server.
pub const VIRTUAL_FILE_PREFIX: &str = "/__es-dev-server__";

/// Prefix under which the host serves files relative to its base path.
pub const BASE_PREFIX: &str = "/base";

/// Snapshot directory used when no resolver is configured.
pub const DEFAULT_SNAPSHOT_PATH: &str = "/base/__snapshots__";

/// Paths that normally go to the dev server.
pub const FORWARD_PREFIXES: &[&str] = &[
    // html entrypoints; the dev server requests them back with the bypass marker
    "/context.html",
    "/debug.html",
    BASE_PREFIX,
    // generated by the dev server
    "/polyfills",
    "/inline-module-",
    VIRTUAL_FILE_PREFIX,
];

/// Where a request should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Proxy to the dev server.
    Forward,
    /// Hand to the next handler of the host.
    Local,
}

/// Compiled routing rules.
#[derive(Debug)]
pub struct RoutingRules {
    forward: AnyMatcher,
    bypass: QueryMarkerMatcher,
    reserved: PathPrefixMatcher,
}

impl RoutingRules {
    /// Build the rules, asking the resolver (if any) where snapshots live.
    pub fn new(snapshot_resolver: Option<&SnapshotPathResolver>) -> Self {
        let snapshot_path = match snapshot_resolver {
            Some(resolve) => dirname(&resolve(BASE_PREFIX, "fake-suite")).to_string(),
            None => DEFAULT_SNAPSHOT_PATH.to_string(),
        };

        Self {
            forward: AnyMatcher::prefixes(FORWARD_PREFIXES.iter().copied()),
            bypass: QueryMarkerMatcher::new(BYPASS_MARKER),
            reserved: PathPrefixMatcher::new(snapshot_path),
        }
    }

    /// The path prefix always served by the host.
    pub fn snapshot_path(&self) -> &str {
        self.reserved.prefix()
    }

    /// Classify a raw request target (`path[?query]`).
    pub fn decide(&self, target: &str) -> Decision {
        let target = RequestTarget::parse(target);
        if self.forward.matches(&target)
            && !self.bypass.matches(&target)
            && !self.reserved.matches(&target)
        {
            Decision::Forward
        } else {
            Decision::Local
        }
    }
}

impl Default for RoutingRules {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Directory component of a slash-separated path, POSIX `dirname` style.
///
/// Trailing slashes are ignored, a lone root yields `/`, a double-slash root
/// is kept as `//`, and a path without slashes yields `.`. Never empty.
pub fn dirname(path: &str) -> &str {
    let bytes = path.as_bytes();
    let Some(&first) = bytes.first() else {
        return ".";
    };
    let has_root = first == b'/';

    let mut end = None;
    let mut matched_slash = true;
    for i in (1..bytes.len()).rev() {
        if bytes[i] == b'/' {
            if !matched_slash {
                end = Some(i);
                break;
            }
        } else {
            matched_slash = false;
        }
    }

    match end {
        None if has_root => "/",
        None => ".",
        Some(1) if has_root => "//",
        Some(end) => &path[..end],
    }
}

/// Strip one leading `/base` from a request target.
pub fn strip_base(target: &str) -> &str {
    target.strip_prefix(BASE_PREFIX).unwrap_or(target)
}
