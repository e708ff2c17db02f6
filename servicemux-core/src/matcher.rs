//! The URI matching seam.
//!
//! Turning a URI template into a matcher is a supplied capability; the
//! routing engine only depends on this trait. The `servicemux` crate ships
//! `Pattern`, a regex-backed implementation, but transports and tests may
//! plug in their own.

use crate::context::Params;

/// Options a matcher is compiled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Whether literal segments are compared case-sensitively.
    pub case_sensitive: bool,
    /// Whether a trailing slash is significant. Forced off for mounts.
    pub strict: bool,
    /// `true`: the whole remaining path must be consumed (leaf routes).
    /// `false`: a prefix match at a segment boundary suffices (mounts and
    /// middleware).
    pub end: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        MatchOptions {
            case_sensitive: false,
            strict: false,
            end: true,
        }
    }
}

/// A successful match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Match {
    /// The literal path prefix the template consumed. Routers use it to
    /// rewrite `base_uri`/`uri` when descending into a mount.
    pub prefix: String,
    /// Extracted named parameters, as strings.
    pub params: Params,
}

/// A compiled URI template.
pub trait Matcher: Send + Sync + 'static {
    /// Match a candidate path. `None` means no match; the router skips to
    /// the next candidate in constant time.
    fn matches(&self, path: &str) -> Option<Match>;
}
