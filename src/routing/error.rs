//! Route configuration errors.
//!
//! Every variant is a startup-time failure: a pattern that cannot be
//! registered should stop the process before it accepts traffic.

use thiserror::Error;

/// Errors raised while registering routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Pattern does not begin with `/`.
    #[error("route pattern must start with '/': {0:?}")]
    MissingLeadingSlash(String),

    /// Pattern ends with `/`.
    #[error("route pattern must not end with '/': {0:?}")]
    TrailingSlash(String),

    /// Pattern contains `//`.
    #[error("route pattern contains an empty segment: {0:?}")]
    EmptySegment(String),

    /// A `:` or `*` segment without a name.
    #[error("parametric segment without a name in {0:?}")]
    UnnamedParam(String),

    /// `*name` used anywhere but the last segment.
    #[error("catch-all segment {segment:?} must be the last segment of {pattern:?}")]
    CatchAllNotLast { pattern: String, segment: String },

    /// Two different parametric segments at the same position.
    #[error("segment {segment:?} in {pattern:?} conflicts with existing {existing:?}")]
    ConflictingParam {
        pattern: String,
        segment: String,
        existing: String,
    },

    /// Registration attempted after the engine was built.
    #[error("routes cannot be registered after the engine has been built")]
    Sealed,
}

/// Result type for route registration.
pub type RouteResult<T = ()> = Result<T, RouteError>;
