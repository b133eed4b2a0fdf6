//! Pattern grammar.
//!
//! # Grammar
//! ```text
//! pattern  = "/" segment *( "/" segment )
//! segment  = literal | ":" name | "*" name
//! ```
//!
//! # Design Decisions
//! - Literals compare case-sensitively, without normalization
//! - `:name` captures exactly one request segment
//! - `*name` captures the rest of the path and must come last
//! - A pattern is validated as a whole before the trie is touched

use crate::routing::error::{RouteError, RouteResult};

/// How a pattern segment matches request segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Matches one request segment with identical text.
    Static,
    /// `:name`, binds one request segment.
    Param,
    /// `*name`, binds every remaining request segment.
    CatchAll,
}

impl SegmentKind {
    /// Classify a raw pattern token.
    pub fn of(token: &str) -> Self {
        if token.starts_with(':') {
            SegmentKind::Param
        } else if token.starts_with('*') {
            SegmentKind::CatchAll
        } else {
            SegmentKind::Static
        }
    }

    pub fn is_parametric(self) -> bool {
        !matches!(self, SegmentKind::Static)
    }
}

/// One validated segment of a registered pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub token: &'a str,
    pub kind: SegmentKind,
}

impl<'a> Segment<'a> {
    /// Parameter name for parametric segments, the literal otherwise.
    pub fn name(&self) -> &'a str {
        match self.kind {
            SegmentKind::Static => self.token,
            SegmentKind::Param | SegmentKind::CatchAll => &self.token[1..],
        }
    }
}

/// Validate `pattern` and split it into segments.
pub fn parse_pattern(pattern: &str) -> RouteResult<Vec<Segment<'_>>> {
    let Some(rest) = pattern.strip_prefix('/') else {
        return Err(RouteError::MissingLeadingSlash(pattern.to_string()));
    };
    if rest.ends_with('/') || rest.is_empty() {
        return Err(RouteError::TrailingSlash(pattern.to_string()));
    }

    let tokens: Vec<&str> = rest.split('/').collect();
    let last = tokens.len() - 1;
    let mut segments = Vec::with_capacity(tokens.len());

    for (i, token) in tokens.into_iter().enumerate() {
        if token.is_empty() {
            return Err(RouteError::EmptySegment(pattern.to_string()));
        }
        let kind = SegmentKind::of(token);
        if kind.is_parametric() && token.len() == 1 {
            return Err(RouteError::UnnamedParam(pattern.to_string()));
        }
        if kind == SegmentKind::CatchAll && i != last {
            return Err(RouteError::CatchAllNotLast {
                pattern: pattern.to_string(),
                segment: token.to_string(),
            });
        }
        segments.push(Segment { token, kind });
    }

    Ok(segments)
}

/// Split a request path into segments.
///
/// Leading and trailing slashes are trimmed. Returns `None` when any segment
/// is empty, which includes the bare root path.
pub fn split_path(path: &str) -> Option<Vec<&str>> {
    let trimmed = path.trim_matches('/');
    let parts: Vec<&str> = trimmed.split('/').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    Some(parts)
}
