//! Trie node: one segment of a registered pattern.
//!
//! # Responsibilities
//! - Hold the literal or parametric token for a single path position
//! - Resolve a request segment to a child (exact first, parametric second)
//! - Grow the tree during registration
//!
//! # Invariants
//! - At most one parametric (`:` or `*`) child per node
//! - `pattern` is set only on nodes that terminate a registered route
//! - Nodes are never removed

use crate::routing::error::{RouteError, RouteResult};
use crate::routing::pattern::{Segment, SegmentKind};

/// A node in a per-method routing tree.
#[derive(Debug, Clone)]
pub struct Node {
    segment: String,
    kind: SegmentKind,
    children: Vec<Node>,
    pattern: Option<String>,
}

impl Node {
    /// Create the root of a method tree.
    pub fn root() -> Self {
        Self {
            segment: "/".to_string(),
            kind: SegmentKind::Static,
            children: Vec::new(),
            pattern: None,
        }
    }

    fn from_segment(segment: &Segment<'_>) -> Self {
        Self {
            segment: segment.token.to_string(),
            kind: segment.kind,
            children: Vec::new(),
            pattern: None,
        }
    }

    /// Raw token stored at this node (`user`, `:name`, `*path`).
    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    pub fn is_parametric(&self) -> bool {
        self.kind.is_parametric()
    }

    /// Name bound by a parametric node.
    pub fn param_name(&self) -> Option<&str> {
        self.is_parametric().then(|| &self.segment[1..])
    }

    /// Full pattern if this node terminates a registered route.
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Find the child matching a literal request segment.
    ///
    /// An exact match wins over the parametric child even when the parametric
    /// child was inserted first.
    pub fn search(&self, part: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|child| !child.is_parametric() && child.segment == part)
            .or_else(|| self.children.iter().find(|child| child.is_parametric()))
    }

    fn exact_child(&self, segment: &Segment<'_>) -> Option<usize> {
        self.children
            .iter()
            .position(|child| child.kind == segment.kind && child.segment == segment.token)
    }

    /// Check that `segments` can be added under this node.
    ///
    /// Lookup here is by exact token only; the parametric fallback of
    /// [`Node::search`] would otherwise fold a literal into a `:param` branch.
    pub(crate) fn check_insert(&self, segments: &[Segment<'_>], pattern: &str) -> RouteResult {
        let mut node = self;
        for segment in segments {
            if let Some(pos) = node.exact_child(segment) {
                node = &node.children[pos];
                continue;
            }
            if segment.kind.is_parametric() {
                if let Some(existing) = node.children.iter().find(|child| child.is_parametric()) {
                    return Err(RouteError::ConflictingParam {
                        pattern: pattern.to_string(),
                        segment: segment.token.to_string(),
                        existing: existing.segment.clone(),
                    });
                }
            }
            // Everything below here is new.
            break;
        }
        Ok(())
    }

    /// Add `segments` under this node and mark the leaf with `pattern`.
    ///
    /// Validation runs before any node is created, so a rejected pattern
    /// leaves the tree unchanged.
    pub(crate) fn insert(&mut self, segments: &[Segment<'_>], pattern: &str) -> RouteResult {
        self.check_insert(segments, pattern)?;

        let mut node = self;
        for segment in segments {
            let pos = match node.exact_child(segment) {
                Some(pos) => pos,
                None => {
                    node.children.push(Node::from_segment(segment));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[pos];
        }
        node.pattern = Some(pattern.to_string());
        Ok(())
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Node::size).sum::<usize>()
    }
}
