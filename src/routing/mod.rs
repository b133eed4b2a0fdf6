//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (setup):
//!     RouterGroup::get("/hello/:name")
//!     → group prefix applied
//!     → pattern.rs (parse + validate segments)
//!     → node.rs (insert into the method's trie)
//!     → router.rs (store terminal handler under (method, pattern))
//!
//! Lookup (per request):
//!     (method, path)
//!     → split path into segments
//!     → walk trie, exact child before parametric child
//!     → Return: pattern + params, or a 404 miss
//! ```
//!
//! # Design Decisions
//! - One trie per HTTP method
//! - Routes registered at startup, immutable once the engine is built
//! - Deterministic: the same path always resolves to the same route

pub mod error;
pub mod group;
pub mod node;
pub mod pattern;
pub mod router;

pub use error::{RouteError, RouteResult};
pub use group::RouterGroup;
pub use node::Node;
pub use pattern::SegmentKind;
pub use router::{RouteMatch, Router};
