//! Built-in middleware.
//!
//! # Data Flow
//! ```text
//! logger   → timestamp → next() → log status/latency → record metrics
//! recovery → next() inside catch_unwind → on panic: abort + 500
//! ```
//!
//! Both are plain [`HandlerFunc`](crate::http::context::HandlerFunc)s and
//! can be attached to any group.

pub mod logger;
pub mod recovery;

pub use logger::logger;
pub use recovery::recovery;
