//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → every subscribed server stops accepting → drains → exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT or a Shutdown broadcast → graceful shutdown future resolves
//! ```
//!
//! # Design Decisions
//! - One broadcast channel fans out to any number of servers
//! - Servers own their shutdown future; tests trigger it without signals

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
