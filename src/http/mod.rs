//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout, body buffering)
//!     → request.rs (detached request snapshot)
//!     → context.rs (handler chain, params, response helpers)
//!     → response.rs (buffered status, headers, body)
//!     → Send to client
//! ```

pub mod context;
pub mod request;
pub mod response;
pub mod server;

pub use context::{handler, Context, HandlerFunc};
pub use request::{MakeRequestUuidV4, Request, X_REQUEST_ID};
pub use response::ResponseWriter;
pub use server::HttpServer;
