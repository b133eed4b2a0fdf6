//! neo-web: a small HTTP dispatch framework.
//!
//! Handlers are synchronous closures over a per-request [`Context`]. Routes
//! live in one trie per method, grouped under path prefixes that carry
//! their own middleware. An [`Engine`] collects routes during setup and
//! builds an immutable [`App`], which [`HttpServer`] serves over Axum.

pub mod config;
pub mod engine;
pub mod http;
pub mod lifecycle;
pub mod middleware;
pub mod observability;
pub mod render;
pub mod routing;
pub mod static_files;

pub use config::ServerConfig;
pub use engine::{App, Engine};
pub use http::{handler, Context, HandlerFunc, HttpServer, Request, ResponseWriter};
pub use lifecycle::Shutdown;
pub use render::{FileTemplates, RenderError, TemplateEngine};
pub use routing::{RouteError, Router, RouterGroup};
pub use static_files::StaticFiles;
