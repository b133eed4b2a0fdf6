//! Engine (setup) and App (serving).
//!
//! # Data Flow
//! ```text
//! Setup (single-threaded):
//!     Engine::new()
//!     → group()/use_middleware()/get()/post()...
//!     → build() seals the registry
//!
//! Serving (read-only, shared via Arc):
//!     App::dispatch(request)
//!     → Context::new
//!     → collect middleware of groups whose prefix matches the path
//!     → Router::handle (append terminal handler, run chain)
//!     → ResponseWriter
//! ```
//!
//! # Design Decisions
//! - The engine holds its root group and forwards group methods to it
//! - Groups and engine share one registry handle; nothing is global
//! - `App` owns plain data; the request path takes no locks

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::Method;

use crate::http::context::{Context, HandlerFunc};
use crate::http::request::Request;
use crate::http::response::ResponseWriter;
use crate::middleware::{logger, recovery};
use crate::render::TemplateEngine;
use crate::routing::error::RouteResult;
use crate::routing::group::{lock, GroupEntry, Registry, RouterGroup, SharedRegistry};
use crate::routing::router::Router;

/// Setup-time builder for an [`App`].
pub struct Engine {
    registry: SharedRegistry,
    root: RouterGroup,
    templates: Option<Arc<dyn TemplateEngine>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// An engine with no middleware.
    pub fn new() -> Self {
        let registry = Registry::shared();
        Self {
            root: RouterGroup::root(registry.clone()),
            registry,
            templates: None,
        }
    }

    /// An engine with request logging and panic recovery installed.
    pub fn with_defaults() -> Self {
        let engine = Self::new();
        engine.use_handlers([logger(), recovery()]);
        engine
    }

    /// The group every route registered on the engine belongs to.
    pub fn root_group(&self) -> &RouterGroup {
        &self.root
    }

    pub fn set_template_engine<T>(&mut self, templates: T)
    where
        T: TemplateEngine + 'static,
    {
        self.templates = Some(Arc::new(templates));
    }

    pub fn group(&self, prefix: &str) -> RouterGroup {
        self.root.group(prefix)
    }

    pub fn use_middleware<F>(&self, f: F) -> &Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.root.use_middleware(f);
        self
    }

    pub fn use_handlers<I>(&self, handlers: I) -> &Self
    where
        I: IntoIterator<Item = HandlerFunc>,
    {
        self.root.use_handlers(handlers);
        self
    }

    pub fn handle<F>(&self, method: Method, pattern: &str, f: F) -> RouteResult
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.root.handle(method, pattern, f)
    }

    pub fn get<F>(&self, pattern: &str, f: F) -> RouteResult
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.root.get(pattern, f)
    }

    pub fn post<F>(&self, pattern: &str, f: F) -> RouteResult
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.root.post(pattern, f)
    }

    pub fn put<F>(&self, pattern: &str, f: F) -> RouteResult
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.root.put(pattern, f)
    }

    pub fn delete<F>(&self, pattern: &str, f: F) -> RouteResult
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.root.delete(pattern, f)
    }

    pub fn patch<F>(&self, pattern: &str, f: F) -> RouteResult
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.root.patch(pattern, f)
    }

    pub fn head<F>(&self, pattern: &str, f: F) -> RouteResult
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.root.head(pattern, f)
    }

    pub fn options<F>(&self, pattern: &str, f: F) -> RouteResult
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.root.options(pattern, f)
    }

    pub fn static_dir(&self, relative: &str, dir: impl Into<PathBuf>) -> RouteResult {
        self.root.static_dir(relative, dir)
    }

    /// Freeze the registry into a servable [`App`].
    ///
    /// Group handles that outlive the engine can no longer register routes.
    pub fn build(self) -> App {
        let (router, groups) = lock(&self.registry).seal();
        tracing::info!(
            routes = router.routes().len(),
            groups = groups.len(),
            "Engine built"
        );
        App {
            router,
            groups,
            templates: self.templates,
        }
    }
}

/// Immutable dispatcher shared by every request.
pub struct App {
    router: Router,
    groups: Vec<GroupEntry>,
    templates: Option<Arc<dyn TemplateEngine>>,
}

impl App {
    /// Dispatch entry point: build the context, gather middleware, route.
    pub fn dispatch(&self, request: Request) -> ResponseWriter {
        let mut ctx = Context::new(request).with_templates(self.templates.clone());
        ctx.extend_handlers(self.middleware_for(ctx.path()));
        self.router.handle(&mut ctx);
        ctx.into_response()
    }

    /// Middleware applying to `path`, outer group first.
    ///
    /// Every group whose prefix matches contributes its list in creation
    /// order. A group whose parent also matches leaves out the entries it
    /// copied from that parent, since the parent contributes them itself
    /// along with anything it gained after the child was created.
    pub fn middleware_for(&self, path: &str) -> Vec<HandlerFunc> {
        self.groups
            .iter()
            .filter(|g| g.matches(path))
            .flat_map(|g| {
                let skip = match g.parent {
                    Some(parent) if self.groups[parent].matches(path) => g.inherited,
                    _ => 0,
                };
                g.middleware[skip..].iter().cloned()
            })
            .collect()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn routes(&self) -> Vec<(Method, String)> {
        self.router.routes()
    }
}
