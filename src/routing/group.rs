//! Route groups and the shared registration registry.
//!
//! # Responsibilities
//! - Prefix patterns with the group's path and forward them to the one Router
//! - Accumulate middleware scoped to the group and its descendants
//! - Record every group in the registry so dispatch can match prefixes
//!
//! # Design Decisions
//! - Groups are handles (`id` + shared registry), not owners of trees
//! - A child is seeded with a snapshot of its parent's middleware; later
//!   `use_middleware` calls on the parent do not reach existing children
//! - The registry is sealed when the engine is built; later registrations fail

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::http::Method;

use crate::http::context::{handler, Context, HandlerFunc};
use crate::routing::error::{RouteError, RouteResult};
use crate::routing::router::Router;
use crate::static_files::StaticFiles;

/// One group as recorded in the registry.
#[derive(Clone)]
pub(crate) struct GroupEntry {
    pub(crate) prefix: String,
    pub(crate) parent: Option<usize>,
    /// Leading entries of `middleware` copied from the parent at creation.
    pub(crate) inherited: usize,
    pub(crate) middleware: Vec<HandlerFunc>,
}

impl GroupEntry {
    /// Whether `path` falls under this group's prefix on a segment boundary.
    pub(crate) fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || self.prefix.is_empty(),
            None => false,
        }
    }
}

/// Setup-time state shared by the engine and all of its groups.
pub(crate) struct Registry {
    pub(crate) router: Router,
    pub(crate) groups: Vec<GroupEntry>,
    sealed: bool,
}

pub(crate) type SharedRegistry = Arc<Mutex<Registry>>;

impl Registry {
    /// A registry holding only the root group (empty prefix).
    pub(crate) fn shared() -> SharedRegistry {
        Arc::new(Mutex::new(Self {
            router: Router::new(),
            groups: vec![GroupEntry {
                prefix: String::new(),
                parent: None,
                inherited: 0,
                middleware: Vec::new(),
            }],
            sealed: false,
        }))
    }

    /// Seal and hand over the router and group list.
    pub(crate) fn seal(&mut self) -> (Router, Vec<GroupEntry>) {
        self.sealed = true;
        (
            std::mem::take(&mut self.router),
            std::mem::take(&mut self.groups),
        )
    }
}

pub(crate) fn lock(registry: &SharedRegistry) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Normalize a group prefix to `/segment...` without a trailing slash.
/// `""` and `"/"` normalize to the empty prefix.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() || trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// A namespace of routes sharing a path prefix and middleware.
#[derive(Clone)]
pub struct RouterGroup {
    id: usize,
    registry: SharedRegistry,
}

impl RouterGroup {
    pub(crate) fn root(registry: SharedRegistry) -> Self {
        Self { id: 0, registry }
    }

    /// Absolute prefix, e.g. `/v1/admin`. Empty for the root group.
    pub fn prefix(&self) -> String {
        lock(&self.registry)
            .groups
            .get(self.id)
            .map(|g| g.prefix.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self) -> Option<RouterGroup> {
        let parent = lock(&self.registry).groups.get(self.id)?.parent?;
        Some(Self {
            id: parent,
            registry: self.registry.clone(),
        })
    }

    /// Number of middleware handlers currently scoped to this group.
    pub fn middleware_len(&self) -> usize {
        lock(&self.registry)
            .groups
            .get(self.id)
            .map(|g| g.middleware.len())
            .unwrap_or(0)
    }

    /// Create a child group. A missing leading `/` is added.
    ///
    /// Once the engine is built no new group can be recorded; the call logs a
    /// warning and returns a handle to `self`, whose registrations fail.
    pub fn group(&self, prefix: &str) -> RouterGroup {
        let mut registry = lock(&self.registry);
        if registry.sealed {
            tracing::warn!(group = self.id, prefix, "Ignoring group created after the engine was built");
            return self.clone();
        }
        let (parent_prefix, parent_middleware) = registry
            .groups
            .get(self.id)
            .map(|g| (g.prefix.clone(), g.middleware.clone()))
            .unwrap_or_default();

        let entry = GroupEntry {
            prefix: format!("{}{}", parent_prefix, normalize_prefix(prefix)),
            parent: Some(self.id),
            inherited: parent_middleware.len(),
            middleware: parent_middleware,
        };
        tracing::debug!(prefix = %entry.prefix, "Route group created");
        registry.groups.push(entry);

        Self {
            id: registry.groups.len() - 1,
            registry: self.registry.clone(),
        }
    }

    /// Append one middleware to this group.
    pub fn use_middleware<F>(&self, f: F) -> &Self
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.use_handlers([handler(f)])
    }

    /// Append several middleware handlers, keeping their order.
    pub fn use_handlers<I>(&self, handlers: I) -> &Self
    where
        I: IntoIterator<Item = HandlerFunc>,
    {
        let mut registry = lock(&self.registry);
        if registry.sealed {
            tracing::warn!(group = self.id, "Ignoring middleware added after the engine was built");
            return self;
        }
        if let Some(group) = registry.groups.get_mut(self.id) {
            group.middleware.extend(handlers);
        }
        self
    }

    /// Register `handler` for `method` at `prefix + pattern`.
    pub fn handle_func(&self, method: Method, pattern: &str, handler: HandlerFunc) -> RouteResult {
        let mut registry = lock(&self.registry);
        if registry.sealed {
            return Err(RouteError::Sealed);
        }
        let prefix = registry
            .groups
            .get(self.id)
            .map(|g| g.prefix.clone())
            .unwrap_or_default();
        registry
            .router
            .add_route(method, &format!("{prefix}{pattern}"), handler)
    }

    pub fn handle<F>(&self, method: Method, pattern: &str, f: F) -> RouteResult
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle_func(method, pattern, handler(f))
    }

    pub fn get<F>(&self, pattern: &str, f: F) -> RouteResult
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::GET, pattern, f)
    }

    pub fn post<F>(&self, pattern: &str, f: F) -> RouteResult
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::POST, pattern, f)
    }

    pub fn put<F>(&self, pattern: &str, f: F) -> RouteResult
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::PUT, pattern, f)
    }

    pub fn delete<F>(&self, pattern: &str, f: F) -> RouteResult
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::DELETE, pattern, f)
    }

    pub fn patch<F>(&self, pattern: &str, f: F) -> RouteResult
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::PATCH, pattern, f)
    }

    pub fn head<F>(&self, pattern: &str, f: F) -> RouteResult
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::HEAD, pattern, f)
    }

    pub fn options<F>(&self, pattern: &str, f: F) -> RouteResult
    where
        F: Fn(&mut Context) + Send + Sync + 'static,
    {
        self.handle(Method::OPTIONS, pattern, f)
    }

    /// Serve files under `dir` at `GET {relative}/*filepath`.
    pub fn static_dir(&self, relative: &str, dir: impl Into<PathBuf>) -> RouteResult {
        let files = StaticFiles::new(dir, "filepath");
        let pattern = format!("{}/*filepath", normalize_prefix(relative));
        self.handle_func(Method::GET, &pattern, files.handler())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> HandlerFunc {
        handler(|_: &mut Context| {})
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("v1"), "/v1");
        assert_eq!(normalize_prefix("/v1/"), "/v1");
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix(""), "");
    }

    #[test]
    fn test_nested_prefixes_and_lineage() {
        let root = RouterGroup::root(Registry::shared());
        let v1 = root.group("v1");
        let admin = v1.group("/admin/");

        assert_eq!(root.prefix(), "");
        assert_eq!(v1.prefix(), "/v1");
        assert_eq!(admin.prefix(), "/v1/admin");
        assert_eq!(admin.parent().map(|p| p.prefix()), Some("/v1".to_string()));
        assert!(root.parent().is_none());
    }

    #[test]
    fn test_child_middleware_is_snapshot() {
        let root = RouterGroup::root(Registry::shared());
        root.use_handlers([noop()]);
        let v1 = root.group("/v1");
        root.use_handlers([noop(), noop()]);
        v1.use_handlers([noop()]);
        let admin = v1.group("/admin");
        v1.use_handlers([noop()]);

        assert_eq!(root.middleware_len(), 3);
        assert_eq!(v1.middleware_len(), 3);
        assert_eq!(admin.middleware_len(), 2);
    }

    #[test]
    fn test_routes_are_prefixed() {
        let registry = Registry::shared();
        let v1 = RouterGroup::root(registry.clone()).group("/v1");
        v1.get("/user", |_: &mut Context| {}).unwrap();
        v1.post("", |_: &mut Context| {}).unwrap();

        let routes = lock(&registry).router.routes();
        assert_eq!(
            routes,
            vec![
                (Method::GET, "/v1/user".to_string()),
                (Method::POST, "/v1".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_pattern_propagates() {
        let root = RouterGroup::root(Registry::shared());
        assert_eq!(
            root.get("user", |_: &mut Context| {}),
            Err(RouteError::MissingLeadingSlash("user".into()))
        );
        assert!(root.group("/v1").get("/user/", |_: &mut Context| {}).is_err());
    }

    #[test]
    fn test_registration_after_seal_fails() {
        let registry = Registry::shared();
        let root = RouterGroup::root(registry.clone());
        let _ = lock(&registry).seal();

        assert_eq!(root.get("/user", |_: &mut Context| {}), Err(RouteError::Sealed));
    }

    #[test]
    fn test_group_after_seal_is_not_recorded() {
        let registry = Registry::shared();
        let root = RouterGroup::root(registry.clone());
        let v1 = root.group("/v1");
        let _ = lock(&registry).seal();

        let late = v1.group("/late");
        assert!(lock(&registry).groups.is_empty());
        assert_eq!(late.get("/x", |_: &mut Context| {}), Err(RouteError::Sealed));
    }

    #[test]
    fn test_child_records_inherited_count() {
        let registry = Registry::shared();
        let root = RouterGroup::root(registry.clone());
        root.use_handlers([noop(), noop()]);
        let v1 = root.group("/v1");
        root.use_handlers([noop()]);

        let registry = lock(&registry);
        assert_eq!(registry.groups[0].inherited, 0);
        assert_eq!(registry.groups[v1.id].inherited, 2);
        assert_eq!(registry.groups[v1.id].middleware.len(), 2);
    }

    #[test]
    fn test_prefix_matching_on_segment_boundary() {
        let entry = |prefix: &str| GroupEntry {
            prefix: prefix.to_string(),
            parent: None,
            inherited: 0,
            middleware: Vec::new(),
        };
        assert!(entry("").matches("/anything"));
        assert!(entry("/v1").matches("/v1"));
        assert!(entry("/v1").matches("/v1/user"));
        assert!(!entry("/v1").matches("/v10/user"));
        assert!(!entry("/v1").matches("/v2/user"));
    }
}
