//! Route registration, lookup and dispatch.
//!
//! # Responsibilities
//! - Own one trie per HTTP method
//! - Map (method, pattern) to the terminal handler
//! - Resolve a request to a pattern plus captured params
//! - Append the terminal handler and start the chain
//!
//! # Design Decisions
//! - Built during setup, read-only while serving (no locks)
//! - Re-registering an identical (method, pattern) replaces the handler
//! - No backtracking: once a segment picks a child, siblings are not retried
//! - A miss is a normal outcome and answers 404 directly

use std::collections::HashMap;

use axum::http::{Method, StatusCode};

use crate::http::context::{Context, HandlerFunc};
use crate::routing::error::RouteResult;
use crate::routing::node::Node;
use crate::routing::pattern::{parse_pattern, split_path, SegmentKind};

/// Composite key for the flat handler map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RouteKey {
    method: Method,
    pattern: String,
}

impl RouteKey {
    fn new(method: &Method, pattern: &str) -> Self {
        Self {
            method: method.clone(),
            pattern: pattern.to_string(),
        }
    }
}

/// Result of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// Registered pattern, e.g. `/hello/:name`.
    pub pattern: &'a str,
    /// Parameter name to literal request text.
    pub params: HashMap<String, String>,
}

/// The routing table.
#[derive(Default)]
pub struct Router {
    roots: HashMap<Method, Node>,
    handlers: HashMap<RouteKey, HandlerFunc>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` and `pattern`.
    pub fn add_route(&mut self, method: Method, pattern: &str, handler: HandlerFunc) -> RouteResult {
        let segments = parse_pattern(pattern)?;
        match self.roots.get_mut(&method) {
            Some(root) => root.insert(&segments, pattern)?,
            None => {
                let mut root = Node::root();
                root.insert(&segments, pattern)?;
                self.roots.insert(method.clone(), root);
            }
        }

        tracing::info!(method = %method, pattern = %pattern, "Route registered");
        self.handlers.insert(RouteKey::new(&method, pattern), handler);
        Ok(())
    }

    /// Resolve `path` in the tree for `method`.
    pub fn get_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let root = self.roots.get(method)?;
        let parts: Vec<String> = split_path(path)?.into_iter().map(decode_segment).collect();

        let mut params = HashMap::new();
        let mut node = root;
        for (i, part) in parts.iter().enumerate() {
            node = node.search(part)?;
            match node.kind() {
                SegmentKind::Static => {}
                SegmentKind::Param => {
                    params.insert(node.segment()[1..].to_string(), part.clone());
                }
                SegmentKind::CatchAll => {
                    params.insert(node.segment()[1..].to_string(), parts[i..].join("/"));
                    break;
                }
            }
        }

        node.pattern().map(|pattern| RouteMatch { pattern, params })
    }

    /// Terminal handler registered for an exact pattern.
    pub fn handler(&self, method: &Method, pattern: &str) -> Option<&HandlerFunc> {
        self.handlers.get(&RouteKey::new(method, pattern))
    }

    /// Resolve the request, append its terminal handler and run the chain.
    pub fn handle(&self, ctx: &mut Context) {
        tracing::debug!(method = %ctx.method(), path = %ctx.path(), "Dispatching request");

        let resolved = self.get_route(ctx.method(), ctx.path()).and_then(|m| {
            self.handler(ctx.method(), m.pattern)
                .map(|handler| (m.params, handler.clone()))
        });

        match resolved {
            Some((params, handler)) => {
                ctx.set_params(params);
                ctx.push_handler(handler);
                ctx.next();
            }
            None => {
                tracing::debug!(method = %ctx.method(), path = %ctx.path(), "No route matched");
                let body = format!("404 NOT FOUND: {}", ctx.path());
                ctx.string(StatusCode::NOT_FOUND, body);
            }
        }
    }

    /// All registered (method, pattern) pairs, sorted.
    pub fn routes(&self) -> Vec<(Method, String)> {
        let mut routes: Vec<_> = self
            .handlers
            .keys()
            .map(|key| (key.method.clone(), key.pattern.clone()))
            .collect();
        routes.sort_by(|a, b| (a.0.as_str(), &a.1).cmp(&(b.0.as_str(), &b.1)));
        routes
    }

    /// Node count of the tree for `method`, if any route uses it.
    pub fn tree_size(&self, method: &Method) -> Option<usize> {
        self.roots.get(method).map(Node::size)
    }
}

/// Percent-decode one path segment. Decoding happens after splitting, so an
/// encoded `/` stays inside its segment. Invalid UTF-8 keeps the raw text.
fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::context::handler;
    use crate::http::request::Request;
    use crate::routing::error::RouteError;
    use axum::http::Uri;

    fn text(body: &'static str) -> HandlerFunc {
        handler(move |c: &mut Context| c.string(StatusCode::OK, body))
    }

    fn router(routes: &[&str]) -> Router {
        let mut r = Router::new();
        for pattern in routes {
            r.add_route(Method::GET, pattern, text("ok")).unwrap();
        }
        r
    }

    fn run(r: &Router, method: Method, uri: &'static str) -> Context {
        let mut ctx = Context::new(Request::new(method, Uri::from_static(uri)));
        r.handle(&mut ctx);
        ctx
    }

    #[test]
    fn test_param_capture_uses_request_text() {
        let r = router(&["/hello/:name"]);
        let m = r.get_route(&Method::GET, "/hello/neo").unwrap();
        assert_eq!(m.pattern, "/hello/:name");
        assert_eq!(m.params.get("name").map(String::as_str), Some("neo"));
    }

    #[test]
    fn test_exact_wins_over_param() {
        for order in [["/hello/:name", "/hello/static"], ["/hello/static", "/hello/:name"]] {
            let r = router(&order);
            let m = r.get_route(&Method::GET, "/hello/static").unwrap();
            assert_eq!(m.pattern, "/hello/static");
            assert!(m.params.is_empty());

            let m = r.get_route(&Method::GET, "/hello/trinity").unwrap();
            assert_eq!(m.pattern, "/hello/:name");
        }
    }

    #[test]
    fn test_login_and_login_id_are_distinct() {
        let r = router(&["/login", "/login/:id"]);
        assert_eq!(r.get_route(&Method::GET, "/login").unwrap().pattern, "/login");
        let m = r.get_route(&Method::GET, "/login/123").unwrap();
        assert_eq!(m.pattern, "/login/:id");
        assert_eq!(m.params["id"], "123");
    }

    #[test]
    fn test_non_terminal_nodes_do_not_match() {
        let r = router(&["/v1/user", "/user/:id/profile"]);
        assert!(r.get_route(&Method::GET, "/v1").is_none());
        assert!(r.get_route(&Method::GET, "/user/7").is_none());
        assert!(r.get_route(&Method::GET, "/v1/user/extra").is_none());

        let m = r.get_route(&Method::GET, "/user/7/profile").unwrap();
        assert_eq!(m.params["id"], "7");
    }

    #[test]
    fn test_no_backtracking_into_param_sibling() {
        let r = router(&["/a/b/d", "/a/:x/c"]);
        assert!(r.get_route(&Method::GET, "/a/b/c").is_none());
        assert_eq!(r.get_route(&Method::GET, "/a/z/c").unwrap().pattern, "/a/:x/c");
    }

    #[test]
    fn test_catch_all_spans_segments() {
        let r = router(&["/assets/*filepath"]);
        let m = r.get_route(&Method::GET, "/assets/css/site.css").unwrap();
        assert_eq!(m.pattern, "/assets/*filepath");
        assert_eq!(m.params["filepath"], "css/site.css");

        assert!(r.get_route(&Method::GET, "/assets").is_none());
    }

    #[test]
    fn test_params_are_percent_decoded() {
        let r = router(&["/hello/:name", "/files/*filepath", "/caf\u{e9}"]);

        let m = r.get_route(&Method::GET, "/hello/ne%20o").unwrap();
        assert_eq!(m.params["name"], "ne o");

        // '+' is literal in a path, and an encoded '/' stays in its segment.
        let m = r.get_route(&Method::GET, "/hello/a+b%2Fc").unwrap();
        assert_eq!(m.params["name"], "a+b/c");

        let m = r.get_route(&Method::GET, "/files/my%20docs/r%C3%A9sum%C3%A9.pdf").unwrap();
        assert_eq!(m.params["filepath"], "my docs/r\u{e9}sum\u{e9}.pdf");

        assert_eq!(r.get_route(&Method::GET, "/caf%C3%A9").unwrap().pattern, "/caf\u{e9}");
        // Not valid UTF-8 once decoded: matched on the raw text.
        assert_eq!(r.get_route(&Method::GET, "/hello/%FF").unwrap().params["name"], "%FF");
    }

    #[test]
    fn test_path_trimming_and_empty_segments() {
        let r = router(&["/v1/user"]);
        assert!(r.get_route(&Method::GET, "/v1/user/").is_some());
        assert!(r.get_route(&Method::GET, "v1/user").is_some());
        assert!(r.get_route(&Method::GET, "/v1//user").is_none());
        assert!(r.get_route(&Method::GET, "/").is_none());
    }

    #[test]
    fn test_method_trees_are_separate() {
        let r = router(&["/user"]);
        assert!(r.get_route(&Method::GET, "/user").is_some());
        assert!(r.get_route(&Method::POST, "/user").is_none());
    }

    #[test]
    fn test_reregistration_replaces_handler_without_new_nodes() {
        let mut r = Router::new();
        r.add_route(Method::GET, "/user/:id", text("first")).unwrap();
        let size = r.tree_size(&Method::GET);
        r.add_route(Method::GET, "/user/:id", text("second")).unwrap();

        assert_eq!(r.tree_size(&Method::GET), size);
        assert_eq!(r.routes().len(), 1);
        assert_eq!(run(&r, Method::GET, "/user/1").response().body_text(), "second");
    }

    #[test]
    fn test_rejected_pattern_leaves_tree_unchanged() {
        let mut r = router(&["/user/:id"]);
        let size = r.tree_size(&Method::GET);

        let err = r.add_route(Method::GET, "/user/:name/posts", text("x")).unwrap_err();
        assert!(matches!(err, RouteError::ConflictingParam { .. }));
        assert_eq!(r.tree_size(&Method::GET), size);
        assert_eq!(r.routes(), vec![(Method::GET, "/user/:id".to_string())]);

        assert!(r.add_route(Method::GET, "/bad/", text("x")).is_err());
        assert!(r.tree_size(&Method::POST).is_none());
    }

    #[test]
    fn test_handle_runs_terminal_handler_with_params() {
        let mut r = Router::new();
        r.add_route(
            Method::GET,
            "/hello/:name",
            handler(|c: &mut Context| {
                let name = c.param("name").unwrap_or_default().to_string();
                c.string(StatusCode::OK, format!("hello {name}"));
            }),
        )
        .unwrap();

        let ctx = run(&r, Method::GET, "/hello/neo");
        assert_eq!(ctx.response().status(), StatusCode::OK);
        assert_eq!(ctx.response().body_text(), "hello neo");
        assert_eq!(ctx.chain_len(), 1);
    }

    #[test]
    fn test_handle_miss_is_404() {
        let r = router(&["/user"]);
        let ctx = run(&r, Method::GET, "/order");
        assert_eq!(ctx.response().status(), StatusCode::NOT_FOUND);
        assert_eq!(ctx.response().body_text(), "404 NOT FOUND: /order");
        assert_eq!(ctx.chain_len(), 0);
    }

    #[test]
    fn test_routes_listing_is_sorted() {
        let mut r = Router::new();
        r.add_route(Method::POST, "/order", text("x")).unwrap();
        r.add_route(Method::GET, "/user", text("x")).unwrap();
        r.add_route(Method::GET, "/admin", text("x")).unwrap();
        assert_eq!(
            r.routes(),
            vec![
                (Method::GET, "/admin".to_string()),
                (Method::GET, "/user".to_string()),
                (Method::POST, "/order".to_string()),
            ]
        );
    }
}
