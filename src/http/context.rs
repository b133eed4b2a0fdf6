//! Per-request control object.
//!
//! # Responsibilities
//! - Carry the request, the response sink and captured route params
//! - Drive the ordered handler chain (middleware first, terminal handler last)
//! - Offer read helpers for the request and write helpers for the response
//!
//! # Chain Semantics
//! ```text
//! index: -1 ──next()──▶ 0 ──▶ 1 ──▶ ... ──▶ N-1 ──▶ N (done)
//!
//! A: before ─┐                       ┌─ after
//! B:         └─ before ─┐   ┌─ after ┘
//! T:                    └ T ┘
//! ```
//! A handler that calls [`Context::next`] runs the rest of the chain before
//! returning; code after the call runs on the way out. A handler that never
//! calls `next()` still lets the loop continue with the following handler.
//! [`Context::abort`] parks the index on a sentinel beyond any chain length,
//! so every pending or future `next()` loop exits.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{header, Extensions, Method, StatusCode};
use serde::Serialize;

use crate::http::request::{Request, X_REQUEST_ID};
use crate::http::response::ResponseWriter;
use crate::render::{RenderError, TemplateEngine};

/// A middleware or terminal handler.
pub type HandlerFunc = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// Wrap a closure as a [`HandlerFunc`].
pub fn handler<F>(f: F) -> HandlerFunc
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Index value meaning "aborted". Far above any real chain length, and far
/// enough below `isize::MAX` that later increments cannot wrap.
const ABORT_INDEX: isize = isize::MAX / 2;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";
const TEXT_HTML: &str = "text/html; charset=utf-8";

/// State for one in-flight request.
pub struct Context {
    request: Request,
    writer: ResponseWriter,
    params: HashMap<String, String>,
    handlers: Vec<HandlerFunc>,
    index: isize,
    templates: Option<Arc<dyn TemplateEngine>>,
}

impl Context {
    pub fn new(request: Request) -> Self {
        Self {
            request,
            writer: ResponseWriter::new(),
            params: HashMap::new(),
            handlers: Vec::new(),
            index: -1,
            templates: None,
        }
    }

    pub fn with_templates(mut self, templates: Option<Arc<dyn TemplateEngine>>) -> Self {
        self.templates = templates;
        self
    }

    // ----- chain control -----

    /// Run the remaining handlers.
    pub fn next(&mut self) {
        self.index = self.index.saturating_add(1);
        while let Some(handler) = self.current() {
            handler(self);
            self.index = self.index.saturating_add(1);
        }
    }

    /// Stop the chain. Handlers already on the stack finish their own code,
    /// but nothing further down the chain starts.
    pub fn abort(&mut self) {
        self.index = ABORT_INDEX;
    }

    /// Write `code` with an empty body and abort.
    pub fn abort_with_status(&mut self, code: StatusCode) {
        self.status(code);
        self.abort();
    }

    pub fn is_aborted(&self) -> bool {
        self.index >= ABORT_INDEX
    }

    fn current(&self) -> Option<HandlerFunc> {
        usize::try_from(self.index)
            .ok()
            .and_then(|i| self.handlers.get(i))
            .cloned()
    }

    pub(crate) fn push_handler(&mut self, handler: HandlerFunc) {
        self.handlers.push(handler);
    }

    pub(crate) fn extend_handlers<I>(&mut self, handlers: I)
    where
        I: IntoIterator<Item = HandlerFunc>,
    {
        self.handlers.extend(handlers);
    }

    /// Number of handlers currently in the chain.
    pub fn chain_len(&self) -> usize {
        self.handlers.len()
    }

    // ----- request -----

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.path()
    }

    /// Captured route parameter, e.g. `name` for `/hello/:name`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    pub fn query(&self, key: &str) -> Option<String> {
        self.request.query(key)
    }

    pub fn post_form(&self, key: &str) -> Option<String> {
        self.request.form_value(key)
    }

    pub fn request_header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    pub fn body(&self) -> &Bytes {
        self.request.body()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request.header(X_REQUEST_ID)
    }

    /// Typed values shared between middleware and handlers.
    pub fn extensions(&self) -> &Extensions {
        self.request.extensions()
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        self.request.extensions_mut()
    }

    // ----- response -----

    pub fn status(&mut self, code: StatusCode) {
        self.writer.set_status(code);
    }

    pub fn set_header(&mut self, name: &str, value: &str) {
        self.writer.set_header(name, value);
    }

    pub fn write(&mut self, bytes: &[u8]) {
        self.writer.write(bytes);
    }

    /// Raw bytes with an explicit content type.
    pub fn data(&mut self, code: StatusCode, content_type: &str, bytes: &[u8]) {
        self.set_header(header::CONTENT_TYPE.as_str(), content_type);
        self.status(code);
        self.write(bytes);
    }

    pub fn string(&mut self, code: StatusCode, body: impl AsRef<str>) {
        self.data(code, TEXT_PLAIN, body.as_ref().as_bytes());
    }

    /// Serialize `value` as JSON. Serialization failure degrades to a 500
    /// text response carrying the error.
    pub fn json<T: Serialize + ?Sized>(&mut self, code: StatusCode, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.data(code, APPLICATION_JSON, &bytes),
            Err(e) => {
                tracing::error!(path = %self.path(), error = %e, "JSON serialization failed");
                self.string(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
            }
        }
    }

    /// Render template `name` with `data`.
    pub fn html<T: Serialize + ?Sized>(&mut self, code: StatusCode, name: &str, data: &T) {
        let Some(templates) = self.templates.clone() else {
            tracing::error!(template = name, "No template engine configured");
            self.string(StatusCode::INTERNAL_SERVER_ERROR, "template engine not configured");
            return;
        };

        let rendered = serde_json::to_value(data)
            .map_err(RenderError::from)
            .and_then(|value| templates.render(name, &value));

        match rendered {
            Ok(bytes) => self.data(code, TEXT_HTML, &bytes),
            Err(e) => {
                tracing::error!(template = name, error = %e, "Template render failed");
                self.string(StatusCode::INTERNAL_SERVER_ERROR, format!("template render failed: {e}"));
            }
        }
    }

    /// Drop any partial response, e.g. after a handler panicked mid-write.
    pub(crate) fn reset_response(&mut self) {
        self.writer.reset();
    }

    pub fn response(&self) -> &ResponseWriter {
        &self.writer
    }

    pub fn into_response(self) -> ResponseWriter {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::FileTemplates;
    use axum::http::Uri;
    use serde::ser::Error as _;

    fn ctx() -> Context {
        Context::new(Request::new(Method::GET, Uri::from_static("/test")))
    }

    fn tag(label: &'static str) -> HandlerFunc {
        handler(move |c: &mut Context| c.write(label.as_bytes()))
    }

    fn onion(name: &'static str) -> HandlerFunc {
        handler(move |c: &mut Context| {
            c.write(format!("{name}>").as_bytes());
            c.next();
            c.write(format!("<{name}").as_bytes());
        })
    }

    #[test]
    fn test_onion_ordering() {
        let mut c = ctx();
        c.extend_handlers([onion("A"), onion("B"), tag("T")]);
        c.next();
        assert_eq!(c.response().body_text(), "A>B>T<B<A");
    }

    #[test]
    fn test_handlers_without_next_still_run_in_order() {
        let mut c = ctx();
        c.extend_handlers([tag("1"), tag("2"), tag("3")]);
        c.next();
        assert_eq!(c.response().body_text(), "123");
    }

    #[test]
    fn test_abort_stops_downstream() {
        let mut c = ctx();
        let guard = handler(|c: &mut Context| {
            c.write(b"guard>");
            c.abort();
            c.next();
            c.write(b"<guard");
        });
        c.extend_handlers([onion("A"), guard, onion("B"), tag("T")]);
        c.next();

        assert_eq!(c.response().body_text(), "A>guard><guard<A");
        assert!(c.is_aborted());

        // A later next() must not re-enter the chain.
        c.next();
        assert_eq!(c.response().body_text(), "A>guard><guard<A");
        assert!(c.is_aborted());
    }

    #[test]
    fn test_abort_with_status() {
        let mut c = ctx();
        c.extend_handlers([
            handler(|c: &mut Context| c.abort_with_status(StatusCode::UNAUTHORIZED)),
            tag("T"),
        ]);
        c.next();
        assert_eq!(c.response().status(), StatusCode::UNAUTHORIZED);
        assert!(c.response().body().is_empty());
    }

    #[test]
    fn test_string_and_json_helpers() {
        let mut c = ctx();
        c.string(StatusCode::OK, "hello");
        assert_eq!(c.response().header("content-type"), Some(TEXT_PLAIN));

        let mut c = ctx();
        c.json(StatusCode::CREATED, &serde_json::json!({"code": "200"}));
        assert_eq!(c.response().status(), StatusCode::CREATED);
        assert_eq!(c.response().header("content-type"), Some(APPLICATION_JSON));
        assert_eq!(c.response().body_text(), r#"{"code":"200"}"#);
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("boom"))
        }
    }

    #[test]
    fn test_json_failure_degrades_to_500() {
        let mut c = ctx();
        c.json(StatusCode::OK, &Unserializable);
        assert_eq!(c.response().status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(c.response().header("content-type"), Some(TEXT_PLAIN));
        assert!(c.response().body_text().contains("boom"));
    }

    #[test]
    fn test_html_rendering() {
        let templates = FileTemplates::from_sources([("hello.html", "<h1>Hi {{ name }}</h1>")]);
        let mut c = ctx().with_templates(Some(Arc::new(templates)));
        c.html(StatusCode::OK, "hello.html", &serde_json::json!({"name": "neo"}));
        assert_eq!(c.response().header("content-type"), Some(TEXT_HTML));
        assert_eq!(c.response().body_text(), "<h1>Hi neo</h1>");

        c.html(StatusCode::OK, "missing.html", &());
        assert_eq!(c.response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_html_without_engine() {
        let mut c = ctx();
        c.html(StatusCode::OK, "index.html", &());
        assert_eq!(c.response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_extensions_shared_between_handlers() {
        #[derive(Clone)]
        struct User(&'static str);

        let mut c = ctx();
        c.extend_handlers([
            handler(|c: &mut Context| {
                c.extensions_mut().insert(User("neo"));
            }),
            handler(|c: &mut Context| {
                let name = c.extensions().get::<User>().map(|u| u.0).unwrap_or("anonymous");
                c.string(StatusCode::OK, name);
            }),
        ]);
        c.next();
        assert_eq!(c.response().body_text(), "neo");
    }
}
