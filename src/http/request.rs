//! Request snapshot handed to the handler chain.
//!
//! # Responsibilities
//! - Own method, path, raw query, headers and the buffered body
//! - Decode query strings and urlencoded forms on demand
//! - Generate request IDs for the transport layer
//!
//! # Design Decisions
//! - The body is buffered before dispatch; handlers are synchronous
//! - Query and form values are decoded lazily, first value wins

use axum::body::Bytes;
use axum::http::request::Parts;
use axum::http::{header, Extensions, HeaderMap, HeaderName, HeaderValue, Method, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// An inbound request, detached from the transport.
#[derive(Debug, Default)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    extensions: Extensions,
}

impl Request {
    /// Build a request with an empty body.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            ..Default::default()
        }
    }

    /// Build from transport parts and an already-buffered body.
    pub fn from_parts(parts: Parts, body: Bytes) -> Self {
        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            body,
            extensions: parts.extensions,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string without the leading `?`.
    pub fn raw_query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// First value of header `name`, if it is valid visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// First decoded value of query parameter `key`.
    pub fn query(&self, key: &str) -> Option<String> {
        self.query
            .as_deref()
            .and_then(|q| first_value(q.as_bytes(), key))
    }

    /// Form value for `key`.
    ///
    /// A urlencoded body on POST, PUT or PATCH takes precedence; otherwise the
    /// query string is consulted.
    pub fn form_value(&self, key: &str) -> Option<String> {
        if self.has_form_body() {
            if let Some(value) = first_value(&self.body, key) {
                return Some(value);
            }
        }
        self.query(key)
    }

    fn has_form_body(&self) -> bool {
        let accepts_body = matches!(self.method, Method::POST | Method::PUT | Method::PATCH);
        let is_form = self
            .header(header::CONTENT_TYPE.as_str())
            .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);
        accepts_body && is_form
    }
}

fn first_value(input: &[u8], key: &str) -> Option<String> {
    url::form_urlencoded::parse(input)
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}
