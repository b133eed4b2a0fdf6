//! Request logging middleware.

use std::time::Instant;

use crate::http::context::{handler, Context, HandlerFunc};
use crate::observability::metrics;

/// Log method, path, status and latency once the rest of the chain returns.
pub fn logger() -> HandlerFunc {
    handler(|c: &mut Context| {
        let start = Instant::now();
        c.next();

        let status = c.response().status();
        tracing::info!(
            request_id = %c.request_id().unwrap_or("unknown"),
            method = %c.method(),
            path = %c.path(),
            status = status.as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Request handled"
        );
        metrics::record_request(c.method().as_str(), status.as_u16(), start);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::Request;
    use axum::http::{Method, StatusCode, Uri};

    #[test]
    fn test_logger_is_transparent() {
        let mut c = Context::new(Request::new(Method::GET, Uri::from_static("/x")));
        c.extend_handlers([
            logger(),
            handler(|c: &mut Context| c.string(StatusCode::ACCEPTED, "done")),
        ]);
        c.next();

        assert_eq!(c.response().status(), StatusCode::ACCEPTED);
        assert_eq!(c.response().body_text(), "done");
    }
}
