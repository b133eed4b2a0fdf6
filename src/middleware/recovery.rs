//! Panic recovery middleware.
//!
//! # Design Decisions
//! - A panic anywhere below this handler is caught, logged and answered
//!   with a plain 500; whatever the handler had written is discarded
//! - The chain is aborted so outer middleware see a finished request
//! - Handlers built with `panic = "abort"` cannot be recovered

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use axum::http::StatusCode;

use crate::http::context::{handler, Context, HandlerFunc};

/// Turn a panic in any later handler into `500 Internal Server Error`.
pub fn recovery() -> HandlerFunc {
    handler(|c: &mut Context| {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| c.next())) {
            tracing::error!(
                method = %c.method(),
                path = %c.path(),
                panic = %panic_message(payload.as_ref()),
                "Handler panicked"
            );
            c.abort();
            c.reset_response();
            c.string(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
