//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::http::StatusCode;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use neo_web::{App, Context, Engine, HttpServer, ServerConfig, Shutdown};

/// An engine with the routes most tests exercise.
///
/// `/v1` requires an `authorization` header; `/v2` tags responses with
/// `x-group: v2` from its own middleware.
pub fn demo_engine() -> Engine {
    let engine = Engine::with_defaults();

    engine
        .get("/hello/:name", |c: &mut Context| {
            let name = c.param("name").unwrap_or_default().to_string();
            c.string(StatusCode::OK, format!("hello {name}"));
        })
        .unwrap();
    engine
        .get("/hello/static", |c: &mut Context| c.string(StatusCode::OK, "static"))
        .unwrap();
    engine
        .get("/login", |c: &mut Context| c.string(StatusCode::OK, "login page"))
        .unwrap();
    engine
        .post("/login", |c: &mut Context| {
            let username = c.post_form("username").unwrap_or_default();
            c.json(StatusCode::OK, &json!({ "username": username }));
        })
        .unwrap();
    engine
        .get("/login/:id", |c: &mut Context| {
            let id = c.param("id").unwrap_or_default().to_string();
            c.json(StatusCode::OK, &json!({ "id": id }));
        })
        .unwrap();
    engine
        .get("/search", |c: &mut Context| {
            let q = c.query("q").unwrap_or_default();
            c.string(StatusCode::OK, q);
        })
        .unwrap();
    engine
        .get("/request-id", |c: &mut Context| {
            let id = c.request_id().unwrap_or_default().to_string();
            c.string(StatusCode::OK, id);
        })
        .unwrap();
    engine
        .get("/panic", |_: &mut Context| panic!("handler exploded"))
        .unwrap();

    let v1 = engine.group("/v1");
    v1.use_middleware(|c: &mut Context| {
        if c.request_header("authorization").is_none() {
            c.json(StatusCode::UNAUTHORIZED, &json!({"error": "missing authorization"}));
            c.abort();
        }
    });
    v1.get("/user", |c: &mut Context| c.string(StatusCode::OK, "v1 user"))
        .unwrap();

    let v2 = engine.group("/v2");
    v2.use_middleware(|c: &mut Context| {
        c.set_header("x-group", "v2");
    });
    v2.get("/user", |c: &mut Context| c.string(StatusCode::OK, "v2 user"))
        .unwrap();

    engine
}

pub fn demo_app() -> App {
    demo_engine().build()
}

/// Config bound to an ephemeral local port.
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.timeouts.request_secs = 5;
    config
}

/// A server running in the background.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server task to exit.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let result = tokio::time::timeout(std::time::Duration::from_secs(5), self.handle)
            .await
            .expect("server stopped in time")
            .expect("server task joined");
        assert!(result.is_ok());
    }
}

/// Start `app` on an ephemeral port.
pub async fn spawn_server(app: App, config: ServerConfig) -> TestServer {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(app, config);
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });
    TestServer {
        addr,
        shutdown,
        handle,
    }
}
