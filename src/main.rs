//! neo-web demo server
//!
//! ```text
//!     Client Request
//!     ─────────────▶ HttpServer (axum: trace → request id → timeout)
//!                        │
//!                        ▼  spawn_blocking
//!                    App::dispatch
//!                        │
//!                        ├─ group middleware (logger, recovery, auth...)
//!                        └─ Router: trie lookup → terminal handler
//!     ◀───────────── ResponseWriter
//! ```

use std::path::PathBuf;

use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;

use axum::http::StatusCode;
use neo_web::config::{load_config, ServerConfig};
use neo_web::observability::{logging, metrics};
use neo_web::{Context, Engine, FileTemplates, HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "neo-web", version, about = "Minimal HTTP dispatch framework demo")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!("neo-web v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        max_body_size = config.limits.max_body_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let engine = build_engine(&config)?;
    let app = engine.build();
    for (method, pattern) in app.routes() {
        tracing::info!(method = %method, pattern = %pattern, "Route");
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let shutdown = Shutdown::new();
    let server = HttpServer::new(app, config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_engine(config: &ServerConfig) -> Result<Engine, Box<dyn std::error::Error>> {
    let mut engine = Engine::with_defaults();

    if let Some(dir) = &config.templates.dir {
        engine.set_template_engine(FileTemplates::load_dir(dir, &config.templates.extension)?);
    }
    if config.assets.enabled {
        engine.static_dir(&config.assets.url_prefix, config.assets.dir.clone())?;
    }

    engine.get("/index", |c: &mut Context| {
        c.html(StatusCode::OK, "index.html", &json!({"title": "neo-web"}));
    })?;
    engine.get("/hello/:name", |c: &mut Context| {
        let name = c.param("name").unwrap_or_default().to_string();
        let path = c.path().to_string();
        c.string(StatusCode::OK, format!("hello {name}, you're at {path}\n"));
    })?;
    engine.get("/hello/static", |c: &mut Context| {
        c.string(StatusCode::OK, "hello from a static route\n");
    })?;
    engine.post("/login", |c: &mut Context| {
        let username = c.post_form("username").unwrap_or_default();
        c.json(StatusCode::OK, &json!({ "username": username }));
    })?;
    engine.get("/login/:id", |c: &mut Context| {
        let id = c.param("id").unwrap_or_default().to_string();
        c.json(StatusCode::OK, &json!({ "id": id }));
    })?;

    let v1 = engine.group("/v1");
    v1.use_middleware(|c: &mut Context| {
        if c.request_header("authorization").is_none() {
            c.json(StatusCode::UNAUTHORIZED, &json!({"error": "missing authorization"}));
            c.abort();
        }
    });
    v1.get("/user", |c: &mut Context| {
        c.json(StatusCode::OK, &json!({"version": "v1", "user": "neo"}));
    })?;

    let v2 = engine.group("/v2");
    v2.get("/user/:id", |c: &mut Context| {
        let id = c.param("id").unwrap_or_default().to_string();
        c.json(StatusCode::OK, &json!({"version": "v2", "id": id}));
    })?;
    v2.get("/files/*filepath", |c: &mut Context| {
        let file = c.param("filepath").unwrap_or_default().to_string();
        c.string(StatusCode::OK, format!("file: {file}\n"));
    })?;

    Ok(engine)
}
