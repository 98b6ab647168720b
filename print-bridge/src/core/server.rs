//! Server Implementation
//!
//! Loopback HTTP server startup, routing and graceful shutdown

use std::future::IntoFuture;
use std::net::{Ipv4Addr, SocketAddr};

use axum::{Router, extract::DefaultBodyLimit, middleware};
use http::{HeaderValue, Method, header};
use kiosk_printer::zpl;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::api::print::MAX_BATCH_SIZE;
use crate::core::{Config, Result, ServerError, ServerState};
use crate::middleware::logging_middleware;

/// Worst-case growth of a label once JSON-escaped (control bytes become `\u00XX`)
const JSON_ESCAPE_FACTOR: usize = 6;

/// Room for field names, printer name and whitespace around the labels
const BODY_FRAMING_BYTES: usize = 64 * 1024;

/// Request body ceiling: a full batch of maximum-size labels, each escaped
/// at the worst case, plus framing
pub const MAX_BODY_BYTES: usize =
    MAX_BATCH_SIZE * zpl::MAX_LABEL_BYTES * JSON_ESCAPE_FACTOR + BODY_FRAMING_BYTES;

/// Build the router with state and middleware applied
pub fn build_app(state: ServerState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    Router::<ServerState>::new()
        .merge(crate::api::health::router())
        .merge(crate::api::printers::router())
        .merge(crate::api::print::router())
        .fallback(crate::api::fallback)
        .layer(middleware::from_fn(logging_middleware))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
        .layer(cors)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring unparsable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// HTTP Server
pub struct Server {
    config: Config,
    state: ServerState,
}

impl Server {
    /// Server over the native spooler
    pub fn new(config: Config) -> Self {
        let state = ServerState::initialize(&config);
        Self { config, state }
    }

    /// Server over an existing state
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self { config, state }
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Bind `127.0.0.1:HTTP_PORT` and serve until Ctrl-C
    pub async fn run(&self) -> Result<()> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, self.config.http_port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        self.listen_for_ctrl_c();
        self.serve(listener).await
    }

    /// Serve on an already bound listener until the shutdown token fires
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        self.state.start_background_tasks();

        let shutdown = self.state.shutdown.clone();
        let app = build_app(self.state.clone());

        tracing::info!("Print bridge listening on http://{}", addr);

        let mut serve = tokio::spawn(
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.clone().cancelled_owned())
                .into_future(),
        );

        tokio::select! {
            res = &mut serve => return flatten(res),
            _ = shutdown.cancelled() => {}
        }

        // In-flight requests get the shutdown budget to finish
        let timeout = self.config.shutdown_timeout();
        match tokio::time::timeout(timeout, &mut serve).await {
            Ok(res) => {
                tracing::info!("Print bridge stopped");
                flatten(res)
            }
            Err(_) => {
                serve.abort();
                tracing::error!(timeout_ms = self.config.shutdown_timeout_ms, "Graceful shutdown timed out");
                Err(ServerError::ShutdownTimeout(self.config.shutdown_timeout_ms))
            }
        }
    }

    fn listen_for_ctrl_c(&self) {
        let shutdown = self.state.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                res = tokio::signal::ctrl_c() => {
                    if let Err(e) = res {
                        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                        return;
                    }
                    tracing::info!("Shutting down...");
                    shutdown.cancel();
                }
                _ = shutdown.cancelled() => {}
            }
        });
    }
}

fn flatten(
    res: std::result::Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<()> {
    match res {
        Ok(inner) => inner.map_err(ServerError::Serve),
        Err(e) => Err(ServerError::Serve(std::io::Error::other(e))),
    }
}
