//! HTTP surface for the generation pipeline.

pub mod handler;

pub use handler::{ApiError, GENERATE_IMAGE_PATH};

use crate::ai::GenerationAdapter;
use crate::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use std::any::Any;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Room for a 10 MiB attachment after base64 expansion plus the JSON wrapper.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub struct AppState {
    pub adapter: GenerationAdapter,
}

/// Build the application router.
///
/// `expose_error_details` controls whether the raw message of an internal
/// failure is echoed back in the `details` field.
pub fn router(adapter: GenerationAdapter, expose_error_details: bool) -> Router {
    let state = Arc::new(AppState { adapter });

    Router::new()
        .route(
            GENERATE_IMAGE_PATH,
            post(handler::generate_image).fallback(handler::method_not_allowed),
        )
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(
            move |panic: Box<dyn Any + Send + 'static>| {
                handler::internal_error_for_panic(panic, expose_error_details)
            },
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(AnyOrigin)
                .allow_methods(AnyOrigin)
                .allow_headers(AnyOrigin),
        )
}

/// Serve `app` until Ctrl-C is received.
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
