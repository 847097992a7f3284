//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! This binary is useful for development and debugging when you only want the
//! REST server (with OpenAPI/Swagger UI). The workspace's main `medq-run`
//! binary additionally attaches the token-called announcement subscriber.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the MedQ REST API server
///
/// Starts the REST API server on the configured address (default:
/// 0.0.0.0:3000) with HTTP endpoints for the whole queue core and
/// OpenAPI/Swagger documentation.
///
/// # Environment Variables
/// - `MEDQ_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - plus the seed/tuning variables read by [`api_rest::state_from_env`]
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - a directory seed file is missing or malformed,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("medq_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MEDQ_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting MedQ REST API on {}", addr);

    let state = api_rest::state_from_env()?;
    let app = api_rest::app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
