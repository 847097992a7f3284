//! Main MedQ server binary.
//!
//! Boots the REST API application and attaches the token-called announcement
//! subscriber: every successful `call` transition is re-published to the
//! server log for the announcement hardware integration to pick up. The
//! standalone `medq-api-rest` binary serves the same application without the
//! subscriber.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the MedQ application
///
/// Starts the REST server (default 0.0.0.0:3000) and the announcement
/// subscriber task.
///
/// # Environment Variables
/// - `MEDQ_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `MEDQ_DOCTORS_FILE` / `MEDQ_PATIENTS_FILE`: directory seed files
/// - `MEDQ_TOKEN_START`, `MEDQ_CALLED_BOARD_SIZE`, `MEDQ_UPDATE_RETRY_BUDGET`,
///   `MEDQ_OTP_TTL_SECS`: queue tuning knobs
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medq=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("medq_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("MEDQ_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("++ Starting MedQ REST on {}", rest_addr);

    let state = api_rest::state_from_env()?;

    // Announcement subscriber: the audio/display hardware integration reads
    // these lines; the queue core itself only publishes the events.
    let mut announcements = state.core().transitions().subscribe();
    tokio::spawn(async move {
        loop {
            match announcements.recv().await {
                Ok(event) => {
                    tracing::info!(
                        "announcing token {} for {}",
                        medq_core::token_label(event.token_number),
                        event.patient_name
                    );
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!("announcement subscriber lagged, missed {}", missed);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let app = api_rest::app(state);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
