//! # API REST
//!
//! REST API implementation for MedQ.
//!
//! Handles:
//! - HTTP endpoints with axum for every queue-core operation
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, error-to-status mapping, CORS)
//!
//! The router is built here so both the standalone `medq-api-rest` binary
//! and the workspace's main `medq-run` binary serve the same application.

#![warn(rust_2018_idioms)]

pub mod models;

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use medq_core::{
    config::{duration_from_env_value, u64_from_env_value},
    constants::{
        DEFAULT_CALLED_BOARD_SIZE, DEFAULT_DOCTORS_FILE, DEFAULT_OTP_TTL_SECS,
        DEFAULT_PATIENTS_FILE, DEFAULT_TOKEN_NUMBER_START, DEFAULT_UPDATE_RETRY_BUDGET,
    },
    CoreConfig, LogCodeDispatcher, NonEmptyText, OperationalFilter, QueueCore, QueueError,
    YamlDoctorDirectory, YamlPatientDirectory,
};

use models::{
    ConfirmCodeReq, DoctorsQuery, ErrorRes, HealthRes, IssueCodeReq, IssueCodeRes, IssueTokenReq,
    ListDoctorsRes, ListTokensQuery, ListTokensRes, PatientRecordBody, PublicViewRes, ResolveReq,
    ResolveRes, TokenRes, VerifyDocumentReq,
};

/// Application state shared across REST API handlers.
///
/// Holds the assembled queue core plus the doctor directory (exposed
/// read-only through `/doctors`).
#[derive(Clone)]
pub struct AppState {
    core: Arc<QueueCore>,
    doctors: Arc<YamlDoctorDirectory>,
}

impl AppState {
    pub fn new(core: Arc<QueueCore>, doctors: Arc<YamlDoctorDirectory>) -> Self {
        Self { core, doctors }
    }

    pub fn core(&self) -> &Arc<QueueCore> {
        &self.core
    }
}

/// Builds the application state from environment variables.
///
/// Reads the seed directory files and queue tuning knobs once at startup;
/// request handlers never touch the environment.
///
/// # Environment Variables
/// - `MEDQ_DOCTORS_FILE`, `MEDQ_PATIENTS_FILE`: YAML seed files
/// - `MEDQ_TOKEN_START`: first token number (default 1)
/// - `MEDQ_CALLED_BOARD_SIZE`: recently-called board depth (default 3)
/// - `MEDQ_UPDATE_RETRY_BUDGET`: optimistic update retries (default 8)
/// - `MEDQ_OTP_TTL_SECS`: one-time code lifetime (default 300)
///
/// # Errors
/// Returns an error when a seed file is missing or unparseable, or when a
/// tuning value is out of range.
pub fn state_from_env() -> anyhow::Result<AppState> {
    let doctors_file = PathBuf::from(
        std::env::var("MEDQ_DOCTORS_FILE").unwrap_or_else(|_| DEFAULT_DOCTORS_FILE.into()),
    );
    let patients_file = PathBuf::from(
        std::env::var("MEDQ_PATIENTS_FILE").unwrap_or_else(|_| DEFAULT_PATIENTS_FILE.into()),
    );

    let token_start = u64_from_env_value(
        "MEDQ_TOKEN_START",
        std::env::var("MEDQ_TOKEN_START").ok(),
        DEFAULT_TOKEN_NUMBER_START,
    )?;
    let board_size = u64_from_env_value(
        "MEDQ_CALLED_BOARD_SIZE",
        std::env::var("MEDQ_CALLED_BOARD_SIZE").ok(),
        DEFAULT_CALLED_BOARD_SIZE as u64,
    )?;
    let retry_budget = u64_from_env_value(
        "MEDQ_UPDATE_RETRY_BUDGET",
        std::env::var("MEDQ_UPDATE_RETRY_BUDGET").ok(),
        DEFAULT_UPDATE_RETRY_BUDGET as u64,
    )?;
    let otp_ttl = duration_from_env_value(
        "MEDQ_OTP_TTL_SECS",
        std::env::var("MEDQ_OTP_TTL_SECS").ok(),
        DEFAULT_OTP_TTL_SECS,
    )?;

    let cfg = CoreConfig::new(token_start, board_size as usize, retry_budget as u32, otp_ttl)?;

    let doctors = Arc::new(YamlDoctorDirectory::load(&doctors_file)?);
    let patients = Arc::new(YamlPatientDirectory::load(&patients_file)?);

    let core = Arc::new(QueueCore::new(
        &cfg,
        patients,
        doctors.clone(),
        Arc::new(LogCodeDispatcher),
    ));

    Ok(AppState::new(core, doctors))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        verify_document,
        issue_code,
        confirm_code,
        resolve,
        list_doctors,
        issue_token,
        get_token,
        list_tokens,
        call_token,
        complete_token,
        cancel_token,
        public_view,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        PatientRecordBody,
        VerifyDocumentReq,
        IssueCodeReq,
        IssueCodeRes,
        ConfirmCodeReq,
        ResolveReq,
        models::SpecializationBody,
        ResolveRes,
        models::DoctorRes,
        ListDoctorsRes,
        IssueTokenReq,
        TokenRes,
        ListTokensRes,
        PublicViewRes,
    ))
)]
struct ApiDoc;

/// Builds the REST application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/verify/document", post(verify_document))
        .route("/verify/phone", post(issue_code))
        .route("/verify/phone/confirm", post(confirm_code))
        .route("/resolve", post(resolve))
        .route("/doctors", get(list_doctors))
        .route("/tokens", post(issue_token))
        .route("/tokens", get(list_tokens))
        .route("/tokens/:id", get(get_token))
        .route("/tokens/:id/call", post(call_token))
        .route("/tokens/:id/complete", post(complete_token))
        .route("/tokens/:id/cancel", post(cancel_token))
        .route("/display", get(public_view))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

type ApiError = (StatusCode, Json<ErrorRes>);

/// Maps a core error onto the HTTP status space and logs it.
///
/// Caller mistakes map to 4xx, transient store conditions to 503 so pollers
/// retry, anything unexpected to 500.
fn reject(context: &'static str, err: QueueError) -> ApiError {
    let status = match &err {
        QueueError::InvalidInput(_) | QueueError::InvalidFormat { .. } => StatusCode::BAD_REQUEST,
        QueueError::NotFound { .. } => StatusCode::NOT_FOUND,
        QueueError::InvalidCode
        | QueueError::ExpiredCode
        | QueueError::BiometricRejected
        | QueueError::InvalidTransition { .. }
        | QueueError::CapacityExceeded { .. } => StatusCode::CONFLICT,
        QueueError::Contention { .. } | QueueError::ResolverUnavailable(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        QueueError::FileRead(_) | QueueError::YamlDeserialization(_) | QueueError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("{} error: {:?}", context, err);
    } else {
        tracing::warn!("{} rejected: {}", context, err);
    }

    (
        status,
        Json(ErrorRes {
            error: err.to_string(),
        }),
    )
}

fn parse_token_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse().map_err(|_| {
        reject(
            "token id",
            QueueError::InvalidInput(format!("invalid token id '{}'", raw)),
        )
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "MedQ REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/verify/document",
    request_body = VerifyDocumentReq,
    responses(
        (status = 200, description = "Patient verified", body = PatientRecordBody),
        (status = 400, description = "Malformed national id", body = ErrorRes),
        (status = 404, description = "Unknown national id", body = ErrorRes),
        (status = 409, description = "Biometric confirmation rejected", body = ErrorRes)
    )
)]
/// Verify a patient by national id and biometric confirmation
///
/// The kiosk submits the 12-digit national id together with the outcome of
/// its biometric confirmation step; on success the verified patient record
/// (with masked national id) is returned.
#[axum::debug_handler]
async fn verify_document(
    State(state): State<AppState>,
    Json(req): Json<VerifyDocumentReq>,
) -> Result<Json<PatientRecordBody>, ApiError> {
    let record = state
        .core
        .verification()
        .verify_document(&req.national_id, req.outcome())
        .map_err(|e| reject("verify document", e))?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    post,
    path = "/verify/phone",
    request_body = IssueCodeReq,
    responses(
        (status = 200, description = "One-time code dispatched out of band", body = IssueCodeRes),
        (status = 400, description = "Malformed phone number", body = ErrorRes),
        (status = 404, description = "Unknown phone number", body = ErrorRes)
    )
)]
/// Issue a one-time code for phone-based verification
///
/// The code is dispatched out of band; the response carries only the expiry
/// so the kiosk can show a countdown.
#[axum::debug_handler]
async fn issue_code(
    State(state): State<AppState>,
    Json(req): Json<IssueCodeReq>,
) -> Result<Json<IssueCodeRes>, ApiError> {
    let issue = state
        .core
        .verification()
        .issue_code(&req.phone)
        .map_err(|e| reject("issue code", e))?;
    Ok(Json(issue.into()))
}

#[utoipa::path(
    post,
    path = "/verify/phone/confirm",
    request_body = ConfirmCodeReq,
    responses(
        (status = 200, description = "Patient verified", body = PatientRecordBody),
        (status = 400, description = "Malformed phone number or code", body = ErrorRes),
        (status = 409, description = "Code invalid or expired", body = ErrorRes)
    )
)]
/// Confirm a one-time code and resolve the patient record
#[axum::debug_handler]
async fn confirm_code(
    State(state): State<AppState>,
    Json(req): Json<ConfirmCodeReq>,
) -> Result<Json<PatientRecordBody>, ApiError> {
    let record = state
        .core
        .verification()
        .confirm_code(&req.phone, &req.code)
        .map_err(|e| reject("confirm code", e))?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    post,
    path = "/resolve",
    request_body = ResolveReq,
    responses(
        (status = 200, description = "Ranked specializations, best match first", body = ResolveRes),
        (status = 503, description = "Specialization source unavailable", body = ErrorRes)
    )
)]
/// Resolve a symptom description to candidate specializations
///
/// Empty input yields an empty list, not an error.
#[axum::debug_handler]
async fn resolve(
    State(state): State<AppState>,
    Json(req): Json<ResolveReq>,
) -> Result<Json<ResolveRes>, ApiError> {
    let ranked = state
        .core
        .resolver()
        .resolve(&req.symptoms)
        .map_err(|e| reject("resolve symptoms", e))?;
    Ok(Json(ResolveRes {
        specializations: ranked.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/doctors",
    params(DoctorsQuery),
    responses(
        (status = 200, description = "Doctor directory listing", body = ListDoctorsRes)
    )
)]
/// List doctors, optionally restricted to one specialization
#[axum::debug_handler]
async fn list_doctors(
    State(state): State<AppState>,
    Query(query): Query<DoctorsQuery>,
) -> Json<ListDoctorsRes> {
    use medq_core::DoctorDirectory;

    let doctors = state.doctors.list(query.specialization.as_deref());
    Json(ListDoctorsRes {
        doctors: doctors.into_iter().map(Into::into).collect(),
    })
}

#[utoipa::path(
    post,
    path = "/tokens",
    request_body = IssueTokenReq,
    responses(
        (status = 201, description = "Token issued", body = TokenRes),
        (status = 400, description = "Bad request", body = ErrorRes),
        (status = 404, description = "Unknown doctor", body = ErrorRes),
        (status = 409, description = "Doctor at capacity", body = ErrorRes)
    )
)]
/// Issue a queue token for a verified patient
///
/// The patient body must be one previously returned by a verification
/// endpoint; its snapshot is denormalised onto the token.
#[axum::debug_handler]
async fn issue_token(
    State(state): State<AppState>,
    Json(req): Json<IssueTokenReq>,
) -> Result<(StatusCode, Json<TokenRes>), ApiError> {
    let patient = req
        .patient
        .into_record()
        .map_err(|e| reject("issue token", e))?;
    let symptoms = NonEmptyText::new(&req.symptoms).map_err(|_| {
        reject(
            "issue token",
            QueueError::InvalidInput("symptoms cannot be empty".into()),
        )
    })?;
    let doctor_id: Uuid = req.doctor_id.parse().map_err(|_| {
        reject(
            "issue token",
            QueueError::InvalidInput(format!("invalid doctor id '{}'", req.doctor_id)),
        )
    })?;
    let priority = req
        .priority
        .parse()
        .map_err(|e| reject("issue token", e))?;

    let token = state
        .core
        .issuance()
        .issue(&patient, symptoms, &req.specialization, doctor_id, priority)
        .map_err(|e| reject("issue token", e))?;
    Ok((StatusCode::CREATED, Json(token.into())))
}

#[utoipa::path(
    get,
    path = "/tokens/{id}",
    responses(
        (status = 200, description = "Token snapshot", body = TokenRes),
        (status = 404, description = "Unknown token", body = ErrorRes)
    )
)]
/// Fetch a single token
#[axum::debug_handler]
async fn get_token(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<TokenRes>, ApiError> {
    let token_id = parse_token_id(&id)?;
    let token = state
        .core
        .projection()
        .token(token_id)
        .map_err(|e| reject("get token", e))?;
    Ok(Json(token.into()))
}

#[utoipa::path(
    get,
    path = "/tokens",
    params(ListTokensQuery),
    responses(
        (status = 200, description = "Operational token view", body = ListTokensRes),
        (status = 400, description = "Bad filter", body = ErrorRes)
    )
)]
/// Staff view over all tokens
///
/// Supports filtering by specialization, status, priority and doctor, and an
/// optional explicit sort; without one, stable allocation order is returned.
#[axum::debug_handler]
async fn list_tokens(
    State(state): State<AppState>,
    Query(query): Query<ListTokensQuery>,
) -> Result<Json<ListTokensRes>, ApiError> {
    let mut filter = OperationalFilter {
        specialization: query.specialization,
        ..OperationalFilter::default()
    };
    if let Some(raw) = query.status {
        filter.status = Some(raw.parse().map_err(|e| reject("list tokens", e))?);
    }
    if let Some(raw) = query.priority {
        filter.priority = Some(raw.parse().map_err(|e| reject("list tokens", e))?);
    }
    if let Some(raw) = query.doctor_id {
        filter.doctor_id = Some(raw.parse().map_err(|_| {
            reject(
                "list tokens",
                QueueError::InvalidInput(format!("invalid doctor id '{}'", raw)),
            )
        })?);
    }
    if let Some(raw) = query.sort {
        filter.sort = Some(raw.parse().map_err(|e| reject("list tokens", e))?);
    }

    let tokens = state
        .core
        .projection()
        .operational_view(&filter)
        .map_err(|e| reject("list tokens", e))?;
    Ok(Json(ListTokensRes {
        tokens: tokens.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/tokens/{id}/call",
    responses(
        (status = 200, description = "Token called", body = TokenRes),
        (status = 404, description = "Unknown token", body = ErrorRes),
        (status = 409, description = "Illegal transition", body = ErrorRes),
        (status = 503, description = "Store contention", body = ErrorRes)
    )
)]
/// Call a waiting token to the consultation room
///
/// Publishes a token-called announcement exactly once on success.
#[axum::debug_handler]
async fn call_token(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<TokenRes>, ApiError> {
    let token_id = parse_token_id(&id)?;
    let token = state
        .core
        .transitions()
        .call(token_id)
        .map_err(|e| reject("call token", e))?;
    Ok(Json(token.into()))
}

#[utoipa::path(
    post,
    path = "/tokens/{id}/complete",
    responses(
        (status = 200, description = "Token completed", body = TokenRes),
        (status = 404, description = "Unknown token", body = ErrorRes),
        (status = 409, description = "Illegal transition", body = ErrorRes),
        (status = 503, description = "Store contention", body = ErrorRes)
    )
)]
/// Mark a called token as completed
#[axum::debug_handler]
async fn complete_token(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<TokenRes>, ApiError> {
    let token_id = parse_token_id(&id)?;
    let token = state
        .core
        .transitions()
        .complete(token_id)
        .map_err(|e| reject("complete token", e))?;
    Ok(Json(token.into()))
}

#[utoipa::path(
    post,
    path = "/tokens/{id}/cancel",
    responses(
        (status = 200, description = "Token cancelled", body = TokenRes),
        (status = 404, description = "Unknown token", body = ErrorRes),
        (status = 409, description = "Illegal transition", body = ErrorRes),
        (status = 503, description = "Store contention", body = ErrorRes)
    )
)]
/// Cancel a waiting or called token
#[axum::debug_handler]
async fn cancel_token(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<TokenRes>, ApiError> {
    let token_id = parse_token_id(&id)?;
    let token = state
        .core
        .transitions()
        .cancel(token_id)
        .map_err(|e| reject("cancel token", e))?;
    Ok(Json(token.into()))
}

#[utoipa::path(
    get,
    path = "/display",
    responses(
        (status = 200, description = "Public display board view", body = PublicViewRes)
    )
)]
/// Public display board view
///
/// Waiting tokens ordered emergencies-first then by arrival, followed by the
/// most recently called tokens. Polled by the display board every refresh
/// tick.
#[axum::debug_handler]
async fn public_view(State(state): State<AppState>) -> Result<Json<PublicViewRes>, ApiError> {
    let tokens = state
        .core
        .projection()
        .public_view()
        .map_err(|e| reject("public view", e))?;
    Ok(Json(PublicViewRes {
        tokens: tokens.into_iter().map(Into::into).collect(),
    }))
}
