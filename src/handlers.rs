use crate::completion_client::CompletionClient;
use crate::config::Config;
use crate::copywriting::{generate_bulk_scripts, generate_top_scripts, recommend_channel};
use crate::dispatcher;
use crate::errors::AppError;
use crate::market_strategy::{
    analyze_category_saturation, analyze_market_by_region, rank_cities_by_opportunity,
};
use crate::models::*;
use crate::scoring::qualify_leads;
use crate::session::SessionContext;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

const DEFAULT_CITY_LIMIT: usize = 5;

/// Shared application state injected into handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Session context shared by every request to this process.
    pub session: Mutex<SessionContext>,
    /// Client for the completion service.
    pub completion: CompletionClient,
}

impl AppState {
    pub fn new(config: Config, completion: CompletionClient) -> Self {
        Self {
            config,
            session: Mutex::new(SessionContext::new()),
            completion,
        }
    }
}

/// All routes, without the rate limiter (applied in `main`).
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/leads/qualify", post(qualify))
        .route("/api/v1/leads/scripts", post(scripts))
        .route("/api/v1/leads/channel", post(channel))
        .route("/api/v1/market/region", post(market_region))
        .route("/api/v1/market/cities", post(market_cities))
        .route("/api/v1/market/saturation", post(market_saturation))
        .route("/api/v1/session", get(session_snapshot))
        .route("/api/v1/session/extractions/:id", get(extraction))
        .route("/api/v1/session/ingest", post(ingest))
        .route("/api/v1/session/reset", post(reset))
        .route("/api/v1/assistant/chat", post(chat))
        .with_state(state)
}

fn validate_leads<'a>(leads: impl IntoIterator<Item = &'a RawLead>) -> Result<(), AppError> {
    for (idx, lead) in leads.into_iter().enumerate() {
        if lead.id.trim().is_empty() {
            return Err(AppError::BadRequest(format!(
                "Lead at position {} has no id",
                idx
            )));
        }
        if lead.name.trim().is_empty() {
            return Err(AppError::BadRequest(format!(
                "Lead '{}' has no name",
                lead.id
            )));
        }
    }
    Ok(())
}

/// Health check endpoint.
///
/// Also reports whether the assistant can reach the completion service.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "leadmaps-api",
            "version": env!("CARGO_PKG_VERSION"),
            "assistant": {
                "credentialConfigured": state.completion.has_credential(),
                "model": state.config.completion_model,
            }
        })),
    )
}

/// POST /api/v1/leads/qualify
///
/// Scores, classifies and ranks a batch without touching the session.
pub async fn qualify(
    Json(payload): Json<LeadBatchRequest>,
) -> Result<Json<Vec<QualifiedLead>>, AppError> {
    tracing::info!("POST /leads/qualify - {} leads", payload.leads.len());
    validate_leads(&payload.leads)?;
    Ok(Json(qualify_leads(&payload.leads)))
}

/// POST /api/v1/leads/scripts
///
/// Generates scripts for every lead, or for the top `limit` by score.
pub async fn scripts(
    Json(payload): Json<ScriptRequest>,
) -> Result<Json<Vec<ProspectingScript>>, AppError> {
    tracing::info!(
        "POST /leads/scripts - {} leads, channel {:?}, limit {:?}",
        payload.leads.len(),
        payload.channel,
        payload.limit
    );
    validate_leads(payload.leads.iter().map(|l| &l.lead))?;

    let scripts = match payload.limit {
        Some(limit) => generate_top_scripts(&payload.leads, payload.channel, limit),
        None => generate_bulk_scripts(&payload.leads, payload.channel),
    };
    Ok(Json(scripts))
}

/// POST /api/v1/leads/channel
pub async fn channel(Json(lead): Json<RawLead>) -> Result<Json<ChannelRecommendation>, AppError> {
    validate_leads([&lead])?;
    Ok(Json(recommend_channel(&lead)))
}

/// POST /api/v1/market/region
pub async fn market_region(
    Json(payload): Json<RegionRequest>,
) -> Result<Json<MarketAnalysis>, AppError> {
    if payload.region.trim().is_empty() {
        return Err(AppError::BadRequest("Region cannot be empty".to_string()));
    }
    tracing::info!(
        "POST /market/region - region '{}', {} leads",
        payload.region,
        payload.leads.len()
    );
    Ok(Json(analyze_market_by_region(&payload.leads, &payload.region)))
}

/// POST /api/v1/market/cities
pub async fn market_cities(
    Json(payload): Json<CityRankingRequest>,
) -> Result<Json<Vec<CityOpportunity>>, AppError> {
    let limit = payload.limit.unwrap_or(DEFAULT_CITY_LIMIT);
    tracing::info!(
        "POST /market/cities - {} leads, limit {}",
        payload.leads.len(),
        limit
    );
    Ok(Json(rank_cities_by_opportunity(&payload.leads, limit)))
}

/// POST /api/v1/market/saturation
pub async fn market_saturation(
    Json(payload): Json<LeadBatchRequest>,
) -> Result<Json<Vec<CategorySaturation>>, AppError> {
    Ok(Json(analyze_category_saturation(&payload.leads)))
}

/// GET /api/v1/session
pub async fn session_snapshot(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    let session = state.session.lock().await;
    Json(session.snapshot())
}

/// GET /api/v1/session/extractions/:id
pub async fn extraction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExtractionSummary>, AppError> {
    let session = state.session.lock().await;
    session
        .extraction(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Extraction {} not found", id)))
}

/// POST /api/v1/session/ingest
///
/// Qualifies the batch, makes it the session's current batch and returns its summary.
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LeadBatchRequest>,
) -> Result<Json<ExtractionSummary>, AppError> {
    tracing::info!("POST /session/ingest - {} leads", payload.leads.len());
    validate_leads(&payload.leads)?;

    let mut session = state.session.lock().await;
    Ok(Json(session.ingest(payload.leads)))
}

/// POST /api/v1/session/reset
pub async fn reset(State(state): State<Arc<AppState>>) -> StatusCode {
    state.session.lock().await.reset();
    StatusCode::NO_CONTENT
}

/// POST /api/v1/assistant/chat
///
/// Always answers 200 once the request is valid; completion failures are
/// reported in the body's `error` field.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<AssistantResponse>, AppError> {
    if payload.message.trim().is_empty() {
        return Err(AppError::BadRequest("Message cannot be empty".to_string()));
    }
    tracing::info!(
        "POST /assistant/chat - {} history messages",
        payload.history.len()
    );

    let mut session = state.session.lock().await;
    let response = dispatcher::respond(
        &mut session,
        &state.completion,
        &payload.message,
        &payload.history,
    )
    .await;

    Ok(Json(response))
}
