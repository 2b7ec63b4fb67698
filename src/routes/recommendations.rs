use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{RankedTutor, Recommendation},
    routes::AppState,
    services::recommendation,
};

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub assessment_id: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub ok: bool,
    pub saved: usize,
    pub top: Vec<RankedTutor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Handler for the recommendation generation endpoint
pub async fn generate(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<GenerateRequest>,
) -> AppResult<Json<GenerateResponse>> {
    let raw = request.assessment_id.trim();
    if raw.is_empty() {
        return Err(AppError::invalid_input("assessment_id is required"));
    }

    let assessment_id = Uuid::parse_str(raw).map_err(|_| {
        AppError::invalid_input(format!("assessment_id {:?} is not a valid id", raw))
    })?;

    tracing::info!(
        request_id = %request_id,
        assessment_id = %assessment_id,
        "Processing recommendation request"
    );

    let outcome = recommendation::generate_recommendations(
        state.repo.as_ref(),
        &state.settings,
        assessment_id,
    )
    .await?;

    tracing::info!(
        request_id = %request_id,
        saved = outcome.saved,
        "Recommendation request completed"
    );

    Ok(Json(GenerateResponse {
        ok: true,
        saved: outcome.saved,
        top: outcome.top,
        reason: outcome.reason,
    }))
}

/// Handler for reading back the stored recommendation set
pub async fn list(
    State(state): State<AppState>,
    Path(assessment_id): Path<Uuid>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let stored = state.repo.get_recommendations(assessment_id).await?;
    Ok(Json(stored))
}
