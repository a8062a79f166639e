use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use std::time::Instant;
use tracing::debug;

use crate::error::AppError;
use crate::handlers::AppState;
use crate::metrics;
use crate::recommend::{self, Recommendation, RecommendQuery};

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub engine: &'static str,
    pub recommendations: Vec<Recommendation>,
}

/// Handle GET /api/recommendations (query parameters)
pub async fn recommendations_get(
    State(state): State<AppState>,
    Query(query): Query<RecommendQuery>,
) -> Result<Json<RecommendResponse>, AppError> {
    respond(&state, query)
}

/// Handle POST /api/recommendations (JSON body, all fields optional)
pub async fn recommendations_post(
    State(state): State<AppState>,
    payload: Option<Json<RecommendQuery>>,
) -> Result<Json<RecommendResponse>, AppError> {
    let query = payload.map(|Json(q)| q).unwrap_or_default();
    respond(&state, query)
}

fn respond(state: &AppState, query: RecommendQuery) -> Result<Json<RecommendResponse>, AppError> {
    let started = Instant::now();
    metrics::record_request("/api/recommendations");

    let catalog = state.catalog.catalog().map_err(|err| {
        metrics::record_error("/api/recommendations", "catalog_unavailable");
        AppError::from(err)
    })?;

    let recommendations = recommend::recommend(&query, &catalog);
    debug!(
        age = ?query.age,
        focus = query.focus.as_deref().unwrap_or("<none>"),
        total = recommendations.len(),
        "Recommendations computed"
    );
    metrics::record_duration("/api/recommendations", started.elapsed());

    Ok(Json(RecommendResponse {
        engine: "rule-based",
        recommendations,
    }))
}
