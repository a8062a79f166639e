use axum::{extract::rejection::JsonRejection, Json};
use std::time::Instant;
use tracing::info;

use crate::error::AppError;
use crate::metrics;
use crate::risk::{self, RiskAssessment, RiskRequest};

/// Handle POST /api/risk-assessment
///
/// Validates the four required numeric fields explicitly so a missing value
/// surfaces as a 400 with a message rather than a body rejection. Non-POST
/// methods are rejected by the router's method routing.
pub async fn assess_risk(
    payload: Result<Json<RiskRequest>, JsonRejection>,
) -> Result<Json<RiskAssessment>, AppError> {
    let started = Instant::now();
    metrics::record_request("/api/risk-assessment");

    let Json(request) = payload.map_err(|rejection| {
        metrics::record_error("/api/risk-assessment", "invalid_request");
        AppError::InvalidRequest(rejection.body_text())
    })?;

    let factors = request.validate().map_err(|msg| {
        metrics::record_error("/api/risk-assessment", "invalid_request");
        AppError::InvalidRequest(msg)
    })?;

    let assessment = risk::assess(&factors);
    info!(
        score = assessment.risk_score,
        level = ?assessment.risk_level,
        "Risk assessment computed"
    );
    metrics::record_duration("/api/risk-assessment", started.elapsed());

    Ok(Json(assessment))
}
