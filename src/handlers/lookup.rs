use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::catalog::{HospitalRecord, PricedHospital};
use crate::error::AppError;
use crate::handlers::AppState;
use crate::metrics;

#[derive(Debug, Deserialize)]
pub struct LookupParams {
    pub test: Option<String>,
}

/// Either a plain directory entry or one annotated with a resolved price,
/// depending on whether a test name was supplied.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LookupHospital {
    Priced(PricedHospital),
    Plain(HospitalRecord),
}

#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub city: String,
    pub test: Option<String>,
    pub total: usize,
    pub hospitals: Vec<LookupHospital>,
}

/// Handle GET /api/hospitals
///
/// With `?test=<name>` the response is filtered to hospitals whose price
/// table contains the test, each annotated with its price. Without it the
/// full directory is returned unfiltered.
pub async fn lookup_hospitals(
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> Result<Json<LookupResponse>, AppError> {
    let started = Instant::now();
    metrics::record_request("/api/hospitals");

    let test = params
        .test
        .as_deref()
        .map(str::to_lowercase)
        .filter(|t| !t.is_empty());

    let catalog = state.catalog.catalog().map_err(|err| {
        metrics::record_error("/api/hospitals", "catalog_unavailable");
        AppError::from(err)
    })?;

    let hospitals: Vec<LookupHospital> = match &test {
        Some(test) => catalog
            .lookup(test)
            .into_iter()
            .map(LookupHospital::Priced)
            .collect(),
        None => catalog
            .hospitals()
            .iter()
            .cloned()
            .map(LookupHospital::Plain)
            .collect(),
    };

    debug!(
        test = test.as_deref().unwrap_or("<none>"),
        total = hospitals.len(),
        "Hospital lookup"
    );
    metrics::record_duration("/api/hospitals", started.elapsed());

    Ok(Json(LookupResponse {
        city: state.catalog.city().to_string(),
        test,
        total: hospitals.len(),
        hospitals,
    }))
}
