use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::AppState;
use crate::metrics;
use crate::scoring::{self, Comparison, Summary};
use crate::session::SearchOutcome;

#[derive(Debug, Deserialize)]
pub struct CompareParams {
    pub test: Option<String>,
    /// Session to commit this search to; a fresh session is created when
    /// absent.
    pub session: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub session: Uuid,
    pub seq: u64,
    /// False when a newer search on the same session overtook this one
    /// before it resolved (latest search wins).
    pub committed: bool,
    pub city: String,
    pub test: String,
    pub total: usize,
    pub results: Vec<Comparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    /// Results are derived per search and never persisted; this marks when
    /// this set was computed.
    #[serde(rename = "generatedAt")]
    pub generated_at: DateTime<Utc>,
}

/// Handle GET /api/compare
///
/// Looks up the requested test, ranks the offerings best-first and commits
/// the outcome to the search session. An unknown test yields an empty
/// result set, not an error.
pub async fn compare_prices(
    State(state): State<AppState>,
    Query(params): Query<CompareParams>,
) -> Result<Json<CompareResponse>, AppError> {
    let started = Instant::now();
    metrics::record_request("/api/compare");

    let test = params
        .test
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            metrics::record_error("/api/compare", "invalid_request");
            AppError::InvalidRequest("Missing 'test' query parameter".to_string())
        })?
        .to_lowercase();

    let (session, seq) = state.sessions.begin(params.session, &test);

    let catalog = match state.catalog.catalog() {
        Ok(catalog) => catalog,
        Err(err) => {
            // The failure is committed to the session, never swallowed.
            let reason = err.to_string();
            state.sessions.resolve(
                session,
                seq,
                SearchOutcome::Failed {
                    reason: reason.clone(),
                },
            );
            metrics::record_search(&test, "failed");
            metrics::record_error("/api/compare", "catalog_unavailable");
            return Err(AppError::CatalogUnavailable(reason));
        }
    };

    let results = scoring::rank(catalog.lookup(&test));
    let summary = scoring::summarize(&results);

    let outcome = match &summary {
        Some(summary) => SearchOutcome::Results {
            results: results.clone(),
            summary: summary.clone(),
        },
        None => SearchOutcome::Empty,
    };
    metrics::record_search(&test, outcome.label());

    // A stale commit means a newer search on this session already started;
    // the session keeps the newer state and this response says so.
    let committed = state.sessions.resolve(session, seq, outcome);

    info!(
        %session,
        seq,
        test = %test,
        total = results.len(),
        committed,
        "Comparison search completed"
    );
    metrics::record_duration("/api/compare", started.elapsed());

    Ok(Json(CompareResponse {
        session,
        seq,
        committed,
        city: state.catalog.city().to_string(),
        total: results.len(),
        test,
        results,
        summary,
        generated_at: Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_state;

    fn params(test: &str) -> CompareParams {
        CompareParams {
            test: Some(test.to_string()),
            session: None,
        }
    }

    #[tokio::test]
    async fn test_compare_ranks_descending() {
        let state = test_state();
        let Json(body) = compare_prices(State(state), Query(params("thyroid panel")))
            .await
            .unwrap();

        assert_eq!(body.total, 4);
        assert!(body.committed);
        for pair in body.results.windows(2) {
            assert!(pair[0].overall_score >= pair[1].overall_score);
        }

        let summary = body.summary.unwrap();
        assert_eq!(summary.best_score, body.results[0].overall_score);
    }

    #[tokio::test]
    async fn test_compare_unknown_test_is_empty_set() {
        let state = test_state();
        let Json(body) = compare_prices(State(state), Query(params("mri scan")))
            .await
            .unwrap();

        assert_eq!(body.total, 0);
        assert!(body.results.is_empty());
        assert!(body.summary.is_none());
        assert!(body.committed);
    }

    #[tokio::test]
    async fn test_compare_missing_test_is_client_error() {
        let state = test_state();
        let err = compare_prices(
            State(state),
            Query(CompareParams {
                test: None,
                session: None,
            }),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_compare_reuses_session_and_bumps_seq() {
        let state = test_state();

        let Json(first) = compare_prices(State(state.clone()), Query(params("lipid profile")))
            .await
            .unwrap();
        assert_eq!(first.seq, 1);

        let Json(second) = compare_prices(
            State(state),
            Query(CompareParams {
                test: Some("thyroid panel".to_string()),
                session: Some(first.session),
            }),
        )
        .await
        .unwrap();

        assert_eq!(second.session, first.session);
        assert_eq!(second.seq, 2);
        assert!(second.committed);
    }

    #[tokio::test]
    async fn test_compare_catalog_failure_commits_failed_phase() {
        use crate::catalog::{Catalog, PriceSource};
        use crate::handlers::test_state_with_source;
        use crate::session::SearchPhase;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hospitals.json");
        let json = serde_json::to_string(Catalog::builtin("Surat").hospitals()).unwrap();
        std::fs::write(&path, json).unwrap();

        let state = test_state_with_source(PriceSource::File {
            city: "Surat".to_string(),
            path: path.clone(),
        });

        // A healthy data file serves normally.
        let Json(first) = compare_prices(State(state.clone()), Query(params("thyroid panel")))
            .await
            .unwrap();
        assert_eq!(first.total, 4);

        // Once the file vanishes the search fails loudly and the session
        // records the failure.
        std::fs::remove_file(&path).unwrap();
        let err = compare_prices(
            State(state.clone()),
            Query(CompareParams {
                test: Some("thyroid panel".to_string()),
                session: Some(first.session),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::CatalogUnavailable(_)));

        let session = state.sessions.get(&first.session).unwrap();
        assert_eq!(session.seq, 2);
        match &session.phase {
            SearchPhase::Failed { test, reason } => {
                assert_eq!(test, "thyroid panel");
                assert!(reason.contains("failed to read"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_compare_out_of_pocket_invariant() {
        let state = test_state();
        let Json(body) = compare_prices(State(state), Query(params("complete blood count (cbc)")))
            .await
            .unwrap();

        for result in &body.results {
            assert!(result.out_of_pocket <= result.base_price);
            assert_eq!(result.savings, result.base_price - result.out_of_pocket);
            assert!(result.overall_score <= 100);
        }
    }
}
