//! HTTP request handlers for the API service.
//!
//! Input problems (unknown customer, missing plan/state/year) are answered
//! with `200 {"error": ...}`. Hosted-service failures are `502`; anything
//! else that aborts a request is `500`.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use homeshield_assistant::{
    Assistant, AssistantError, ClaimRequest, CoverageAssessment, CoverageRequest, Outcome, QaAnswer, QaRequest,
    ReindexReport, UpgradeReport, UpgradeRequest,
};
use homeshield_domain::Claim;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The coverage assistant
    pub assistant: Arc<Assistant>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok" when the server answers
    pub status: String,
    /// Vector index namespace in use
    pub namespace: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum ApiError {
    /// The assistant failed
    Assistant(AssistantError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Assistant(e) if e.is_upstream() => (StatusCode::BAD_GATEWAY, e.to_string()),
            ApiError::Assistant(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };
        error!("Request failed ({}): {}", status, message);

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

impl From<AssistantError> for ApiError {
    fn from(e: AssistantError) -> Self {
        ApiError::Assistant(e)
    }
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        namespace: state.assistant.namespace().to_string(),
    })
}

/// POST /qa - Answer a coverage question
async fn qa(
    State(state): State<AppState>,
    Json(request): Json<QaRequest>,
) -> Result<Json<Outcome<QaAnswer>>, ApiError> {
    Ok(Json(state.assistant.ask(&request).await?))
}

/// POST /claim - Submit and adjudicate a claim
async fn claim(
    State(state): State<AppState>,
    Json(request): Json<ClaimRequest>,
) -> Result<Json<Outcome<Claim>>, ApiError> {
    Ok(Json(state.assistant.submit_claim(&request).await?))
}

/// POST /coverage - Decide coverage for an issue
async fn coverage(
    State(state): State<AppState>,
    Json(request): Json<CoverageRequest>,
) -> Result<Json<Outcome<CoverageAssessment>>, ApiError> {
    Ok(Json(state.assistant.evaluate_issue(&request).await?))
}

/// POST /upgrades - Suggest alternative plans
async fn upgrades(
    State(state): State<AppState>,
    Json(request): Json<UpgradeRequest>,
) -> Result<Json<Outcome<UpgradeReport>>, ApiError> {
    Ok(Json(state.assistant.suggest_upgrades(&request).await?))
}

/// POST /reindex - Rebuild the namespace from the policy directory
async fn reindex(State(state): State<AppState>) -> Result<Json<ReindexReport>, ApiError> {
    let report = state.assistant.reindex().await?;
    info!("Reindexed {} chunks into '{}'", report.chunks, report.namespace);
    Ok(Json(report))
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route("/health", get(health_check))
        .route("/qa", post(qa))
        .route("/claim", post(claim))
        .route("/coverage", post(coverage))
        .route("/upgrades", post(upgrades))
        .route("/reindex", post(reindex))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use homeshield_assistant::{AssistantConfig, Collaborators};
    use homeshield_llm::MockProvider;
    use homeshield_store::{CsvCustomerTable, HashEmbedder, InMemoryIndex};
    use tower::ServiceExt; // for oneshot

    fn create_test_state(dir: &std::path::Path) -> AppState {
        let embedder = Arc::new(HashEmbedder::default());
        let collaborators = Collaborators {
            generation: Arc::new(MockProvider::default()),
            embedding: embedder.clone(),
            index: Arc::new(InMemoryIndex::new("handlers-test", embedder)),
            customers: Arc::new(CsvCustomerTable::new(dir.join("customers.csv"))),
        };
        let assistant = Assistant::new(collaborators, AssistantConfig::default(), dir.join("policies")).unwrap();
        AppState {
            assistant: Arc::new(assistant),
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(create_test_state(dir.path()));

        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_customer_table_is_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(create_test_state(dir.path()));

        let request = Request::builder()
            .method("POST")
            .uri("/claim")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"customer_id": "C00001", "message": "My AC stopped cooling"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_missing_policy_dir_is_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(create_test_state(dir.path()));

        let request = Request::builder()
            .method("POST")
            .uri("/reindex")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
