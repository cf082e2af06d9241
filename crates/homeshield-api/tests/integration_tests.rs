//! Integration tests for the API service

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use homeshield_api::handlers::{create_router, AppState, ErrorResponse, HealthResponse};
use homeshield_assistant::{Assistant, AssistantConfig, Collaborators};
use homeshield_llm::MockProvider;
use homeshield_store::{CsvCustomerTable, HashEmbedder, InMemoryIndex};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt; // for oneshot

const CUSTOMERS: &str = "\
customer_id,first_name,plan,state,effective_date,policy_file
C00001,Ana,Gold,TX,2024-01-01,LHG_Gold_TX_2024.txt
C00002,Ben,Silver,TX,2024-01-01,LHG_Silver_TX_2024.txt
";

const POLICIES: [(&str, &str); 3] = [
    (
        "LHG_Gold_TX_2024.txt",
        "Air conditioning systems are covered, including the compressor and condenser.",
    ),
    (
        "LHG_Silver_TX_2024.txt",
        "Air conditioning units are not covered under this plan.",
    ),
    (
        "LHG_Platinum_TX_2024.txt",
        "Air conditioning is covered. Exclusions: window units.",
    ),
];

/// Helper to create test application state with an indexed policy set
async fn create_test_state(llm: MockProvider) -> (AppState, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let policy_dir = dir.path().join("policies_docs");
    std::fs::create_dir(&policy_dir).unwrap();
    for (name, text) in POLICIES {
        std::fs::write(policy_dir.join(name), text).unwrap();
    }
    let customers_csv = dir.path().join("customers.csv");
    std::fs::write(&customers_csv, CUSTOMERS).unwrap();

    let embedder = Arc::new(HashEmbedder::default());
    let collaborators = Collaborators {
        generation: Arc::new(llm),
        embedding: embedder.clone(),
        index: Arc::new(InMemoryIndex::new("api-test", embedder)),
        customers: Arc::new(CsvCustomerTable::new(customers_csv)),
    };
    let assistant = Assistant::new(collaborators, AssistantConfig::default(), policy_dir).unwrap();
    assistant.reindex().await.unwrap();

    let state = AppState {
        assistant: Arc::new(assistant),
    };
    (state, dir)
}

fn scripted_llm() -> MockProvider {
    let mut llm = MockProvider::default();
    llm.add_response(
        "stopped cooling yesterday",
        r#"{"appliance": "AC", "issue": "stopped cooling", "failure_date": "2025-06-01"}"#,
    );
    llm.add_response(
        "Exclusions: window units",
        r#"{"covered": "yes", "reason": "Central air is covered."}"#,
    );
    llm
}

async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_check_endpoint() {
    let (state, _dir) = create_test_state(scripted_llm()).await;
    let app = create_router(state);

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let health: HealthResponse = serde_json::from_slice(&body).unwrap();

    assert_eq!(health.status, "ok");
    assert_eq!(health.namespace, "api-test");
}

#[tokio::test]
async fn test_reindex_endpoint() {
    let (state, _dir) = create_test_state(scripted_llm()).await;
    let app = create_router(state);

    let (status, report) = post_json(app, "/reindex", "{}").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["cleared"], true);
    assert_eq!(report["chunks"], POLICIES.len());
    assert_eq!(report["namespace"], "api-test");
}

#[tokio::test]
async fn test_claim_covered() {
    let (state, _dir) = create_test_state(scripted_llm()).await;
    let app = create_router(state);

    let (status, claim) = post_json(
        app,
        "/claim",
        r#"{"customer_id": "C00001", "message": "My AC stopped cooling yesterday"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(claim["claim_id"].as_str().unwrap().starts_with("CLM-"));
    assert_eq!(claim["extraction"]["appliance"], "AC");
    assert_eq!(claim["extraction"]["failure_date"], "2025-06-01");
    assert_eq!(claim["decision"], "covered");
    assert_eq!(claim["citations"][0]["source"], "LHG_Gold_TX_2024.txt");
    assert!(claim.get("error").is_none());
}

#[tokio::test]
async fn test_claim_unknown_customer_is_soft_error() {
    let (state, _dir) = create_test_state(scripted_llm()).await;
    let app = create_router(state);

    let (status, body) = post_json(
        app,
        "/claim",
        r#"{"customer_id": "C99999", "message": "My AC stopped cooling yesterday"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let error: ErrorResponse = serde_json::from_value(body).unwrap();
    assert_eq!(error.error, "customer_id C99999 not found");
}

#[tokio::test]
async fn test_claim_upstream_failure_is_bad_gateway() {
    let mut llm = MockProvider::default();
    llm.add_error("stopped cooling yesterday");
    let (state, _dir) = create_test_state(llm).await;
    let app = create_router(state);

    let (status, body) = post_json(
        app,
        "/claim",
        r#"{"customer_id": "C00001", "message": "My AC stopped cooling yesterday"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_qa_without_routing_is_soft_error() {
    let (state, _dir) = create_test_state(scripted_llm()).await;
    let app = create_router(state);

    let (status, body) = post_json(app, "/qa", r#"{"question": "Is my AC covered?"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "Provide plan/state/year or customer_id.");
}

#[tokio::test]
async fn test_qa_for_customer() {
    let mut llm = MockProvider::default();
    llm.add_response(
        "Is my AC covered?",
        r#"{"answer": "Yes, AC is covered.", "citations": [{"source": "LHG_Gold_TX_2024.txt", "page": 1, "quote": "Air conditioning systems are covered"}]}"#,
    );
    let (state, _dir) = create_test_state(llm).await;
    let app = create_router(state);

    let (status, body) = post_json(
        app,
        "/qa",
        r#"{"question": "Is my AC covered?", "customer_id": "C00001"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Yes, AC is covered.");
    assert_eq!(body["citations"][0]["page"], 1);
}

#[tokio::test]
async fn test_coverage_with_explicit_routing() {
    let llm = scripted_llm();
    let (state, _dir) = create_test_state(llm.clone()).await;
    let app = create_router(state);

    let (status, body) = post_json(
        app,
        "/coverage",
        r#"{"issue": "AC not cooling", "plan": "Silver", "state": "TX", "year": 2024}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["covered"], false);
    assert!(!body["citations"].as_array().unwrap().is_empty());
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_upgrades_for_customer() {
    let (state, _dir) = create_test_state(scripted_llm()).await;
    let app = create_router(state);

    let (status, body) = post_json(
        app,
        "/upgrades",
        r#"{"issue": "AC stopped cooling", "customer_id": "C00002"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_plan"], "Silver");
    let plans: Vec<&str> = body["suggestions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["plan"].as_str().unwrap())
        .collect();
    assert_eq!(plans, vec!["Gold", "Platinum"]);
}
