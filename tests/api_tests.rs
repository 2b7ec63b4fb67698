use std::sync::Arc;

use axum_test::TestServer;
use serde_json::json;
use uuid::Uuid;

use matchstudy_api::db::InMemoryRepository;
use matchstudy_api::models::{Assessment, Modality, TagWeight, TutorProfile};
use matchstudy_api::routes::{create_router, AppState};
use matchstudy_api::services::recommendation::EngineSettings;

fn create_test_server(repo: Arc<InMemoryRepository>) -> TestServer {
    let state = AppState {
        repo,
        settings: EngineSettings::default(),
    };
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

fn assessment(id: Uuid, modality: Modality) -> Assessment {
    Assessment {
        id,
        student_email: "student@example.com".to_string(),
        modality,
        budget_min: None,
        budget_max: None,
    }
}

fn tutor(email: &str, modality: Modality) -> TutorProfile {
    TutorProfile {
        email: email.to_string(),
        active: true,
        modality,
        hourly_rate_min: None,
        hourly_rate_max: None,
    }
}

async fn seed_full_scenario(repo: &InMemoryRepository) -> Uuid {
    let id = Uuid::new_v4();
    repo.insert_assessment(assessment(id, Modality::Online)).await;
    repo.insert_assessment_tags(
        id,
        vec![
            TagWeight {
                tag_id: 1,
                weight: None,
            },
            TagWeight {
                tag_id: 2,
                weight: None,
            },
        ],
    )
    .await;

    repo.insert_tutor(tutor("exact@example.com", Modality::Online), vec![(1, None), (2, None)])
        .await;
    repo.insert_tutor(tutor("partial@example.com", Modality::Ambos), vec![(1, None)])
        .await;
    repo.insert_tutor(tutor("disjoint@example.com", Modality::Online), vec![(7, None)])
        .await;

    id
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(Arc::new(InMemoryRepository::new()));
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_generate_recommendations_flow() {
    let repo = Arc::new(InMemoryRepository::new());
    let id = seed_full_scenario(&repo).await;
    let server = create_test_server(repo.clone());

    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "assessment_id": id.to_string() }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["saved"], 2);
    assert!(body.get("reason").is_none());

    let top = body["top"].as_array().unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0]["tutor_email"], "exact@example.com");
    assert_eq!(top[1]["tutor_email"], "partial@example.com");
    assert!(top[0]["score"].as_f64().unwrap() > top[1]["score"].as_f64().unwrap());

    // The stored set is readable through the read-back endpoint
    let response = server
        .get(&format!("/api/v1/assessments/{}/recommendations", id))
        .await;
    response.assert_status_ok();

    let stored: Vec<serde_json::Value> = response.json();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0]["tutor_email"], "exact@example.com");
    assert_eq!(stored[0]["model_version"], "tags-cosine-v1");
}

#[tokio::test]
async fn test_generate_with_blank_assessment_id() {
    let server = create_test_server(Arc::new(InMemoryRepository::new()));

    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "assessment_id": "  " }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("required"));
}

#[tokio::test]
async fn test_generate_with_malformed_assessment_id() {
    let server = create_test_server(Arc::new(InMemoryRepository::new()));

    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "assessment_id": "not-a-uuid" }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_with_unknown_assessment() {
    let server = create_test_server(Arc::new(InMemoryRepository::new()));

    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "assessment_id": Uuid::new_v4().to_string() }))
        .await;
    response.assert_status(axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_generate_with_no_tags_returns_hint() {
    let repo = Arc::new(InMemoryRepository::new());
    let id = Uuid::new_v4();
    repo.insert_assessment(assessment(id, Modality::Online)).await;
    let server = create_test_server(repo);

    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "assessment_id": id.to_string() }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("tag weights"));
    assert!(body["hint"].as_str().is_some());
}

#[tokio::test]
async fn test_generate_with_no_active_tutors() {
    let repo = Arc::new(InMemoryRepository::new());
    let id = Uuid::new_v4();
    repo.insert_assessment(assessment(id, Modality::Online)).await;
    repo.insert_assessment_tags(
        id,
        vec![TagWeight {
            tag_id: 1,
            weight: None,
        }],
    )
    .await;

    // An inactive tutor is not a candidate
    let mut inactive = tutor("inactive@example.com", Modality::Online);
    inactive.active = false;
    repo.insert_tutor(inactive, vec![(1, None)]).await;

    let server = create_test_server(repo);

    let response = server
        .post("/api/v1/recommendations")
        .json(&json!({ "assessment_id": id.to_string() }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["ok"], true);
    assert_eq!(body["saved"], 0);
    assert_eq!(body["reason"], "no active tutors");
}

#[tokio::test]
async fn test_read_back_empty_set() {
    let server = create_test_server(Arc::new(InMemoryRepository::new()));

    let response = server
        .get(&format!("/api/v1/assessments/{}/recommendations", Uuid::new_v4()))
        .await;
    response.assert_status_ok();

    let stored: Vec<serde_json::Value> = response.json();
    assert!(stored.is_empty());
}
