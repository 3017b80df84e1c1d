use reqwest::Client;
use serde_json::json;

mod common;
use common::utils::{create_test_user_and_login, make_authenticated_request, spawn_app};

async fn sync_one(
    client: &Client,
    address: &str,
    token: &str,
    metric_type: &str,
    source_type: &str,
    recorded_at: &str,
) {
    let response = make_authenticated_request(
        client,
        reqwest::Method::POST,
        &format!("{}/health/sync", address),
        token,
        Some(json!({
            "metrics": [{
                "metric_type": metric_type,
                "value": 42,
                "source_type": source_type,
                "recorded_at": recorded_at
            }]
        })),
    ).await;
    assert!(response.status().is_success());
}

#[tokio::test]
async fn new_accounts_have_no_preferred_sources() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let test_user = create_test_user_and_login(&test_app.address).await;

    let response = make_authenticated_request(
        &client,
        reqwest::Method::GET,
        &format!("{}/health/preferences", &test_app.address),
        &test_user.token,
        None,
    ).await;

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], true);
    assert!(body["data"]["activity_source"].is_null());
    assert!(body["data"]["sleep_source"].is_null());
    assert!(body["data"]["body_composition_source"].is_null());
}

#[tokio::test]
async fn preferring_a_source_without_connected_data_is_rejected() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let test_user = create_test_user_and_login(&test_app.address).await;

    let response = make_authenticated_request(
        &client,
        reqwest::Method::PUT,
        &format!("{}/health/preferences", &test_app.address),
        &test_user.token,
        Some(json!({
            "category": "body_composition",
            "source_type": "withings"
        })),
    ).await;

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("withings"));
}

#[tokio::test]
async fn preference_update_is_visible_to_the_next_read() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let test_user = create_test_user_and_login(&test_app.address).await;

    sync_one(
        &client, &test_app.address, &test_user.token,
        "body_weight", "withings", "2024-01-01T07:00:00Z",
    ).await;

    let update = make_authenticated_request(
        &client,
        reqwest::Method::PUT,
        &format!("{}/health/preferences", &test_app.address),
        &test_user.token,
        Some(json!({
            "category": "body_composition",
            "source_type": "withings"
        })),
    ).await;
    assert!(update.status().is_success());

    let read = make_authenticated_request(
        &client,
        reqwest::Method::GET,
        &format!("{}/health/preferences", &test_app.address),
        &test_user.token,
        None,
    ).await;
    let body: serde_json::Value = read.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["body_composition_source"], "withings");
}

#[tokio::test]
async fn queries_follow_the_preferred_source_once_set() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let test_user = create_test_user_and_login(&test_app.address).await;

    // Two providers report body composition; withings first, healthkit later
    sync_one(
        &client, &test_app.address, &test_user.token,
        "body_weight", "withings", "2024-01-01T07:00:00Z",
    ).await;
    sync_one(
        &client, &test_app.address, &test_user.token,
        "body_weight", "healthkit", "2024-01-01T08:00:00Z",
    ).await;

    let update = make_authenticated_request(
        &client,
        reqwest::Method::PUT,
        &format!("{}/health/preferences", &test_app.address),
        &test_user.token,
        Some(json!({
            "category": "body_composition",
            "source_type": "withings"
        })),
    ).await;
    assert!(update.status().is_success());

    let response = make_authenticated_request(
        &client,
        reqwest::Method::GET,
        &format!("{}/health/metrics?category=body_composition", &test_app.address),
        &test_user.token,
        None,
    ).await;
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["source"], "withings");
    let metrics = body["data"]["metrics"].as_array().unwrap();
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0]["source_type"], "withings");
}

#[tokio::test]
async fn unset_preference_falls_back_to_most_recently_synced_source() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let test_user = create_test_user_and_login(&test_app.address).await;

    sync_one(
        &client, &test_app.address, &test_user.token,
        "body_weight", "withings", "2024-01-01T07:00:00Z",
    ).await;
    sync_one(
        &client, &test_app.address, &test_user.token,
        "body_weight", "csv", "2024-01-01T09:00:00Z",
    ).await;

    // No preference set: csv synced last and wins the fallback
    let response = make_authenticated_request(
        &client,
        reqwest::Method::GET,
        &format!("{}/health/metrics?category=body_composition", &test_app.address),
        &test_user.token,
        None,
    ).await;
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["source"], "csv");

    // The fallback is deterministic across calls
    let again = make_authenticated_request(
        &client,
        reqwest::Method::GET,
        &format!("{}/health/metrics?category=body_composition", &test_app.address),
        &test_user.token,
        None,
    ).await;
    let again: serde_json::Value = again.json().await.expect("Failed to parse response");
    assert_eq!(again["data"]["source"], "csv");
}

#[tokio::test]
async fn workouts_category_has_no_preference_of_its_own() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let test_user = create_test_user_and_login(&test_app.address).await;

    sync_one(
        &client, &test_app.address, &test_user.token,
        "activity_steps", "healthkit", "2024-01-01T00:00:00Z",
    ).await;

    let response = make_authenticated_request(
        &client,
        reqwest::Method::PUT,
        &format!("{}/health/preferences", &test_app.address),
        &test_user.token,
        Some(json!({
            "category": "workouts",
            "source_type": "healthkit"
        })),
    ).await;

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert!(body["error"].as_str().unwrap().contains("activity"));
}

#[tokio::test]
async fn workout_queries_resolve_via_the_activity_preference() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let test_user = create_test_user_and_login(&test_app.address).await;

    // Activity data from two providers, workout data from both too
    sync_one(
        &client, &test_app.address, &test_user.token,
        "activity_steps", "oura", "2024-01-01T00:00:00Z",
    ).await;
    sync_one(
        &client, &test_app.address, &test_user.token,
        "activity_steps", "healthkit", "2024-01-01T01:00:00Z",
    ).await;
    sync_one(
        &client, &test_app.address, &test_user.token,
        "workout_duration", "oura", "2024-01-01T07:00:00Z",
    ).await;
    sync_one(
        &client, &test_app.address, &test_user.token,
        "workout_duration", "healthkit", "2024-01-01T08:00:00Z",
    ).await;

    let update = make_authenticated_request(
        &client,
        reqwest::Method::PUT,
        &format!("{}/health/preferences", &test_app.address),
        &test_user.token,
        Some(json!({
            "category": "activity",
            "source_type": "oura"
        })),
    ).await;
    assert!(update.status().is_success());

    let response = make_authenticated_request(
        &client,
        reqwest::Method::GET,
        &format!("{}/health/metrics?category=workouts", &test_app.address),
        &test_user.token,
        None,
    ).await;
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["source"], "oura");
    let metrics = body["data"]["metrics"].as_array().unwrap();
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0]["metric_type"], "workout_duration");
}

#[tokio::test]
async fn connected_sources_reflect_ingested_data_per_category() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let test_user = create_test_user_and_login(&test_app.address).await;

    sync_one(
        &client, &test_app.address, &test_user.token,
        "body_weight", "withings", "2024-01-01T07:00:00Z",
    ).await;
    sync_one(
        &client, &test_app.address, &test_user.token,
        "body_weight", "healthkit", "2024-01-01T08:00:00Z",
    ).await;
    sync_one(
        &client, &test_app.address, &test_user.token,
        "sleep_duration", "oura", "2024-01-02T00:00:00Z",
    ).await;

    let response = make_authenticated_request(
        &client,
        reqwest::Method::GET,
        &format!("{}/health/sources", &test_app.address),
        &test_user.token,
        None,
    ).await;

    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    let categories = body["data"]["categories"].as_array().unwrap();

    let body_comp = categories
        .iter()
        .find(|c| c["category"] == "body_composition")
        .unwrap();
    let connected: Vec<&str> = body_comp["connected_sources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap())
        .collect();
    assert_eq!(connected, vec!["healthkit", "withings"]);
    assert!(body_comp["preferred_source"].is_null());

    let sleep = categories.iter().find(|c| c["category"] == "sleep").unwrap();
    assert_eq!(sleep["resolved_source"], "oura");

    let nutrition = categories
        .iter()
        .find(|c| c["category"] == "nutrition")
        .unwrap();
    assert_eq!(nutrition["connected_sources"].as_array().unwrap().len(), 0);
    assert!(nutrition["resolved_source"].is_null());
}
