use reqwest::Client;
use serde_json::json;
use uuid::Uuid;

mod common;
use common::utils::spawn_app;

#[tokio::test]
async fn register_user_returns_200_and_creates_preference_row() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let username = format!("user{}", Uuid::new_v4());
    let body = json!({
        "username": username,
        "email": format!("{}@example.com", username),
        "password": "password123"
    });

    let response = client
        .post(&format!("{}/register_user", &test_app.address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());

    let saved = sqlx::query_as::<_, (String,)>(
        "SELECT username FROM users WHERE username = $1"
    )
    .bind(&username)
    .fetch_one(&test_app.db_pool)
    .await
    .expect("Failed to fetch saved user.");
    assert_eq!(saved.0, username);

    // Registration also creates the empty source-preference row
    let prefs = sqlx::query_as::<_, (Option<String>,)>(
        r#"
        SELECT p.activity_source
        FROM user_data_source_preferences p
        JOIN users u ON u.id = p.user_id
        WHERE u.username = $1
        "#
    )
    .bind(&username)
    .fetch_one(&test_app.db_pool)
    .await
    .expect("Failed to fetch preference row.");
    assert!(prefs.0.is_none());
}

#[tokio::test]
async fn register_user_with_taken_username_returns_409() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let username = format!("user{}", Uuid::new_v4());
    let body = json!({
        "username": username,
        "email": format!("{}@example.com", username),
        "password": "password123"
    });

    let first = client
        .post(&format!("{}/register_user", &test_app.address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.");
    assert!(first.status().is_success());

    let second = client
        .post(&format!("{}/register_user", &test_app.address))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(second.status().as_u16(), 409);
}
