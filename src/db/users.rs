use chrono::Utc;
use secrecy::ExposeSecret;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::user::RegistrationRequest;
use crate::utils::password::hash_password;

/// Credential columns needed to verify a login.
#[derive(Debug, FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
}

pub async fn insert_user(
    pool: &PgPool,
    user_form: &RegistrationRequest,
) -> Result<Uuid, sqlx::Error> {
    let user_id = Uuid::new_v4();
    let now = Utc::now();

    // User row and its empty preference row are created atomically
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, password_hash, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(user_id)
    .bind(&user_form.username)
    .bind(&user_form.email)
    .bind(hash_password(user_form.password.expose_secret()))
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute user insert query: {:?}", e);
        e
    })?;

    sqlx::query(
        r#"
        INSERT INTO user_data_source_preferences (user_id, created_at, updated_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(user_id)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute preferences insert query: {:?}", e);
        e
    })?;

    tx.commit().await?;
    Ok(user_id)
}

pub async fn find_user_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<UserCredentials>, sqlx::Error> {
    sqlx::query_as::<_, UserCredentials>(
        r#"
        SELECT id, username, password_hash
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}
