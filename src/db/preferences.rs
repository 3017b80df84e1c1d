use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::metrics::latest_synced_source;
use crate::models::metrics::HealthCategory;
use crate::models::preferences::UserDataSourcePreferences;

pub async fn get_preferences(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Option<UserDataSourcePreferences>, sqlx::Error> {
    sqlx::query_as::<_, UserDataSourcePreferences>(
        r#"
        SELECT user_id, activity_source, sleep_source, nutrition_source,
               body_composition_source, heart_health_source, created_at, updated_at
        FROM user_data_source_preferences
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Write one category's preferred source. Upserts so accounts created before
/// the preferences table existed still get a row. Last write wins.
pub async fn set_preferred_source(
    pool: &PgPool,
    user_id: Uuid,
    category: HealthCategory,
    source_type: &str,
) -> Result<(), sqlx::Error> {
    let column = match category.preference_category() {
        HealthCategory::Activity | HealthCategory::Workouts => "activity_source",
        HealthCategory::Sleep => "sleep_source",
        HealthCategory::Nutrition => "nutrition_source",
        HealthCategory::BodyComposition => "body_composition_source",
        HealthCategory::HeartHealth => "heart_health_source",
    };

    // Column name comes from the match above, never from user input
    let query = format!(
        r#"
        INSERT INTO user_data_source_preferences (user_id, {column}, created_at, updated_at)
        VALUES ($1, $2, $3, $3)
        ON CONFLICT (user_id)
        DO UPDATE SET {column} = $2, updated_at = $3
        "#,
        column = column
    );

    sqlx::query(&query)
        .bind(user_id)
        .bind(source_type)
        .bind(Utc::now())
        .execute(pool)
        .await?;

    Ok(())
}

/// Decide which provider is authoritative for a category.
///
/// The stored preference wins (workouts reads the activity field). When the
/// user never chose one, fall back to the provider that synced data for the
/// category most recently; None when nothing was ever ingested.
pub async fn resolve_source(
    pool: &PgPool,
    user_id: Uuid,
    category: HealthCategory,
) -> Result<Option<String>, sqlx::Error> {
    if let Some(prefs) = get_preferences(pool, user_id).await? {
        if let Some(source) = prefs.source_for(category) {
            return Ok(Some(source.to_string()));
        }
    }

    latest_synced_source(pool, user_id, category).await
}
