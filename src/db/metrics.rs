use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::metrics::{HealthCategory, HealthMetricRecord, MetricType, UnifiedMetric};

/// Insert one normalized metric. Returns false when the row already existed:
/// (user_id, metric_type, source_type, recorded_at) is the idempotency key,
/// so re-submitting the same observation is a no-op.
pub async fn insert_metric(
    pool: &PgPool,
    user_id: Uuid,
    metric: &UnifiedMetric,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO health_metrics (
            user_id, metric_type, value, unit, source_type, recorded_at,
            source_app, device_name, metadata, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (user_id, metric_type, source_type, recorded_at) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(metric.metric_type.as_str())
    .bind(metric.value)
    .bind(&metric.unit)
    .bind(&metric.source_type)
    .bind(metric.recorded_at)
    .bind(&metric.source_app)
    .bind(&metric.device_name)
    .bind(metric.metadata.as_ref().map(Json))
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Metrics for a set of types in a time range, ascending by observation time.
/// `source_type` narrows to one provider when the caller resolved a preference.
pub async fn query_metrics(
    pool: &PgPool,
    user_id: Uuid,
    metric_types: &[MetricType],
    source_type: Option<&str>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<Vec<HealthMetricRecord>, sqlx::Error> {
    let type_tags: Vec<String> = metric_types.iter().map(|t| t.to_string()).collect();

    sqlx::query_as::<_, HealthMetricRecord>(
        r#"
        SELECT id, user_id, metric_type, value, unit, source_type, recorded_at,
               source_app, device_name, metadata, created_at
        FROM health_metrics
        WHERE user_id = $1
          AND metric_type = ANY($2)
          AND ($3::text IS NULL OR source_type = $3)
          AND ($4::timestamptz IS NULL OR recorded_at >= $4)
          AND ($5::timestamptz IS NULL OR recorded_at <= $5)
        ORDER BY recorded_at ASC
        "#,
    )
    .bind(user_id)
    .bind(&type_tags)
    .bind(source_type)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

/// Distinct providers that have reported at least one metric in the category.
pub async fn connected_sources(
    pool: &PgPool,
    user_id: Uuid,
    category: HealthCategory,
) -> Result<Vec<String>, sqlx::Error> {
    let type_tags: Vec<String> = MetricType::for_category(category)
        .iter()
        .map(|t| t.to_string())
        .collect();

    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT DISTINCT source_type
        FROM health_metrics
        WHERE user_id = $1 AND metric_type = ANY($2)
        ORDER BY source_type ASC
        "#,
    )
    .bind(user_id)
    .bind(&type_tags)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(source,)| source).collect())
}

/// Whether a provider has any ingested data for the category.
pub async fn source_has_data(
    pool: &PgPool,
    user_id: Uuid,
    category: HealthCategory,
    source_type: &str,
) -> Result<bool, sqlx::Error> {
    let type_tags: Vec<String> = MetricType::for_category(category)
        .iter()
        .map(|t| t.to_string())
        .collect();

    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        SELECT 1::bigint
        FROM health_metrics
        WHERE user_id = $1 AND metric_type = ANY($2) AND source_type = $3
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(&type_tags)
    .bind(source_type)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// Fallback for the preference resolver: the provider that synced data for
/// the category most recently. Ties break on source name, so the result is
/// deterministic across calls.
pub async fn latest_synced_source(
    pool: &PgPool,
    user_id: Uuid,
    category: HealthCategory,
) -> Result<Option<String>, sqlx::Error> {
    let type_tags: Vec<String> = MetricType::for_category(category)
        .iter()
        .map(|t| t.to_string())
        .collect();

    let row: Option<(String,)> = sqlx::query_as(
        r#"
        SELECT source_type
        FROM health_metrics
        WHERE user_id = $1 AND metric_type = ANY($2)
        GROUP BY source_type
        ORDER BY MAX(created_at) DESC, source_type ASC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(&type_tags)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(source,)| source))
}
