use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::handlers::metrics::sync_metrics::persist_metrics;
use crate::mappers::{csv, healthkit, oura, withings};
use crate::middleware::auth::Claims;
use crate::models::metrics::UnifiedMetric;

/// Raw HealthKit payload from the iOS client: quantity samples, sleep
/// analysis intervals, and workout sessions in one request.
#[derive(Debug, Deserialize)]
pub struct HealthKitImportRequest {
    #[serde(default)]
    pub quantity_samples: Vec<healthkit::QuantitySample>,
    #[serde(default)]
    pub sleep_samples: Vec<healthkit::SleepSegment>,
    #[serde(default)]
    pub workouts: Vec<healthkit::WorkoutSample>,
}

#[derive(Debug, Deserialize)]
pub struct WithingsImportRequest {
    #[serde(default)]
    pub measure_groups: Vec<withings::MeasureGroup>,
    #[serde(default)]
    pub activity_summaries: Vec<withings::ActivitySummary>,
    #[serde(default)]
    pub sleep_summaries: Vec<withings::SleepSummary>,
}

#[derive(Debug, Deserialize)]
pub struct OuraImportRequest {
    #[serde(default)]
    pub daily_activity: Vec<oura::DailyActivity>,
    #[serde(default)]
    pub sleep_periods: Vec<oura::SleepPeriod>,
}

#[derive(Debug, Deserialize)]
pub struct CsvImportRequest {
    pub rows: Vec<csv::CsvMetricRow>,
}

fn parse_user_id(claims: &Claims) -> Result<Uuid, HttpResponse> {
    claims.user_id().ok_or_else(|| {
        tracing::error!("Failed to parse user ID from claims");
        HttpResponse::InternalServerError().json(json!({
            "status": "error",
            "message": "Invalid user ID"
        }))
    })
}

/// Mapping already dropped unrecognized/malformed samples, so the batch
/// total is the number of normalized metrics going into the store.
async fn persist_mapped(
    pool: &PgPool,
    user_id: Uuid,
    metrics: Vec<UnifiedMetric>,
) -> HttpResponse {
    let total_count = metrics.len();
    let indexed = metrics.into_iter().enumerate().collect();
    let response = persist_metrics(pool, user_id, indexed, Vec::new(), total_count).await;
    tracing::info!(
        "Provider import {} finished: {}/{} processed",
        response.sync_id,
        response.processed_count,
        response.total_count
    );
    HttpResponse::Ok().json(response)
}

#[tracing::instrument(
    name = "Import HealthKit payload",
    skip(body, pool, claims),
    fields(username = %claims.username)
)]
pub async fn import_healthkit(
    body: web::Json<HealthKitImportRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> HttpResponse {
    let user_id = match parse_user_id(&claims) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let mut metrics = healthkit::map_quantity_samples(&body.quantity_samples);
    metrics.extend(healthkit::map_sleep_samples(&body.sleep_samples));
    for workout in &body.workouts {
        metrics.extend(healthkit::map_workout_sample(workout));
    }

    persist_mapped(&pool, user_id, metrics).await
}

#[tracing::instrument(
    name = "Import Withings payload",
    skip(body, pool, claims),
    fields(username = %claims.username)
)]
pub async fn import_withings(
    body: web::Json<WithingsImportRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> HttpResponse {
    let user_id = match parse_user_id(&claims) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let mut metrics = withings::map_measure_groups(&body.measure_groups);
    for summary in &body.activity_summaries {
        metrics.extend(withings::map_activity_summary(summary));
    }
    for summary in &body.sleep_summaries {
        metrics.extend(withings::map_sleep_summary(summary));
    }

    persist_mapped(&pool, user_id, metrics).await
}

#[tracing::instrument(
    name = "Import Oura payload",
    skip(body, pool, claims),
    fields(username = %claims.username)
)]
pub async fn import_oura(
    body: web::Json<OuraImportRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> HttpResponse {
    let user_id = match parse_user_id(&claims) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let mut metrics = Vec::new();
    for activity in &body.daily_activity {
        metrics.extend(oura::map_daily_activity(activity));
    }
    for period in &body.sleep_periods {
        metrics.extend(oura::map_sleep_period(period));
    }

    persist_mapped(&pool, user_id, metrics).await
}

#[tracing::instrument(
    name = "Import CSV rows",
    skip(body, pool, claims),
    fields(username = %claims.username, row_count = body.rows.len())
)]
pub async fn import_csv(
    body: web::Json<CsvImportRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> HttpResponse {
    let user_id = match parse_user_id(&claims) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    let metrics = csv::map_rows(&body.rows);
    persist_mapped(&pool, user_id, metrics).await
}
