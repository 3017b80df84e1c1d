use actix_web::{web, HttpResponse};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::metrics::insert_metric;
use crate::middleware::auth::Claims;
use crate::models::metrics::{
    MetricPayload, MetricSyncRequest, MetricSyncResponse, MetricValidationError, SyncItemError,
    SyncStatus, UnifiedMetric,
};

/// Persist a batch of normalized metrics, one insert per metric. Per-item
/// failures land in `errors`; duplicates of already-stored observations are
/// absorbed by the idempotency key and still count as processed.
pub async fn persist_metrics(
    pool: &PgPool,
    user_id: Uuid,
    metrics: Vec<(usize, UnifiedMetric)>,
    mut errors: Vec<SyncItemError>,
    total_count: usize,
) -> MetricSyncResponse {
    let mut processed_count = 0;

    for (index, metric) in metrics {
        match insert_metric(pool, user_id, &metric).await {
            Ok(inserted) => {
                if !inserted {
                    tracing::debug!("Duplicate metric ignored: {} at {}", metric.metric_type, metric.recorded_at);
                }
                processed_count += 1;
            }
            Err(e) => {
                tracing::error!("Failed to insert metric: {:?}", e);
                errors.push(SyncItemError {
                    index,
                    message: format!("failed to store metric: {}", e),
                });
            }
        }
    }

    let failed_count = errors.len();
    let status = if failed_count == 0 {
        SyncStatus::Completed
    } else if processed_count > 0 {
        SyncStatus::Partial
    } else {
        SyncStatus::Failed
    };

    MetricSyncResponse {
        sync_id: Uuid::new_v4(),
        status,
        processed_count,
        failed_count,
        total_count,
        errors,
    }
}

#[tracing::instrument(
    name = "Sync health metrics",
    skip(body, pool, claims),
    fields(
        username = %claims.username,
        batch_size = body.metrics.len()
    )
)]
pub async fn sync_metrics(
    body: web::Json<MetricSyncRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> HttpResponse {
    let user_id = match claims.user_id() {
        Some(id) => id,
        None => {
            tracing::error!("Failed to parse user ID from claims");
            return HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": "Invalid user ID"
            }));
        }
    };

    // Validate each entry on its own; one bad entry must not fail the batch
    let total_count = body.metrics.len();
    let mut valid = Vec::new();
    let mut errors = Vec::new();

    for (index, raw) in body.metrics.iter().enumerate() {
        let payload = match serde_json::from_value::<MetricPayload>(raw.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                errors.push(SyncItemError {
                    index,
                    message: MetricValidationError::Malformed(e.to_string()).to_string(),
                });
                continue;
            }
        };

        match payload.into_unified() {
            Ok(metric) => valid.push((index, metric)),
            Err(e) => errors.push(SyncItemError { index, message: e.to_string() }),
        }
    }

    let response = persist_metrics(&pool, user_id, valid, errors, total_count).await;
    tracing::info!(
        "Metric sync {} finished: {}/{} processed",
        response.sync_id,
        response.processed_count,
        response.total_count
    );

    HttpResponse::Ok().json(response)
}
