use std::str::FromStr;

use actix_web::{web, HttpResponse};
use serde_json::json;
use sqlx::PgPool;

use crate::db::metrics::query_metrics;
use crate::db::preferences::resolve_source;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;
use crate::models::metrics::{HealthCategory, MetricQuery, MetricType};

#[tracing::instrument(
    name = "Query health metrics",
    skip(query, pool, claims),
    fields(username = %claims.username)
)]
pub async fn get_metrics(
    query: web::Query<MetricQuery>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> HttpResponse {
    let user_id = match claims.user_id() {
        Some(id) => id,
        None => {
            tracing::error!("Failed to parse user ID from claims");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // A request names either one metric type or a whole category
    let (metric_types, category): (Vec<MetricType>, HealthCategory) =
        match (&query.metric_type, query.category) {
            (Some(tag), _) => match MetricType::from_str(tag) {
                Ok(metric_type) => (vec![metric_type], metric_type.category()),
                Err(e) => {
                    return HttpResponse::BadRequest()
                        .json(ApiResponse::<()>::error(e));
                }
            },
            (None, Some(category)) => (MetricType::for_category(category), category),
            (None, None) => {
                return HttpResponse::BadRequest().json(ApiResponse::<()>::error(
                    "Either `category` or `metric_type` must be provided",
                ));
            }
        };

    // Preference resolution picks the authoritative provider unless the
    // caller asked for everything (source attribution views)
    let source = if query.all_sources {
        None
    } else {
        match resolve_source(&pool, user_id, category).await {
            Ok(source) => source,
            Err(e) => {
                tracing::error!("Failed to resolve preferred source: {:?}", e);
                return HttpResponse::InternalServerError().finish();
            }
        }
    };

    let records = match query_metrics(
        &pool,
        user_id,
        &metric_types,
        source.as_deref(),
        query.start,
        query.end,
    )
    .await
    {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("Failed to query metrics: {:?}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    // No data for the range is a normal outcome, not an error
    HttpResponse::Ok().json(ApiResponse::success(
        "Metrics retrieved",
        json!({
            "category": category,
            "source": source,
            "metrics": records
        }),
    ))
}
