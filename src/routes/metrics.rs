use actix_web::{get, post, web, HttpResponse};
use sqlx::PgPool;

use crate::handlers::metrics::connected_sources::get_connected_sources;
use crate::handlers::metrics::get_metrics::get_metrics;
use crate::handlers::metrics::import_provider::{
    import_csv, import_healthkit, import_oura, import_withings, CsvImportRequest,
    HealthKitImportRequest, OuraImportRequest, WithingsImportRequest,
};
use crate::handlers::metrics::sync_metrics::sync_metrics;
use crate::middleware::auth::Claims;
use crate::models::metrics::{MetricQuery, MetricSyncRequest};

#[post("/sync")]
async fn sync(
    body: web::Json<MetricSyncRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> HttpResponse {
    sync_metrics(body, pool, claims).await
}

#[post("/import/healthkit")]
async fn import_healthkit_route(
    body: web::Json<HealthKitImportRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> HttpResponse {
    import_healthkit(body, pool, claims).await
}

#[post("/import/withings")]
async fn import_withings_route(
    body: web::Json<WithingsImportRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> HttpResponse {
    import_withings(body, pool, claims).await
}

#[post("/import/oura")]
async fn import_oura_route(
    body: web::Json<OuraImportRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> HttpResponse {
    import_oura(body, pool, claims).await
}

#[post("/import/csv")]
async fn import_csv_route(
    body: web::Json<CsvImportRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> HttpResponse {
    import_csv(body, pool, claims).await
}

#[get("/metrics")]
async fn get_metrics_route(
    query: web::Query<MetricQuery>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> HttpResponse {
    get_metrics(query, pool, claims).await
}

#[get("/sources")]
async fn get_sources(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> HttpResponse {
    get_connected_sources(pool, claims).await
}
