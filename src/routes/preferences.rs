use actix_web::{get, put, web, HttpResponse};
use sqlx::PgPool;

use crate::handlers::preferences::get_preferences::get_source_preferences;
use crate::handlers::preferences::update_preference::update_source_preference;
use crate::middleware::auth::Claims;
use crate::models::preferences::UpdatePreferenceRequest;

#[get("/preferences")]
async fn get_preferences_route(
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> HttpResponse {
    get_source_preferences(pool, claims).await
}

#[put("/preferences")]
async fn update_preference_route(
    body: web::Json<UpdatePreferenceRequest>,
    pool: web::Data<PgPool>,
    claims: web::ReqData<Claims>
) -> HttpResponse {
    update_source_preference(body, pool, claims).await
}
