use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::db::metrics::source_has_data;
use crate::db::preferences::set_preferred_source;
use crate::middleware::auth::Claims;
use crate::models::common::ApiResponse;
use crate::models::metrics::HealthCategory;
use crate::models::preferences::UpdatePreferenceRequest;

#[tracing::instrument(
    name = "Update source preference",
    skip(body, pool, claims),
    fields(
        username = %claims.username,
        category = %body.category,
        source_type = %body.source_type
    )
)]
pub async fn update_source_preference(
    body: web::Json<UpdatePreferenceRequest>,
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

    if body.category == HealthCategory::Workouts {
        return HttpResponse::BadRequest().json(ApiResponse::<()>::error(
            "Workouts follow the activity preference; update `activity` instead",
        ));
    }

    // A source can only be preferred once it has actually reported data
    // for the category
    let connected = match source_has_data(&pool, user_id, body.category, &body.source_type).await {
        Ok(connected) => connected,
        Err(e) => {
            tracing::error!("Failed to check source connectivity: {:?}", e);
            return HttpResponse::InternalServerError().finish();
        }
    };

    if !connected {
        return HttpResponse::BadRequest().json(ApiResponse::<()>::error(format!(
            "Source `{}` has no connected data for category `{}`",
            body.source_type, body.category
        )));
    }

    match set_preferred_source(&pool, user_id, body.category, &body.source_type).await {
        Ok(()) => {
            tracing::info!("Preference updated");
            HttpResponse::Ok().json(ApiResponse::<()>::success_message(format!(
                "Preferred source for `{}` set to `{}`",
                body.category, body.source_type
            )))
        }
        Err(e) => {
            tracing::error!("Failed to update preference: {:?}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
